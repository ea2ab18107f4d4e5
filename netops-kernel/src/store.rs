/**
 * TOPOLOGY STORE - Source de vérité unique de l'état topologique
 *
 * RÔLE : Nœuds, connexions, zones, menaces + état UI (sélection, filtre de zone).
 * Mutations synchrones consommées par le client live et par le dashboard.
 *
 * ARCHITECTURE : État possédé derrière un `Shared<T>` + notification broadcast.
 * Chaque appel de mutation émet exactement un `StoreChange`.
 * UTILITÉ : Remplace le re-render réactif implicite par un observer explicite.
 */

use crate::models::{
    Connection, ConnectionRef, ConnectionStatus, ConnectionType, NetworkNode, NetworkTopology,
    NodePatch, SecurityZone, SecurityZoneType, ThreatEvent,
};
use crate::sample::sample_topology;
use crate::state::{new_state, Shared, TopologyState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::broadcast;

const CHANGE_CAPACITY: usize = 256;

const DEFAULT_BANDWIDTH_MBPS: f64 = 1000.0;

/// Notification émise après chaque mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    NodeAdded { id: String },
    NodeUpdated { id: String },
    NodeRemoved { id: String },
    ConnectionAdded { id: String },
    ConnectionRemoved { id: String },
    ConnectionsReplaced { count: usize },
    SelectionChanged { id: Option<String> },
    ZoneFilterChanged { zone: Option<SecurityZoneType> },
    TopologyLoaded,
    NodesCleared,
    Cleared,
}

#[derive(Clone)]
pub struct TopologyStore {
    state: Shared<TopologyState>,
    changes: broadcast::Sender<StoreChange>,
    revision: Arc<AtomicU64>,
    connection_seq: Arc<AtomicU64>,
}

impl TopologyStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: new_state(TopologyState::default()),
            changes,
            revision: Arc::new(AtomicU64::new(0)),
            connection_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Abonnement aux notifications. Un abonné en retard perd des
    /// notifications (`Lagged`), jamais de l'état : il relit `snapshot()`.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Nombre de mutations appliquées depuis la création.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn commit(&self, change: StoreChange) {
        self.revision.fetch_add(1, Ordering::AcqRel);
        // Err = aucun abonné, ce n'est pas une erreur
        let _ = self.changes.send(change);
    }

    // --- Nœuds ---

    /// Ajoute le nœud en fin de collection, sans contrôle de doublon.
    pub fn add_node(&self, node: NetworkNode) {
        let id = node.id.clone();
        self.state.lock().nodes.push(node);
        self.commit(StoreChange::NodeAdded { id });
    }

    /// Fusionne `patch` dans chaque nœud portant `id` ; no-op si absent.
    /// Le nœud sélectionné est corrigé en même temps s'il correspond.
    pub fn update_node(&self, id: &str, patch: &NodePatch) {
        {
            let mut state = self.state.lock();
            for node in state.nodes.iter_mut().filter(|n| n.id == id) {
                patch.apply(node);
            }
            if let Some(selected) = state.selected_node.as_mut().filter(|n| n.id == id) {
                patch.apply(selected);
            }
        }
        self.commit(StoreChange::NodeUpdated { id: id.to_string() });
    }

    /// Supprime le nœud, toutes les connexions qui le référencent, et la
    /// sélection si elle le visait.
    pub fn remove_node(&self, id: &str) {
        {
            let mut state = self.state.lock();
            state.nodes.retain(|n| n.id != id);
            state.connections.retain(|c| c.from != id && c.to != id);
            if state.selected_node.as_ref().is_some_and(|n| n.id == id) {
                state.selected_node = None;
            }
        }
        self.commit(StoreChange::NodeRemoved { id: id.to_string() });
    }

    /// Vide les nœuds uniquement ; connexions, zones et sélection restent.
    pub fn clear_nodes(&self) {
        self.state.lock().nodes.clear();
        self.commit(StoreChange::NodesCleared);
    }

    // --- Connexions ---

    /// Ajoute une connexion manuelle et retourne son id `c<unix-ms>-<seq>`.
    pub fn add_connection(&self, from: &str, to: &str, connection_type: ConnectionType) -> String {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let seq = self.connection_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("c{millis}-{seq}");

        let connection = Connection {
            id: id.clone(),
            from: from.to_string(),
            to: to.to_string(),
            connection_type,
            latency: 0.0,
            bandwidth: DEFAULT_BANDWIDTH_MBPS,
            status: ConnectionStatus::Active,
        };
        self.state.lock().connections.push(connection);
        self.commit(StoreChange::ConnectionAdded { id: id.clone() });
        id
    }

    pub fn remove_connection(&self, id: &str) {
        self.state.lock().connections.retain(|c| c.id != id);
        self.commit(StoreChange::ConnectionRemoved { id: id.to_string() });
    }

    /// Remplace toute la collection. Les métadonnées sont fixes : https,
    /// 1000 Mbps, latence 0, active ; l'id vaut `<from>-<to>-<index>`.
    pub fn set_connections(&self, refs: &[ConnectionRef]) {
        let connections: Vec<Connection> = refs
            .iter()
            .enumerate()
            .map(|(idx, r)| Connection {
                id: format!("{}-{}-{}", r.from, r.to, idx),
                from: r.from.clone(),
                to: r.to.clone(),
                connection_type: ConnectionType::Https,
                latency: 0.0,
                bandwidth: DEFAULT_BANDWIDTH_MBPS,
                status: ConnectionStatus::Active,
            })
            .collect();
        let count = connections.len();
        self.state.lock().connections = connections;
        self.commit(StoreChange::ConnectionsReplaced { count });
    }

    // --- État UI ---

    pub fn select_node(&self, node: Option<NetworkNode>) {
        let id = node.as_ref().map(|n| n.id.clone());
        self.state.lock().selected_node = node;
        self.commit(StoreChange::SelectionChanged { id });
    }

    pub fn filter_by_zone(&self, zone: Option<SecurityZoneType>) {
        self.state.lock().filtered_zone = zone;
        self.commit(StoreChange::ZoneFilterChanged { zone });
    }

    // --- Utilitaires ---

    /// Écrase nœuds, connexions, zones et menaces (sélection et filtre intacts).
    pub fn load_topology(&self, topology: NetworkTopology) {
        {
            let mut state = self.state.lock();
            state.nodes = topology.nodes;
            state.connections = topology.connections;
            state.security_zones = topology.security_zones;
            state.threat_events = topology.threat_events;
        }
        self.commit(StoreChange::TopologyLoaded);
    }

    pub fn load_sample_data(&self) {
        self.load_topology(sample_topology());
    }

    pub fn clear_all(&self) {
        *self.state.lock() = TopologyState::default();
        self.commit(StoreChange::Cleared);
    }

    // --- Lecture ---

    pub fn snapshot(&self) -> TopologyState {
        self.state.lock().clone()
    }

    pub fn nodes(&self) -> Vec<NetworkNode> {
        self.state.lock().nodes.clone()
    }

    pub fn node(&self, id: &str) -> Option<NetworkNode> {
        self.state.lock().node(id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.state.lock().connections.clone()
    }

    pub fn security_zones(&self) -> Vec<SecurityZone> {
        self.state.lock().security_zones.clone()
    }

    pub fn threat_events(&self) -> Vec<ThreatEvent> {
        self.state.lock().threat_events.clone()
    }

    pub fn selected_node(&self) -> Option<NetworkNode> {
        self.state.lock().selected_node.clone()
    }

    pub fn filtered_zone(&self) -> Option<SecurityZoneType> {
        self.state.lock().filtered_zone
    }
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceType, Location, NodeStatus};

    fn node(id: &str) -> NetworkNode {
        NetworkNode::new(
            id,
            DeviceType::Server,
            format!("host-{id}"),
            Location { lat: 40.71, lng: -74.0 },
            "10.0.0.1",
            NodeStatus::Online,
        )
    }

    #[test]
    fn test_add_node_keeps_duplicates() {
        let store = TopologyStore::new();
        store.add_node(node("a"));
        store.add_node(node("b"));
        store.add_node(node("a"));

        assert_eq!(store.node_count(), 3);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn test_update_missing_node_is_noop() {
        let store = TopologyStore::new();
        store.add_node(node("a"));
        let before = store.nodes();

        store.update_node("ghost", &NodePatch::new("ghost").with_status(NodeStatus::Critical));

        assert_eq!(store.nodes(), before);
    }

    #[test]
    fn test_update_patches_selected_node() {
        let store = TopologyStore::new();
        store.add_node(node("a"));
        store.select_node(store.node("a"));

        store.update_node("a", &NodePatch::new("a").with_status(NodeStatus::Warning).with_connections(12));

        assert_eq!(store.node("a").unwrap().status, NodeStatus::Warning);
        assert_eq!(store.selected_node().unwrap().connections, Some(12));
        assert_eq!(store.selected_node().unwrap().status, NodeStatus::Warning);
        assert_eq!(store.selected_node().unwrap().name, "host-a");
    }

    #[test]
    fn test_remove_node_drops_its_connections_only() {
        let store = TopologyStore::new();
        for id in ["a", "b", "c"] {
            store.add_node(node(id));
        }
        store.set_connections(&[
            ConnectionRef::new("a", "b"),
            ConnectionRef::new("c", "a"),
            ConnectionRef::new("b", "c"),
        ]);

        store.remove_node("a");

        let remaining = store.connections();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].from, "b");
        assert_eq!(remaining[0].to, "c");
        assert!(store.node("a").is_none());
    }

    #[test]
    fn test_remove_selected_node_clears_selection() {
        let store = TopologyStore::new();
        store.add_node(node("x"));
        store.select_node(store.node("x"));

        store.remove_node("x");

        assert!(store.selected_node().is_none());
    }

    #[test]
    fn test_set_connections_replaces_everything() {
        let store = TopologyStore::new();
        store.add_connection("old", "older", ConnectionType::Ssh);

        store.set_connections(&[ConnectionRef::new("a", "b"), ConnectionRef::new("b", "c")]);

        let connections = store.connections();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].id, "a-b-0");
        assert_eq!(connections[1].id, "b-c-1");
        for c in &connections {
            assert_eq!(c.status, ConnectionStatus::Active);
            assert_eq!(c.connection_type, ConnectionType::Https);
            assert_eq!(c.bandwidth, 1000.0);
            assert_eq!(c.latency, 0.0);
        }
    }

    #[test]
    fn test_manual_connection_ids_do_not_collide() {
        let store = TopologyStore::new();
        let first = store.add_connection("a", "b", ConnectionType::Vpn);
        let second = store.add_connection("a", "b", ConnectionType::Vpn);

        assert_ne!(first, second);
        assert!(first.starts_with('c'));

        store.remove_connection(&first);
        let left = store.connections();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, second);
    }

    #[test]
    fn test_clear_nodes_is_narrower_than_clear_all() {
        let store = TopologyStore::new();
        store.load_sample_data();
        store.filter_by_zone(Some(SecurityZoneType::Dmz));

        store.clear_nodes();
        let snap = store.snapshot();
        assert!(snap.nodes.is_empty());
        assert!(!snap.connections.is_empty());
        assert!(!snap.security_zones.is_empty());
        assert_eq!(snap.filtered_zone, Some(SecurityZoneType::Dmz));

        store.clear_all();
        assert_eq!(store.snapshot(), TopologyState::default());
    }

    #[tokio::test]
    async fn test_each_mutation_notifies_once() {
        let store = TopologyStore::new();
        let mut rx = store.subscribe();

        store.add_node(node("a"));
        store.update_node("a", &NodePatch::new("a").with_name("renamed"));
        store.filter_by_zone(None);

        assert_eq!(rx.recv().await.unwrap(), StoreChange::NodeAdded { id: "a".into() });
        assert_eq!(rx.recv().await.unwrap(), StoreChange::NodeUpdated { id: "a".into() });
        assert_eq!(rx.recv().await.unwrap(), StoreChange::ZoneFilterChanged { zone: None });
        assert!(rx.try_recv().is_err());
    }
}
