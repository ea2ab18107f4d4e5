use crate::models::{Connection, NetworkNode, SecurityZone, SecurityZoneType, ThreatEvent};
use parking_lot::Mutex;
use std::sync::Arc;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// État complet de la topologie, possédé par le store.
///
/// `selected_node` est une copie : `update_node` la corrige en place pour que
/// le panneau de détails reste à jour sans re-sélection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyState {
    pub nodes: Vec<NetworkNode>,
    pub connections: Vec<Connection>,
    pub selected_node: Option<NetworkNode>,
    pub security_zones: Vec<SecurityZone>,
    pub threat_events: Vec<ThreatEvent>,
    pub filtered_zone: Option<SecurityZoneType>,
}

impl TopologyState {
    /// Premier nœud portant cet id (les doublons sont tolérés).
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
