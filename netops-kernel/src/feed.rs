/**
 * FEED TOPOLOGIE - Décodage et dispatch des frames du feed live
 *
 * RÔLE : Transforme chaque frame texte en `FeedMessage` puis l'applique au store.
 * Le backend omet les champs vides : chaque payload est optionnel, un payload
 * absent (ou `null`) est un no-op, sauf `initial_state` qui vide toujours les nœuds.
 *
 * UTILITÉ : Un type inconnu se distingue d'un JSON invalide pour la journalisation.
 */

use crate::error::FeedError;
use crate::models::{ConnectionRef, NetworkNode, NodePatch};
use crate::store::TopologyStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

pub const MESSAGE_TYPES: [&str; 5] = [
    "initial_state",
    "node_add",
    "node_update",
    "node_remove",
    "connections_update",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMessage {
    InitialState {
        #[serde(default)]
        nodes: Option<Vec<NetworkNode>>,
    },
    NodeAdd {
        #[serde(default)]
        node: Option<NetworkNode>,
    },
    NodeUpdate {
        #[serde(default)]
        node: Option<NodePatch>,
    },
    NodeRemove {
        #[serde(default)]
        id: Option<String>,
    },
    ConnectionsUpdate {
        #[serde(default)]
        connections: Option<Vec<ConnectionRef>>,
    },
}

impl FeedMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedMessage::InitialState { .. } => "initial_state",
            FeedMessage::NodeAdd { .. } => "node_add",
            FeedMessage::NodeUpdate { .. } => "node_update",
            FeedMessage::NodeRemove { .. } => "node_remove",
            FeedMessage::ConnectionsUpdate { .. } => "connections_update",
        }
    }
}

/// Décode un frame texte. Le discriminant `type` est lu en premier : un type
/// inconnu donne [`FeedError::UnknownType`], pas une erreur de décodage.
pub fn decode_frame(text: &str) -> Result<FeedMessage, FeedError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(FeedError::MissingType),
    };
    if !MESSAGE_TYPES.contains(&kind.as_str()) {
        return Err(FeedError::UnknownType(kind));
    }
    Ok(serde_json::from_value(value)?)
}

/// Applique un message décodé au store.
pub fn apply_message(store: &TopologyStore, message: FeedMessage) {
    match message {
        FeedMessage::InitialState { nodes } => {
            store.clear_nodes();
            let nodes = nodes.unwrap_or_default();
            let count = nodes.len();
            for node in nodes {
                store.add_node(node);
            }
            info!(count, "loaded initial nodes");
        }
        FeedMessage::NodeAdd { node: Some(node) } => {
            info!(name = %node.name, id = %node.id, "node added");
            store.add_node(node);
        }
        FeedMessage::NodeUpdate { node: Some(patch) } => {
            info!(id = %patch.id, "node updated");
            store.update_node(&patch.id, &patch);
        }
        FeedMessage::NodeRemove { id: Some(id) } if !id.is_empty() => {
            info!(%id, "node removed");
            store.remove_node(&id);
        }
        FeedMessage::ConnectionsUpdate { connections: Some(connections) } => {
            info!(count = connections.len(), "connections updated");
            store.set_connections(&connections);
        }
        other => {
            debug!(kind = other.kind(), "frame without payload ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceType, Location, NodeStatus};
    use serde_json::json;

    fn node_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": format!("host-{id}"),
            "ipAddress": "192.0.2.1",
            "type": "server",
            "location": { "lat": 51.5, "lng": -0.12 },
            "status": "online",
            "connections": 1
        })
    }

    #[test]
    fn test_decode_known_types() {
        let msg = decode_frame(&json!({"type": "node_remove", "id": "X"}).to_string()).unwrap();
        assert_eq!(msg, FeedMessage::NodeRemove { id: Some("X".into()) });

        let msg = decode_frame(
            &json!({"type": "connections_update", "connections": [{"from": "a", "to": "b"}]}).to_string(),
        )
        .unwrap();
        assert_eq!(
            msg,
            FeedMessage::ConnectionsUpdate { connections: Some(vec![ConnectionRef::new("a", "b")]) }
        );
    }

    #[test]
    fn test_decode_rejections() {
        assert!(matches!(decode_frame("not json"), Err(FeedError::Decode(_))));
        assert!(matches!(decode_frame(r#"{"id": "X"}"#), Err(FeedError::MissingType)));
        assert!(matches!(
            decode_frame(r#"{"type": "heartbeat"}"#),
            Err(FeedError::UnknownType(kind)) if kind == "heartbeat"
        ));
        assert!(matches!(
            decode_frame(r#"{"type": "node_add", "node": {"id": 42}}"#),
            Err(FeedError::Decode(_))
        ));
    }

    #[test]
    fn test_initial_state_replaces_nodes_in_order() {
        let store = TopologyStore::new();
        store.add_node(NetworkNode::new(
            "stale",
            DeviceType::Router,
            "stale",
            Location { lat: 0.0, lng: 0.0 },
            "10.9.9.9",
            NodeStatus::Offline,
        ));

        let frame = json!({"type": "initial_state", "nodes": [node_json("a"), node_json("b")]});
        apply_message(&store, decode_frame(&frame.to_string()).unwrap());

        let ids: Vec<String> = store.nodes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_initial_state_with_null_nodes_clears() {
        let store = TopologyStore::new();
        apply_message(&store, decode_frame(&json!({"type": "node_add", "node": node_json("a")}).to_string()).unwrap());

        apply_message(&store, decode_frame(r#"{"type": "initial_state", "nodes": null}"#).unwrap());

        assert_eq!(store.node_count(), 0);
    }

    #[test]
    fn test_missing_payload_is_noop() {
        let store = TopologyStore::new();
        store.set_connections(&[ConnectionRef::new("a", "b")]);
        let revision = store.revision();

        apply_message(&store, decode_frame(r#"{"type": "connections_update"}"#).unwrap());
        apply_message(&store, decode_frame(r#"{"type": "node_add"}"#).unwrap());
        apply_message(&store, decode_frame(r#"{"type": "node_remove", "id": ""}"#).unwrap());

        assert_eq!(store.revision(), revision);
        assert_eq!(store.connections().len(), 1);
    }

    #[test]
    fn test_node_update_merges_partial_payload() {
        let store = TopologyStore::new();
        apply_message(&store, decode_frame(&json!({"type": "node_add", "node": node_json("a")}).to_string()).unwrap());

        let frame = json!({"type": "node_update", "node": {"id": "a", "status": "critical"}});
        apply_message(&store, decode_frame(&frame.to_string()).unwrap());

        let node = store.node("a").unwrap();
        assert_eq!(node.status, NodeStatus::Critical);
        assert_eq!(node.name, "host-a");
    }

    #[test]
    fn test_node_remove_clears_selection() {
        let store = TopologyStore::new();
        apply_message(&store, decode_frame(&json!({"type": "node_add", "node": node_json("X")}).to_string()).unwrap());
        store.select_node(store.node("X"));

        apply_message(&store, decode_frame(r#"{"type": "node_remove", "id": "X"}"#).unwrap());

        assert!(store.selected_node().is_none());
    }
}
