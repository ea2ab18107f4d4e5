/*!
Builders de frames du feed topologie

Produit les messages JSON tels que le backend les émet (camelCase, champ
`type` discriminant), pour alimenter `MockFeedServer` dans les tests.
*/

use serde_json::{json, Value};

pub struct FeedMessageBuilder;

impl FeedMessageBuilder {
    /// Nœud minimal valide, `lastSeen` à maintenant.
    pub fn node(id: &str, name: &str, ip: &str, lat: f64, lng: f64, status: &str) -> Value {
        json!({
            "id": id,
            "type": "server",
            "name": name,
            "location": { "lat": lat, "lng": lng },
            "ipAddress": ip,
            "status": status,
            "lastSeen": chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Même nœud avec un champ supplémentaire (`owner`, `securityZone`...).
    pub fn with_field(mut node: Value, key: &str, value: Value) -> Value {
        if let Value::Object(fields) = &mut node {
            fields.insert(key.to_string(), value);
        }
        node
    }

    pub fn initial_state(nodes: Vec<Value>) -> Value {
        json!({ "type": "initial_state", "nodes": nodes })
    }

    pub fn node_add(node: Value) -> Value {
        json!({ "type": "node_add", "node": node })
    }

    /// `patch` doit contenir au moins `id`.
    pub fn node_update(patch: Value) -> Value {
        json!({ "type": "node_update", "node": patch })
    }

    pub fn node_remove(node_id: &str) -> Value {
        json!({ "type": "node_remove", "id": node_id })
    }

    pub fn connections_update(pairs: &[(&str, &str)]) -> Value {
        let connections: Vec<Value> = pairs
            .iter()
            .map(|(from, to)| json!({ "from": from, "to": to }))
            .collect();
        json!({ "type": "connections_update", "connections": connections })
    }

    /// Enregistrement du flux `/logs`.
    pub fn log(level: &str, message: &str) -> Value {
        json!({ "level": level, "message": message })
    }
}
