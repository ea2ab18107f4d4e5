use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use time::OffsetDateTime;

// Énumérations du feed. `Unknown` absorbe toute valeur inconnue : le frame
// reste décodable et la présentation retombe sur son style par défaut.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    Server,
    Firewall,
    Router,
    Switch,
    Endpoint,
    LoadBalancer,
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Server => "server",
            DeviceType::Firewall => "firewall",
            DeviceType::Router => "router",
            DeviceType::Switch => "switch",
            DeviceType::Endpoint => "endpoint",
            DeviceType::LoadBalancer => "load-balancer",
            DeviceType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    Warning,
    Critical,
    #[serde(other)]
    Unknown,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Online => "online",
            NodeStatus::Offline => "offline",
            NodeStatus::Warning => "warning",
            NodeStatus::Critical => "critical",
            NodeStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityZoneType {
    Dmz,
    Internal,
    Public,
    Private,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Ssh,
    Http,
    Https,
    Database,
    Vpn,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Inactive,
    Degraded,
    #[serde(other)]
    Unknown,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Inactive => "inactive",
            ConnectionStatus::Degraded => "degraded",
            ConnectionStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreatType {
    FailedLogin,
    PortScan,
    Ddos,
    Intrusion,
    #[serde(other)]
    Unknown,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatType::FailedLogin => "failed-login",
            ThreatType::PortScan => "port-scan",
            ThreatType::Ddos => "ddos",
            ThreatType::Intrusion => "intrusion",
            ThreatType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub cpu: f32,       // 0-100
    pub memory: f32,    // 0-100
    pub bandwidth: f64, // Mbps
    pub connections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkNode {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub name: String,
    pub location: Location,
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_zone: Option<SecurityZoneType>,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NetworkMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl NetworkNode {
    /// Nœud minimal, les attributs optionnels restent vides.
    pub fn new(
        id: impl Into<String>,
        device_type: DeviceType,
        name: impl Into<String>,
        location: Location,
        ip_address: impl Into<String>,
        status: NodeStatus,
    ) -> Self {
        Self {
            id: id.into(),
            device_type,
            name: name.into(),
            location,
            ip_address: ip_address.into(),
            security_zone: None,
            status,
            metrics: None,
            owner: None,
            asn: None,
            connections: None,
            process: None,
            first_seen: None,
            last_seen: None,
            metadata: HashMap::new(),
        }
    }
}

/// Mise à jour partielle d'un nœud (payload de `node_update`).
///
/// Seuls les champs présents écrasent ceux du nœud ciblé ; `metadata` est
/// remplacé en bloc, pas fusionné clé par clé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_zone: Option<SecurityZoneType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<NetworkMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl NodePatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_connections(mut self, connections: u32) -> Self {
        self.connections = Some(connections);
        self
    }

    pub fn apply(&self, node: &mut NetworkNode) {
        if let Some(v) = self.device_type { node.device_type = v; }
        if let Some(v) = &self.name { node.name = v.clone(); }
        if let Some(v) = self.location { node.location = v; }
        if let Some(v) = &self.ip_address { node.ip_address = v.clone(); }
        if let Some(v) = self.security_zone { node.security_zone = Some(v); }
        if let Some(v) = self.status { node.status = v; }
        if let Some(v) = self.metrics { node.metrics = Some(v); }
        if let Some(v) = &self.owner { node.owner = Some(v.clone()); }
        if let Some(v) = &self.asn { node.asn = Some(v.clone()); }
        if let Some(v) = self.connections { node.connections = Some(v); }
        if let Some(v) = &self.process { node.process = Some(v.clone()); }
        if let Some(v) = self.first_seen { node.first_seen = Some(v); }
        if let Some(v) = self.last_seen { node.last_seen = Some(v); }
        if let Some(v) = &self.metadata { node.metadata = v.clone(); }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub from: String, // node id
    pub to: String,   // node id
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub latency: f64,   // ms
    pub bandwidth: f64, // Mbps
    pub status: ConnectionStatus,
}

/// Paire d'extrémités telle que le feed l'envoie dans `connections_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRef {
    pub from: String,
    pub to: String,
}

impl ConnectionRef {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityZone {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: SecurityZoneType,
    pub polygon: Vec<[f64; 2]>, // [lng, lat]
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub threat_type: ThreatType,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub node_id: String,
    pub severity: ThreatSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkTopology {
    pub name: String,
    pub nodes: Vec<NetworkNode>,
    pub connections: Vec<Connection>,
    pub security_zones: Vec<SecurityZone>,
    #[serde(default)]
    pub threat_events: Vec<ThreatEvent>,
}
