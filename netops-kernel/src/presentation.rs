/**
 * PRÉSENTATION - Vues pures dérivées du store
 *
 * RÔLE : Placement des marqueurs, lignes de connexion, couleurs, icônes, libellés.
 * Rien ici n'échoue : une valeur d'enum inconnue retombe sur un style neutre,
 * une référence vers un nœud absent est ignorée.
 */

use crate::models::{
    Connection, ConnectionStatus, ConnectionType, DeviceType, Location, NetworkNode, NodeStatus,
    SecurityZone, SecurityZoneType, ThreatEvent, ThreatSeverity, ThreatType,
};
use crate::state::TopologyState;
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use time::OffsetDateTime;

/// Rayon (en degrés) du cercle sur lequel on écarte les nœuds superposés.
pub const OVERLAP_RADIUS_DEG: f64 = 0.3;

const FALLBACK_GREY: &str = "#666";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusColors {
    pub border: &'static str,
    pub background: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoneColors {
    pub fill: &'static str,
    pub outline: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThreatColors {
    pub color: &'static str,
    pub glow: Option<&'static str>,
}

pub fn device_icon(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::Server => "🖥️",
        DeviceType::Firewall => "🛡️",
        DeviceType::Router => "📡",
        DeviceType::Switch => "🔀",
        DeviceType::Endpoint => "💻",
        DeviceType::LoadBalancer => "⚖️",
        DeviceType::Unknown => "❓",
    }
}

pub fn status_colors(status: NodeStatus) -> StatusColors {
    match status {
        NodeStatus::Online => StatusColors { border: "#00ff41", background: "rgba(0, 255, 65, 0.2)" },
        NodeStatus::Warning => StatusColors { border: "#ffb000", background: "rgba(255, 176, 0, 0.2)" },
        NodeStatus::Critical => StatusColors { border: "#ff0055", background: "rgba(255, 0, 85, 0.2)" },
        NodeStatus::Offline | NodeStatus::Unknown => {
            StatusColors { border: FALLBACK_GREY, background: "rgba(102, 102, 102, 0.2)" }
        }
    }
}

pub fn connection_style(connection_type: ConnectionType) -> LineStyle {
    match connection_type {
        ConnectionType::Ssh => LineStyle { color: "#00ff41", width: 2.0, dash: Some([4.0, 4.0]), label: "SSH" },
        ConnectionType::Http => LineStyle { color: "#00d9ff", width: 2.0, dash: None, label: "HTTP" },
        ConnectionType::Https => LineStyle { color: "#00d9ff", width: 3.0, dash: None, label: "HTTPS" },
        ConnectionType::Database => {
            LineStyle { color: "#bd00ff", width: 2.0, dash: Some([2.0, 3.0]), label: "Database" }
        }
        ConnectionType::Vpn => LineStyle { color: "#ffb000", width: 4.0, dash: None, label: "VPN" },
        ConnectionType::Unknown => LineStyle { color: FALLBACK_GREY, width: 2.0, dash: None, label: "Unknown" },
    }
}

pub fn connection_opacity(status: ConnectionStatus) -> f32 {
    match status {
        ConnectionStatus::Active | ConnectionStatus::Unknown => 0.8,
        ConnectionStatus::Degraded => 0.5,
        ConnectionStatus::Inactive => 0.3,
    }
}

pub fn zone_colors(zone_type: SecurityZoneType) -> ZoneColors {
    match zone_type {
        SecurityZoneType::Dmz => ZoneColors { fill: "rgba(255, 176, 0, 0.15)", outline: "#ffb000", label: "DMZ" },
        SecurityZoneType::Internal => {
            ZoneColors { fill: "rgba(0, 255, 65, 0.15)", outline: "#00ff41", label: "Internal" }
        }
        SecurityZoneType::Public => ZoneColors { fill: "rgba(255, 0, 85, 0.15)", outline: "#ff0055", label: "Public" },
        SecurityZoneType::Private => {
            ZoneColors { fill: "rgba(189, 0, 255, 0.15)", outline: "#bd00ff", label: "Private" }
        }
        SecurityZoneType::Unknown => {
            ZoneColors { fill: "rgba(100, 100, 100, 0.15)", outline: FALLBACK_GREY, label: "Unknown" }
        }
    }
}

pub fn threat_icon(threat_type: ThreatType) -> &'static str {
    match threat_type {
        ThreatType::FailedLogin => "🔐",
        ThreatType::PortScan => "🔍",
        ThreatType::Ddos => "💥",
        ThreatType::Intrusion => "🚨",
        ThreatType::Unknown => "⚠️",
    }
}

pub fn threat_colors(severity: ThreatSeverity) -> ThreatColors {
    match severity {
        ThreatSeverity::Critical => ThreatColors { color: "#ff0055", glow: Some("glow-red") },
        ThreatSeverity::High | ThreatSeverity::Medium => ThreatColors { color: "#ffb000", glow: Some("glow-amber") },
        ThreatSeverity::Low => ThreatColors { color: "#00d9ff", glow: Some("glow-blue") },
        ThreatSeverity::Unknown => ThreatColors { color: FALLBACK_GREY, glow: None },
    }
}

/// "Just now", "12m ago", "3h ago", "2d ago". Une date future donne "Just now".
pub fn time_ago(timestamp: OffsetDateTime, now: OffsetDateTime) -> String {
    let minutes = (now - timestamp).whole_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

pub fn ip_version(ip_address: &str) -> &'static str {
    if ip_address.contains(':') { "IPv6" } else { "IPv4" }
}

/// "1 connection" / "N connections", rien pour zéro ou inconnu.
pub fn connection_count_label(connections: Option<u32>) -> Option<String> {
    match connections {
        None | Some(0) => None,
        Some(1) => Some("1 connection".to_string()),
        Some(n) => Some(format!("{n} connections")),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPlacement {
    pub node_id: String,
    pub position: Location,
    /// Déplacé hors de sa position réelle pour rester cliquable.
    pub offset: bool,
}

fn location_key(location: &Location) -> String {
    format!("{:.2},{:.2}", location.lat, location.lng)
}

/// Position des marqueurs, une par nœud dans l'ordre de la collection.
///
/// Les nœuds d'une même position (arrondie à deux décimales) sont répartis sur
/// un cercle de [`OVERLAP_RADIUS_DEG`] autour du premier membre du groupe.
pub fn layout_markers(nodes: &[NetworkNode]) -> Vec<MarkerPlacement> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (idx, node) in nodes.iter().enumerate() {
        let slot = *by_key.entry(location_key(&node.location)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(idx);
    }

    let mut positions = vec![Location { lat: 0.0, lng: 0.0 }; nodes.len()];
    for group in &groups {
        if let [single] = group.as_slice() {
            positions[*single] = nodes[*single].location;
            continue;
        }
        let base = nodes[group[0]].location;
        let count = group.len() as f64;
        for (i, &idx) in group.iter().enumerate() {
            let angle = (i as f64 / count) * 2.0 * PI;
            positions[idx] = Location {
                lat: base.lat + OVERLAP_RADIUS_DEG * angle.sin(),
                lng: base.lng + OVERLAP_RADIUS_DEG * angle.cos(),
            };
        }
    }

    nodes
        .iter()
        .zip(positions)
        .map(|(node, position)| MarkerPlacement {
            node_id: node.id.clone(),
            offset: position != node.location,
            position,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionLine {
    pub connection_id: String,
    /// `[[lng, lat], [lng, lat]]`
    pub coordinates: [[f64; 2]; 2],
    pub style: LineStyle,
    pub opacity: f32,
}

/// Une ligne par connexion dont les deux extrémités existent.
pub fn connection_lines(connections: &[Connection], nodes: &[NetworkNode]) -> Vec<ConnectionLine> {
    connections
        .iter()
        .filter_map(|conn| {
            let from = nodes.iter().find(|n| n.id == conn.from)?;
            let to = nodes.iter().find(|n| n.id == conn.to)?;
            Some(ConnectionLine {
                connection_id: conn.id.clone(),
                coordinates: [
                    [from.location.lng, from.location.lat],
                    [to.location.lng, to.location.lat],
                ],
                style: connection_style(conn.connection_type),
                opacity: connection_opacity(conn.status),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatMarker {
    pub threat_id: String,
    pub node_name: String,
    pub position: Location,
    pub icon: &'static str,
    pub colors: ThreatColors,
    pub title: String,
}

pub fn threat_markers(threats: &[ThreatEvent], nodes: &[NetworkNode]) -> Vec<ThreatMarker> {
    threats
        .iter()
        .filter_map(|threat| {
            let node = nodes.iter().find(|n| n.id == threat.node_id)?;
            Some(ThreatMarker {
                threat_id: threat.id.clone(),
                node_name: node.name.clone(),
                position: node.location,
                icon: threat_icon(threat.threat_type),
                colors: threat_colors(threat.severity),
                title: threat.threat_type.as_str().replace('-', " ").to_uppercase(),
            })
        })
        .collect()
}

/// Anneau fermé du polygone : le premier point est répété à la fin.
pub fn zone_ring(zone: &SecurityZone) -> Vec<[f64; 2]> {
    let mut ring = zone.polygon.clone();
    if let Some(first) = zone.polygon.first() {
        ring.push(*first);
    }
    ring
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub connections: u64,
}

pub fn status_summary(nodes: &[NetworkNode]) -> StatusSummary {
    StatusSummary {
        total: nodes.len(),
        online: nodes.iter().filter(|n| n.status == NodeStatus::Online).count(),
        offline: nodes.iter().filter(|n| n.status == NodeStatus::Offline).count(),
        connections: nodes.iter().map(|n| u64::from(n.connections.unwrap_or(0))).sum(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterFacets {
    pub owners: Vec<String>,
    pub device_types: Vec<DeviceType>,
}

/// Owners et types distincts, dans l'ordre d'apparition.
pub fn filter_facets(nodes: &[NetworkNode]) -> FilterFacets {
    let mut facets = FilterFacets::default();
    for node in nodes {
        if let Some(owner) = node.owner.as_ref().filter(|o| !o.is_empty()) {
            if !facets.owners.contains(owner) {
                facets.owners.push(owner.clone());
            }
        }
        if !facets.device_types.contains(&node.device_type) {
            facets.device_types.push(node.device_type);
        }
    }
    facets
}

/// Nœuds laissés visibles par le filtre de zone actif.
pub fn visible_nodes(state: &TopologyState) -> Vec<&NetworkNode> {
    match state.filtered_zone {
        None => state.nodes.iter().collect(),
        Some(zone) => state.nodes.iter().filter(|n| n.security_zone == Some(zone)).collect(),
    }
}
