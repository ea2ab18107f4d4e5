// Topologie de démo statique (hors ligne ou `sample_data: true`).

use crate::models::{
    Connection, ConnectionStatus, ConnectionType, DeviceType, Location, NetworkMetrics,
    NetworkNode, NetworkTopology, NodeStatus, SecurityZone, SecurityZoneType, ThreatEvent,
    ThreatSeverity, ThreatType,
};
use time::macros::datetime;

fn node(
    id: &str,
    device_type: DeviceType,
    name: &str,
    (lat, lng): (f64, f64),
    ip: &str,
    zone: SecurityZoneType,
    status: NodeStatus,
) -> NetworkNode {
    let mut node = NetworkNode::new(id, device_type, name, Location { lat, lng }, ip, status);
    node.security_zone = Some(zone);
    node
}

fn link(
    id: &str,
    from: &str,
    to: &str,
    connection_type: ConnectionType,
    latency: f64,
    bandwidth: f64,
    status: ConnectionStatus,
) -> Connection {
    Connection {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        connection_type,
        latency,
        bandwidth,
        status,
    }
}

pub fn sample_topology() -> NetworkTopology {
    use ConnectionStatus::*;
    use ConnectionType::*;
    use SecurityZoneType::*;

    let mut nodes = vec![
        node("fw-edge", DeviceType::Firewall, "Edge Firewall", (40.7128, -74.006), "203.0.113.1", Public, NodeStatus::Online),
        node("lb-web", DeviceType::LoadBalancer, "Web Load Balancer", (39.9526, -75.1652), "10.10.0.5", Dmz, NodeStatus::Online),
        node("web-01", DeviceType::Server, "web-01", (38.9072, -77.0369), "10.10.1.11", Dmz, NodeStatus::Online),
        node("web-02", DeviceType::Server, "web-02", (38.9072, -77.0369), "10.10.1.12", Dmz, NodeStatus::Warning),
        node("core-rtr", DeviceType::Router, "Core Router", (41.8781, -87.6298), "10.0.0.1", Internal, NodeStatus::Online),
        node("sw-dc1", DeviceType::Switch, "DC1 Switch", (41.8781, -87.6298), "10.0.1.2", Internal, NodeStatus::Online),
        node("db-primary", DeviceType::Server, "Postgres Primary", (32.7767, -96.797), "10.20.0.10", Private, NodeStatus::Online),
        node("db-replica", DeviceType::Server, "Postgres Replica", (37.7749, -122.4194), "10.20.0.11", Private, NodeStatus::Critical),
        node("vpn-gw", DeviceType::Firewall, "VPN Gateway", (47.6062, -122.3321), "2001:db8::10", Public, NodeStatus::Online),
        node("ops-laptop", DeviceType::Endpoint, "ops-laptop", (34.0522, -118.2437), "10.30.4.20", Internal, NodeStatus::Offline),
    ];
    nodes[2].metrics = Some(NetworkMetrics { cpu: 42.0, memory: 61.5, bandwidth: 180.0, connections: 312 });
    nodes[6].metrics = Some(NetworkMetrics { cpu: 73.0, memory: 88.0, bandwidth: 95.0, connections: 48 });
    nodes[6].owner = Some("data-platform".into());
    nodes[7].owner = Some("data-platform".into());
    nodes[1].owner = Some("web-team".into());

    let connections = vec![
        link("c1", "fw-edge", "lb-web", Https, 8.0, 10000.0, Active),
        link("c2", "lb-web", "web-01", Http, 2.0, 1000.0, Active),
        link("c3", "lb-web", "web-02", Http, 3.0, 1000.0, Degraded),
        link("c4", "web-01", "db-primary", Database, 21.0, 1000.0, Active),
        link("c5", "db-primary", "db-replica", Database, 48.0, 1000.0, Inactive),
        link("c6", "core-rtr", "sw-dc1", Https, 1.0, 40000.0, Active),
        link("c7", "vpn-gw", "core-rtr", Vpn, 35.0, 500.0, Active),
        link("c8", "ops-laptop", "vpn-gw", Ssh, 60.0, 100.0, Inactive),
    ];

    let security_zones = vec![
        SecurityZone {
            id: "zone-public".into(),
            name: "Internet Edge".into(),
            zone_type: Public,
            polygon: vec![[-76.0, 42.0], [-72.0, 42.0], [-72.0, 39.5], [-76.0, 39.5]],
            rules: vec!["Allow 443/tcp inbound".into(), "Deny all other inbound".into()],
        },
        SecurityZone {
            id: "zone-dmz".into(),
            name: "Web DMZ".into(),
            zone_type: Dmz,
            polygon: vec![[-78.5, 40.5], [-74.5, 40.5], [-74.5, 38.0], [-78.5, 38.0]],
            rules: vec!["Allow 80,443/tcp from edge".into(), "Allow 5432/tcp to private".into()],
        },
        SecurityZone {
            id: "zone-internal".into(),
            name: "Corporate LAN".into(),
            zone_type: Internal,
            polygon: vec![[-90.0, 43.0], [-85.0, 43.0], [-85.0, 40.0], [-90.0, 40.0]],
            rules: vec!["Allow all from VPN".into()],
        },
        SecurityZone {
            id: "zone-private".into(),
            name: "Data Tier".into(),
            zone_type: Private,
            polygon: vec![[-124.0, 38.5], [-95.0, 38.5], [-95.0, 31.5], [-124.0, 31.5]],
            rules: vec!["Allow 5432/tcp from DMZ".into(), "Deny internet egress".into()],
        },
    ];

    let threat_events = vec![
        ThreatEvent {
            id: "t1".into(),
            threat_type: ThreatType::PortScan,
            timestamp: datetime!(2025-03-01 09:12 UTC),
            node_id: "fw-edge".into(),
            severity: ThreatSeverity::Medium,
            message: "Sequential SYN probes on ports 1-1024 from 198.51.100.23".into(),
        },
        ThreatEvent {
            id: "t2".into(),
            threat_type: ThreatType::FailedLogin,
            timestamp: datetime!(2025-03-01 09:40 UTC),
            node_id: "vpn-gw".into(),
            severity: ThreatSeverity::High,
            message: "12 failed VPN logins for user admin".into(),
        },
        ThreatEvent {
            id: "t3".into(),
            threat_type: ThreatType::Ddos,
            timestamp: datetime!(2025-03-01 10:05 UTC),
            node_id: "lb-web".into(),
            severity: ThreatSeverity::Critical,
            message: "HTTP flood, 45k req/s".into(),
        },
        ThreatEvent {
            id: "t4".into(),
            threat_type: ThreatType::Intrusion,
            timestamp: datetime!(2025-03-01 10:30 UTC),
            node_id: "db-replica".into(),
            severity: ThreatSeverity::Low,
            message: "Unexpected outbound connection from replica".into(),
        },
    ];

    NetworkTopology {
        name: "NetOps Demo".into(),
        nodes,
        connections,
        security_zones,
        threat_events,
    }
}
