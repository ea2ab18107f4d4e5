/**
 * DASHBOARD CONSOLE - Rendu texte des panneaux
 *
 * RÔLE : Statut réseau, détails du nœud sélectionné, liste filtrée, menaces,
 * fin du terminal. Vues pures sur un snapshot du store.
 *
 * ARCHITECTURE : `Dashboard` réaffiche l'écran à chaque changement du store,
 * du scrollback ou de l'état du feed.
 */

use crate::logstream::{LogEntry, Scrollback};
use crate::models::NetworkNode;
use crate::presentation::{
    connection_count_label, device_icon, filter_facets, ip_version, status_summary, threat_markers,
    time_ago, visible_nodes,
};
use crate::state::TopologyState;
use crate::store::{StoreChange, TopologyStore};
use crate::transport::ConnectionState;
use std::fmt::Write;
use time::OffsetDateTime;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Open => "CONNECTED",
        ConnectionState::Connecting => "CONNECTING...",
        ConnectionState::Disconnected => "DISCONNECTED",
    }
}

pub fn render_status_panel(state: &TopologyState, feed: ConnectionState) -> String {
    let summary = status_summary(&state.nodes);
    let mut out = String::new();
    let _ = writeln!(out, "NETWORK STATUS  [{}]", connection_label(feed));
    let _ = writeln!(
        out,
        "  nodes {:>4}   online {:>4}   offline {:>4}   connections {:>6}",
        summary.total, summary.online, summary.offline, summary.connections
    );
    let _ = writeln!(
        out,
        "  links {:>4}   threats {:>3}   zone filter {}",
        state.connections.len(),
        state.threat_events.len(),
        state.filtered_zone.map(|z| format!("{z:?}")).unwrap_or_else(|| "none".into()),
    );
    let facets = filter_facets(&state.nodes);
    if !facets.owners.is_empty() {
        let _ = writeln!(out, "  owners {}", facets.owners.join(", "));
    }
    out
}

pub fn render_node_details(node: &NetworkNode, now: OffsetDateTime) -> String {
    let mut rows = vec![
        ("name", format!("{} {}", device_icon(node.device_type), node.name)),
        ("type", node.device_type.as_str().to_string()),
        ("status", node.status.as_str().to_string()),
        ("ip", format!("{} ({})", node.ip_address, ip_version(&node.ip_address))),
    ];
    if let Some(zone) = node.security_zone {
        rows.push(("zone", format!("{zone:?}")));
    }
    if let Some(owner) = &node.owner {
        rows.push(("owner", owner.clone()));
    }
    if let Some(asn) = &node.asn {
        rows.push(("asn", asn.clone()));
    }
    if let Some(label) = connection_count_label(node.connections) {
        rows.push(("active", label));
    }
    if let Some(process) = &node.process {
        rows.push(("process", process.clone()));
    }
    if let Some(metrics) = &node.metrics {
        rows.push((
            "metrics",
            format!(
                "cpu {:.0}%  mem {:.0}%  bw {:.0} Mbps",
                metrics.cpu, metrics.memory, metrics.bandwidth
            ),
        ));
    }
    if let Some(last_seen) = node.last_seen {
        rows.push(("last seen", time_ago(last_seen, now)));
    }

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "  {label:<10} {value}");
    }
    out
}

pub fn render_threats(state: &TopologyState) -> Vec<String> {
    threat_markers(&state.threat_events, &state.nodes)
        .into_iter()
        .map(|m| format!("{} {} on {}", m.icon, m.title, m.node_name))
        .collect()
}

/// Une ligne par nœud laissé par le filtre de zone.
pub fn render_node_list(state: &TopologyState) -> Vec<String> {
    visible_nodes(state)
        .into_iter()
        .map(|n| format!("{} {:<20} {:<15} {}", device_icon(n.device_type), n.name, n.ip_address, n.status.as_str()))
        .collect()
}

pub fn render_log_line(entry: &LogEntry) -> String {
    format!("[{}] {} {}", entry.timestamp, entry.level.prefix(), entry.message)
}

pub struct Dashboard {
    store: TopologyStore,
    scrollback: Scrollback,
    changes: broadcast::Receiver<StoreChange>,
    logs: watch::Receiver<u64>,
    feed: watch::Receiver<ConnectionState>,
    tail: usize,
}

impl Dashboard {
    pub fn new(
        store: TopologyStore,
        scrollback: Scrollback,
        feed: watch::Receiver<ConnectionState>,
        tail: usize,
    ) -> Self {
        Self {
            changes: store.subscribe(),
            logs: scrollback.subscribe(),
            store,
            scrollback,
            feed,
            tail,
        }
    }

    /// Écran complet : statut, nœud sélectionné, fin du terminal.
    pub fn render(&self) -> String {
        let snapshot = self.store.snapshot();
        let mut out = render_status_panel(&snapshot, *self.feed.borrow());
        if let Some(node) = &snapshot.selected_node {
            out.push_str("SELECTED\n");
            out.push_str(&render_node_details(node, OffsetDateTime::now_utc()));
        }
        for entry in self.scrollback.tail(self.tail) {
            let _ = writeln!(out, "{}", render_log_line(&entry));
        }
        out
    }

    /// Attend le prochain changement (store, logs ou état du feed) et rend
    /// l'écran. `None` quand une source est fermée.
    pub async fn next_frame(&mut self) -> Option<String> {
        tokio::select! {
            change = self.changes.recv() => match change {
                Ok(change) => debug!(?change, "store changed"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("[dashboard] lagged, {skipped} notifications skipped");
                }
                Err(RecvError::Closed) => return None,
            },
            changed = self.logs.changed() => changed.ok()?,
            changed = self.feed.changed() => {
                changed.ok()?;
                info!("[dashboard] feed {}", self.feed.borrow_and_update().as_str());
            }
        }
        Some(self.render())
    }
}
