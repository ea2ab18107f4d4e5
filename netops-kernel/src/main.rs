/**
 * NETOPS KERNEL - Point d'entrée du dashboard console
 *
 * RÔLE : Charge la config, démarre le feed topologie et le flux de logs,
 * réaffiche le dashboard à chaque changement du store, des logs ou du feed.
 * Ctrl-C ferme proprement les deux sockets.
 */

use anyhow::Context;
use netops_kernel::dashboard::Dashboard;
use netops_kernel::{load_config, LiveUpdateClient, LogStream, Scrollback, TopologyStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_TAIL: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netops_kernel=info")),
        )
        .init();

    let cfg = load_config().await;
    let feed_url = cfg.feed_url().context("invalid feed endpoint")?;
    let logs_url = cfg.logs_url().context("invalid log stream endpoint")?;
    info!(
        style = %cfg.map.style_url,
        center = ?cfg.map.center,
        zoom = cfg.map.zoom,
        "[kernel] map configuration"
    );

    let store = TopologyStore::new();
    if cfg.sample_data {
        store.load_sample_data();
        info!("[kernel] sample topology loaded ({} nodes)", store.node_count());
    }

    let live = Arc::new(LiveUpdateClient::new(store.clone()));
    let feed = live.spawn(feed_url, cfg.reconnect_delay());

    let scrollback = Scrollback::new();
    let log_stream = Arc::new(LogStream::new(scrollback.clone(), cfg.reconnect_delay()));
    let logs = log_stream.spawn(logs_url);

    let mut dashboard = Dashboard::new(store.clone(), scrollback, feed.watch_state(), LOG_TAIL);
    info!("[kernel] dashboard running, Ctrl-C to quit");
    info!("\n{}", dashboard.render());

    loop {
        let frame = tokio::select! {
            frame = dashboard.next_frame() => frame,
            _ = tokio::signal::ctrl_c() => {
                info!("[kernel] shutting down");
                None
            }
        };
        match frame {
            Some(frame) => info!("\n{}", frame),
            None => break,
        }
    }

    feed.shutdown().await;
    logs.shutdown().await;
    let health = live.health();
    info!(
        sessions = health.sessions,
        applied = health.frames_applied,
        malformed = health.frames_malformed,
        "[kernel] feed closed"
    );
    Ok(())
}
