/**
 * LIVE UPDATE CLIENT - Client du feed topologie temps réel
 *
 * RÔLE : Décode chaque frame texte du feed et l'applique au store.
 * Un frame invalide est journalisé puis ignoré, le flux continue.
 *
 * ARCHITECTURE : `FrameHandler` branché sur la boucle de reconnexion partagée.
 * Compteurs atomiques (sessions, frames appliqués/rejetés) pour le dashboard.
 */

use crate::error::FeedError;
use crate::feed::{apply_message, decode_frame};
use crate::store::TopologyStore;
use crate::transport::{spawn_reconnecting, FrameHandler, StreamHandle};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedHealth {
    pub sessions: u64,
    pub frames_applied: u64,
    pub frames_malformed: u64,
    pub frames_unknown: u64,
    pub transport_errors: u64,
}

#[derive(Default)]
struct FeedCounters {
    sessions: AtomicU64,
    applied: AtomicU64,
    malformed: AtomicU64,
    unknown: AtomicU64,
    transport_errors: AtomicU64,
}

pub struct LiveUpdateClient {
    store: TopologyStore,
    counters: FeedCounters,
}

impl LiveUpdateClient {
    pub fn new(store: TopologyStore) -> Self {
        Self { store, counters: FeedCounters::default() }
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    /// Démarre la boucle de reconnexion sur l'endpoint du feed.
    pub fn spawn(self: &Arc<Self>, url: Url, reconnect_delay: Duration) -> StreamHandle {
        spawn_reconnecting("feed", url, reconnect_delay, Arc::clone(self))
    }

    pub fn health(&self) -> FeedHealth {
        FeedHealth {
            sessions: self.counters.sessions.load(Ordering::Relaxed),
            frames_applied: self.counters.applied.load(Ordering::Relaxed),
            frames_malformed: self.counters.malformed.load(Ordering::Relaxed),
            frames_unknown: self.counters.unknown.load(Ordering::Relaxed),
            transport_errors: self.counters.transport_errors.load(Ordering::Relaxed),
        }
    }
}

impl FrameHandler for LiveUpdateClient {
    fn on_open(&self) {
        self.counters.sessions.fetch_add(1, Ordering::Relaxed);
    }

    fn on_frame(&self, text: &str) {
        match decode_frame(text) {
            Ok(message) => {
                apply_message(&self.store, message);
                self.counters.applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(FeedError::UnknownType(kind)) => {
                warn!(%kind, "unknown feed message type");
                self.counters.unknown.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("failed to parse feed frame: {e}");
                self.counters.malformed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn on_error(&self, error: &FeedError) {
        error!("feed transport error: {error}");
        self.counters.transport_errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bad_frame_does_not_block_next_one() {
        let client = LiveUpdateClient::new(TopologyStore::new());

        client.on_frame("{ this is not json");
        client.on_frame(
            &json!({
                "type": "node_add",
                "node": {
                    "id": "n1",
                    "name": "db-1",
                    "ipAddress": "10.1.0.5",
                    "type": "server",
                    "location": { "lat": 52.52, "lng": 13.4 },
                    "status": "online"
                }
            })
            .to_string(),
        );

        assert_eq!(client.store().node_count(), 1);
        let health = client.health();
        assert_eq!(health.frames_malformed, 1);
        assert_eq!(health.frames_applied, 1);
    }

    #[test]
    fn test_unknown_type_is_counted_and_ignored() {
        let client = LiveUpdateClient::new(TopologyStore::new());

        client.on_frame(r#"{"type": "threat_event", "id": "t1"}"#);

        assert_eq!(client.store().revision(), 0);
        assert_eq!(client.health().frames_unknown, 1);
    }
}
