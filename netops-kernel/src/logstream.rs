/**
 * LOG STREAM - Flux de logs backend vers le terminal
 *
 * RÔLE : Second WebSocket, indépendant du feed, qui alimente le scrollback.
 * Frames : records JSON `{level, message}` ou texte brut.
 *
 * ARCHITECTURE : `FrameHandler` sur la boucle de reconnexion partagée.
 * Le scrollback n'est borné que par la mémoire et signale chaque écriture.
 */

use crate::error::FeedError;
use crate::state::{new_state, Shared};
use crate::transport::{spawn_reconnecting, FrameHandler, StreamHandle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warn,
    Error,
    #[serde(other)]
    Other,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Error => "[ERROR]",
            LogLevel::Other => "[LOG]",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            LogLevel::Info => "#00ff41",
            LogLevel::Warn => "#ffb000",
            LogLevel::Error => "#ff0055",
            LogLevel::Other => "#00ff41",
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogRecord {
    #[serde(default)]
    level: LogLevel,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String, // HH:MM:SS
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let timestamp = now
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();
        Self { timestamp, level, message: message.into() }
    }

    /// Record JSON `{level, message}` si possible, sinon texte brut en `info`.
    pub fn parse(frame: &str) -> Self {
        match serde_json::from_str::<LogRecord>(frame) {
            Ok(record) => Self::now(record.level, record.message),
            Err(_) => Self::now(LogLevel::Info, frame),
        }
    }
}

#[derive(Clone)]
pub struct Scrollback {
    entries: Shared<Vec<LogEntry>>,
    // compteur d'écritures, pour réveiller le dashboard
    changes: Arc<watch::Sender<u64>>,
}

impl Scrollback {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self { entries: new_state(Vec::new()), changes: Arc::new(changes) }
    }

    /// Notifié après chaque `push`/`clear` ; les écritures rapprochées sont
    /// fusionnées en une seule notification.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|n| *n = n.wrapping_add(1));
    }

    pub fn push(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
        self.notify();
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.push(LogEntry::now(level, message));
    }

    /// Vide le scrollback en laissant une seule entrée marqueur.
    pub fn clear(&self) {
        {
            let mut entries = self.entries.lock();
            entries.clear();
            entries.push(LogEntry::now(LogLevel::Info, "Terminal cleared"));
        }
        self.notify();
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn tail(&self, count: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let start = entries.len().saturating_sub(count);
        entries[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for Scrollback {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LogStream {
    scrollback: Scrollback,
    reconnect_delay: Duration,
}

impl LogStream {
    pub fn new(scrollback: Scrollback, reconnect_delay: Duration) -> Self {
        Self { scrollback, reconnect_delay }
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn spawn(self: &Arc<Self>, url: Url) -> StreamHandle {
        spawn_reconnecting("logs", url, self.reconnect_delay, Arc::clone(self))
    }
}

impl FrameHandler for LogStream {
    fn on_open(&self) {
        self.scrollback.log(LogLevel::Info, "Terminal connected to backend log stream");
    }

    fn on_frame(&self, text: &str) {
        let entry = LogEntry::parse(text);
        debug!(level = ?entry.level, "backend log: {}", entry.message);
        self.scrollback.push(entry);
    }

    fn on_error(&self, _error: &FeedError) {
        self.scrollback.log(LogLevel::Error, "WebSocket connection error");
    }

    fn on_close(&self) {
        self.scrollback.log(
            LogLevel::Warn,
            format!(
                "Disconnected from backend. Reconnecting in {}s...",
                self.reconnect_delay.as_secs()
            ),
        );
    }
}
