/**
 * TRANSPORT WEBSOCKET - Boucle de reconnexion partagée feed / logs
 *
 * RÔLE : Une tâche par flux, un socket à la fois. Le socket précédent est
 * toujours fermé avant une nouvelle tentative.
 *
 * ARCHITECTURE : Après chaque fermeture ou erreur, une seule reconnexion est
 * planifiée à délai fixe. Pas de backoff, pas de limite de tentatives.
 * État publié sur un `watch` pour l'indicateur de connexion.
 */

use crate::error::FeedError;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// `disconnected → connecting → open`, retour à `disconnected` à la fermeture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
        }
    }
}

/// Réactions d'un consommateur de flux. Chaque appel se termine avant la
/// lecture du frame suivant.
pub trait FrameHandler: Send + Sync + 'static {
    fn on_open(&self) {}

    fn on_frame(&self, text: &str);

    fn on_error(&self, _error: &FeedError) {}

    fn on_close(&self) {}
}

/// Timer de reconnexion à un seul slot : une rafale de fermetures/erreurs
/// ne produit jamais plus d'une tentative.
#[derive(Debug, Clone)]
pub struct ReconnectSchedule {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ReconnectSchedule {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arme le timer ; `false` si une tentative était déjà en attente.
    pub fn on_close(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consomme la tentative en attente si son échéance est passée.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

/// Poignée sur une tâche de flux. La dropper arrête aussi la tâche : le canal
/// de shutdown se ferme et la boucle sort au prochain point d'attente.
pub struct StreamHandle {
    name: String,
    state: watch::Receiver<ConnectionState>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Ferme le socket, annule la reconnexion en attente et attend la tâche.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(stream = %self.name, "stream task ended abnormally: {e}");
            }
        }
    }
}

/// Lance la boucle de reconnexion vers `url` dans une tâche de fond.
pub fn spawn_reconnecting<H: FrameHandler>(
    name: impl Into<String>,
    url: Url,
    delay: Duration,
    handler: Arc<H>,
) -> StreamHandle {
    let name = name.into();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

    let task = tokio::spawn(run_stream(
        name.clone(),
        url,
        ReconnectSchedule::new(delay),
        handler,
        state_tx,
        shutdown_rx,
    ));

    StreamHandle {
        name,
        state: state_rx,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

enum SessionEnd {
    Closed,
    Shutdown,
}

async fn run_stream<H: FrameHandler>(
    name: String,
    url: Url,
    mut schedule: ReconnectSchedule,
    handler: Arc<H>,
    state: watch::Sender<ConnectionState>,
    mut shutdown: mpsc::Receiver<()>,
) {
    loop {
        state.send_replace(ConnectionState::Connecting);
        info!(stream = %name, %url, "connecting");

        let connected = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = shutdown.recv() => break,
        };

        match connected {
            Ok((mut socket, _response)) => {
                state.send_replace(ConnectionState::Open);
                info!(stream = %name, "connected");
                handler.on_open();

                let end = read_frames(&name, &mut socket, handler.as_ref(), &mut shutdown).await;
                // close-before-reconnect : jamais deux sockets ouverts
                let _ = socket.close(None).await;
                if let SessionEnd::Shutdown = end {
                    break;
                }
            }
            Err(e) => {
                let error = FeedError::from(e);
                warn!(stream = %name, "connection failed: {error}");
                handler.on_error(&error);
            }
        }

        state.send_replace(ConnectionState::Disconnected);
        handler.on_close();

        schedule.on_close(Instant::now());
        let Some(deadline) = schedule.deadline() else { continue };
        info!(stream = %name, "disconnected, reconnecting in {}s", schedule.delay().as_secs_f32());

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                schedule.take_due(Instant::now());
            }
            _ = shutdown.recv() => {
                schedule.cancel();
                break;
            }
        }
    }

    state.send_replace(ConnectionState::Disconnected);
    debug!(stream = %name, "stream stopped");
}

async fn read_frames<H: FrameHandler>(
    name: &str,
    socket: &mut Socket,
    handler: &H,
    shutdown: &mut mpsc::Receiver<()>,
) -> SessionEnd {
    loop {
        tokio::select! {
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => handler.on_frame(&text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => handler.on_frame(&text),
                    Err(_) => warn!(stream = %name, "{}", FeedError::NonUtf8Frame),
                },
                Some(Ok(Message::Close(_))) => {
                    info!(stream = %name, "closed by peer");
                    return SessionEnd::Closed;
                }
                Some(Ok(_)) => {} // ping/pong
                Some(Err(e)) => {
                    let error = FeedError::from(e);
                    warn!(stream = %name, "transport error: {error}");
                    handler.on_error(&error);
                    return SessionEnd::Closed;
                }
                None => return SessionEnd::Closed,
            },
            _ = shutdown.recv() => return SessionEnd::Shutdown,
        }
    }
}
