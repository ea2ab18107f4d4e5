/*!
Backend NetOps simulé

Serveur axum local exposant `/ws` (feed topologie) et `/logs` (flux de logs),
comme le backend réel. Les tests poussent des frames à tous les clients
connectés, ferment les sockets côté serveur pour provoquer une reconnexion,
et comptent les connexions reçues.
*/

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
enum Command {
    Frame(String),
    Close,
}

/// Un endpoint WebSocket (feed ou logs) et ses compteurs.
struct Endpoint {
    name: &'static str,
    commands: broadcast::Sender<Command>,
    /// Frames envoyés à chaque nouveau client dès l'ouverture.
    greeting: Mutex<Vec<String>>,
    connections: AtomicUsize,
    active: AtomicUsize,
}

impl Endpoint {
    fn new(name: &'static str) -> Arc<Self> {
        let (commands, _) = broadcast::channel(256);
        Arc::new(Self {
            name,
            commands,
            greeting: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
        })
    }

    fn send(&self, command: Command) {
        // Err = aucun client connecté
        let _ = self.commands.send(command);
    }
}

#[derive(Clone)]
struct ServerState {
    feed: Arc<Endpoint>,
    logs: Arc<Endpoint>,
}

pub struct MockFeedServer {
    addr: SocketAddr,
    state: ServerState,
    task: JoinHandle<()>,
}

impl MockFeedServer {
    /// Démarre le serveur sur un port libre de 127.0.0.1.
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock feed server")?;
        let addr = listener.local_addr()?;

        let state = ServerState {
            feed: Endpoint::new("feed"),
            logs: Endpoint::new("logs"),
        };
        let app = Router::new()
            .route("/ws", get(feed_handler))
            .route("/logs", get(logs_handler))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[mock] server error: {}", e);
            }
        });

        log::info!("🛰️ [MOCK] backend listening on {}", addr);
        Ok(Self { addr, state, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn feed_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn logs_url(&self) -> String {
        format!("ws://{}/logs", self.addr)
    }

    /// Remplace les frames envoyés à l'ouverture de chaque connexion feed
    /// (typiquement un `initial_state`).
    pub fn set_feed_greeting(&self, frames: Vec<Value>) {
        let frames = frames.iter().map(Value::to_string).collect();
        *self.state.feed.greeting.lock().unwrap_or_else(PoisonError::into_inner) = frames;
    }

    /// Frame texte brut, valide ou non, vers tous les clients feed.
    pub fn push_feed_frame(&self, text: impl Into<String>) {
        self.state.feed.send(Command::Frame(text.into()));
    }

    pub fn push_feed_json(&self, message: &Value) {
        self.push_feed_frame(message.to_string());
    }

    pub fn push_log_frame(&self, text: impl Into<String>) {
        self.state.logs.send(Command::Frame(text.into()));
    }

    /// Ferme côté serveur toutes les connexions feed ouvertes.
    pub fn close_feed_clients(&self) {
        self.state.feed.send(Command::Close);
    }

    pub fn close_log_clients(&self) {
        self.state.logs.send(Command::Close);
    }

    /// Nombre total de connexions feed acceptées depuis le démarrage.
    pub fn feed_connections(&self) -> usize {
        self.state.feed.connections.load(Ordering::SeqCst)
    }

    pub fn active_feed_clients(&self) -> usize {
        self.state.feed.active.load(Ordering::SeqCst)
    }

    pub fn log_connections(&self) -> usize {
        self.state.logs.connections.load(Ordering::SeqCst)
    }

    pub fn active_log_clients(&self) -> usize {
        self.state.logs.active.load(Ordering::SeqCst)
    }
}

impl Drop for MockFeedServer {
    fn drop(&mut self) {
        self.state.feed.send(Command::Close);
        self.state.logs.send(Command::Close);
        self.task.abort();
    }
}

async fn feed_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_client(socket, state.feed))
}

async fn logs_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_client(socket, state.logs))
}

async fn serve_client(mut socket: WebSocket, endpoint: Arc<Endpoint>) {
    // Abonnement avant comptage : un frame poussé dès que le client est
    // visible comme actif lui parvient forcément.
    let mut commands = endpoint.commands.subscribe();
    endpoint.connections.fetch_add(1, Ordering::SeqCst);
    endpoint.active.fetch_add(1, Ordering::SeqCst);
    log::info!("🔌 [MOCK] {} client connected", endpoint.name);

    let greeting = endpoint
        .greeting
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let mut open = true;
    for frame in greeting {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            open = false;
            break;
        }
    }

    while open {
        tokio::select! {
            command = commands.recv() => match command {
                Ok(Command::Frame(text)) => {
                    open = socket.send(Message::Text(text.into())).await.is_ok();
                }
                Ok(Command::Close) | Err(RecvError::Closed) => {
                    let _ = socket.send(Message::Close(None)).await;
                    open = false;
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("[mock] {} client lagged, {} frames dropped", endpoint.name, skipped);
                }
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => open = false,
                Some(Ok(_)) => {}
            },
        }
    }

    endpoint.active.fetch_sub(1, Ordering::SeqCst);
    log::info!("🔌 [MOCK] {} client disconnected", endpoint.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_tungstenite::{connect_async, tungstenite};

    #[tokio::test]
    async fn test_greeting_then_pushed_frames() {
        let server = MockFeedServer::start().await.unwrap();
        server.set_feed_greeting(vec![serde_json::json!({"type": "initial_state", "nodes": []})]);

        let (mut socket, _) = connect_async(server.feed_url()).await.unwrap();
        let first = timeout(Duration::from_secs(5), socket.next()).await.unwrap().unwrap().unwrap();
        let first: Value = serde_json::from_str(first.to_text().unwrap()).unwrap();
        assert_eq!(first["type"], "initial_state");

        assert!(crate::wait_until(Duration::from_secs(5), || server.active_feed_clients() == 1).await);
        server.push_feed_frame("hello");
        let next = timeout(Duration::from_secs(5), socket.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(next.into_text().unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_close_clients_is_per_endpoint() {
        let server = MockFeedServer::start().await.unwrap();
        let (mut feed, _) = connect_async(server.feed_url()).await.unwrap();
        let (_logs, _) = connect_async(server.logs_url()).await.unwrap();
        assert!(crate::wait_until(Duration::from_secs(5), || {
            server.active_feed_clients() == 1 && server.active_log_clients() == 1
        })
        .await);

        server.close_feed_clients();

        let frame = timeout(Duration::from_secs(5), feed.next()).await.unwrap();
        assert!(matches!(frame, Some(Ok(tungstenite::Message::Close(_))) | None));
        assert!(crate::wait_until(Duration::from_secs(5), || server.active_feed_clients() == 0).await);
        assert_eq!(server.active_log_clients(), 1);
        assert_eq!(server.feed_connections(), 1);
        assert_eq!(server.log_connections(), 1);
    }
}
