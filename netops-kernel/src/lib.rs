/**
 * NETOPS KERNEL - Client temps réel de la topologie réseau
 *
 * RÔLE : Store observable de la topologie (nœuds, connexions, zones, menaces),
 * client du feed live, client du flux de logs backend, vues de présentation.
 *
 * ARCHITECTURE : feed WebSocket → `TopologyStore` → dashboard (flux à sens unique).
 * Les deux flux partagent la même boucle de reconnexion à délai fixe.
 */

pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod live;
pub mod logstream;
pub mod models;
pub mod presentation;
pub mod sample;
pub mod state;
pub mod store;
pub mod transport;

pub use config::{load_config, NetOpsConfig};
pub use error::{ConfigError, FeedError};
pub use feed::{apply_message, decode_frame, FeedMessage};
pub use live::{FeedHealth, LiveUpdateClient};
pub use logstream::{LogEntry, LogLevel, LogStream, Scrollback};
pub use models::*;
pub use state::TopologyState;
pub use store::{StoreChange, TopologyStore};
pub use transport::{ConnectionState, StreamHandle};
