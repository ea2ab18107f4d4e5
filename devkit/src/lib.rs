/*!
# NetOps DevKit - Backend simulé et utilitaires de test

Bibliothèque facilitant le test des clients NetOps sans backend réel:
- Serveur WebSocket simulé (`/ws` feed topologie, `/logs` flux de logs)
- Builders de frames JSON conformes au feed
- Harness de test avec attentes asynchrones
*/

pub mod message_builder;
pub mod mock_feed;
pub mod test_utils;

pub use message_builder::FeedMessageBuilder;
pub use mock_feed::MockFeedServer;
pub use test_utils::{wait_until, TestHarness};
