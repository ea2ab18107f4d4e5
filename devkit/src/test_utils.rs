/*!
Test Harness pour les clients NetOps

Facilite l'écriture de tests d'intégration avec:
- Démarrage automatique du backend simulé
- Envoi de frames feed/logs typés
- Attentes asynchrones avec timeout (pas de sleep fixe)
*/

use crate::message_builder::FeedMessageBuilder;
use crate::mock_feed::MockFeedServer;
use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Réévalue `condition` jusqu'à ce qu'elle soit vraie ou que `timeout` expire.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Harness de test complet autour d'un `MockFeedServer`
pub struct TestHarness {
    pub server: MockFeedServer,
    timeout: Duration,
}

impl TestHarness {
    /// Démarre un backend simulé avec un timeout d'attente de 5s.
    pub async fn start() -> Result<Self> {
        env_logger::try_init().ok(); // Init logging pour tests

        Ok(Self {
            server: MockFeedServer::start().await?,
            timeout: Duration::from_secs(5),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn feed_url(&self) -> String {
        self.server.feed_url()
    }

    pub fn logs_url(&self) -> String {
        self.server.logs_url()
    }

    /// État initial envoyé à chaque (re)connexion feed.
    pub fn greet_with(&self, nodes: Vec<Value>) {
        self.server.set_feed_greeting(vec![FeedMessageBuilder::initial_state(nodes)]);
    }

    pub fn send_feed(&self, message: &Value) {
        self.server.push_feed_json(message);
        log::info!("📨 Sent feed frame: {}", message["type"]);
    }

    pub fn send_log(&self, level: &str, message: &str) {
        self.server.push_log_frame(FeedMessageBuilder::log(level, message).to_string());
    }

    /// Attend qu'au moins `count` clients feed soient connectés.
    pub async fn wait_for_feed_clients(&self, count: usize) -> Result<()> {
        self.expect("feed clients connected", || self.server.active_feed_clients() >= count)
            .await
    }

    pub async fn wait_for_log_clients(&self, count: usize) -> Result<()> {
        self.expect("log clients connected", || self.server.active_log_clients() >= count)
            .await
    }

    /// Comme [`wait_until`], mais échoue avec `what` si le délai expire.
    pub async fn expect<F>(&self, what: &str, condition: F) -> Result<()>
    where
        F: FnMut() -> bool,
    {
        if wait_until(self.timeout, condition).await {
            log::info!("✅ {}", what);
            Ok(())
        } else {
            anyhow::bail!("timeout after {:?} waiting for: {}", self.timeout, what)
        }
    }
}
