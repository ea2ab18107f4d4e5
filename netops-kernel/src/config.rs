use crate::error::ConfigError;
use crate::transport::DEFAULT_RECONNECT_DELAY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::warn;
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct NetOpsConfig {
    pub feed: EndpointConf,
    pub logs: EndpointConf,
    pub reconnect_delay_secs: u64,
    pub map: MapConf,
    pub sample_data: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointConf {
    pub url: String, // ex: "ws://localhost:8081/ws"
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConf {
    pub style_url: String,
    pub center: [f64; 2], // [lng, lat]
    pub zoom: f64,
}

impl Default for MapConf {
    fn default() -> Self {
        Self {
            style_url: "https://basemaps.cartocdn.com/gl/dark-matter-gl-style/style.json".into(),
            center: [-95.7129, 37.0902],
            zoom: 4.0,
        }
    }
}

impl Default for NetOpsConfig {
    fn default() -> Self {
        Self {
            feed: EndpointConf { url: "ws://localhost:8081/ws".into() },
            logs: EndpointConf { url: "ws://localhost:8081/logs".into() },
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY.as_secs(),
            map: MapConf::default(),
            sample_data: false,
        }
    }
}

impl NetOpsConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn feed_url(&self) -> Result<Url, ConfigError> {
        parse_ws_url("feed", &self.feed.url)
    }

    pub fn logs_url(&self) -> Result<Url, ConfigError> {
        parse_ws_url("logs", &self.logs.url)
    }

    /// NETOPS_FEED_URL / NETOPS_LOGS_URL ont priorité sur le fichier.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NETOPS_FEED_URL") {
            self.feed.url = url;
        }
        if let Ok(url) = std::env::var("NETOPS_LOGS_URL") {
            self.logs.url = url;
        }
    }
}

fn parse_ws_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme { field, value: value.to_string() }),
    }
}

pub fn parse_config(text: &str) -> Result<NetOpsConfig, ConfigError> {
    if text.trim().is_empty() {
        return Ok(NetOpsConfig::default());
    }
    let mut cfg: NetOpsConfig = serde_yaml::from_str(text)?;
    // 0 = reconnexions en boucle sans pause contre un backend injoignable
    if cfg.reconnect_delay_secs == 0 {
        warn!(
            "[config] reconnect_delay_secs must be > 0, using {}s",
            DEFAULT_RECONNECT_DELAY.as_secs()
        );
        cfg.reconnect_delay_secs = DEFAULT_RECONNECT_DELAY.as_secs();
    }
    Ok(cfg)
}

/// Fichier absent ou invalide : config par défaut + avertissement.
pub async fn load_config_from(path: &Path) -> NetOpsConfig {
    if !path.exists() {
        warn!("[config] no {} found, using default config", path.display());
        return NetOpsConfig::default();
    }
    let loaded = match fs::read_to_string(path).await {
        Ok(text) => parse_config(&text),
        Err(e) => Err(ConfigError::from(e)),
    };
    loaded.unwrap_or_else(|e| {
        warn!("[config] invalid config {}: {e}", path.display());
        NetOpsConfig::default()
    })
}

pub async fn load_config() -> NetOpsConfig {
    let path = std::env::var("NETOPS_CONFIG").unwrap_or_else(|_| "netops.yaml".into());
    let mut cfg = load_config_from(Path::new(&path)).await;
    cfg.apply_env_overrides();
    cfg
}
