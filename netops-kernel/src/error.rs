use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid JSON frame: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("frame has no `type` discriminator")]
    MissingType,

    #[error("unknown message type `{0}`")]
    UnknownType(String),

    #[error("binary frame is not valid UTF-8")]
    NonUtf8Frame,

    #[error("websocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid {field} url `{value}`: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{field} url must use ws:// or wss://, got `{value}`")]
    UnsupportedScheme { field: &'static str, value: String },
}
