//! Application Error Types
//!
//! Centralized error handling for the client internals. None of these
//! cross the public command surface: `connect`/`disconnect`/`send_message`
//! never raise, all failure is observed through session phase changes.

/// Client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transport closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        match e {
            tokio_tungstenite::tungstenite::Error::ConnectionClosed
            | tokio_tungstenite::tungstenite::Error::AlreadyClosed => Self::Closed,
            other => Self::Transport(other.to_string()),
        }
    }
}
