//! Session errors.

use a2ui_core::{ConfigError, TransportError};
use thiserror::Error;

/// Protocol error.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Connection closed before reply")]
    Closed,
    #[error("No reply to {0} in time")]
    Timeout(String),
    #[error("Remote error: {message}")]
    Remote { code: Option<i64>, message: String },
}

/// Session controller error.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Invalid handshake reply: {0}")]
    Handshake(#[source] serde_json::Error),
}
