//! Seams for transports and host environments.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, Stream};
use thiserror::Error;
use url::Url;

/// Transport error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Connection closed")]
    Closed,
    #[error("Transport error: {0}")]
    Io(String),
}

/// Outbound half of a connection: text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;

/// Inbound half of a connection: text frames until the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// An open duplex text connection.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    #[must_use]
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens duplex connections.
///
/// Implement this for a concrete socket library; the connection manager
/// owns reconnection and framing on top of it.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `url`.
    async fn connect(&self, url: &Url) -> Result<Connection, TransportError>;
}

/// Host environment that can open locations on behalf of the agent.
pub trait Navigator: Send + Sync {
    /// Open `url`, in a new top-level context if `new_tab`.
    fn navigate(&self, url: &str, new_tab: bool);
}

/// Navigator that only logs requests.
#[derive(Debug, Default, Clone)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, url: &str, new_tab: bool) {
        tracing::info!(url, new_tab, "Agent requested navigation");
    }
}
