//! Transport layer for A2UI dashboard clients.
//!
//! Provides:
//! - Binary exponential backoff
//! - `ConnectionManager` - one reconnecting duplex connection
//! - Wire protocol (typed inbound operations, outbound actions)
//! - `EventFeedClient` - marketplace-wide event feed
//! - WebSocket connector (feature: websocket)

pub mod backoff;
pub mod connection;
pub mod feed;
pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use backoff::Backoff;
pub use connection::{ConnectionEvent, ConnectionManager, ConnectionOptions};
pub use feed::EventFeedClient;
pub use protocol::{ClientAction, InboundMessage};

#[cfg(feature = "websocket")]
pub use websocket::WsConnector;
