//! A2UI session orchestration.
//!
//! Provides:
//! - `ProtocolClient` - method dispatch and handshake correlation over a connection
//! - `UiState` - the reconciled component table, pending slots, progress and notifications
//! - `SessionController` - connect/handshake, inbound dispatch and operator actions
//! - `RenderRegistry` - per-type renderers for reconciled components

pub mod client;
pub mod controller;
pub mod error;
pub mod render;
pub mod state;

pub use client::ProtocolClient;
pub use controller::SessionController;
pub use error::{ProtocolError, SessionError};
pub use render::RenderRegistry;
pub use state::UiState;
