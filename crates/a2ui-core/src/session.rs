//! Session identity and status.

use serde::{Deserialize, Serialize};

use crate::DataBag;

/// Caller-visible status of an A2UI session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Transport opening or handshake in flight.
    Connecting,
    /// Handshake completed.
    Connected,
    /// Not connected (initial state, explicit disconnect or clean close).
    #[default]
    Disconnected,
    /// Connect, handshake or transport failure.
    Error,
}

impl SessionStatus {
    /// Whether a connection attempt is live or established.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Session established by the init handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Remote session identifier.
    pub session_id: String,
    /// Agent this session talks to.
    pub agent_id: String,
    /// Capabilities advertised by the agent.
    #[serde(default)]
    pub capabilities: DataBag,
}
