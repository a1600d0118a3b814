//! Transient notifications pushed by the agent.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display time when a notification does not specify one.
pub const DEFAULT_NOTIFICATION_MS: f64 = 5000.0;

/// Notification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Notification as carried by `ui.notify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    #[serde(default)]
    pub level: NotificationLevel,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Display time; zero or negative disables automatic dismissal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl NotificationEntry {
    /// Delay before automatic dismissal, `None` if it stays until dismissed.
    #[must_use]
    pub fn auto_dismiss_after(&self) -> Option<Duration> {
        let ms = self.duration_ms.unwrap_or(DEFAULT_NOTIFICATION_MS);
        if ms > 0.0 {
            Duration::try_from_secs_f64(ms / 1000.0).ok()
        } else {
            None
        }
    }
}

/// Identity of one notification instance.
///
/// Two notifications with identical content still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(Uuid);

impl NotificationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(flatten)]
    pub entry: NotificationEntry,
}

impl Notification {
    /// Wrap an entry with a fresh identity.
    #[must_use]
    pub fn new(entry: NotificationEntry) -> Self {
        Self {
            id: NotificationId::new(),
            entry,
        }
    }
}
