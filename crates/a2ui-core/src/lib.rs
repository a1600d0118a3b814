//! Core abstractions for A2UI dashboard clients.
//!
//! This crate provides the fundamental building blocks:
//! - `Component`, `ProgressEntry`, `Notification` and the pending request types
//! - `reconcile` - Pure update operations and progress/latency derivations
//! - `Frame` - The `{method, params}` wire envelope
//! - `FeedStore` - Bounded recent-event history with listener fan-out
//! - `Connector` and `Navigator` seams for transports and hosts
//! - Client configuration

pub mod component;
pub mod config;
pub mod feed_store;
pub mod frame;
pub mod listeners;
#[cfg(feature = "memory")]
pub mod memory;
pub mod notification;
pub mod progress;
pub mod reconcile;
pub mod requests;
pub mod session;
pub mod traits;

pub use component::{Component, DataBag, UpdateOperation};
pub use config::{BackoffConfig, ConfigError, FeedConfig, Origin, SessionConfig};
pub use feed_store::{FeedEvent, FeedStore};
pub use frame::{Frame, FrameError};
pub use listeners::{Listener, Listeners, Subscription};
pub use notification::{Notification, NotificationEntry, NotificationId, NotificationLevel};
pub use progress::{ProgressEntry, ProgressType};
pub use requests::{ConfirmRequest, InputRequest, Severity};
pub use session::{SessionInfo, SessionStatus};
pub use traits::{Connection, Connector, Navigator, TransportError};
