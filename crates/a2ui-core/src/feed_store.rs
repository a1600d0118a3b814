//! Bounded recent-event history with listener fan-out.

use std::{
    collections::VecDeque,
    sync::{PoisonError, RwLock},
};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::{DataBag, Listener, Listeners, Subscription};

/// Default number of retained events.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Capacity of the live broadcast channel.
const BROADCAST_CAPACITY: usize = 1024;

/// One event from the marketplace feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedEvent(DataBag);

impl FeedEvent {
    #[must_use]
    pub const fn new(fields: DataBag) -> Self {
        Self(fields)
    }

    /// The event's `type` field, if present.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// A field of the event.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// All fields.
    #[must_use]
    pub const fn fields(&self) -> &DataBag {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> DataBag {
        self.0
    }
}

impl From<DataBag> for FeedEvent {
    fn from(fields: DataBag) -> Self {
        Self(fields)
    }
}

/// Event store with bounded history, callback listeners and a broadcast
/// channel for async consumers.
///
/// Late subscribers render from [`FeedStore::recent`] then follow live events.
pub struct FeedStore {
    history: RwLock<VecDeque<FeedEvent>>,
    limit: usize,
    listeners: Listeners<FeedEvent>,
    sender: broadcast::Sender<FeedEvent>,
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl FeedStore {
    /// Create a store retaining at most `limit` events.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            history: RwLock::new(VecDeque::with_capacity(limit)),
            limit,
            listeners: Listeners::new(),
            sender,
        }
    }

    /// Record an event and deliver it to listeners, in registration order.
    pub fn push(&self, event: FeedEvent) {
        {
            let mut history = self
                .history
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            history.push_front(event.clone());
            history.truncate(self.limit);
        }

        self.listeners.emit(&event);
        let _ = self.sender.send(event); // live receivers
    }

    /// Retained events, most recent first.
    #[must_use]
    pub fn recent(&self) -> Vec<FeedEvent> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a callback for every subsequent event.
    pub fn subscribe(&self, listener: Listener<FeedEvent>) -> Subscription<FeedEvent> {
        self.listeners.subscribe(listener)
    }

    /// Get a receiver for live events.
    #[must_use]
    pub fn get_receiver(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    /// Stream that yields retained history (oldest first), then live events.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, FeedEvent> {
        let rx = self.get_receiver();
        let mut history = self.recent();
        history.reverse();

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}
