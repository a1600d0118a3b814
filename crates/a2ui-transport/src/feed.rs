//! Marketplace-wide live event feed.

use std::sync::Arc;

use a2ui_core::{
    ConfigError, Connector, FeedConfig, FeedEvent, FeedStore, Listener, Subscription,
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{ConnectionEvent, ConnectionManager, ConnectionOptions};

/// Event feed client.
///
/// Keeps one reconnecting connection to the feed endpoint, retains the most
/// recent events and fans every event out to its listeners.
pub struct EventFeedClient<C: Connector> {
    manager: ConnectionManager<C>,
    store: Arc<FeedStore>,
    dispatch: JoinHandle<()>,
}

impl<C: Connector> EventFeedClient<C> {
    /// Create a feed client. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns error if the feed endpoint cannot be derived from the origin.
    pub fn new(connector: C, config: &FeedConfig) -> Result<Self, ConfigError> {
        let url = config.endpoint()?;
        let options = ConnectionOptions {
            reconnect: true,
            backoff: config.backoff,
        };
        let (manager, events) = ConnectionManager::new(Arc::new(connector), url, options);
        let store = Arc::new(FeedStore::new(config.history_limit));
        let dispatch = tokio::spawn(dispatch(events, Arc::clone(&store)));

        Ok(Self {
            manager,
            store,
            dispatch,
        })
    }

    /// Open the feed. No-op if already connected or reconnecting.
    pub fn connect(&self) {
        self.manager.connect();
    }

    /// Close the feed and stop reconnecting.
    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    /// Register a callback for every event.
    pub fn subscribe(&self, listener: Listener<FeedEvent>) -> Subscription<FeedEvent> {
        self.store.subscribe(listener)
    }

    /// Retained events, most recent first.
    #[must_use]
    pub fn recent(&self) -> Vec<FeedEvent> {
        self.store.recent()
    }

    /// Retained history (oldest first) followed by live events.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, FeedEvent> {
        self.store.history_plus_stream()
    }

    /// Whether the feed socket is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.manager.is_open()
    }
}

impl<C: Connector> Drop for EventFeedClient<C> {
    fn drop(&mut self) {
        self.manager.disconnect();
        self.dispatch.abort();
    }
}

async fn dispatch(mut events: mpsc::UnboundedReceiver<ConnectionEvent>, store: Arc<FeedStore>) {
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::Message(bag) => store.push(FeedEvent::from(bag)),
            ConnectionEvent::Opened => tracing::debug!("Event feed open"),
            ConnectionEvent::Closed { error: Some(e) } => {
                tracing::debug!("Event feed closed: {e}");
            }
            ConnectionEvent::Closed { error: None } => tracing::debug!("Event feed closed"),
        }
    }
}
