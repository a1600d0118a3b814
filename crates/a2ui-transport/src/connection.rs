//! Connection manager: one duplex connection with automatic recovery.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use a2ui_core::{BackoffConfig, Connection, Connector, DataBag, TransportError};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::Backoff;

/// Event delivered to the owner of a connection, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The socket opened.
    Opened,
    /// A frame that parsed as a JSON object.
    Message(DataBag),
    /// The socket closed or could not be opened.
    ///
    /// `error` is `None` for a clean close by the peer.
    Closed { error: Option<TransportError> },
}

/// Connection behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Reopen after a close, waiting according to `backoff`.
    pub reconnect: bool,
    pub backoff: BackoffConfig,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            reconnect: true,
            backoff: BackoffConfig::default(),
        }
    }
}

impl ConnectionOptions {
    /// Single attempt; the owner decides on retries.
    #[must_use]
    pub fn once() -> Self {
        Self {
            reconnect: false,
            ..Self::default()
        }
    }
}

struct Live {
    cancel: CancellationToken,
    open: Arc<AtomicBool>,
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

/// Owns at most one live connection to a fixed endpoint.
///
/// Frames are parsed here; anything that is not a JSON object is dropped
/// without disturbing later frames.
pub struct ConnectionManager<C: Connector> {
    connector: Arc<C>,
    url: Url,
    options: ConnectionOptions,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    live: Mutex<Option<Live>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager and the receiver for its events.
    #[must_use]
    pub fn new(
        connector: Arc<C>,
        url: Url,
        options: ConnectionOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            connector,
            url,
            options,
            events,
            live: Mutex::new(None),
        };
        (manager, events_rx)
    }

    /// Endpoint this manager connects to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Start connecting. No-op while a connection task is running.
    pub fn connect(&self) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if live.as_ref().is_some_and(|l| !l.task.is_finished()) {
            return;
        }

        // Each supervisor owns its flag so a superseded one cannot clear it.
        let cancel = CancellationToken::new();
        let open = Arc::new(AtomicBool::new(false));
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let supervisor = Supervisor {
            connector: Arc::clone(&self.connector),
            url: self.url.clone(),
            options: self.options,
            events: self.events.clone(),
            open: Arc::clone(&open),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(supervisor.run(outbound_rx));

        *live = Some(Live {
            cancel,
            open,
            outbound,
            task,
        });
    }

    /// Cancel any pending reconnect and close the active connection.
    ///
    /// No reconnection happens until [`ConnectionManager::connect`] is called again.
    pub fn disconnect(&self) {
        let live = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(live) = live {
            live.cancel.cancel();
            tracing::debug!(url = %self.url, "Connection cancelled");
        }
    }

    /// Queue a text frame for the current connection.
    ///
    /// Frames queued while the socket is still opening are sent once it opens.
    ///
    /// # Errors
    /// Returns error if no connection task is running.
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        match live.as_ref() {
            Some(l) if !l.task.is_finished() => {
                l.outbound.send(text).map_err(|_| TransportError::Closed)
            }
            _ => Err(TransportError::Closed),
        }
    }

    /// Whether a socket is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|l| l.open.load(Ordering::SeqCst))
    }

    /// Whether a connection task is running (open, opening or backing off).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|l| !l.task.is_finished())
    }
}

impl<C: Connector> Drop for ConnectionManager<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum PumpEnd {
    Cancelled,
    Closed(Option<TransportError>),
}

struct Supervisor<C: Connector> {
    connector: Arc<C>,
    url: Url,
    options: ConnectionOptions,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    open: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl<C: Connector> Supervisor<C> {
    async fn run(self, mut outbound: mpsc::UnboundedReceiver<String>) {
        let mut backoff = Backoff::new(self.options.backoff);

        loop {
            let attempt = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                result = self.connector.connect(&self.url) => result,
            };

            let error = match attempt {
                Ok(connection) => {
                    backoff.reset();
                    self.open.store(true, Ordering::SeqCst);
                    tracing::info!(url = %self.url, "Connection open");
                    let _ = self.events.send(ConnectionEvent::Opened);

                    let end = self.pump(connection, &mut outbound).await;
                    self.open.store(false, Ordering::SeqCst);
                    match end {
                        PumpEnd::Cancelled => return,
                        PumpEnd::Closed(error) => error,
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, "Connection failed: {e}");
                    Some(e)
                }
            };

            if self.events.send(ConnectionEvent::Closed { error }).is_err() {
                return; // owner gone
            }
            if !self.options.reconnect {
                return;
            }

            let delay = backoff.next_delay();
            tracing::debug!(url = %self.url, ?delay, "Scheduling reconnect");
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn pump(
        &self,
        connection: Connection,
        outbound: &mut mpsc::UnboundedReceiver<String>,
    ) -> PumpEnd {
        let Connection {
            mut sink,
            mut stream,
        } = connection;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    let _ = sink.close().await;
                    return PumpEnd::Cancelled;
                }
                frame = stream.next() => match frame {
                    Some(Ok(text)) => {
                        let Some(bag) = parse_frame(&text) else {
                            tracing::debug!("Dropping malformed frame");
                            continue;
                        };
                        if self.events.send(ConnectionEvent::Message(bag)).is_err() {
                            let _ = sink.close().await;
                            return PumpEnd::Cancelled;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(url = %self.url, "Connection error: {e}");
                        return PumpEnd::Closed(Some(e));
                    }
                    None => {
                        tracing::info!(url = %self.url, "Connection closed by peer");
                        return PumpEnd::Closed(None);
                    }
                },
                text = outbound.recv() => {
                    let Some(text) = text else {
                        let _ = sink.close().await;
                        return PumpEnd::Cancelled;
                    };
                    if let Err(e) = sink.send(text).await {
                        tracing::warn!(url = %self.url, "Send failed: {e}");
                        return PumpEnd::Closed(Some(e));
                    }
                }
            }
        }
    }
}

/// Parse a text frame as a JSON object.
#[must_use]
pub fn parse_frame(text: &str) -> Option<DataBag> {
    serde_json::from_str(text).ok()
}
