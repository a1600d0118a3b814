//! In-memory connector.
//!
//! Useful for development and tests: every accepted connection hands a
//! [`MemoryPeer`] to the owner of [`MemoryPeers`], which plays the remote side.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, channel::mpsc as frame_channel};
use serde_json::Value;
use tokio::{sync::mpsc, time::Instant};
use url::Url;

use crate::{Connection, Connector, TransportError};

/// One recorded connection attempt.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub at: Instant,
    pub url: Url,
}

#[derive(Default)]
struct Inner {
    attempts: Vec<Attempt>,
    refuse_next: usize,
    refuse_all: bool,
}

/// Connector backed by in-process channels.
#[derive(Clone)]
pub struct MemoryConnector {
    inner: Arc<Mutex<Inner>>,
    peers_tx: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the queue of accepted peers.
    #[must_use]
    pub fn new() -> (Self, MemoryPeers) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        let connector = Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            peers_tx,
        };
        (connector, MemoryPeers { rx: peers_rx })
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: usize) {
        self.lock().refuse_next = n;
    }

    /// Refuse every attempt until turned off again.
    pub fn set_refuse_all(&self, refuse: bool) {
        self.lock().refuse_all = refuse;
    }

    /// Every attempt made so far, accepted or refused.
    #[must_use]
    pub fn attempts(&self) -> Vec<Attempt> {
        self.lock().attempts.clone()
    }

    #[must_use]
    pub fn attempt_count(&self) -> usize {
        self.lock().attempts.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &Url) -> Result<Connection, TransportError> {
        let refused = {
            let mut inner = self.lock();
            inner.attempts.push(Attempt {
                at: Instant::now(),
                url: url.clone(),
            });
            if inner.refuse_all {
                true
            } else if inner.refuse_next > 0 {
                inner.refuse_next -= 1;
                true
            } else {
                false
            }
        };
        if refused {
            return Err(TransportError::Connect(format!("connection refused: {url}")));
        }

        let (to_client_tx, to_client_rx) = frame_channel::unbounded();
        let (to_peer_tx, to_peer_rx) = frame_channel::unbounded();

        let peer = MemoryPeer {
            url: url.clone(),
            tx: to_client_tx,
            rx: to_peer_rx,
        };
        if self.peers_tx.send(peer).is_err() {
            return Err(TransportError::Connect("no peer is accepting".to_string()));
        }

        let sink = to_peer_tx.sink_map_err(|_| TransportError::Closed);
        Ok(Connection::new(Box::pin(sink), Box::pin(to_client_rx)))
    }
}

/// Queue of accepted connections.
pub struct MemoryPeers {
    rx: mpsc::UnboundedReceiver<MemoryPeer>,
}

impl MemoryPeers {
    /// Wait for the next accepted connection.
    pub async fn accept(&mut self) -> Option<MemoryPeer> {
        self.rx.recv().await
    }
}

/// Remote side of an in-memory connection.
///
/// Dropping the peer closes the connection cleanly.
pub struct MemoryPeer {
    url: Url,
    tx: frame_channel::UnboundedSender<Result<String, TransportError>>,
    rx: frame_channel::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// URL the client connected to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Send a raw text frame. Returns false if the client has gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.tx.unbounded_send(Ok(text.into())).is_ok()
    }

    /// Send a JSON frame.
    pub fn send_json(&self, value: &Value) -> bool {
        self.send_text(value.to_string())
    }

    /// Next frame sent by the client, `None` once the client closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.next().await
    }

    /// Next frame sent by the client, parsed as JSON.
    pub async fn recv_json(&mut self) -> Option<Value> {
        let text = self.recv().await?;
        serde_json::from_str(&text).ok()
    }

    /// Whether the client dropped its end.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close with a transport error instead of a clean close.
    pub fn fail(self, message: impl Into<String>) {
        let _ = self
            .tx
            .unbounded_send(Err(TransportError::Io(message.into())));
    }

    /// Close cleanly.
    pub fn close(self) {}
}
