//! Protocol client: typed method dispatch over a connection.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use a2ui_core::{Connector, DataBag, Frame};
use a2ui_transport::{
    ClientAction, ConnectionEvent, ConnectionManager, ConnectionOptions, InboundMessage,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use crate::ProtocolError;

type ReplySender = oneshot::Sender<Result<Value, ProtocolError>>;

/// Sends calls and notifications, routes inbound frames.
///
/// Only correlated calls wait for a reply; everything else is fire-and-forget.
pub struct ProtocolClient<C: Connector> {
    manager: ConnectionManager<C>,
    pending: Mutex<HashMap<u64, ReplySender>>,
    next_id: AtomicU64,
}

impl<C: Connector> ProtocolClient<C> {
    /// Create a client for a single-attempt connection to `url`.
    #[must_use]
    pub fn new(
        connector: Arc<C>,
        url: Url,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (manager, events) = ConnectionManager::new(connector, url, ConnectionOptions::once());
        let client = Self {
            manager,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        };
        (client, events)
    }

    /// Open the connection.
    pub fn open(&self) {
        self.manager.connect();
    }

    /// Close the connection and fail in-flight calls.
    pub fn close(&self) {
        self.manager.disconnect();
        self.fail_pending();
    }

    /// Whether the socket is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.manager.is_open()
    }

    /// Send a call and wait for its correlated reply.
    ///
    /// # Errors
    /// Returns error if the frame cannot be sent, the connection closes
    /// first, the reply is an error, or no reply arrives within `timeout`.
    pub async fn call(
        &self,
        method: &str,
        params: DataBag,
        timeout: Duration,
    ) -> Result<Value, ProtocolError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);

        if let Err(e) = self.send_frame(&Frame::call(id, method, params)) {
            self.lock_pending().remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(ProtocolError::Closed),
            Err(_) => {
                self.lock_pending().remove(&id);
                Err(ProtocolError::Timeout(method.to_string()))
            }
        }
    }

    /// Send an operator action.
    ///
    /// # Errors
    /// Returns error if the frame cannot be serialized or no connection is running.
    pub fn send_action(&self, action: &ClientAction) -> Result<(), ProtocolError> {
        self.send_frame(&action.to_frame()?)
    }

    fn send_frame(&self, frame: &Frame) -> Result<(), ProtocolError> {
        let text = serde_json::to_string(frame)?;
        self.manager.send(text)?;
        Ok(())
    }

    /// Route an inbound frame.
    ///
    /// Replies complete their pending call. Operations are returned for the
    /// caller to apply. Frames without an envelope, with unknown methods or
    /// with mismatched params are dropped.
    pub fn route(&self, bag: DataBag) -> Option<InboundMessage> {
        let Some(frame) = Frame::from_bag(bag) else {
            tracing::debug!("Dropping frame without envelope");
            return None;
        };

        if frame.is_reply() {
            self.resolve(frame);
            return None;
        }

        let Some(method) = frame.method else {
            tracing::debug!("Dropping frame without method");
            return None;
        };

        match InboundMessage::parse(&method, frame.params) {
            Ok(Some(message)) => Some(message),
            Ok(None) => {
                tracing::debug!(method, "Ignoring unknown method");
                None
            }
            Err(e) => {
                tracing::debug!(method, "Dropping malformed params: {e}");
                None
            }
        }
    }

    fn resolve(&self, frame: Frame) {
        let Some(id) = frame.id else { return };
        let Some(tx) = self.lock_pending().remove(&id) else {
            tracing::debug!(id, "Reply for unknown call");
            return;
        };

        let reply = match frame.error {
            Some(error) => Err(ProtocolError::Remote {
                code: error.code,
                message: error.message,
            }),
            None => Ok(frame.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(reply);
    }

    /// Fail every in-flight call with [`ProtocolError::Closed`].
    pub fn fail_pending(&self) {
        self.lock_pending().clear();
    }

    /// Number of calls awaiting a reply.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, ReplySender>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
