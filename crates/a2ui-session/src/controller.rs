//! Session controller: handshake, inbound reconciliation and operator actions.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use a2ui_core::{
    Connector, Navigator, NotificationEntry, NotificationId, SessionConfig,
    SessionInfo, SessionStatus, TransportError,
};
use a2ui_transport::{
    ClientAction, ConnectionEvent, InboundMessage,
    protocol::{InitParams, methods, to_params},
};
use serde_json::Value;
use tokio::{
    sync::{mpsc, watch},
    task::{AbortHandle, JoinHandle},
};

use crate::{ProtocolClient, ProtocolError, SessionError, UiState};

/// Reason sent when a confirmation expires without an answer.
pub const AUTO_REJECT_REASON: &str = "Timed out";

struct Shared<C: Connector> {
    config: SessionConfig,
    client: ProtocolClient<C>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<UiState>,
    timers: Mutex<HashMap<NotificationId, AbortHandle>>,
    status: watch::Sender<SessionStatus>,
    revision: watch::Sender<u64>,
}

/// Drives one A2UI session against a single agent.
///
/// Inbound operations are applied one at a time, in arrival order, by a
/// dispatch task. Callers read the result through [`SessionController::snapshot`]
/// and the watch channels.
pub struct SessionController<C: Connector> {
    shared: Arc<Shared<C>>,
    dispatch: JoinHandle<()>,
}

impl<C: Connector> SessionController<C> {
    /// Create a controller. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns error if the session endpoint cannot be derived from the config.
    pub fn new(
        connector: C,
        config: SessionConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        let url = config.endpoint()?;
        let (client, events) = ProtocolClient::new(Arc::new(connector), url);
        let (status, _) = watch::channel(SessionStatus::Disconnected);
        let (revision, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            config,
            client,
            navigator,
            state: Mutex::new(UiState::default()),
            timers: Mutex::new(HashMap::new()),
            status,
            revision,
        });
        let dispatch = tokio::spawn(dispatch(events, Arc::downgrade(&shared)));

        Ok(Self { shared, dispatch })
    }

    /// Open the connection and perform the `session.init` handshake.
    ///
    /// State from any earlier connection is discarded first. Returns the
    /// resulting status; failures show up as [`SessionStatus::Error`].
    pub async fn connect(&self) -> SessionStatus {
        let shared = &self.shared;
        {
            // Check and claim under one guard so concurrent callers open once.
            let mut state = shared.lock_state();
            if state.status.is_active() {
                let current = state.status;
                tracing::debug!(?current, "Connect ignored, session already active");
                return current;
            }
            state.reset();
            state.status = SessionStatus::Connecting;
        }
        shared.cancel_timers();
        shared.status.send_replace(SessionStatus::Connecting);
        shared.bump();

        tracing::info!(agent_id = %shared.config.agent_id, "Connecting session");
        shared.client.open();

        match shared.handshake().await {
            Ok(info) => {
                let mut state = shared.lock_state();
                if state.status == SessionStatus::Connecting {
                    tracing::info!(session_id = %info.session_id, "Session connected");
                    state.session = Some(info);
                    state.status = SessionStatus::Connected;
                    drop(state);
                    shared.status.send_replace(SessionStatus::Connected);
                    shared.bump();
                }
            }
            Err(e) => {
                tracing::warn!(agent_id = %shared.config.agent_id, "Handshake failed: {e}");
                shared.client.close();
                shared.transition(SessionStatus::Connecting, SessionStatus::Error);
            }
        }

        self.status()
    }

    /// Close the connection. No reconnection is attempted.
    ///
    /// The last reconciled state stays readable until the next connect.
    pub fn disconnect(&self) {
        self.shared.client.close();
        self.shared.cancel_timers();
        self.shared.set_status(SessionStatus::Disconnected);
        tracing::info!(agent_id = %self.shared.config.agent_id, "Session disconnected");
    }

    /// Answer an input request. Clears the pending input whatever its id.
    pub fn respond(&self, request_id: impl Into<String>, value: Value) {
        self.shared.send(&ClientAction::Respond {
            request_id: request_id.into(),
            value,
        });
        if self.shared.lock_state().clear_pending_input().is_none() {
            tracing::debug!("Respond with no pending input");
        }
        self.shared.bump();
    }

    /// Decide a confirmation request. Clears the pending confirmation whatever its id.
    pub fn approve(&self, request_id: impl Into<String>, approved: bool, reason: Option<String>) {
        self.shared.send(&ClientAction::Approve {
            request_id: request_id.into(),
            approved,
            reason,
        });
        if self.shared.lock_state().clear_pending_confirm().is_none() {
            tracing::debug!("Approve with no pending confirmation");
        }
        self.shared.bump();
    }

    /// Reject a confirmation whose timeout elapsed.
    pub fn auto_reject(&self, request_id: impl Into<String>) {
        self.approve(request_id, false, Some(AUTO_REJECT_REASON.to_string()));
    }

    /// Ask the agent to stop a task. Progress is left as reported.
    pub fn cancel(&self, task_id: impl Into<String>) {
        self.shared.send(&ClientAction::Cancel {
            task_id: task_id.into(),
        });
    }

    /// Remove a notification before its timer fires.
    ///
    /// Returns `false` if it was already gone.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.shared.remove_notification(id)
    }

    /// Clone of the current state.
    #[must_use]
    pub fn snapshot(&self) -> UiState {
        self.shared.lock_state().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.shared.lock_state().status
    }

    /// Handshake result of the current connection.
    #[must_use]
    pub fn session(&self) -> Option<SessionInfo> {
        self.shared.lock_state().session.clone()
    }

    /// Receiver for status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.shared.status.subscribe()
    }

    /// Receiver whose value increments after every applied change.
    #[must_use]
    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }
}

#[cfg(feature = "websocket")]
impl SessionController<a2ui_transport::WsConnector> {
    /// Controller speaking WebSocket to the dashboard.
    ///
    /// # Errors
    /// Returns error if the session endpoint cannot be derived from the config.
    pub fn websocket(
        config: SessionConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, SessionError> {
        Self::new(a2ui_transport::WsConnector::new(), config, navigator)
    }
}

impl<C: Connector> Drop for SessionController<C> {
    fn drop(&mut self) {
        self.shared.client.close();
        self.dispatch.abort();
        self.shared.cancel_timers();
    }
}

impl<C: Connector> Shared<C> {
    async fn handshake(&self) -> Result<SessionInfo, SessionError> {
        let params = to_params(&InitParams {
            agent_id: self.config.agent_id.clone(),
        })
        .map_err(ProtocolError::from)?;
        let reply = self
            .client
            .call(methods::INIT, params, self.config.handshake_timeout())
            .await?;
        parse_session_info(reply)
    }

    fn send(&self, action: &ClientAction) {
        if let Err(e) = self.client.send_action(action) {
            tracing::debug!(method = action.method(), "Action not sent: {e}");
        }
    }

    fn apply(self: &Arc<Self>, message: InboundMessage) {
        let changed = match message {
            InboundMessage::Render(render) => {
                self.lock_state().render(
                    render.component_id,
                    render.component_type,
                    render.data,
                    render.metadata,
                );
                true
            }
            InboundMessage::Update(update) => {
                let applied =
                    self.lock_state()
                        .update(&update.component_id, update.operation, update.data);
                if !applied {
                    tracing::debug!(component_id = %update.component_id, "Update for unknown component");
                }
                applied
            }
            InboundMessage::RequestInput(request) => {
                self.lock_state().set_pending_input(request);
                true
            }
            InboundMessage::Confirm(request) => {
                self.lock_state().set_pending_confirm(request);
                true
            }
            InboundMessage::Progress(entry) => {
                self.lock_state().upsert_progress(entry);
                true
            }
            InboundMessage::Navigate(navigate) => {
                self.navigator.navigate(&navigate.url, navigate.new_tab);
                false
            }
            InboundMessage::Notify(entry) => {
                self.notify(entry);
                true
            }
        };

        if changed {
            self.bump();
        }
    }

    fn notify(self: &Arc<Self>, entry: NotificationEntry) {
        let delay = entry.auto_dismiss_after();
        let id = self.lock_state().push_notification(entry);
        if let Some(delay) = delay {
            self.schedule_dismiss(id, delay);
        }
    }

    fn schedule_dismiss(self: &Arc<Self>, id: NotificationId, delay: Duration) {
        let weak = Arc::downgrade(self);
        let mut timers = self.lock_timers();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.remove_notification(id);
            }
        });
        timers.insert(id, task.abort_handle());
    }

    /// Single removal path for timers and explicit dismissal.
    fn remove_notification(&self, id: NotificationId) -> bool {
        if let Some(timer) = self.lock_timers().remove(&id) {
            timer.abort();
        }
        let removed = self.lock_state().remove_notification(id);
        if removed {
            self.bump();
        }
        removed
    }

    fn cancel_timers(&self) {
        for (_, timer) in self.lock_timers().drain() {
            timer.abort();
        }
    }

    fn on_closed(&self, error: Option<&TransportError>) {
        self.client.fail_pending();

        let current = self.lock_state().status;
        let next = match (current, error) {
            (SessionStatus::Connecting, _) | (SessionStatus::Connected, Some(_)) => {
                SessionStatus::Error
            }
            (SessionStatus::Connected, None) => SessionStatus::Disconnected,
            _ => return,
        };
        match error {
            Some(e) => tracing::warn!(agent_id = %self.config.agent_id, "Session lost: {e}"),
            None => tracing::info!(agent_id = %self.config.agent_id, "Session closed by agent"),
        }
        self.transition(current, next);
    }

    fn set_status(&self, status: SessionStatus) {
        self.lock_state().status = status;
        self.status.send_replace(status);
        self.bump();
    }

    /// Move to `to` only if the status is still `from`.
    fn transition(&self, from: SessionStatus, to: SessionStatus) {
        {
            let mut state = self.lock_state();
            if state.status != from {
                return;
            }
            state.status = to;
        }
        self.status.send_replace(to);
        self.bump();
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn lock_state(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timers(&self) -> MutexGuard<'_, HashMap<NotificationId, AbortHandle>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn dispatch<C: Connector>(
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    shared: Weak<Shared<C>>,
) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        match event {
            ConnectionEvent::Opened => tracing::debug!("Session socket open"),
            ConnectionEvent::Message(bag) => {
                if let Some(message) = shared.client.route(bag) {
                    tracing::trace!(method = message.method(), "Applying operation");
                    shared.apply(message);
                }
            }
            ConnectionEvent::Closed { error } => shared.on_closed(error.as_ref()),
        }
    }
}

fn parse_session_info(reply: Value) -> Result<SessionInfo, SessionError> {
    serde_json::from_value(reply).map_err(SessionError::Handshake)
}
