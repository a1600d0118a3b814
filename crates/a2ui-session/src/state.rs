//! Reconciled UI state for one session.

use std::collections::HashMap;

use a2ui_core::{
    Component, ConfirmRequest, DataBag, InputRequest, Notification, NotificationEntry,
    NotificationId, ProgressEntry, SessionInfo, SessionStatus, UpdateOperation,
};
use serde::Serialize;

/// Everything a presentation layer needs to draw a session.
///
/// Owned by the controller; callers get clones via `SessionController::snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiState {
    pub status: SessionStatus,
    pub session: Option<SessionInfo>,
    pub components: HashMap<String, Component>,
    pub pending_input: Option<InputRequest>,
    pub pending_confirm: Option<ConfirmRequest>,
    pub progress: HashMap<String, ProgressEntry>,
    /// In arrival order.
    pub notifications: Vec<Notification>,
}

impl UiState {
    /// Insert or replace a component.
    pub fn render(
        &mut self,
        id: String,
        component_type: String,
        data: DataBag,
        metadata: Option<DataBag>,
    ) {
        let component = Component {
            id: id.clone(),
            component_type,
            data,
            metadata,
        };
        self.components.insert(id, component);
    }

    /// Apply an update to an existing component.
    ///
    /// Returns `false` without touching anything when `id` is unknown.
    pub fn update(&mut self, id: &str, operation: UpdateOperation, data: DataBag) -> bool {
        let Some(component) = self.components.get_mut(id) else {
            return false;
        };
        component.apply(operation, data);
        true
    }

    /// Components sorted by id.
    #[must_use]
    pub fn components_by_id(&self) -> Vec<&Component> {
        let mut components: Vec<_> = self.components.values().collect();
        components.sort_by(|a, b| a.id.cmp(&b.id));
        components
    }

    /// Make `request` the sole pending input, replacing any earlier one.
    pub fn set_pending_input(&mut self, request: InputRequest) {
        self.pending_input = Some(request);
    }

    /// Make `request` the sole pending confirmation, replacing any earlier one.
    pub fn set_pending_confirm(&mut self, request: ConfirmRequest) {
        self.pending_confirm = Some(request);
    }

    pub fn clear_pending_input(&mut self) -> Option<InputRequest> {
        self.pending_input.take()
    }

    pub fn clear_pending_confirm(&mut self) -> Option<ConfirmRequest> {
        self.pending_confirm.take()
    }

    /// Insert or replace the progress entry for its task.
    pub fn upsert_progress(&mut self, entry: ProgressEntry) {
        self.progress.insert(entry.task_id.clone(), entry);
    }

    /// Append a notification and return its identity.
    pub fn push_notification(&mut self, entry: NotificationEntry) -> NotificationId {
        let notification = Notification::new(entry);
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    /// Remove exactly the notification with `id`.
    pub fn remove_notification(&mut self, id: NotificationId) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    /// Drop everything received from a previous connection.
    ///
    /// Status is left to the caller.
    pub fn reset(&mut self) {
        *self = Self {
            status: self.status,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use a2ui_core::{NotificationLevel, ProgressType, Severity};
    use serde_json::{Value, json};

    use super::*;

    fn bag(value: Value) -> DataBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn input(request_id: &str) -> InputRequest {
        serde_json::from_value(json!({"request_id": request_id, "prompt": "Name?"})).unwrap()
    }

    fn note(title: &str) -> NotificationEntry {
        NotificationEntry {
            level: NotificationLevel::Info,
            title: title.into(),
            message: None,
            duration_ms: Some(0.0),
        }
    }

    #[test]
    fn test_render_is_idempotent_replace() {
        let mut state = UiState::default();
        state.render("c1".into(), "card".into(), bag(json!({"a": 1})), None);
        state.render(
            "c1".into(),
            "table".into(),
            bag(json!({"b": 2})),
            Some(bag(json!({"w": 3}))),
        );

        assert_eq!(state.components.len(), 1);
        let component = &state.components["c1"];
        assert_eq!(component.component_type, "table");
        assert_eq!(Value::Object(component.data.clone()), json!({"b": 2}));
        assert!(component.metadata.is_some());
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut state = UiState::default();
        state.render("c1".into(), "card".into(), bag(json!({"a": 1})), None);
        let before = state.clone();

        assert!(!state.update("c2", UpdateOperation::Merge, bag(json!({"a": 9}))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_update_operations() {
        let mut state = UiState::default();
        state.render(
            "c1".into(),
            "card".into(),
            bag(json!({"title": "A", "items": [1], "log": "x", "n": 1})),
            None,
        );

        assert!(state.update("c1", UpdateOperation::Merge, bag(json!({"title": "B"}))));
        assert!(state.update(
            "c1",
            UpdateOperation::Append,
            bag(json!({"items": [2], "log": "y", "n": 5}))
        ));
        assert_eq!(
            Value::Object(state.components["c1"].data.clone()),
            json!({"title": "B", "items": [1, 2], "log": "xy", "n": 5})
        );

        assert!(state.update("c1", UpdateOperation::Replace, bag(json!({"only": true}))));
        assert_eq!(
            Value::Object(state.components["c1"].data.clone()),
            json!({"only": true})
        );
    }

    #[test]
    fn test_pending_input_is_replaced() {
        let mut state = UiState::default();
        state.set_pending_input(input("r1"));
        state.set_pending_input(input("r2"));

        assert_eq!(state.pending_input.as_ref().unwrap().request_id, "r2");
        assert_eq!(state.clear_pending_input().unwrap().request_id, "r2");
        assert!(state.clear_pending_input().is_none());
    }

    #[test]
    fn test_pending_confirm_is_replaced() {
        let mut state = UiState::default();
        for id in ["k1", "k2"] {
            state.set_pending_confirm(ConfirmRequest {
                request_id: id.into(),
                title: "Deploy?".into(),
                description: String::new(),
                severity: Severity::Critical,
                timeout_seconds: None,
            });
        }
        assert_eq!(state.pending_confirm.as_ref().unwrap().request_id, "k2");
    }

    #[test]
    fn test_progress_upsert() {
        let mut state = UiState::default();
        for value in [10.0, 20.0] {
            state.upsert_progress(ProgressEntry {
                task_id: "t1".into(),
                progress_type: ProgressType::Determinate,
                value: Some(value),
                total: Some(100.0),
                message: None,
            });
        }

        assert_eq!(state.progress.len(), 1);
        assert_eq!(state.progress["t1"].value, Some(20.0));
    }

    #[test]
    fn test_remove_notification_targets_identity() {
        let mut state = UiState::default();
        let first = state.push_notification(note("Saved"));
        let second = state.push_notification(note("Saved"));

        assert!(state.remove_notification(first));
        assert!(!state.remove_notification(first));
        assert_eq!(state.notifications.len(), 1);
        assert_eq!(state.notifications[0].id, second);
    }

    #[test]
    fn test_reset_keeps_status() {
        let mut state = UiState {
            status: SessionStatus::Connecting,
            ..UiState::default()
        };
        state.render("c1".into(), "card".into(), DataBag::new(), None);
        state.push_notification(note("Hi"));
        state.reset();

        assert_eq!(state.status, SessionStatus::Connecting);
        assert!(state.components.is_empty());
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn test_components_by_id() {
        let mut state = UiState::default();
        for id in ["b", "c", "a"] {
            state.render(id.into(), "card".into(), DataBag::new(), None);
        }
        let ids: Vec<_> = state.components_by_id().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
