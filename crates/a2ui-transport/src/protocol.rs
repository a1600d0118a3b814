//! Wire protocol for A2UI sessions.

use a2ui_core::{
    ConfirmRequest, DataBag, Frame, InputRequest, NotificationEntry, ProgressEntry,
    UpdateOperation,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Method names.
pub mod methods {
    pub const RENDER: &str = "ui.render";
    pub const UPDATE: &str = "ui.update";
    pub const REQUEST_INPUT: &str = "ui.request_input";
    pub const CONFIRM: &str = "ui.confirm";
    pub const PROGRESS: &str = "ui.progress";
    pub const NAVIGATE: &str = "ui.navigate";
    pub const NOTIFY: &str = "ui.notify";

    pub const INIT: &str = "session.init";
    pub const RESPOND: &str = "ui.respond";
    pub const APPROVE: &str = "ui.approve";
    pub const CANCEL: &str = "ui.cancel";
}

/// `ui.render` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    pub component_id: String,
    pub component_type: String,
    #[serde(default)]
    pub data: DataBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DataBag>,
}

/// `ui.update` parameters. A missing `operation` means merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub component_id: String,
    #[serde(default)]
    pub operation: UpdateOperation,
    #[serde(default)]
    pub data: DataBag,
}

/// `ui.navigate` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateParams {
    pub url: String,
    #[serde(default)]
    pub new_tab: bool,
}

/// Operation sent by the agent.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Render(RenderParams),
    Update(UpdateParams),
    RequestInput(InputRequest),
    Confirm(ConfirmRequest),
    Progress(ProgressEntry),
    Navigate(NavigateParams),
    Notify(NotificationEntry),
}

impl InboundMessage {
    /// Decode `params` for `method`.
    ///
    /// Returns `Ok(None)` for methods this client does not handle.
    ///
    /// # Errors
    /// Returns error if the params do not match the method's shape.
    pub fn parse(method: &str, params: DataBag) -> Result<Option<Self>, serde_json::Error> {
        let message = match method {
            methods::RENDER => Self::Render(decode(params)?),
            methods::UPDATE => Self::Update(decode(params)?),
            methods::REQUEST_INPUT => Self::RequestInput(decode(params)?),
            methods::CONFIRM => Self::Confirm(decode(params)?),
            methods::PROGRESS => Self::Progress(decode(params)?),
            methods::NAVIGATE => Self::Navigate(decode(params)?),
            methods::NOTIFY => Self::Notify(decode(params)?),
            _ => return Ok(None),
        };
        Ok(Some(message))
    }

    /// Method name of this operation.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Render(_) => methods::RENDER,
            Self::Update(_) => methods::UPDATE,
            Self::RequestInput(_) => methods::REQUEST_INPUT,
            Self::Confirm(_) => methods::CONFIRM,
            Self::Progress(_) => methods::PROGRESS,
            Self::Navigate(_) => methods::NAVIGATE,
            Self::Notify(_) => methods::NOTIFY,
        }
    }
}

fn decode<T: DeserializeOwned>(params: DataBag) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(params))
}

/// `session.init` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitParams {
    pub agent_id: String,
}

/// Fire-and-forget action sent by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientAction {
    /// Answer to an input request.
    Respond { request_id: String, value: Value },
    /// Decision on a confirmation request.
    Approve {
        request_id: String,
        approved: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Ask the agent to stop a task.
    Cancel { task_id: String },
}

impl ClientAction {
    /// Method name of this action.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Respond { .. } => methods::RESPOND,
            Self::Approve { .. } => methods::APPROVE,
            Self::Cancel { .. } => methods::CANCEL,
        }
    }

    /// Wire frame for this action.
    ///
    /// # Errors
    /// Returns error if a value cannot be serialized.
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        Ok(Frame::notification(self.method(), to_params(self)?))
    }
}

/// Serialize a params struct into a data bag.
///
/// # Errors
/// Returns error if the value does not serialize to a JSON object.
pub fn to_params<T: Serialize>(value: &T) -> Result<DataBag, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "params must be an object, got {other}"
        ))),
    }
}
