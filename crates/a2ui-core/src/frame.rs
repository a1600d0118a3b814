//! Wire envelope shared by inbound and outbound frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DataBag;

/// One JSON frame on the duplex connection.
///
/// Calls and notifications carry `method` and `params`. A correlated call
/// also carries an `id`; its reply echoes the `id` with `result` or `error`
/// and no `method`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "DataBag::is_empty")]
    pub params: DataBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FrameError>,
}

/// Error carried by a reply frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    pub message: String,
}

impl Frame {
    /// A fire-and-forget notification.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: DataBag) -> Self {
        Self {
            method: Some(method.into()),
            params,
            ..Self::default()
        }
    }

    /// A call expecting a reply correlated by `id`.
    #[must_use]
    pub fn call(id: u64, method: impl Into<String>, params: DataBag) -> Self {
        Self {
            id: Some(id),
            ..Self::notification(method, params)
        }
    }

    /// Build a frame from an already-parsed JSON object.
    ///
    /// Returns `None` if the object does not have the envelope shape.
    #[must_use]
    pub fn from_bag(bag: DataBag) -> Option<Self> {
        serde_json::from_value(Value::Object(bag)).ok()
    }

    /// Whether this frame answers an earlier call.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.id.is_some() && self.method.is_none()
    }
}
