//! Agent-initiated requests awaiting an operator reply.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DataBag;

/// A prompt for operator input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRequest {
    /// Correlates the operator's `respond`.
    pub request_id: String,
    /// Kind of input widget (text, number, select...).
    #[serde(default = "default_input_type")]
    pub input_type: String,
    /// Prompt shown to the operator.
    pub prompt: String,
    /// Choices for select-like inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    /// Validation rules for the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<DataBag>,
}

fn default_input_type() -> String {
    "text".to_string()
}

/// Severity of a confirmation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// A yes/no decision requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmRequest {
    /// Correlates the operator's `approve`.
    pub request_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    /// After this long the presentation layer auto-rejects.
    ///
    /// Integer and fractional values are both accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
}

impl ConfirmRequest {
    /// Auto-reject timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_input_request_defaults() {
        let request: InputRequest =
            serde_json::from_value(json!({"request_id": "r1", "prompt": "Name?"})).unwrap();

        assert_eq!(request.input_type, "text");
        assert!(request.options.is_none());
    }

    #[test]
    fn test_confirm_request_timeout() {
        let mut request: ConfirmRequest = serde_json::from_value(json!({
            "request_id": "r1",
            "title": "Deploy?",
            "severity": "critical",
            "timeout_seconds": 30
        }))
        .unwrap();

        assert_eq!(request.severity, Severity::Critical);
        assert_eq!(request.timeout(), Some(Duration::from_secs(30)));

        request.timeout_seconds = Some(0.0);
        assert_eq!(request.timeout(), None);
    }

    #[test]
    fn test_confirm_request_fractional_timeout() {
        let mut request: ConfirmRequest = serde_json::from_value(json!({
            "request_id": "r2",
            "title": "Restart?",
            "timeout_seconds": 2.5
        }))
        .unwrap();

        assert_eq!(request.timeout_seconds, Some(2.5));
        assert_eq!(request.timeout(), Some(Duration::from_millis(2500)));

        request.timeout_seconds = Some(-1.0);
        assert_eq!(request.timeout(), None);
        request.timeout_seconds = Some(f64::INFINITY);
        assert_eq!(request.timeout(), None);
    }
}
