//! Task progress entries.

use serde::{Deserialize, Serialize};

/// Kind of progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressType {
    /// Known value out of a known total.
    Determinate,
    /// Busy without a measurable amount.
    #[default]
    Indeterminate,
    /// Output arrives incrementally.
    Streaming,
}

/// Latest progress reported for a task, keyed by `task_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub task_id: String,
    #[serde(default)]
    pub progress_type: ProgressType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
