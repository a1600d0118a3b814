//! Pure reconciliation functions.
//!
//! The three update operations applied to component data, plus the
//! percentage and latency derivations used by progress and pipeline views.

use serde_json::Value;

use crate::{DataBag, ProgressEntry, ProgressType, UpdateOperation};

/// Apply `operation` with `incoming` to `existing`.
pub fn apply_update(existing: &mut DataBag, operation: UpdateOperation, incoming: DataBag) {
    match operation {
        UpdateOperation::Replace => replace(existing, incoming),
        UpdateOperation::Merge => merge(existing, incoming),
        UpdateOperation::Append => append(existing, incoming),
    }
}

/// Substitute the whole bag.
pub fn replace(existing: &mut DataBag, incoming: DataBag) {
    *existing = incoming;
}

/// Shallow merge: incoming keys overwrite, other keys are untouched.
pub fn merge(existing: &mut DataBag, incoming: DataBag) {
    for (key, value) in incoming {
        existing.insert(key, value);
    }
}

/// Per-key append.
///
/// Array onto array concatenates, string onto string concatenates, anything
/// else replaces the value at that key.
pub fn append(existing: &mut DataBag, incoming: DataBag) {
    for (key, value) in incoming {
        let value = match (existing.get_mut(&key), value) {
            (Some(Value::Array(current)), Value::Array(mut more)) => {
                current.append(&mut more);
                continue;
            }
            (Some(Value::String(current)), Value::String(more)) => {
                current.push_str(&more);
                continue;
            }
            (_, value) => value,
        };
        existing.insert(key, value);
    }
}

/// Percentage of `value` over `total`, clamped to `0..=100`.
///
/// Returns `None` when `total` is not a positive finite number.
#[must_use]
pub fn percentage(value: f64, total: f64) -> Option<f64> {
    if !total.is_finite() || total <= 0.0 || !value.is_finite() {
        return None;
    }
    Some((value / total * 100.0).clamp(0.0, 100.0))
}

/// Completion percentage for a progress entry.
///
/// Only determinate entries have one. Without a `total`, `value` is taken
/// to already be a percentage.
#[must_use]
pub fn progress_percent(entry: &ProgressEntry) -> Option<f64> {
    if entry.progress_type != ProgressType::Determinate {
        return None;
    }
    match (entry.value, entry.total) {
        (Some(value), Some(total)) => percentage(value, total),
        (Some(value), None) => value.is_finite().then(|| value.clamp(0.0, 100.0)),
        _ => None,
    }
}

/// Elapsed milliseconds between two timestamps; zero if the clock went backwards.
#[must_use]
pub const fn latency_ms(started_at_ms: u64, finished_at_ms: u64) -> u64 {
    finished_at_ms.saturating_sub(started_at_ms)
}

/// Mean of latency samples in milliseconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_latency_ms(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: u128 = samples.iter().map(|s| u128::from(*s)).sum();
    Some(sum as f64 / samples.len() as f64)
}
