//! UI components rendered by a remote agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::reconcile;

/// Keyed bag of untyped values carried by components and frames.
pub type DataBag = Map<String, Value>;

/// A component in the reconciled component table.
///
/// Identity is `id`; a render with an existing id replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Component identifier, unique within one session.
    pub id: String,
    /// Widget type used to pick a renderer (card, table, form, chart...).
    #[serde(rename = "type")]
    pub component_type: String,
    /// Component data.
    #[serde(default)]
    pub data: DataBag,
    /// Optional presentation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DataBag>,
}

impl Component {
    /// Create a component without metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, component_type: impl Into<String>, data: DataBag) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            data,
            metadata: None,
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: DataBag) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Apply an update operation to this component's data.
    pub fn apply(&mut self, operation: UpdateOperation, incoming: DataBag) {
        reconcile::apply_update(&mut self.data, operation, incoming);
    }
}

/// How an update combines incoming data with existing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOperation {
    /// Substitute the whole data bag.
    Replace,
    /// Shallow merge, incoming keys win.
    #[default]
    Merge,
    /// Concatenate sequences and text, otherwise replace per key.
    Append,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_component_wire_shape() {
        let component: Component = serde_json::from_value(json!({
            "id": "c1",
            "type": "table",
            "data": {"rows": []}
        }))
        .unwrap();

        assert_eq!(component.component_type, "table");
        assert!(component.metadata.is_none());

        let value = serde_json::to_value(&component).unwrap();
        assert_eq!(value["type"], "table");
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_apply_delegates_to_reconcile() {
        let mut data = DataBag::new();
        data.insert("log".into(), json!("a"));
        let mut component = Component::new("c1", "text", data);

        let mut incoming = DataBag::new();
        incoming.insert("log".into(), json!("b"));
        component.apply(UpdateOperation::Append, incoming);

        assert_eq!(component.data["log"], "ab");
    }
}
