//! Node type for the discourse graph.

use serde::{Deserialize, Serialize};

/// An annotated unit with a type/class label and lemma text.
///
/// Attribute values are recorded verbatim from the markup. A missing
/// required attribute is stored as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within a graph.
    pub id: String,
    /// Annotation type (e.g. `Event`, `Entity`).
    #[serde(rename = "type")]
    pub node_type: String,
    /// Annotation class.
    pub class: String,
    /// Lemma text used as the node's display label.
    pub nuclear_lemmas: String,
    /// Optional annotation values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
}

impl Node {
    /// Create a new node.
    pub fn new(
        id: impl Into<String>,
        node_type: impl Into<String>,
        class: impl Into<String>,
        nuclear_lemmas: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            class: class.into(),
            nuclear_lemmas: nuclear_lemmas.into(),
            values: None,
        }
    }

    /// Set the `values` attribute.
    pub fn with_values(mut self, values: Option<String>) -> Self {
        self.values = values;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_json_field_names() {
        let node = Node::new("r", "Event", "verb", "run").with_values(Some("past".into()));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Event");
        assert_eq!(json["nuclearLemmas"], "run");
        assert_eq!(json["values"], "past");
    }

    #[test]
    fn test_node_without_values_omits_field() {
        let node = Node::new("r", "Event", "verb", "run");
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("values").is_none());
    }
}
