//! Edge types for the discourse graph.

use serde::{Deserialize, Serialize};

/// Directed relation from a parent node to a child node.
///
/// `edge_type` and `function` come from the edge wrapper of the child node
/// and are absent when the child has no wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Synthesized as `edge_<n>`.
    pub id: String,
    /// Parent node id.
    pub source: String,
    /// Child node id.
    pub target: String,
    /// Relation type.
    #[serde(rename = "type", default)]
    pub edge_type: Option<String>,
    /// Relation function.
    #[serde(default)]
    pub function: Option<String>,
}

impl Edge {
    /// Create a new untyped edge.
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            function: None,
        }
    }

    /// Set the edge type.
    pub fn with_type(mut self, edge_type: Option<String>) -> Self {
        self.edge_type = edge_type;
        self
    }

    /// Set the edge function.
    pub fn with_function(mut self, function: Option<String>) -> Self {
        self.function = function;
        self
    }

    /// The `(source, target)` pair.
    pub fn endpoints(&self) -> (&str, &str) {
        (&self.source, &self.target)
    }

    /// Edge type as used by type filters: a missing type reads as `""`.
    pub fn type_label(&self) -> &str {
        self.edge_type.as_deref().unwrap_or("")
    }

    /// Whether `node_id` is either endpoint.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite to `node_id`, if `node_id` is an endpoint.
    pub fn far_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }
}
