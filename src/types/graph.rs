//! The flat graph produced from one or more annotated documents.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::{Edge, Node};

/// Node map plus ordered edge list.
///
/// Nodes keep their discovery order; re-inserting an existing id replaces
/// the node but keeps its original position. Edges are in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes keyed by id.
    pub nodes: IndexMap<String, Node>,
    /// Edges in discovery order.
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes and edges. Later nodes win on id collision.
    pub fn from_parts(nodes: impl IntoIterator<Item = Node>, edges: Vec<Edge>) -> Self {
        let mut map = IndexMap::new();
        for node in nodes {
            map.insert(node.id.clone(), node);
        }
        Self { nodes: map, edges }
    }

    /// Insert or replace a node.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether the node map contains `id`.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// True if the graph has no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// First discovered node; the default ego center.
    pub fn first_node_id(&self) -> Option<&str> {
        self.nodes.keys().next().map(String::as_str)
    }

    /// Unique node types in discovery order.
    pub fn node_types(&self) -> Vec<&str> {
        let types: IndexSet<&str> = self.nodes.values().map(|n| n.node_type.as_str()).collect();
        types.into_iter().collect()
    }

    /// Unique edge types in discovery order; untyped edges report `""`.
    pub fn edge_types(&self) -> Vec<&str> {
        let types: IndexSet<&str> = self.edges.iter().map(Edge::type_label).collect();
        types.into_iter().collect()
    }

    /// Edges with at least one endpoint missing from the node map.
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(|e| !self.contains_node(&e.source) || !self.contains_node(&e.target))
    }
}
