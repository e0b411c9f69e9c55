//! In-memory graph store for tests and single-process sessions.

use std::convert::Infallible;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::types::{Edge, Graph, Node};
use super::GraphStore;

/// In-memory graph store.
///
/// Entries are kept in write order: an upsert moves its entity to the end,
/// so a full reconcile reads back in the desired graph's discovery order.
/// Operations never fail.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    /// Nodes by ID.
    nodes: RwLock<IndexMap<String, Node>>,
    /// Edges by ID.
    edges: RwLock<IndexMap<String, Edge>>,
}

impl InMemoryGraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a graph.
    pub fn with_graph(graph: &Graph) -> Self {
        let store = Self::new();
        {
            let mut nodes = store.nodes.write();
            for node in graph.nodes.values() {
                nodes.insert(node.id.clone(), node.clone());
            }
            let mut edges = store.edges.write();
            for edge in &graph.edges {
                edges.insert(edge.id.clone(), edge.clone());
            }
        }
        store
    }

    /// Get number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.read().len()
    }

    /// Get number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.read().len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    type Error = Infallible;

    async fn upsert_node(&self, node: &Node) -> Result<(), Self::Error> {
        let mut nodes = self.nodes.write();
        nodes.shift_remove(&node.id);
        nodes.insert(node.id.clone(), node.clone());
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), Self::Error> {
        self.nodes.write().shift_remove(id);
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<(), Self::Error> {
        let mut edges = self.edges.write();
        edges.shift_remove(&edge.id);
        edges.insert(edge.id.clone(), edge.clone());
        Ok(())
    }

    async fn delete_edge(&self, id: &str) -> Result<(), Self::Error> {
        self.edges.write().shift_remove(id);
        Ok(())
    }

    async fn read_all(&self) -> Result<Graph, Self::Error> {
        let nodes: Vec<Node> = self.nodes.read().values().cloned().collect();
        let edges: Vec<Edge> = self.edges.read().values().cloned().collect();
        Ok(Graph::from_parts(nodes, edges))
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        self.nodes.write().clear();
        self.edges.write().clear();
        Ok(())
    }
}
