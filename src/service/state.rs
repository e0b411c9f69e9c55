//! Service state management.
//!
//! Holds the graph store, runtime configuration and the last merged graph.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::store::GraphStore;
use crate::types::Graph;

/// Shared service state.
///
/// The cached graph is the one most recently reconciled into the store. It is
/// cleared when a reconciliation fails part way, so reads fall back to the
/// store until the next successful ingest.
///
/// The service is the store's only writer. Ingest and clear hold the write
/// lock from the first store access until the cache is updated, so
/// reconciliations never interleave.
pub struct ServiceState<S: GraphStore + 'static> {
    /// The graph store backend.
    pub store: Arc<S>,
    /// Runtime configuration.
    pub config: Arc<GraphConfig>,
    current: Arc<RwLock<Option<Graph>>>,
    writer: Arc<Mutex<()>>,
}

impl<S: GraphStore + 'static> ServiceState<S> {
    /// Create service state with an empty cache.
    pub fn new(store: S, config: GraphConfig) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            current: Arc::new(RwLock::new(None)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Create service state with configuration from the environment.
    pub fn from_env(store: S) -> Self {
        Self::new(store, GraphConfig::from_env())
    }

    /// Wait for exclusive write access to the store.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// The cached graph, if any.
    pub fn cached_graph(&self) -> Option<Graph> {
        self.current.read().clone()
    }

    /// Replace the cached graph.
    pub fn set_graph(&self, graph: Graph) {
        *self.current.write() = Some(graph);
    }

    /// Drop the cached graph.
    pub fn invalidate(&self) {
        *self.current.write() = None;
    }

    /// The current graph: cache first, otherwise a full store read.
    pub async fn current_graph(&self) -> Result<Graph, GraphError> {
        if let Some(graph) = self.cached_graph() {
            return Ok(graph);
        }

        let graph = self.store.read_all().await.map_err(GraphError::from_store)?;
        self.set_graph(graph.clone());
        Ok(graph)
    }
}

impl<S: GraphStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            current: Arc::clone(&self.current),
            writer: Arc::clone(&self.writer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGraphStore;
    use crate::types::Node;

    #[tokio::test]
    async fn test_current_graph_falls_back_to_store() {
        let seeded = Graph::from_parts(vec![Node::new("a", "T", "", "a")], Vec::new());
        let state = ServiceState::new(InMemoryGraphStore::with_graph(&seeded), GraphConfig::default());

        assert!(state.cached_graph().is_none());
        let graph = state.current_graph().await.unwrap();
        assert!(graph.contains_node("a"));
        assert!(state.cached_graph().is_some());
    }

    #[tokio::test]
    async fn test_clone_shares_cache() {
        let state = ServiceState::new(InMemoryGraphStore::new(), GraphConfig::default());
        let other = state.clone();

        state.set_graph(Graph::from_parts(vec![Node::new("x", "T", "", "x")], Vec::new()));
        assert!(other.cached_graph().is_some());

        other.invalidate();
        assert!(state.cached_graph().is_none());
    }

    #[tokio::test]
    async fn test_write_lock_is_shared_across_clones() {
        let state = ServiceState::new(InMemoryGraphStore::new(), GraphConfig::default());
        let other = state.clone();

        let guard = state.lock_writes().await;
        assert!(other.writer.try_lock().is_err());
        drop(guard);
        assert!(other.writer.try_lock().is_ok());
    }
}
