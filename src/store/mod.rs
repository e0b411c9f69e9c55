//! Graph storage backends.
//!
//! The store holds two keyed collections, nodes by id and edges by id.
//! Only the reconciler writes to it.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use crate::types::{Edge, Graph, Node};

/// Trait for graph storage backends.
///
/// `read_all` returns nodes and edges in write order: an upsert of an
/// existing id moves it after every earlier write. Reconciling a graph
/// therefore reads it back in discovery order.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync;

    /// Insert or fully replace a node, keyed by its id.
    async fn upsert_node(&self, node: &Node) -> Result<(), Self::Error>;

    /// Delete a node by id. Deleting a missing id is not an error.
    async fn delete_node(&self, id: &str) -> Result<(), Self::Error>;

    /// Insert or fully replace an edge, keyed by its id.
    async fn upsert_edge(&self, edge: &Edge) -> Result<(), Self::Error>;

    /// Delete an edge by id. Deleting a missing id is not an error.
    async fn delete_edge(&self, id: &str) -> Result<(), Self::Error>;

    /// Full snapshot of the persisted graph.
    async fn read_all(&self) -> Result<Graph, Self::Error>;

    /// Remove every node and edge.
    async fn clear(&self) -> Result<(), Self::Error>;

    /// Whether the backend is reachable.
    async fn is_healthy(&self) -> bool {
        true
    }
}

pub use memory::InMemoryGraphStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresGraphStore};
