//! Store reconciliation.
//!
//! Aligns the persisted graph (current state) with a freshly parsed graph
//! (desired state).
//!
//! ## Protocol
//!
//! 1. Read the full persisted snapshot
//! 2. Delete persisted nodes absent from the desired node map, then
//!    persisted edges whose match key is absent from the desired edge list
//! 3. Upsert every desired node, then every desired edge (keyed by edge id)
//!
//! The pass is sequential and not atomic across entity classes. The first
//! store failure aborts the remaining steps without rolling back; the next
//! full reconcile converges again.
//!
//! ## Edge matching
//!
//! By default edges match on `(source, target)` only, so two structurally
//! different edges between the same endpoints are indistinguishable for
//! deletion, and an edge that keeps its endpoints but changes id is
//! inserted alongside the old one. [`EdgeMatch::EndpointsAndType`] adds the
//! edge type to the key.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::snapshot::GraphSnapshot;
use crate::store::GraphStore;
use crate::types::{Edge, Graph};

/// Key used to decide whether a persisted edge survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMatch {
    /// `(source, target)`.
    #[default]
    Endpoints,
    /// `(source, target, type)`.
    EndpointsAndType,
}

/// An edge match name that is neither `endpoints` nor `endpoints_and_type`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown edge match: {0}")]
pub struct ParseEdgeMatchError(String);

impl FromStr for EdgeMatch {
    type Err = ParseEdgeMatchError;

    /// Parse from a config string, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "endpoints" => Ok(Self::Endpoints),
            "endpoints_and_type" => Ok(Self::EndpointsAndType),
            _ => Err(ParseEdgeMatchError(s.to_string())),
        }
    }
}

impl EdgeMatch {
    fn key<'a>(&self, edge: &'a Edge) -> (&'a str, &'a str, Option<&'a str>) {
        match self {
            Self::Endpoints => (&edge.source, &edge.target, None),
            Self::EndpointsAndType => (&edge.source, &edge.target, edge.edge_type.as_deref()),
        }
    }
}

impl std::fmt::Display for EdgeMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Endpoints => write!(f, "endpoints"),
            Self::EndpointsAndType => write!(f, "endpoints_and_type"),
        }
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Persisted nodes deleted.
    pub nodes_deleted: usize,
    /// Persisted edges deleted.
    pub edges_deleted: usize,
    /// Desired nodes written.
    pub nodes_upserted: usize,
    /// Desired edges written.
    pub edges_upserted: usize,
    /// Fingerprint of the desired graph.
    pub desired: GraphSnapshot,
    /// Whether the persisted graph already had the desired content.
    pub unchanged: bool,
}

/// Reconciles a [`GraphStore`] against desired graphs.
pub struct Reconciler<S: GraphStore> {
    store: Arc<S>,
    edge_match: EdgeMatch,
}

impl<S: GraphStore> Reconciler<S> {
    /// Create a reconciler with endpoint-only edge matching.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            edge_match: EdgeMatch::default(),
        }
    }

    /// Use a different edge match key.
    pub fn with_edge_match(mut self, edge_match: EdgeMatch) -> Self {
        self.edge_match = edge_match;
        self
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make the store hold `desired`.
    pub async fn reconcile(&self, desired: &Graph) -> Result<ReconcileReport, GraphError> {
        let current = self.store.read_all().await.map_err(GraphError::from_store)?;

        let desired_snapshot = GraphSnapshot::compute(desired)?;
        let current_snapshot = GraphSnapshot::compute(&current)?;

        let stale_nodes: Vec<&str> = current
            .nodes
            .keys()
            .filter(|id| !desired.contains_node(id))
            .map(String::as_str)
            .collect();

        let desired_keys: HashSet<_> = desired.edges.iter().map(|e| self.edge_match.key(e)).collect();
        let stale_edges: Vec<&str> = current
            .edges
            .iter()
            .filter(|e| !desired_keys.contains(&self.edge_match.key(e)))
            .map(|e| e.id.as_str())
            .collect();

        for id in &stale_nodes {
            self.store.delete_node(id).await.map_err(GraphError::from_store)?;
        }
        for id in &stale_edges {
            self.store.delete_edge(id).await.map_err(GraphError::from_store)?;
        }

        for node in desired.nodes.values() {
            self.store.upsert_node(node).await.map_err(GraphError::from_store)?;
        }
        for edge in &desired.edges {
            self.store.upsert_edge(edge).await.map_err(GraphError::from_store)?;
        }

        let report = ReconcileReport {
            nodes_deleted: stale_nodes.len(),
            edges_deleted: stale_edges.len(),
            nodes_upserted: desired.num_nodes(),
            edges_upserted: desired.num_edges(),
            unchanged: desired_snapshot.same_content(&current_snapshot),
            desired: desired_snapshot,
        };

        tracing::info!(
            nodes_deleted = report.nodes_deleted,
            edges_deleted = report.edges_deleted,
            nodes_upserted = report.nodes_upserted,
            edges_upserted = report.edges_upserted,
            edge_match = %self.edge_match,
            snapshot_id = %report.desired.snapshot_id,
            "Store reconciled"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGraphStore;
    use crate::types::Node;

    fn graph(nodes: &[&str], edges: &[(&str, &str, &str, Option<&str>)]) -> Graph {
        Graph::from_parts(
            nodes.iter().map(|id| Node::new(*id, "T", "", *id)),
            edges
                .iter()
                .map(|(id, s, t, ty)| Edge::new(*id, *s, *t).with_type(ty.map(str::to_owned)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_reconcile_empty_store() {
        let store = Arc::new(InMemoryGraphStore::new());
        let desired = graph(&["a", "b"], &[("edge_0", "a", "b", None)]);

        let report = Reconciler::new(Arc::clone(&store)).reconcile(&desired).await.unwrap();

        assert_eq!(report.nodes_deleted, 0);
        assert_eq!(report.nodes_upserted, 2);
        assert!(!report.unchanged);
        let persisted = store.read_all().await.unwrap();
        assert_eq!(persisted.nodes, desired.nodes);
        assert_eq!(persisted.edges, desired.edges);
    }

    #[tokio::test]
    async fn test_reconcile_deletes_stale() {
        let old = graph(
            &["a", "b", "gone"],
            &[("edge_0", "a", "b", None), ("edge_1", "a", "gone", None)],
        );
        let store = Arc::new(InMemoryGraphStore::with_graph(&old));
        let desired = graph(&["a", "b"], &[("edge_0", "a", "b", None)]);

        let report = Reconciler::new(Arc::clone(&store)).reconcile(&desired).await.unwrap();

        assert_eq!(report.nodes_deleted, 1);
        assert_eq!(report.edges_deleted, 1);
        let persisted = store.read_all().await.unwrap();
        assert!(!persisted.contains_node("gone"));
        assert_eq!(persisted.num_edges(), 1);
    }

    #[tokio::test]
    async fn test_endpoint_match_keeps_old_edge_under_new_id() {
        // Same endpoints, new id: the old edge survives deletion and the new
        // one is inserted next to it.
        let old = graph(&["a", "b"], &[("edge_7", "a", "b", Some("Agent"))]);
        let store = Arc::new(InMemoryGraphStore::with_graph(&old));
        let desired = graph(&["a", "b"], &[("edge_0", "a", "b", Some("Theme"))]);

        Reconciler::new(Arc::clone(&store)).reconcile(&desired).await.unwrap();

        let persisted = store.read_all().await.unwrap();
        assert_eq!(persisted.num_edges(), 2);
    }

    #[tokio::test]
    async fn test_endpoints_and_type_match_deletes_retyped_edge() {
        let old = graph(&["a", "b"], &[("edge_7", "a", "b", Some("Agent"))]);
        let store = Arc::new(InMemoryGraphStore::with_graph(&old));
        let desired = graph(&["a", "b"], &[("edge_0", "a", "b", Some("Theme"))]);

        let report = Reconciler::new(Arc::clone(&store))
            .with_edge_match(EdgeMatch::EndpointsAndType)
            .reconcile(&desired)
            .await
            .unwrap();

        assert_eq!(report.edges_deleted, 1);
        let persisted = store.read_all().await.unwrap();
        assert_eq!(persisted.edges, desired.edges);
    }

    #[tokio::test]
    async fn test_second_pass_is_unchanged() {
        let store = Arc::new(InMemoryGraphStore::new());
        let desired = graph(&["a", "b"], &[("edge_0", "a", "b", None)]);
        let reconciler = Reconciler::new(Arc::clone(&store));

        reconciler.reconcile(&desired).await.unwrap();
        let second = reconciler.reconcile(&desired).await.unwrap();

        assert!(second.unchanged);
        assert_eq!(second.nodes_deleted, 0);
        assert_eq!(second.edges_deleted, 0);
    }

    #[test]
    fn test_edge_match_from_str() {
        assert_eq!("endpoints".parse(), Ok(EdgeMatch::Endpoints));
        assert_eq!("ENDPOINTS_AND_TYPE".parse(), Ok(EdgeMatch::EndpointsAndType));
        let err = "id".parse::<EdgeMatch>().unwrap_err();
        assert_eq!(err.to_string(), "unknown edge match: id");
        for m in [EdgeMatch::Endpoints, EdgeMatch::EndpointsAndType] {
            assert_eq!(m.to_string().parse(), Ok(m));
        }
    }
}
