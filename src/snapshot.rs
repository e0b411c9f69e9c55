//! Graph snapshot fingerprints.
//!
//! A `GraphSnapshot` summarizes a graph's identity so callers can tell
//! whether a re-parse changed anything.
//!
//! ## Determinism Guarantees
//!
//! - Node ids are sorted before hashing, so node insertion order is irrelevant
//! - Edges hash as sorted `(source, target, type, function)` tuples; edge ids
//!   are ignored since they depend on discovery order
//! - Hashes are xxh64 over canonical JSON

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::types::Graph;
use crate::GRAPH_SCHEMA_VERSION;

/// Hash a serializable value as canonical JSON and return hex.
///
/// Use BTreeMap or sorted Vecs for maps in hashed data.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(format!("{:016x}", xxh64(&bytes, 0)))
}

/// Fingerprint of a graph's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// xxh64 over all components below.
    pub snapshot_id: String,
    /// Number of nodes.
    pub node_count: u64,
    /// Number of edges.
    pub edge_count: u64,
    /// Schema version used for types.
    pub schema_version: String,
    /// Hash of sorted node contents.
    pub node_hash: String,
    /// Hash of sorted edge tuples.
    pub edge_hash: String,
    /// Unix timestamp when this snapshot was computed.
    pub computed_at: i64,
}

impl GraphSnapshot {
    /// Compute the snapshot of a graph.
    pub fn compute(graph: &Graph) -> Result<Self, serde_json::Error> {
        let mut nodes: Vec<_> = graph.nodes.values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let node_hash = canonical_hash_hex(&nodes)?;

        let mut edges: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (&e.source, &e.target, &e.edge_type, &e.function))
            .collect();
        edges.sort();
        let edge_hash = canonical_hash_hex(&edges)?;

        let node_count = graph.num_nodes() as u64;
        let edge_count = graph.num_edges() as u64;

        let snapshot_id = canonical_hash_hex(&SnapshotIdInput {
            node_count,
            edge_count,
            schema_version: GRAPH_SCHEMA_VERSION,
            node_hash: &node_hash,
            edge_hash: &edge_hash,
        })?;

        Ok(Self {
            snapshot_id,
            node_count,
            edge_count,
            schema_version: GRAPH_SCHEMA_VERSION.to_string(),
            node_hash,
            edge_hash,
            computed_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Whether two snapshots describe the same graph content.
    pub fn same_content(&self, other: &GraphSnapshot) -> bool {
        self.snapshot_id == other.snapshot_id
    }
}

#[derive(Serialize)]
struct SnapshotIdInput<'a> {
    node_count: u64,
    edge_count: u64,
    schema_version: &'a str,
    node_hash: &'a str,
    edge_hash: &'a str,
}
