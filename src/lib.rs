//! # discourse-graph
//!
//! Discourse graphs from annotated text.
//!
//! The crate answers one question:
//!
//! > Given a set of annotated documents, what graph of typed discourse units
//! > and relations do they describe, and how is it kept in sync with storage?
//!
//! ## Core Contract
//!
//! 1. Walk each document's markup tree into a [`Graph`] of nodes and edges
//! 2. Merge per-document graphs in input order (last document wins on id)
//! 3. Reconcile a [`GraphStore`] so it holds exactly the merged graph
//! 4. Serve bounded-depth, type-filtered ego networks for rendering
//!
//! ## Architecture
//!
//! ```text
//! documents → walker → merge → reconcile → GraphStore (Postgres or Memory)
//!                        ↓
//!                     Graph → EgoQuery → rendered subgraph
//!                        ↓
//!                  GraphExport (lemma selection)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same document → identical graph, including synthesized `node_<n>` and
//!   `edge_<n>` ids
//! - Node order follows first insertion; replacing a node keeps its slot
//! - Ego extraction is a pure function of (graph, center, depth, filters)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod ego;
pub mod error;
pub mod export;
pub mod ingest;
pub mod markup;
pub mod merge;
pub mod reconcile;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod walker;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use config::{GraphConfig, LogFormat};
pub use ego::{extract_ego, EgoQuery, TypeFilter};
pub use error::GraphError;
pub use export::GraphExport;
pub use ingest::{ingest, parse_batch, parse_source, DocumentSource, IngestOutcome};
pub use markup::{element::Element, MarkupNode};
pub use merge::merge_graphs;
pub use reconcile::{EdgeMatch, ParseEdgeMatchError, ReconcileReport, Reconciler};
pub use snapshot::{canonical_hash_hex, GraphSnapshot};
pub use store::{GraphStore, InMemoryGraphStore};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresGraphStore};
pub use types::{Edge, Graph, Node};
pub use walker::{parse_document, walk};

/// Version of the graph data model, recorded in every snapshot.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0.0";
