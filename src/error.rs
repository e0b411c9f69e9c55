//! Error taxonomy for the ingest, persistence and extraction pipeline.

use std::path::PathBuf;

/// Error type shared by the walker, merger, ingest pipeline and reconciler.
///
/// Every variant carries a human-readable message; callers display it and
/// re-issue the whole operation. Nothing in the crate retries automatically.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Missing or invalid root structure, or markup that does not parse.
    /// No partial graph is ever returned alongside this error.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A document source could not be read.
    #[error("Failed to read document {path}: {source}")]
    DocumentIo {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Store read or write failure. Reconciliation stops at the failing
    /// operation; writes already applied are not rolled back.
    #[error("Store I/O error: {0}")]
    StoreIo(String),

    /// A graph could not be canonically encoded for hashing.
    #[error("Snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A spawned parse task panicked or was cancelled before finishing.
    #[error("Parse task failed: {0}")]
    Task(String),

    /// One document of a concurrently parsed batch failed, so the whole
    /// batch failed. Results of the other documents are discarded.
    #[error("Batch failed at document {index}: {source}")]
    Aggregation {
        /// Position of the failing document in the batch.
        index: usize,
        /// Why that document failed.
        #[source]
        source: Box<GraphError>,
    },
}

impl GraphError {
    /// Create a store error from any backend error type.
    pub fn from_store<E: std::error::Error>(e: E) -> Self {
        Self::StoreIo(e.to_string())
    }

    /// Create a malformed-document error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDocument(msg.into())
    }

    /// Wrap a per-document failure as a batch failure.
    pub fn aggregation(index: usize, source: GraphError) -> Self {
        Self::Aggregation {
            index,
            source: Box::new(source),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedDocument(_) => "MALFORMED_DOCUMENT",
            Self::DocumentIo { .. } => "DOCUMENT_IO",
            Self::StoreIo(_) => "STORE_IO",
            Self::Snapshot(_) => "SNAPSHOT",
            Self::Task(_) => "TASK_FAILED",
            Self::Aggregation { .. } => "AGGREGATION",
        }
    }
}
