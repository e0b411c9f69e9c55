//! Document ingest pipeline.
//!
//! ```text
//! sources ──spawn──▶ parse task per document ──join all──▶ merge ──▶ reconcile
//! ```
//!
//! Each document is read and walked in its own tokio task. The merge is a
//! join point: it runs only after every task has finished, and a single
//! failure fails the whole batch with [`GraphError::Aggregation`], aborting
//! tasks still in flight. There is no partial merge.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};

use crate::error::GraphError;
use crate::merge;
use crate::reconcile::{EdgeMatch, ReconcileReport, Reconciler};
use crate::store::GraphStore;
use crate::types::Graph;
use crate::walker;

/// Where a document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Markup already in memory.
    Text(String),
    /// Markup file on disk.
    Path(PathBuf),
}

impl DocumentSource {
    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("<inline, {} bytes>", text.len()),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl From<String> for DocumentSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Read and walk one document.
pub async fn parse_source(source: DocumentSource) -> Result<Graph, GraphError> {
    match source {
        DocumentSource::Text(text) => walker::parse_document(&text),
        DocumentSource::Path(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| GraphError::DocumentIo { path: path.clone(), source })?;
            walker::parse_document(&text)
        }
    }
}

fn join_failure(e: JoinError) -> GraphError {
    if e.is_panic() {
        GraphError::Task(format!("parse task panicked: {}", e))
    } else {
        GraphError::Task(format!("parse task was cancelled: {}", e))
    }
}

/// Parse documents concurrently and merge them in input order.
pub async fn parse_batch(sources: Vec<DocumentSource>) -> Result<Graph, GraphError> {
    let count = sources.len();
    let handles: Vec<JoinHandle<Result<Graph, GraphError>>> = sources
        .into_iter()
        .map(|source| tokio::spawn(parse_source(source)))
        .collect();

    let mut graphs = Vec::with_capacity(count);
    let mut pending = handles.into_iter().enumerate();

    while let Some((index, handle)) = pending.next() {
        let outcome = match handle.await {
            Ok(result) => result.map_err(|e| GraphError::aggregation(index, e)),
            // A task failure is not tied to the document at this index.
            Err(join_error) => Err(join_failure(join_error)),
        };

        match outcome {
            Ok(graph) => graphs.push(graph),
            Err(e) => {
                for (_, rest) in pending {
                    rest.abort();
                }
                tracing::warn!(index = index, documents = count, error = %e, "Document batch failed");
                return Err(e);
            }
        }
    }

    let merged = merge::merge_graphs(graphs);
    tracing::info!(
        documents = count,
        nodes = merged.num_nodes(),
        edges = merged.num_edges(),
        "Document batch merged"
    );
    Ok(merged)
}

/// Result of a parse-and-persist run.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// The merged graph now held by the store.
    pub graph: Graph,
    /// What reconciliation did.
    pub report: ReconcileReport,
}

/// Parse a document set and reconcile the store against it.
pub async fn ingest<S: GraphStore>(
    sources: Vec<DocumentSource>,
    store: Arc<S>,
    edge_match: EdgeMatch,
) -> Result<IngestOutcome, GraphError> {
    let graph = parse_batch(sources).await?;
    let report = Reconciler::new(store)
        .with_edge_match(edge_match)
        .reconcile(&graph)
        .await?;
    Ok(IngestOutcome { graph, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryGraphStore;

    fn doc(root_id: &str, child_id: &str) -> DocumentSource {
        DocumentSource::Text(format!(
            r#"<OpenText><text><node id="{}" type="Event" class="v" nuclear_lemmas="{}"><node id="{}" type="Entity" class="n" nuclear_lemmas="{}"/></node></text></OpenText>"#,
            root_id, root_id, child_id, child_id
        ))
    }

    #[tokio::test]
    async fn test_parse_batch_merges_in_order() {
        let g = parse_batch(vec![doc("a", "b"), doc("c", "d")]).await.unwrap();
        let ids: Vec<_> = g.nodes.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(g.edges[1].endpoints(), ("c", "d"));
    }

    #[tokio::test]
    async fn test_parse_batch_fails_whole_batch() {
        let bad = DocumentSource::Text("<OpenText><text/></OpenText>".into());
        let err = parse_batch(vec![doc("a", "b"), bad, doc("c", "d")]).await.unwrap_err();
        match err {
            GraphError::Aggregation { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, GraphError::MalformedDocument(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_join_failure_is_task_error() {
        let panicked = tokio::spawn(async { panic!("walker blew up") }).await.unwrap_err();
        let err = join_failure(panicked);
        assert!(matches!(err, GraphError::Task(_)));
        assert_eq!(err.code(), "TASK_FAILED");
        assert!(err.to_string().contains("panicked"));

        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err = join_failure(handle.await.unwrap_err());
        assert!(err.to_string().contains("cancelled"));
    }

    #[tokio::test]
    async fn test_parse_batch_empty() {
        assert!(parse_batch(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_document_io() {
        let source = DocumentSource::Path(PathBuf::from("/definitely/not/here.xml"));
        let err = parse_source(source).await.unwrap_err();
        assert!(matches!(err, GraphError::DocumentIo { .. }));
    }

    #[tokio::test]
    async fn test_parse_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.xml");
        let DocumentSource::Text(xml) = doc("r", "c1") else { unreachable!() };
        std::fs::write(&path, xml).unwrap();

        let g = parse_source(DocumentSource::Path(path)).await.unwrap();
        assert_eq!(g.num_nodes(), 2);
    }

    #[tokio::test]
    async fn test_ingest_persists_merged_graph() {
        let store = Arc::new(InMemoryGraphStore::new());
        let outcome = ingest(vec![doc("a", "b")], Arc::clone(&store), EdgeMatch::Endpoints)
            .await
            .unwrap();

        assert_eq!(outcome.report.nodes_upserted, 2);
        let persisted = store.read_all().await.unwrap();
        assert_eq!(persisted.nodes, outcome.graph.nodes);
    }
}
