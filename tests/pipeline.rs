//! Golden tests for the document pipeline.
//!
//! These tests pin walk output, merge ordering and reconciliation behaviour
//! end to end through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use discourse_graph::{
    extract_ego, ingest, merge_graphs, parse_batch, parse_document, DocumentSource, Edge,
    EdgeMatch, Graph, GraphError, GraphExport, GraphSnapshot, GraphStore, InMemoryGraphStore,
    Node, Reconciler,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

const AGENT_DOC: &str = r#"<OpenText><text>
    <node id="r" type="Event" class="verb" nuclear_lemmas="run">
        <node id="c1" type="Entity" class="noun" nuclear_lemmas="dog">
            <edge type="Agent"/>
        </node>
    </node>
</text></OpenText>"#;

fn single_node_doc(id: &str, node_type: &str) -> String {
    format!(
        r#"<OpenText><text><node id="{}" type="{}" class="k" nuclear_lemmas="{}"/></text></OpenText>"#,
        id, node_type, id
    )
}

/// Store wrapper that fails every write after the first `budget` writes.
struct FlakyStore {
    inner: InMemoryGraphStore,
    budget: usize,
    writes: AtomicUsize,
}

#[derive(Debug, thiserror::Error)]
#[error("write budget exhausted after {0} writes")]
struct Exhausted(usize);

impl FlakyStore {
    fn new(inner: InMemoryGraphStore, budget: usize) -> Self {
        Self {
            inner,
            budget,
            writes: AtomicUsize::new(0),
        }
    }

    fn spend(&self) -> Result<(), Exhausted> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        if n >= self.budget {
            Err(Exhausted(self.budget))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GraphStore for FlakyStore {
    type Error = Exhausted;

    async fn upsert_node(&self, node: &Node) -> Result<(), Self::Error> {
        self.spend()?;
        let _ = self.inner.upsert_node(node).await;
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), Self::Error> {
        self.spend()?;
        let _ = self.inner.delete_node(id).await;
        Ok(())
    }

    async fn upsert_edge(&self, edge: &Edge) -> Result<(), Self::Error> {
        self.spend()?;
        let _ = self.inner.upsert_edge(edge).await;
        Ok(())
    }

    async fn delete_edge(&self, id: &str) -> Result<(), Self::Error> {
        self.spend()?;
        let _ = self.inner.delete_edge(id).await;
        Ok(())
    }

    async fn read_all(&self) -> Result<Graph, Self::Error> {
        Ok(self.inner.read_all().await.unwrap_or_default())
    }

    async fn clear(&self) -> Result<(), Self::Error> {
        let _ = self.inner.clear().await;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Walk + Merge
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn golden_agent_document() {
    let g = parse_document(AGENT_DOC).unwrap();

    let ids: Vec<_> = g.nodes.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["r", "c1"]);
    assert_eq!(g.node("r").unwrap().node_type, "Event");
    assert_eq!(g.node("c1").unwrap().nuclear_lemmas, "dog");

    assert_eq!(g.edges.len(), 1);
    let edge = &g.edges[0];
    assert_eq!(edge.id, "edge_0");
    assert_eq!(edge.endpoints(), ("r", "c1"));
    assert_eq!(edge.edge_type.as_deref(), Some("Agent"));
}

#[test]
fn golden_graph_json_shape() {
    let g = parse_document(AGENT_DOC).unwrap();
    let json = serde_json::to_value(&g).unwrap();

    assert_eq!(json["nodes"]["c1"]["type"], "Entity");
    assert_eq!(json["nodes"]["c1"]["nuclearLemmas"], "dog");
    assert_eq!(json["edges"][0]["type"], "Agent");
    assert!(json["edges"][0]["function"].is_null());
}

#[test]
fn merge_last_document_wins() {
    let first = parse_document(&single_node_doc("x", "Event")).unwrap();
    let second = parse_document(&single_node_doc("x", "Entity")).unwrap();

    let merged = merge_graphs(vec![first, second.clone()]);
    assert_eq!(merged.num_nodes(), 1);
    assert_eq!(merged.node("x"), second.node("x"));
}

#[test]
fn merge_same_document_twice_doubles_edges() {
    let g = parse_document(AGENT_DOC).unwrap();
    let merged = merge_graphs(vec![g.clone(), g.clone()]);

    assert_eq!(merged.nodes, g.nodes);
    assert_eq!(merged.num_edges(), 2 * g.num_edges());
    assert_eq!(merged.edges[0].endpoints(), merged.edges[1].endpoints());
    assert_ne!(merged.edges[0].id, merged.edges[1].id);
}

#[tokio::test]
async fn batch_parse_matches_sequential_merge() {
    let docs = vec![AGENT_DOC.to_string(), single_node_doc("x", "Event")];

    let sequential = merge_graphs(docs.iter().map(|d| parse_document(d).unwrap()));
    let concurrent = parse_batch(docs.into_iter().map(DocumentSource::Text).collect())
        .await
        .unwrap();

    assert_eq!(concurrent, sequential);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconcile
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_store_matches_desired_nodes() {
    let store = Arc::new(InMemoryGraphStore::new());
    let outcome = ingest(
        vec![DocumentSource::Text(AGENT_DOC.to_string())],
        Arc::clone(&store),
        EdgeMatch::Endpoints,
    )
    .await
    .unwrap();

    let persisted = store.read_all().await.unwrap();
    assert_eq!(persisted.nodes, outcome.graph.nodes);
    for edge in &outcome.graph.edges {
        assert!(persisted.edges.iter().any(|p| p.endpoints() == edge.endpoints()));
    }
    assert!(GraphSnapshot::compute(&persisted)
        .unwrap()
        .same_content(&outcome.report.desired));
}

#[tokio::test]
async fn reparse_with_fewer_nodes_removes_them() {
    let store = Arc::new(InMemoryGraphStore::new());
    let reconciler = Reconciler::new(Arc::clone(&store));

    reconciler.reconcile(&parse_document(AGENT_DOC).unwrap()).await.unwrap();
    let report = reconciler
        .reconcile(&parse_document(&single_node_doc("r", "Event")).unwrap())
        .await
        .unwrap();

    assert_eq!(report.nodes_deleted, 1);
    assert_eq!(report.edges_deleted, 1);
    let persisted = store.read_all().await.unwrap();
    assert_eq!(persisted.num_nodes(), 1);
    assert_eq!(persisted.num_edges(), 0);
}

fn wide_doc(children: &[&str]) -> String {
    let inner: String = children
        .iter()
        .map(|id| format!(r#"<node id="{}" type="Entity" class="n" nuclear_lemmas="{}"/>"#, id, id))
        .collect();
    format!(
        r#"<OpenText><text><node id="root" type="Event" class="v" nuclear_lemmas="root">{}</node></text></OpenText>"#,
        inner
    )
}

fn order(g: &Graph) -> (Vec<&str>, Vec<&str>) {
    (
        g.nodes.keys().map(String::as_str).collect(),
        g.edges.iter().map(|e| e.id.as_str()).collect(),
    )
}

#[tokio::test]
async fn read_back_keeps_discovery_order() {
    let children: Vec<String> = (0..12).map(|i| format!("c{}", 11 - i)).collect();
    let refs: Vec<&str> = children.iter().map(String::as_str).collect();
    let walked = parse_document(&wide_doc(&refs)).unwrap();

    let store = Arc::new(InMemoryGraphStore::new());
    Reconciler::new(Arc::clone(&store)).reconcile(&walked).await.unwrap();

    let persisted = store.read_all().await.unwrap();
    assert_eq!(order(&persisted), order(&walked));
    assert_eq!(persisted.edges, walked.edges);
    assert_eq!(persisted.first_node_id(), Some("root"));
}

#[tokio::test]
async fn reconcile_reorders_existing_entities() {
    let store = Arc::new(InMemoryGraphStore::new());
    let reconciler = Reconciler::new(Arc::clone(&store));

    reconciler.reconcile(&parse_document(&wide_doc(&["a", "b"])).unwrap()).await.unwrap();
    let reordered = parse_document(&wide_doc(&["b", "a"])).unwrap();
    reconciler.reconcile(&reordered).await.unwrap();

    let persisted = store.read_all().await.unwrap();
    assert_eq!(order(&persisted), order(&reordered));
}

#[tokio::test]
async fn store_failure_aborts_without_rollback() {
    let stale = Graph::from_parts(vec![Node::new("old", "T", "", "old")], Vec::new());
    // One write allowed: the stale delete succeeds, the first upsert fails.
    let store = Arc::new(FlakyStore::new(InMemoryGraphStore::with_graph(&stale), 1));

    let err = Reconciler::new(Arc::clone(&store))
        .reconcile(&parse_document(AGENT_DOC).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::StoreIo(_)));
    assert_eq!(err.code(), "STORE_IO");
    assert!(store.inner.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_batch_leaves_store_untouched() {
    let seeded = parse_document(AGENT_DOC).unwrap();
    let store = Arc::new(InMemoryGraphStore::with_graph(&seeded));

    let err = ingest(
        vec![
            DocumentSource::Text(single_node_doc("x", "Event")),
            DocumentSource::Text("<OpenText><text><node/><node/></text></OpenText>".into()),
        ],
        Arc::clone(&store),
        EdgeMatch::Endpoints,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GraphError::Aggregation { index: 1, .. }));
    assert_eq!(store.read_all().await.unwrap().nodes, seeded.nodes);
}

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ego_and_export_on_parsed_graph() {
    let g = parse_document(AGENT_DOC).unwrap();

    let ego = extract_ego(&g, "c1", 1);
    assert_eq!(ego, g);

    let selected = ["dog".to_string()].into_iter().collect();
    let export = GraphExport::select(&g, &selected);
    assert_eq!(export.nodes.len(), 1);
    assert!(export.edges.is_empty());
}
