//! Lemma-selection export.
//!
//! Keeps only nodes whose `nuclearLemmas` value is selected and only edges
//! whose both endpoints are kept, serialized as JSON for download.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{Edge, Graph, Node};

/// Exported subgraph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    /// Selected nodes in graph order.
    pub nodes: Vec<Node>,
    /// Edges between selected nodes, in graph order.
    pub edges: Vec<Edge>,
}

impl GraphExport {
    /// Select by lemma values.
    pub fn select(graph: &Graph, lemmas: &BTreeSet<String>) -> Self {
        let nodes: Vec<Node> = graph
            .nodes
            .values()
            .filter(|n| lemmas.contains(&n.nuclear_lemmas))
            .cloned()
            .collect();

        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = graph
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();

        Self { nodes, edges }
    }

    /// Pretty-printed JSON document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Graph {
        Graph::from_parts(
            vec![
                Node::new("r", "Event", "v", "run"),
                Node::new("c1", "Entity", "n", "dog"),
                Node::new("c2", "Entity", "n", "park"),
            ],
            vec![Edge::new("edge_0", "r", "c1"), Edge::new("edge_1", "r", "c2")],
        )
    }

    fn lemmas(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_export_keeps_edges_between_selected() {
        let export = GraphExport::select(&sample(), &lemmas(&["run", "dog"]));
        assert_eq!(export.nodes.len(), 2);
        assert_eq!(export.edges.len(), 1);
        assert_eq!(export.edges[0].id, "edge_0");
    }

    #[test]
    fn test_export_single_endpoint_drops_edges() {
        let export = GraphExport::select(&sample(), &lemmas(&["park"]));
        assert_eq!(export.nodes.len(), 1);
        assert!(export.edges.is_empty());
    }

    #[test]
    fn test_export_json_shape() {
        let export = GraphExport::select(&sample(), &lemmas(&["run", "park"]));
        let json: serde_json::Value = serde_json::from_str(&export.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["nuclearLemmas"], "run");
        assert_eq!(json["edges"][0]["target"], "c2");
    }
}
