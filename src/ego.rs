//! Ego-network extraction.
//!
//! Produces the bounded-depth neighborhood around a center node, computed
//! over a type-filtered view of the graph. Pure and synchronous; never
//! touches the store.
//!
//! ## Algorithm
//!
//! 1. Apply the node-type and edge-type allow-lists (empty = no filter).
//!    Edges whose endpoint was removed by the node filter are dropped too,
//!    so the filtered view never has dangling edges
//! 2. Breadth-first from the center, following edges in both directions,
//!    expanding only nodes closer than `depth` hops
//! 3. Result nodes: visited nodes in graph order. Result edges: the edges
//!    scanned from expanded nodes, in input order
//!
//! Level order makes the visited set exactly "nodes within `depth` hops",
//! independent of edge scan order. Nodes at the last level are reached but
//! not expanded, so an edge between two of them is not part of the result.
//! `depth >= eccentricity(center)` expands the whole connected component.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{Edge, Graph};

/// Node-type and edge-type allow-lists. Empty sets disable the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    /// Allowed node types.
    #[serde(default)]
    pub node_types: BTreeSet<String>,
    /// Allowed edge types. An untyped edge matches `""`.
    #[serde(default)]
    pub edge_types: BTreeSet<String>,
}

impl TypeFilter {
    /// Filter that keeps everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Restrict to the given node types.
    pub fn with_node_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.node_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given edge types.
    pub fn with_edge_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edge_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// True when neither allow-list is set.
    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty() && self.edge_types.is_empty()
    }

    /// Apply both allow-lists to a graph.
    pub fn apply(&self, graph: &Graph) -> Graph {
        if self.is_empty() {
            return graph.clone();
        }

        let mut kept = Graph::new();
        let mut removed: HashSet<&str> = HashSet::new();
        for (id, node) in &graph.nodes {
            if self.node_types.is_empty() || self.node_types.contains(&node.node_type) {
                kept.nodes.insert(id.clone(), node.clone());
            } else {
                removed.insert(id.as_str());
            }
        }

        kept.edges = graph
            .edges
            .iter()
            .filter(|e| self.edge_types.is_empty() || self.edge_types.contains(e.type_label()))
            .filter(|e| !removed.contains(e.source.as_str()) && !removed.contains(e.target.as_str()))
            .cloned()
            .collect();

        kept
    }
}

/// A view request from the rendering side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgoQuery {
    /// Center node; `None` returns the whole filtered graph.
    #[serde(default)]
    pub center: Option<String>,
    /// Maximum hop count from the center.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Type allow-lists applied before traversal.
    #[serde(flatten)]
    pub filter: TypeFilter,
}

fn default_depth() -> usize {
    1
}

impl EgoQuery {
    /// Ego-network query around `center`.
    pub fn around(center: impl Into<String>, depth: usize) -> Self {
        Self {
            center: Some(center.into()),
            depth,
            filter: TypeFilter::none(),
        }
    }

    /// Full-graph query (filters only).
    pub fn full() -> Self {
        Self {
            center: None,
            depth: default_depth(),
            filter: TypeFilter::none(),
        }
    }

    /// Attach type filters.
    pub fn with_filter(mut self, filter: TypeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Run the query against a graph.
    pub fn run(&self, graph: &Graph) -> Graph {
        let filtered = self.filter.apply(graph);
        match &self.center {
            Some(center) => extract_ego(&filtered, center, self.depth),
            None => filtered,
        }
    }
}

/// Ego-network of `center` within `depth` hops.
///
/// An unknown center yields an empty graph.
pub fn extract_ego(graph: &Graph, center: &str, depth: usize) -> Graph {
    let Some((center_key, _)) = graph.nodes.get_key_value(center) else {
        tracing::warn!(center = %center, "Ego center not in graph");
        return Graph::new();
    };

    let incidence = incidence_index(&graph.edges);

    let mut visited: HashSet<&str> = HashSet::from([center_key.as_str()]);
    let mut scanned: BTreeSet<usize> = BTreeSet::new();
    let mut frontier: VecDeque<(&str, usize)> = VecDeque::from([(center_key.as_str(), 0)]);

    while let Some((node_id, hops)) = frontier.pop_front() {
        if hops >= depth {
            continue;
        }
        let Some(touching) = incidence.get(node_id) else {
            continue;
        };
        for &idx in touching {
            let Some(far) = graph.edges[idx].far_end(node_id) else {
                continue;
            };
            scanned.insert(idx);
            if visited.insert(far) {
                frontier.push_back((far, hops + 1));
            }
        }
    }

    let nodes = graph
        .nodes
        .values()
        .filter(|n| visited.contains(n.id.as_str()))
        .cloned();
    let edges = scanned.into_iter().map(|idx| graph.edges[idx].clone()).collect();

    Graph::from_parts(nodes, edges)
}

/// Map from node id to the indices of edges touching it.
fn incidence_index(edges: &[Edge]) -> HashMap<&str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        index.entry(edge.source.as_str()).or_default().push(i);
        if edge.target != edge.source {
            index.entry(edge.target.as_str()).or_default().push(i);
        }
    }
    index
}
