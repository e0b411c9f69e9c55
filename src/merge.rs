//! Graph assembly merger.
//!
//! Combines per-document graphs into one aggregate graph:
//! - Node map: union, later document wins on id collision (silently)
//! - Edge list: concatenation in input order, never deduplicated
//!
//! Every document numbers its edges from `edge_0`, so concatenated edges are
//! renumbered `edge_<n>` by their position in the merged list. A single
//! document merges to itself unchanged.

use crate::types::Graph;

/// Merge graphs in order.
pub fn merge_graphs<I>(graphs: I) -> Graph
where
    I: IntoIterator<Item = Graph>,
{
    let mut merged = Graph::new();
    for graph in graphs {
        absorb(&mut merged, graph);
    }
    merged
}

/// Append `next` onto `acc`.
pub fn absorb(acc: &mut Graph, next: Graph) {
    for (_, node) in next.nodes {
        acc.insert_node(node);
    }
    for mut edge in next.edges {
        edge.id = format!("edge_{}", acc.edges.len());
        acc.edges.push(edge);
    }
}
