//! Markup tree walker.
//!
//! Depth-first descent over nested node elements, producing a flat
//! [`Graph`] for one document.
//!
//! ## Algorithm
//!
//! For each node element, in document order:
//! 1. Take its id from the `id` attribute, else synthesize `node_<n>` where
//!    `n` is the node-map size at that moment
//! 2. Record `type`, `class`, `nuclear_lemmas`, `values` verbatim
//! 3. If it has a parent, append `edge_<m>` parent → node, typed from the
//!    node's *own* first edge wrapper (a node carries the metadata of the
//!    edge pointing into it)
//! 4. Recurse into direct child nodes, then into nodes nested in the first
//!    edge wrapper
//!
//! Id counters live in a [`WalkState`] owned by one walk, so concurrent or
//! repeated walks never share numbering.

use crate::error::GraphError;
use crate::markup::{self, attr, MarkupNode};
use crate::types::{Edge, Graph, Node};

/// Accumulator threaded through one walk.
#[derive(Debug, Default)]
pub struct WalkState {
    graph: Graph,
}

impl WalkState {
    /// Next synthesized node id.
    fn next_node_id(&self) -> String {
        format!("node_{}", self.graph.nodes.len())
    }

    /// Next synthesized edge id.
    fn next_edge_id(&self) -> String {
        format!("edge_{}", self.graph.edges.len())
    }

    /// Finish the walk.
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Walk a tree rooted at one node element.
pub fn walk<N: MarkupNode>(root: &N) -> Graph {
    let mut state = WalkState::default();
    visit(root, None, &mut state);
    state.into_graph()
}

/// Parse markup text and walk its single top-level node element.
pub fn parse_document(xml: &str) -> Result<Graph, GraphError> {
    let tree = markup::parse_element_tree(xml)?;
    let root = markup::locate_root(&tree)?;
    let graph = walk(root);

    tracing::debug!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        "Document walked"
    );

    Ok(graph)
}

fn visit<N: MarkupNode>(element: &N, parent_id: Option<&str>, state: &mut WalkState) {
    let id = element
        .attribute(attr::ID)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| state.next_node_id());

    let wrapper = element.edge_wrapper();

    state.graph.insert_node(
        Node::new(
            id.clone(),
            element.attribute(attr::TYPE).unwrap_or_default(),
            element.attribute(attr::CLASS).unwrap_or_default(),
            element.attribute(attr::NUCLEAR_LEMMAS).unwrap_or_default(),
        )
        .with_values(element.attribute(attr::VALUES).map(str::to_owned)),
    );

    if let Some(parent_id) = parent_id {
        let edge = Edge::new(state.next_edge_id(), parent_id, id.clone())
            .with_type(wrapper.and_then(|w| w.attribute(attr::TYPE)).map(str::to_owned))
            .with_function(wrapper.and_then(|w| w.attribute(attr::FUNCTION)).map(str::to_owned));
        state.graph.edges.push(edge);
    }

    for child in element.child_nodes() {
        visit(child, Some(id.as_str()), state);
    }

    // Cross-references embedded inside the edge wrapper.
    if let Some(wrapper) = wrapper {
        for child in wrapper.child_nodes() {
            visit(child, Some(id.as_str()), state);
        }
    }
}
