//! Markup input layer.
//!
//! The walker never sees the XML library. It runs over anything that
//! implements [`MarkupNode`]: attribute lookup, direct child node elements,
//! and the first edge-wrapper child.
//!
//! ## Document shape
//!
//! ```text
//! <OpenText>
//!   <text>
//!     <node id="r" type="Event" class="..." nuclear_lemmas="...">
//!       <edge type="Agent" function="...">
//!         <node .../>        <!-- reached through the edge wrapper -->
//!       </edge>
//!       <node .../>          <!-- direct child -->
//!     </node>
//!   </text>
//! </OpenText>
//! ```

pub mod element;

pub use element::{parse_element_tree, Element};

use crate::error::GraphError;

/// Top-level element of an annotated document.
pub const ROOT_TAG: &str = "OpenText";
/// Annotated-text container under the root.
pub const TEXT_TAG: &str = "text";
/// Annotated node element.
pub const NODE_TAG: &str = "node";
/// Edge wrapper element carrying metadata for the edge into its parent node.
pub const EDGE_TAG: &str = "edge";

/// Attribute names read by the walker.
pub mod attr {
    /// Explicit node id.
    pub const ID: &str = "id";
    /// Node or edge type.
    pub const TYPE: &str = "type";
    /// Node class.
    pub const CLASS: &str = "class";
    /// Node lemma text.
    pub const NUCLEAR_LEMMAS: &str = "nuclear_lemmas";
    /// Node values.
    pub const VALUES: &str = "values";
    /// Edge function.
    pub const FUNCTION: &str = "function";
}

/// Tree capability the walker needs from a parsed document.
pub trait MarkupNode {
    /// Attribute value by name.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Direct child node elements, in document order.
    fn child_nodes(&self) -> Vec<&Self>;

    /// First edge-wrapper child, if any.
    fn edge_wrapper(&self) -> Option<&Self>;
}

/// Resolve the single top-level node element of a parsed document.
///
/// Requires `OpenText` at the root, a `text` child (the first one is used),
/// and exactly one `node` directly under it.
pub fn locate_root(document: &Element) -> Result<&Element, GraphError> {
    if document.name != ROOT_TAG {
        return Err(GraphError::malformed(format!(
            "expected <{}> root element, found <{}>",
            ROOT_TAG, document.name
        )));
    }

    let text = document
        .children_named(TEXT_TAG)
        .next()
        .ok_or_else(|| GraphError::malformed(format!("<{}> has no <{}> child", ROOT_TAG, TEXT_TAG)))?;

    let mut nodes = text.children_named(NODE_TAG);
    let root = nodes
        .next()
        .ok_or_else(|| GraphError::malformed(format!("<{}> has no top-level <{}>", TEXT_TAG, NODE_TAG)))?;

    let extra = nodes.count();
    if extra > 0 {
        return Err(GraphError::malformed(format!(
            "<{}> has {} top-level <{}> elements, expected exactly one",
            TEXT_TAG,
            extra + 1,
            NODE_TAG
        )));
    }

    Ok(root)
}
