//! Core types for the discourse graph.

pub mod node;
pub mod edge;
pub mod graph;

pub use node::Node;
pub use edge::Edge;
pub use graph::Graph;
