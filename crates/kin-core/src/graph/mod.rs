//! Presentation graph of a tree and traversals over it.

pub mod assemble;
pub mod lineage;

pub use assemble::{GraphEdge, GraphNode, TreeGraph, build_graph};
pub use lineage::Lineage;
