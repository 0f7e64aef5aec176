mod arc;
mod colored;
mod geometric;
mod graph;
mod node;

pub use arc::{Arc, ArcHandle};
pub use colored::{Color, ColorSnapshot, ColoredNode};
pub use geometric::{GeometricGraph, Located, Point, COORDINATE_EPSILON};
pub use graph::DiGraph;
pub use node::{Node, NodeHandle};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Quadtree error: {0}")]
    QuadtreeError(#[from] quadtree::Error),
    #[error("Duplicate coordinate: ({0}, {1})")]
    DuplicateCoordinate(f64, f64),
    #[error("Invalid node: {0}")]
    InvalidNode(usize),
}
