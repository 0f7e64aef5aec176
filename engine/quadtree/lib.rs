mod quadrant;
mod quadtree;
mod rect;
mod spatial_index;

pub use crate::quadrant::{QuadMap, Quadrant, QUADRANTS};
pub use crate::quadtree::{Error, Path, Quadtree, VisitData, Visitor};
pub use crate::rect::Rect;
pub use crate::spatial_index::{Entry, NeighborsVisitor, SpatialIndex};
