mod coloring;
mod common;
mod edge;
mod graph;
mod iterator;
mod node;
mod router;

pub use coloring::{blue_to_red, color_road_graph, colored_road_graph, recolor};
pub use common::{Error, Mode, RoadArc, RoadClass, RoutingConfig, MODES};
pub use edge::RouteArc;
pub use graph::{ColoredRoadGraph, RoadGraph, RoutingGraph, TransitIndex};
pub use iterator::{wait_until, NodeIterator, RoadIterator, Successors, TransitIterator};
pub use node::RouteNode;
pub use router::Router;
