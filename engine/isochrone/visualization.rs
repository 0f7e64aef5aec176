use cgmath::MetricSpace;

use network::{NodeHandle, Point};

use crate::boundary::BoundaryBuilder;
use crate::dual::VisGraph;
use crate::identifier::IsoFace;
use crate::min_distance::MinimumDistanceBuilder;
use crate::octilinear::OctilinearBuilder;

/** The drawn way through one face, from its input split to its output split. */
#[derive(Debug, Clone)]
pub struct FaceVisualization {
    pub graph: VisGraph,
    pub path: Vec<Point>,
    pub diagnostic: Option<String>,
}

impl FaceVisualization {
    /**
     * The fallback when no path can be found: a straight exception edge from input to
     * output, added to the graph as well.
     */
    pub fn exception(face: &IsoFace, mut graph: VisGraph, reason: String) -> Self {
        log::warn!("face {}: {}, drawing an exception edge", face.id, reason);
        let ends = (
            graph.add_or_get_node(face.start()),
            graph.add_or_get_node(face.end()),
        );
        if let (Ok(start), Ok(end)) = ends {
            add_edge(&mut graph, start, end);
        }
        let diagnostic = match &face.diagnostic {
            Some(existing) => format!("{}; {}", existing, reason),
            None => reason,
        };
        Self {
            graph,
            path: vec![face.start(), face.end()],
            diagnostic: Some(diagnostic),
        }
    }

    pub fn from_path(face: &IsoFace, graph: VisGraph, nodes: &[NodeHandle]) -> Self {
        let path = nodes.iter().map(|node| graph.position(*node)).collect();
        Self {
            graph,
            path,
            diagnostic: face.diagnostic.clone(),
        }
    }

    pub fn length(&self) -> f64 {
        self.path
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

#[enum_dispatch::enum_dispatch]
pub trait FaceBuilder {
    /** Never fails: a face that cannot be drawn falls back to an exception edge. */
    fn visualize(&self, face: &IsoFace) -> FaceVisualization;
}

// NOTE: all implementations of FaceBuilder must be listed here
#[enum_dispatch::enum_dispatch(FaceBuilder)]
#[derive(Debug, Clone)]
pub enum Visualizer {
    OctilinearBuilder,
    MinimumDistanceBuilder,
    BoundaryBuilder,
}

/** Adds both directions of an undirected edge, weighted by its length. */
pub fn add_edge(graph: &mut VisGraph, a: NodeHandle, b: NodeHandle) {
    if a == b || graph.graph().find_arc(a, b).is_some() {
        return;
    }
    let length = graph.position(a).distance(graph.position(b));
    graph.add_arc(a, b, length);
    graph.add_arc(b, a, length);
}
