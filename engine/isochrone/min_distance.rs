use cgmath::MetricSpace;
use petgraph::algo::{astar, has_path_connecting};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use network::{NodeHandle, Point};
use planar::segment_crosses_ring;

use crate::boundary::BoundaryBuilder;
use crate::config::{ToleranceConfig, VisualizationConfig};
use crate::dual::VisGraph;
use crate::identifier::IsoFace;
use crate::region::Region;
use crate::visualization::{add_edge, FaceBuilder, FaceVisualization};
use crate::Error;

/**
 * Draws the shortest Euclidean way through a face, over the visibility graph of points
 * sampled along the face boundary. Sight lines may not touch the reachable side.
 */
#[derive(Debug, Clone)]
pub struct MinimumDistanceBuilder {
    config: VisualizationConfig,
    tolerance: ToleranceConfig,
}

impl MinimumDistanceBuilder {
    pub fn new(config: VisualizationConfig, tolerance: ToleranceConfig) -> Self {
        Self { config, tolerance }
    }

    /**
     * Ring vertices plus evenly spaced points on every ring edge. The spacing grows beyond
     * `sample_spacing` when the boundary would need more than `max_samples` points.
     */
    pub fn samples(&self, region: &Region) -> Vec<Point> {
        let perimeter = region.perimeter();
        let spacing = self
            .config
            .sample_spacing
            .max(perimeter / self.config.max_samples.max(1) as f64);
        let mut samples = Vec::new();
        for (a, b) in region.segments() {
            samples.push(a);
            let length = a.distance(b);
            if spacing > 0.0 && length > spacing {
                let count = (length / spacing).ceil() as usize;
                samples.extend((1..count).map(|step| a + (b - a) * (step as f64 / count as f64)));
            }
        }
        samples
    }

    /** Whether the segment stays within the face and off its reachable side. */
    fn visible(&self, face: &IsoFace, a: Point, b: Point) -> bool {
        let epsilon = self.tolerance.endpoint_epsilon;
        face.region.rings().all(|ring| !segment_crosses_ring(a, b, ring))
            && [0.25, 0.5, 0.75]
                .iter()
                .all(|t| face.region.covers(a + (b - a) * *t, epsilon))
            && !face.touches_reachable(a, b, epsilon)
    }

    pub fn visibility_graph(&self, face: &IsoFace) -> Result<VisGraph, Error> {
        let mut graph = VisGraph::new();
        graph.add_or_get_node(face.start())?;
        graph.add_or_get_node(face.end())?;
        for sample in self.samples(&face.region) {
            graph.add_or_get_node(sample)?;
        }

        let count = graph.graph().node_count();
        for i in 0..count {
            for j in (i + 1)..count {
                let (a, b) = (graph.position(NodeHandle(i)), graph.position(NodeHandle(j)));
                if self.visible(face, a, b) {
                    add_edge(&mut graph, NodeHandle(i), NodeHandle(j));
                }
            }
        }
        Ok(graph)
    }
}

impl FaceBuilder for MinimumDistanceBuilder {
    fn visualize(&self, face: &IsoFace) -> FaceVisualization {
        if face.is_loop() {
            return BoundaryBuilder::new(self.config).visualize(face);
        }
        let graph = match self.visibility_graph(face) {
            Ok(graph) => graph,
            Err(error) => {
                return FaceVisualization::exception(
                    face,
                    VisGraph::new(),
                    format!("visibility graph failed: {}", error),
                )
            }
        };

        let mut search: UnGraph<Point, f64> =
            UnGraph::with_capacity(graph.graph().node_count(), graph.graph().arc_count() / 2);
        for node in graph.graph().nodes() {
            search.add_node(node.data);
        }
        for arc in graph.graph().arcs() {
            if arc.source() < arc.target() {
                search.add_edge(
                    NodeIndex::new(arc.source().0),
                    NodeIndex::new(arc.target().0),
                    arc.data,
                );
            }
        }

        let (source, target) = (NodeIndex::new(0), NodeIndex::new(1));
        if !has_path_connecting(&search, source, target, None) {
            return FaceVisualization::exception(
                face,
                graph,
                "input and output do not see each other".to_owned(),
            );
        }
        let goal = search[target];
        let path = astar(
            &search,
            source,
            |node| node == target,
            |edge| *edge.weight(),
            |node| search[node].distance(goal),
        );
        match path {
            Some((_, nodes)) => {
                let nodes: Vec<NodeHandle> =
                    nodes.iter().map(|node| NodeHandle(node.index())).collect();
                FaceVisualization::from_path(face, graph, &nodes)
            }
            None => FaceVisualization::exception(face, graph, "no shortest path".to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use dcel::FaceId;

    use crate::min_distance::*;

    fn face(start: Point, end: Point, outer: Vec<Point>) -> IsoFace {
        IsoFace {
            id: 0,
            face: FaceId(1),
            input: NodeHandle(0),
            output: NodeHandle(1),
            boundary: vec![start, end],
            reachable: Vec::new(),
            region: Region::new(outer, Vec::new()),
            predecessor: 0,
            successor: 0,
            diagnostic: None,
        }
    }

    fn builder(spacing: f64) -> MinimumDistanceBuilder {
        MinimumDistanceBuilder::new(
            VisualizationConfig {
                sample_spacing: spacing,
                ..VisualizationConfig::default()
            },
            ToleranceConfig::default(),
        )
    }

    #[test]
    fn sample_spacing() {
        let region = Region::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            Vec::new(),
        );
        assert_eq!(builder(2.5).samples(&region).len(), 16);
        assert_eq!(builder(100.0).samples(&region).len(), 4);
    }

    #[test]
    fn shortest_path_wraps_around_corner() {
        // L-shaped face: the straight line from start to end leaves it
        let (start, end) = (Point::new(1.0, 0.0), Point::new(4.0, 3.0));
        let face = face(
            start,
            end,
            vec![
                Point::new(0.0, 0.0),
                start,
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(4.0, 2.0),
                end,
                Point::new(4.0, 4.0),
                Point::new(0.0, 4.0),
            ],
        );
        let visualization = builder(100.0).visualize(&face);
        assert!(visualization.diagnostic.is_none());
        assert_eq!(
            visualization.path,
            vec![start, Point::new(2.0, 2.0), end]
        );
        let expected = 5.0_f64.sqrt() + 5.0_f64.sqrt();
        assert!((visualization.length() - expected).abs() < 1e-9);
    }

    #[test]
    fn keeps_clear_of_reachable_roads() {
        // the straight way from start to end would run along the reachable bottom side
        let (start, end) = (Point::new(4.0, 0.0), Point::new(0.0, 0.0));
        let mut face = face(
            start,
            end,
            vec![
                end,
                Point::new(2.0, 0.0),
                start,
                Point::new(4.0, 4.0),
                Point::new(0.0, 4.0),
            ],
        );
        face.reachable = vec![start, Point::new(2.0, 0.0), end];
        let visualization = builder(1.0).visualize(&face);
        assert!(visualization.diagnostic.is_none());
        assert!(visualization.path.len() > 2);
        assert!(visualization.path[1..visualization.path.len() - 1]
            .iter()
            .all(|point| point.y > 0.5));
    }
}
