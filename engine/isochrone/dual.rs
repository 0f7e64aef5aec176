use petgraph::algo::{astar, has_path_connecting};
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;

use network::{ArcHandle, GeometricGraph, NodeHandle, Point};

use crate::config::VisualizationConfig;
use crate::turn_cost::{compute_turn_cost, is_octilinear};

/** Candidate edges a face boundary is drawn on. Arc data is the length. */
pub type VisGraph = GeometricGraph<Point, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualNode {
    Source,
    Target,
    Arc(ArcHandle),
}

/**
 * Linear dual of a visualization graph: every arc becomes a node and every pair of
 * consecutive arcs an edge, weighted by the turn between them plus the length of the second.
 * A shortest path in the dual is a path in the primal that trades length against bends.
 */
pub struct LinearDual {
    dual: Graph<DualNode, f64>,
    source: NodeIndex,
    target: NodeIndex,
}

impl LinearDual {
    pub fn new(
        graph: &VisGraph,
        source: NodeHandle,
        target: NodeHandle,
        config: &VisualizationConfig,
    ) -> Self {
        let primal = graph.graph();
        let mut dual = Graph::with_capacity(primal.arc_count() + 2, primal.arc_count() * 4);
        let dual_source = dual.add_node(DualNode::Source);
        let dual_target = dual.add_node(DualNode::Target);
        let arc_nodes: Vec<NodeIndex> = primal
            .arcs()
            .iter()
            .map(|arc| dual.add_node(DualNode::Arc(arc.id)))
            .collect();

        let cost = |arc: ArcHandle| -> f64 {
            let (from, to) = graph.arc_segment(arc);
            let malus = if is_octilinear(to - from) {
                1.0
            } else {
                config.non_octilinear_malus
            };
            config.distance_weight * primal.arc(arc).data * malus
        };

        for arc in primal.arcs() {
            let node = arc_nodes[arc.id.0];
            if arc.source() == source {
                dual.add_edge(dual_source, node, cost(arc.id));
            }
            if arc.target() == target {
                dual.add_edge(node, dual_target, 0.0);
            }
            let (from, via) = graph.arc_segment(arc.id);
            for next in primal.outgoing(arc.target()) {
                let to = graph.position(next.target());
                let turn = compute_turn_cost(via - from, to - via, config.weight_uturn);
                dual.add_edge(
                    node,
                    arc_nodes[next.id.0],
                    config.turn_weight * turn + cost(next.id),
                );
            }
        }

        Self {
            dual,
            source: dual_source,
            target: dual_target,
        }
    }

    pub fn node_count(&self) -> usize {
        self.dual.node_count()
    }

    pub fn is_connected(&self) -> bool {
        has_path_connecting(&self.dual, self.source, self.target, None)
    }

    /** Cheapest primal node sequence from source to target, with its cost. */
    pub fn shortest_path(&self, graph: &VisGraph) -> Option<(f64, Vec<NodeHandle>)> {
        let target = self.target;
        let (cost, path) = astar(
            &self.dual,
            self.source,
            |node| node == target,
            |edge| *edge.weight(),
            |_| 0.0,
        )?;

        let arcs: Vec<ArcHandle> = path
            .iter()
            .filter_map(|node| match self.dual[*node] {
                DualNode::Arc(arc) => Some(arc),
                _ => None,
            })
            .collect();
        let first = arcs.first()?;
        let mut nodes = vec![graph.graph().arc(*first).source()];
        nodes.extend(arcs.iter().map(|arc| graph.graph().arc(*arc).target()));
        Some((cost, nodes))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::MetricSpace;

    use crate::dual::*;

    /**
     * From (0, 0) to (2, 1): either a bent octilinear path over (1, 0), or a direct
     * non-octilinear segment.
     */
    fn triangle() -> VisGraph {
        let mut graph = VisGraph::new();
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 1.0)];
        for point in points {
            graph.try_add_node(point).expect("distinct points");
        }
        for (a, b) in [(0, 1), (1, 2), (0, 2)] {
            let length = points[a].distance(points[b]);
            graph.add_arc(NodeHandle(a), NodeHandle(b), length);
            graph.add_arc(NodeHandle(b), NodeHandle(a), length);
        }
        graph
    }

    #[test]
    fn prefers_octilinear_bend_when_turns_are_cheap() {
        let graph = triangle();
        let config = VisualizationConfig {
            turn_weight: 0.1,
            ..VisualizationConfig::default()
        };
        let dual = LinearDual::new(&graph, NodeHandle(0), NodeHandle(2), &config);
        assert_eq!(dual.node_count(), 8);
        assert!(dual.is_connected());
        let (_, path) = dual.shortest_path(&graph).expect("connected");
        assert_eq!(path, vec![NodeHandle(0), NodeHandle(1), NodeHandle(2)]);
    }

    #[test]
    fn prefers_straight_segment_when_turns_are_expensive() {
        let graph = triangle();
        let config = VisualizationConfig {
            turn_weight: 10.0,
            ..VisualizationConfig::default()
        };
        let dual = LinearDual::new(&graph, NodeHandle(0), NodeHandle(2), &config);
        let (cost, path) = dual.shortest_path(&graph).expect("connected");
        assert_eq!(path, vec![NodeHandle(0), NodeHandle(2)]);
        assert!((cost - 2.0 * 5.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn disconnected_target() {
        let mut graph = triangle();
        let lonely = graph.try_add_node(Point::new(5.0, 5.0)).expect("distinct points");
        let dual = LinearDual::new(&graph, NodeHandle(0), lonely, &VisualizationConfig::default());
        assert!(!dual.is_connected());
        assert!(dual.shortest_path(&graph).is_none());
    }
}
