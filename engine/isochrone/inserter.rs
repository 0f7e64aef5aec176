use std::collections::HashSet;

use cgmath::{EuclideanSpace, MetricSpace};

use network::{Color, ColoredNode, NodeHandle, Point};
use planar::line_key;

use crate::arrangement::ArrangementGraph;
use crate::Error;

/**
 * Places split nodes where the reachable area ends along each arc. A split is a Reachable
 * node with no time left, and has exactly one Unreachable neighbor.
 */
#[derive(Debug, Clone, Copy)]
pub struct NodeInserter {
    walking_speed: f64,
}

/** Replacement of one undirected arc by a chain of arcs. */
struct Subdivision {
    line: (NodeHandle, NodeHandle),
    chain: Vec<NodeHandle>,
}

impl NodeInserter {
    pub fn new(walking_speed: f64) -> Self {
        Self { walking_speed }
    }

    /**
     * Subdivides every Reachable-Unreachable arc at the split point, and every
     * Reachable-Reachable arc that is too long to be covered from both ends, in which case an
     * Unreachable dummy separates the two splits. Returns the new split nodes.
     */
    pub fn insert_split_nodes(
        &self,
        graph: &mut ArrangementGraph,
    ) -> Result<Vec<NodeHandle>, Error> {
        let mut seen = HashSet::new();
        let lines: Vec<(NodeHandle, NodeHandle)> = graph
            .graph()
            .arcs()
            .iter()
            .map(|arc| (arc.source(), arc.target()))
            .filter(|(source, target)| source != target && seen.insert(line_key(*source, *target)))
            .collect();

        let mut splits = Vec::new();
        let mut subdivisions = Vec::new();
        for (a, b) in lines {
            let (first, second) = (graph.graph().node(a).data, graph.graph().node(b).data);
            let subdivision = match (first.is_reachable(), second.is_reachable()) {
                (true, false) => self.split_boundary_arc(graph, a, b, &mut splits)?,
                (false, true) => self.split_boundary_arc(graph, b, a, &mut splits)?,
                (true, true) => self.split_gap_arc(graph, a, b, &mut splits)?,
                (false, false) => None,
            };
            subdivisions.extend(subdivision);
        }

        let replaced: HashSet<(NodeHandle, NodeHandle)> =
            subdivisions.iter().map(|subdivision| subdivision.line).collect();
        graph.retain_arcs(|arc| !replaced.contains(&line_key(arc.source(), arc.target())));
        for subdivision in &subdivisions {
            for pair in subdivision.chain.windows(2) {
                let length = graph.position(pair[0]).distance(graph.position(pair[1]));
                graph.add_arc(pair[0], pair[1], length);
                graph.add_arc(pair[1], pair[0], length);
            }
        }

        log::debug!(
            "inserted {} split nodes on {} arcs",
            splits.len(),
            subdivisions.len()
        );
        Ok(splits)
    }

    fn reach(&self, graph: &ArrangementGraph, node: NodeHandle) -> f64 {
        graph
            .graph()
            .node(node)
            .data
            .remaining_distance(self.walking_speed)
    }

    fn split_boundary_arc(
        &self,
        graph: &mut ArrangementGraph,
        reachable: NodeHandle,
        unreachable: NodeHandle,
        splits: &mut Vec<NodeHandle>,
    ) -> Result<Option<Subdivision>, Error> {
        let (from, to) = (graph.position(reachable), graph.position(unreachable));
        let length = from.distance(to);
        let fraction = self.reach(graph, reachable) / length;
        let fraction = if fraction > 0.0 && fraction < 1.0 {
            fraction
        } else {
            0.5
        };

        let mut point = interpolate(from, to, fraction);
        if graph.node_at(point).is_some() {
            point = interpolate(from, to, 0.5);
        }
        if graph.node_at(point).is_some() {
            log::warn!(
                "no room for a split node between {} and {}, leaving the arc whole",
                reachable,
                unreachable
            );
            return Ok(None);
        }

        let split = graph.try_add_node(split_node(point))?;
        splits.push(split);
        Ok(Some(Subdivision {
            line: line_key(reachable, unreachable),
            chain: vec![reachable, split, unreachable],
        }))
    }

    fn split_gap_arc(
        &self,
        graph: &mut ArrangementGraph,
        a: NodeHandle,
        b: NodeHandle,
        splits: &mut Vec<NodeHandle>,
    ) -> Result<Option<Subdivision>, Error> {
        let (from, to) = (graph.position(a), graph.position(b));
        let length = from.distance(to);
        let (reach_a, reach_b) = (self.reach(graph, a), self.reach(graph, b));
        if !(length > reach_a + reach_b) {
            return Ok(None);
        }

        let first = interpolate(from, to, reach_a.max(0.0) / length);
        let second = interpolate(from, to, 1.0 - reach_b.max(0.0) / length);
        let middle = first.midpoint(second);
        if [first, second, middle]
            .iter()
            .any(|point| graph.node_at(*point).is_some())
            || first.distance(second) <= 2.0 * graph.epsilon()
        {
            log::warn!(
                "no room for split nodes in the gap between {} and {}, leaving the arc whole",
                a,
                b
            );
            return Ok(None);
        }

        let first = graph.try_add_node(split_node(first))?;
        let middle = graph.try_add_node(ColoredNode::with_color(
            middle,
            Color::Unreachable,
            f64::NEG_INFINITY,
        ))?;
        let second = graph.try_add_node(split_node(second))?;
        splits.push(first);
        splits.push(second);
        Ok(Some(Subdivision {
            line: line_key(a, b),
            chain: vec![a, first, middle, second, b],
        }))
    }
}

fn split_node(point: Point) -> ColoredNode {
    ColoredNode::with_color(point, Color::Reachable, 0.0)
}

fn interpolate(from: Point, to: Point, fraction: f64) -> Point {
    from + (to - from) * fraction
}

/** Whether `node` is a split, i.e. reachable with exactly one unreachable neighbor. */
pub fn is_split_node(graph: &ArrangementGraph, node: NodeHandle) -> bool {
    let data = graph.graph().node(node).data;
    data.is_reachable()
        && graph
            .graph()
            .outgoing(node)
            .filter(|arc| !graph.graph().node(arc.target()).data.is_reachable())
            .count()
            == 1
}

#[cfg(test)]
mod tests {
    use network::GeometricGraph;

    use crate::inserter::*;

    fn path_graph(nodes: &[(f64, Color, f64)]) -> ArrangementGraph {
        let mut graph = GeometricGraph::new();
        for (x, color, remaining) in nodes {
            graph
                .try_add_node(ColoredNode::with_color(Point::new(*x, 0.0), *color, *remaining))
                .expect("distinct points");
        }
        for index in 1..nodes.len() {
            let length = nodes[index].0 - nodes[index - 1].0;
            graph.add_arc(NodeHandle(index - 1), NodeHandle(index), length);
            graph.add_arc(NodeHandle(index), NodeHandle(index - 1), length);
        }
        graph
    }

    #[test]
    fn boundary_arc() -> Result<(), Error> {
        let mut graph = path_graph(&[
            (0.0, Color::Reachable, 3.0),
            (10.0, Color::Unreachable, f64::NEG_INFINITY),
        ]);
        let splits = NodeInserter::new(2.0).insert_split_nodes(&mut graph)?;
        assert_eq!(splits, vec![NodeHandle(2)]);
        assert_eq!(graph.position(NodeHandle(2)), Point::new(6.0, 0.0));
        assert!(is_split_node(&graph, NodeHandle(2)));
        assert_eq!(graph.graph().arc_count(), 4);
        assert!(graph.graph().find_arc(NodeHandle(0), NodeHandle(1)).is_none());
        assert_eq!(graph.graph().node(NodeHandle(2)).data.remaining_time, 0.0);
        Ok(())
    }

    #[test]
    fn degenerate_fraction_bisects() -> Result<(), Error> {
        let mut graph = path_graph(&[
            (0.0, Color::Reachable, 100.0),
            (10.0, Color::Unreachable, f64::NEG_INFINITY),
        ]);
        let splits = NodeInserter::new(1.0).insert_split_nodes(&mut graph)?;
        assert_eq!(graph.position(splits[0]), Point::new(5.0, 0.0));
        Ok(())
    }

    #[test]
    fn gap_between_reachable_ends() -> Result<(), Error> {
        let mut graph = path_graph(&[(0.0, Color::Reachable, 2.0), (10.0, Color::Reachable, 4.0)]);
        let splits = NodeInserter::new(1.0).insert_split_nodes(&mut graph)?;
        let points: Vec<Point> = splits.iter().map(|split| graph.position(*split)).collect();
        assert_eq!(points, vec![Point::new(2.0, 0.0), Point::new(6.0, 0.0)]);
        let dummy = graph.node_at(Point::new(4.0, 0.0)).expect("dummy exists");
        assert!(graph.graph().node(dummy).data.is_unreachable());
        // 0 - s1 - dummy - s2 - 1
        assert_eq!(graph.graph().arc_count(), 8);
        assert!(splits.iter().all(|split| is_split_node(&graph, *split)));
        Ok(())
    }

    #[test]
    fn covered_arcs_stay_whole() -> Result<(), Error> {
        let mut graph = path_graph(&[
            (0.0, Color::Reachable, 6.0),
            (10.0, Color::Reachable, 6.0),
            (20.0, Color::Unreachable, f64::NEG_INFINITY),
            (30.0, Color::Unreachable, f64::NEG_INFINITY),
        ]);
        let splits = NodeInserter::new(1.0).insert_split_nodes(&mut graph)?;
        assert_eq!(splits.len(), 1);
        assert_eq!(graph.position(splits[0]), Point::new(16.0, 0.0));
        assert!(graph.graph().find_arc(NodeHandle(0), NodeHandle(1)).is_some());
        assert!(graph.graph().find_arc(NodeHandle(2), NodeHandle(3)).is_some());
        Ok(())
    }
}
