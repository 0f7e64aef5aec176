use std::collections::{BTreeMap, HashMap, HashSet};

use cgmath::{EuclideanSpace, MetricSpace};
use serde::{Deserialize, Serialize};

use network::{ArcHandle, GeometricGraph, Located, NodeHandle, Point};

use crate::geometry::{centroid, point_key, LineSegment, PointKey};
use crate::sweep::{find_crossings, Tolerance};
use crate::Error;

/**
 * An undirected arc of the input graph. `first` sits at `segment.a` and `second` at
 * `segment.b`.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginalLine {
    pub first: NodeHandle,
    pub second: NodeHandle,
    pub segment: LineSegment,
}

impl OriginalLine {
    pub fn key(&self) -> (NodeHandle, NodeHandle) {
        line_key(self.first, self.second)
    }
}

pub fn line_key(a: NodeHandle, b: NodeHandle) -> (NodeHandle, NodeHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/**
 * A graph without proper crossings, along with the bookkeeping of which input arcs were split
 * where.
 */
#[derive(Debug, Clone)]
pub struct PlanarGraph<N: Located, A> {
    pub graph: GeometricGraph<N, A>,
    /** Crossing point to the input lines crossing there. */
    pub cross_points: BTreeMap<PointKey, Vec<OriginalLine>>,
    /** Input line to its crossing points, ordered from `first` to `second`. */
    pub crossed_lines: HashMap<(NodeHandle, NodeHandle), Vec<Point>>,
}

impl<N: Located, A> PlanarGraph<N, A> {
    pub fn crossing_count(&self) -> usize {
        self.cross_points.len()
    }

    pub fn lines_at(&self, point: Point) -> Option<&Vec<OriginalLine>> {
        self.cross_points.get(&point_key(point))
    }

    pub fn crossing_nodes(&self) -> Vec<NodeHandle> {
        self.cross_points
            .keys()
            .filter_map(|key| self.graph.node_at(crate::geometry::key_point(key)))
            .collect()
    }

    pub fn into_graph(self) -> GeometricGraph<N, A> {
        self.graph
    }
}

#[derive(Debug, Clone, Default)]
pub struct Planarizer {
    tolerance: Tolerance,
}

impl Planarizer {
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }

    /**
     * Splits every pair of crossing arcs at their crossing point. Existing node handles stay
     * valid; arc handles do not.
     *
     * `node_factory` creates the payload of a crossing vertex from its position and the input
     * lines crossing there. A crossing that lands on an existing coordinate reuses that node.
     * `arc_factory` derives the payload of each piece of a split arc from the original payload
     * and the piece length.
     */
    pub fn planarize<N, A, NF, AF>(
        &self,
        graph: &GeometricGraph<N, A>,
        mut node_factory: NF,
        mut arc_factory: AF,
    ) -> Result<PlanarGraph<N, A>, Error>
    where
        N: Located + Clone,
        A: Clone,
        NF: FnMut(Point, &[OriginalLine]) -> N,
        AF: FnMut(&A, f64) -> A,
    {
        let mut lines: Vec<OriginalLine> = Vec::new();
        let mut seen = HashSet::new();
        for arc in graph.graph().arcs() {
            if arc.source() == arc.target() || !seen.insert(line_key(arc.source(), arc.target())) {
                continue;
            }
            let (source, target) = (graph.position(arc.source()), graph.position(arc.target()));
            let segment = LineSegment::new(source, target);
            let (first, second) = if segment.a == source {
                (arc.source(), arc.target())
            } else {
                (arc.target(), arc.source())
            };
            lines.push(OriginalLine {
                first,
                second,
                segment,
            });
        }

        // sweep around the origin for better precision
        let points: Vec<Point> = graph
            .graph()
            .nodes()
            .iter()
            .map(|node| node.data.position())
            .collect();
        let offset = centroid(&points).to_vec();
        let translated: Vec<LineSegment> = lines
            .iter()
            .map(|line| LineSegment::new(line.segment.a - offset, line.segment.b - offset))
            .collect();
        let crossings = find_crossings(&translated, self.tolerance);

        let mut result = graph.clone();
        let mut cross_points: BTreeMap<PointKey, Vec<OriginalLine>> = BTreeMap::new();
        let mut splits: HashMap<(NodeHandle, NodeHandle), Vec<(f64, NodeHandle, Point)>> =
            HashMap::new();

        for crossing in crossings {
            let point = crossing.point + offset;
            let crossed: Vec<OriginalLine> =
                crossing.segments.iter().map(|index| lines[*index]).collect();
            let node = match result.node_at(point) {
                Some(existing) => existing,
                None => result.try_add_node(node_factory(point, &crossed))?,
            };
            let point = result.position(node);
            for line in crossed.iter() {
                splits.entry(line.key()).or_default().push((
                    line.segment.parameter(point),
                    node,
                    point,
                ));
            }
            cross_points.entry(point_key(point)).or_default().extend(crossed);
        }

        let mut removed: HashSet<ArcHandle> = HashSet::new();
        let mut added: Vec<(NodeHandle, NodeHandle, A)> = Vec::new();
        let mut crossed_lines: HashMap<(NodeHandle, NodeHandle), Vec<Point>> = HashMap::new();

        for line in lines.iter() {
            let pieces = match splits.get_mut(&line.key()) {
                Some(pieces) => pieces,
                None => continue,
            };
            pieces.sort_by(|a, b| a.0.total_cmp(&b.0));
            pieces.dedup_by_key(|piece| piece.1);
            crossed_lines.insert(line.key(), pieces.iter().map(|piece| piece.2).collect());

            let mut chain: Vec<NodeHandle> = vec![line.first];
            chain.extend(pieces.iter().map(|piece| piece.1));
            chain.push(line.second);
            chain.dedup();

            for (source, target) in [(line.first, line.second), (line.second, line.first)] {
                let arcs: Vec<ArcHandle> = graph
                    .graph()
                    .outgoing(source)
                    .filter(|arc| arc.target() == target)
                    .map(|arc| arc.id)
                    .collect();
                for arc in arcs {
                    removed.insert(arc);
                    let data = &graph.graph().arc(arc).data;
                    let ordered: Vec<NodeHandle> = if source == line.first {
                        chain.clone()
                    } else {
                        chain.iter().rev().copied().collect()
                    };
                    for window in ordered.windows(2) {
                        let length =
                            result.position(window[0]).distance(result.position(window[1]));
                        added.push((window[0], window[1], arc_factory(data, length)));
                    }
                }
            }
        }

        result.retain_arcs(|arc| !removed.contains(&arc.id));
        for (source, target, data) in added {
            result.add_arc(source, target, data);
        }

        log::debug!(
            "planarized {} lines: {} crossing points, {} lines split",
            lines.len(),
            cross_points.len(),
            crossed_lines.len()
        );

        Ok(PlanarGraph {
            graph: result,
            cross_points,
            crossed_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::planarizer::*;

    fn add_line(graph: &mut GeometricGraph<Point, f64>, a: Point, b: Point) -> Result<(), Error> {
        let u = graph.add_or_get_node(a)?;
        let v = graph.add_or_get_node(b)?;
        let length = a.distance(b);
        graph.add_arc(u, v, length);
        graph.add_arc(v, u, length);
        Ok(())
    }

    fn planarize(graph: &GeometricGraph<Point, f64>) -> Result<PlanarGraph<Point, f64>, Error> {
        Planarizer::default().planarize(graph, |point, _| point, |_, length| length)
    }

    #[test]
    fn x_crossing() -> Result<(), Error> {
        let mut graph = GeometricGraph::new();
        add_line(&mut graph, Point::new(0.0, 0.0), Point::new(2.0, 2.0))?;
        add_line(&mut graph, Point::new(0.0, 2.0), Point::new(2.0, 0.0))?;

        let planar = planarize(&graph)?;
        assert_eq!(planar.crossing_count(), 1);
        assert_eq!(planar.graph.graph().node_count(), 5);
        assert_eq!(planar.graph.graph().arc_count(), 8);

        let center = planar
            .graph
            .node_at(Point::new(1.0, 1.0))
            .expect("crossing vertex");
        assert_eq!(planar.graph.graph().node(center).outgoing_arcs().len(), 4);
        assert_eq!(planar.graph.graph().node(center).incoming_arcs().len(), 4);
        for arc in planar.graph.graph().outgoing(center) {
            assert!((arc.data - 2f64.sqrt()).abs() < 1e-9);
        }
        assert_eq!(planar.lines_at(Point::new(1.0, 1.0)).map(Vec::len), Some(2));
        planar.graph.graph().validate();
        Ok(())
    }

    #[test]
    fn idempotent() -> Result<(), Error> {
        let mut graph = GeometricGraph::new();
        add_line(&mut graph, Point::new(0.0, 0.0), Point::new(4.0, 4.0))?;
        add_line(&mut graph, Point::new(0.0, 4.0), Point::new(4.0, 0.0))?;
        add_line(&mut graph, Point::new(0.0, 1.0), Point::new(4.0, 1.0))?;

        let once = planarize(&graph)?;
        assert_eq!(once.crossing_count(), 3);
        let twice = planarize(&once.graph)?;
        assert_eq!(twice.crossing_count(), 0);
        assert_eq!(
            twice.graph.graph().node_count(),
            once.graph.graph().node_count()
        );
        assert_eq!(twice.graph.graph().arc_count(), once.graph.graph().arc_count());
        Ok(())
    }

    #[test]
    fn collinear_overlap_is_not_split() -> Result<(), Error> {
        let mut graph = GeometricGraph::new();
        add_line(&mut graph, Point::new(0.0, 0.0), Point::new(2.0, 0.0))?;
        add_line(&mut graph, Point::new(1.0, 0.0), Point::new(3.0, 0.0))?;

        let planar = planarize(&graph)?;
        assert_eq!(planar.crossing_count(), 0);
        assert_eq!(planar.graph.graph().node_count(), 4);
        assert_eq!(planar.graph.graph().arc_count(), 4);
        Ok(())
    }

    #[test]
    fn one_way_arcs_stay_one_way() -> Result<(), Error> {
        let mut graph: GeometricGraph<Point, f64> = GeometricGraph::new();
        let a = graph.try_add_node(Point::new(0.0, 0.0))?;
        let b = graph.try_add_node(Point::new(2.0, 2.0))?;
        graph.add_arc(a, b, 1.0);
        add_line(&mut graph, Point::new(0.0, 2.0), Point::new(2.0, 0.0))?;

        let planar = planarize(&graph)?;
        assert_eq!(planar.graph.graph().arc_count(), 6);
        let center = planar
            .graph
            .node_at(Point::new(1.0, 1.0))
            .expect("crossing vertex");
        assert!(planar.graph.graph().find_arc(a, center).is_some());
        assert!(planar.graph.graph().find_arc(center, a).is_none());
        assert!(planar.graph.graph().find_arc(center, b).is_some());
        assert_eq!(
            planar.crossed_lines.get(&line_key(a, b)),
            Some(&vec![Point::new(1.0, 1.0)])
        );
        Ok(())
    }
}
