use std::collections::{HashMap, HashSet};
use std::f64::consts::FRAC_1_SQRT_2;

use cgmath::{EuclideanSpace, InnerSpace, Vector2};

use network::{NodeHandle, Point};
use planar::cross;

use crate::boundary::BoundaryBuilder;
use crate::config::{ToleranceConfig, VisualizationConfig};
use crate::dual::{LinearDual, VisGraph};
use crate::identifier::IsoFace;
use crate::visualization::{add_edge, FaceBuilder, FaceVisualization};
use crate::Error;

const DIRECTIONS: [Vector2<f64>; 4] = [
    Vector2 { x: 1.0, y: 0.0 },
    Vector2 {
        x: FRAC_1_SQRT_2,
        y: FRAC_1_SQRT_2,
    },
    Vector2 { x: 0.0, y: 1.0 },
    Vector2 {
        x: -FRAC_1_SQRT_2,
        y: FRAC_1_SQRT_2,
    },
];

/** Lines closer than this are merged, and points closer than this to a line lie on it. */
const LINE_EPSILON: f64 = 1e-6;

/**
 * Draws the way through a face on an octilinear grid: lines at 0°, 45°, 90° and 135° through
 * the splits and every corner of the face, clipped to the face. Grid edges touching the
 * reachable side are left out. When the grid does not connect the splits, points along the
 * straight line between them add more grid lines.
 */
#[derive(Debug, Clone)]
pub struct OctilinearBuilder {
    config: VisualizationConfig,
    tolerance: ToleranceConfig,
}

impl OctilinearBuilder {
    pub fn new(config: VisualizationConfig, tolerance: ToleranceConfig) -> Self {
        Self { config, tolerance }
    }

    /** Grid of the face with `2^level - 1` extra anchors between the splits. */
    pub fn grid(&self, face: &IsoFace, level: u32) -> Result<VisGraph, Error> {
        let (start, end) = (face.start(), face.end());
        let mut anchors = vec![start, end];
        anchors.extend(face.region.rings().flatten().copied());
        let steps = 1u32 << level.min(16);
        anchors.extend((1..steps).map(|step| start + (end - start) * (step as f64 / steps as f64)));

        let mut lines: HashMap<(usize, i64), Point> = HashMap::new();
        for anchor in &anchors {
            for (index, direction) in DIRECTIONS.iter().enumerate() {
                let offset = (cross(*direction, anchor.to_vec()) / LINE_EPSILON).round();
                lines.entry((index, offset as i64)).or_insert(*anchor);
            }
        }
        let mut keys: Vec<&(usize, i64)> = lines.keys().collect();
        keys.sort();

        let mut graph = VisGraph::new();
        for key in keys {
            let direction = DIRECTIONS[key.0];
            let origin = lines[key];
            for (from, to) in self.clip(face, origin, direction, &anchors) {
                let a = graph.add_or_get_node(origin + direction * from)?;
                let b = graph.add_or_get_node(origin + direction * to)?;
                add_edge(&mut graph, a, b);
            }
        }

        let planar = self
            .tolerance
            .planarizer()
            .planarize(&graph, |point, _| point, |_, length| length)?;
        let mut graph = planar.into_graph();
        let blocked: HashSet<(NodeHandle, NodeHandle)> = graph
            .graph()
            .arcs()
            .iter()
            .filter(|arc| {
                let (a, b) = (graph.position(arc.source()), graph.position(arc.target()));
                face.touches_reachable(a, b, LINE_EPSILON)
            })
            .map(|arc| (arc.source(), arc.target()))
            .collect();
        let mut seen = HashSet::new();
        graph.retain_arcs(|arc| {
            let key = (arc.source(), arc.target());
            arc.source() != arc.target() && !blocked.contains(&key) && seen.insert(key)
        });
        Ok(graph)
    }

    /**
     * Pieces of the line `origin + t * direction` inside the region, as parameter intervals.
     * The line is also cut at every anchor on it.
     */
    fn clip(
        &self,
        face: &IsoFace,
        origin: Point,
        direction: Vector2<f64>,
        anchors: &[Point],
    ) -> Vec<(f64, f64)> {
        let mut ts: Vec<f64> = Vec::new();
        for (a, b) in face.region.segments() {
            let edge = b - a;
            let denominator = cross(direction, edge);
            if denominator.abs() < LINE_EPSILON {
                if cross(direction, a - origin).abs() < LINE_EPSILON {
                    ts.push((a - origin).dot(direction));
                    ts.push((b - origin).dot(direction));
                }
                continue;
            }
            let t = cross(a - origin, edge) / denominator;
            let u = cross(a - origin, direction) / denominator;
            if (-LINE_EPSILON..=1.0 + LINE_EPSILON).contains(&u) {
                ts.push(t);
            }
        }
        for anchor in anchors {
            if cross(direction, anchor - origin).abs() < LINE_EPSILON {
                ts.push((anchor - origin).dot(direction));
            }
        }
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() < LINE_EPSILON);

        ts.windows(2)
            .filter(|pair| {
                let middle = origin + direction * ((pair[0] + pair[1]) / 2.0);
                face.region.covers(middle, LINE_EPSILON)
            })
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

impl FaceBuilder for OctilinearBuilder {
    fn visualize(&self, face: &IsoFace) -> FaceVisualization {
        if face.is_loop() {
            return BoundaryBuilder::new(self.config).visualize(face);
        }
        if face.region.outer.len() < 3 {
            return FaceVisualization::exception(
                face,
                VisGraph::new(),
                format!("face {} has no bounded region", face.face),
            );
        }

        let mut last = VisGraph::new();
        for level in 0..=self.config.max_densify_levels {
            let graph = match self.grid(face, level) {
                Ok(graph) => graph,
                Err(error) => {
                    log::warn!("face {}: octilinear grid failed: {}", face.id, error);
                    continue;
                }
            };
            let ends = (graph.node_at(face.start()), graph.node_at(face.end()));
            if let (Some(source), Some(target)) = ends {
                let dual = LinearDual::new(&graph, source, target, &self.config);
                if dual.is_connected() {
                    if let Some((_, nodes)) = dual.shortest_path(&graph) {
                        return FaceVisualization::from_path(face, graph, &nodes);
                    }
                }
            }
            log::debug!("face {}: octilinear grid at level {} is disconnected", face.id, level);
            last = graph;
        }
        FaceVisualization::exception(
            face,
            last,
            format!(
                "no octilinear path after {} densify levels",
                self.config.max_densify_levels
            ),
        )
    }
}
