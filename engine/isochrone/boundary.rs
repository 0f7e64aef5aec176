use cgmath::{InnerSpace, Vector2};

use network::Point;

use crate::config::VisualizationConfig;
use crate::dual::VisGraph;
use crate::identifier::IsoFace;
use crate::visualization::{add_edge, FaceBuilder, FaceVisualization};

/**
 * Follows the reachable side of the face boundary itself, pushed into the face by
 * `boundary_offset`. The splits stay where they are.
 */
#[derive(Debug, Clone)]
pub struct BoundaryBuilder {
    config: VisualizationConfig,
}

impl BoundaryBuilder {
    pub fn new(config: VisualizationConfig) -> Self {
        Self { config }
    }

    pub fn offset_path(&self, side: &[Point]) -> Vec<Point> {
        offset_right(side, self.config.boundary_offset)
    }
}

/**
 * Moves the interior points of a path `offset` to its right. Dead ends are wrapped with two
 * points beyond their tip.
 */
pub fn offset_right(side: &[Point], offset: f64) -> Vec<Point> {
    let mut path = Vec::with_capacity(side.len() + 2);
    for (index, point) in side.iter().enumerate() {
        if index == 0 || index + 1 == side.len() {
            path.push(*point);
            continue;
        }
        let incoming = unit(*point - side[index - 1]);
        let outgoing = unit(side[index + 1] - *point);
        match (incoming, outgoing) {
            (Some(a), Some(b)) if (a + b).magnitude2() < 1e-12 => {
                path.push(*point + (a + right_normal(a)) * offset);
                path.push(*point + (a - right_normal(a)) * offset);
            }
            (Some(a), Some(b)) => {
                path.push(*point + (right_normal(a) + right_normal(b)).normalize() * offset)
            }
            (Some(a), None) | (None, Some(a)) => path.push(*point + right_normal(a) * offset),
            (None, None) => path.push(*point),
        }
    }
    path
}

fn unit(direction: Vector2<f64>) -> Option<Vector2<f64>> {
    if direction.magnitude2() == 0.0 {
        None
    } else {
        Some(direction.normalize())
    }
}

fn right_normal(direction: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(direction.y, -direction.x)
}

impl FaceBuilder for BoundaryBuilder {
    fn visualize(&self, face: &IsoFace) -> FaceVisualization {
        let path = self.offset_path(&face.reachable);

        let mut graph = VisGraph::new();
        let mut previous = None;
        for point in &path {
            let node = match graph.add_or_get_node(*point) {
                Ok(node) => node,
                Err(error) => {
                    return FaceVisualization::exception(
                        face,
                        graph,
                        format!("offset boundary failed: {}", error),
                    )
                }
            };
            if let Some(previous) = previous {
                add_edge(&mut graph, previous, node);
            }
            previous = Some(node);
        }

        FaceVisualization {
            graph,
            path,
            diagnostic: face.diagnostic.clone(),
        }
    }
}
