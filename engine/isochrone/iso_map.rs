use cgmath::MetricSpace;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use network::Point;
use planar::{cleanup_ring, point_in_ring, point_on_ring, signed_area};

use crate::config::ToleranceConfig;
use crate::identifier::FaceChain;
use crate::visualization::{FaceBuilder, FaceVisualization, Visualizer};

/** One connected piece of the isochrone. The outer ring is counter-clockwise, holes clockwise. */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsoPolygon {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    pub diagnostic: Option<String>,
}

impl IsoPolygon {
    pub fn contains(&self, point: Point) -> bool {
        point_in_ring(point, &self.outer)
            && !self.holes.iter().any(|hole| point_in_ring(point, hole))
    }

    /** Area without the holes. */
    pub fn area(&self) -> f64 {
        signed_area(&self.outer) + self.holes.iter().map(|hole| signed_area(hole)).sum::<f64>()
    }
}

/** A closed ring drawn from one face chain. */
#[derive(Debug, Clone)]
pub struct IsoRing {
    pub points: Vec<Point>,
    pub faces: Vec<FaceVisualization>,
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IsoMap {
    pub rings: Vec<IsoRing>,
    pub polygons: Vec<IsoPolygon>,
    pub diagnostic: Option<String>,
}

fn join(diagnostics: impl Iterator<Item = String>) -> Option<String> {
    let mut diagnostics = diagnostics.peekable();
    diagnostics.peek()?;
    Some(diagnostics.join("; "))
}

impl IsoMap {
    /**
     * Draws every face in parallel, joins each chain into a ring, and nests the rings into
     * polygons: counter-clockwise rings are outer boundaries, and clockwise rings are holes in
     * the smallest outer ring around them.
     */
    pub fn build(
        chains: &[FaceChain],
        visualizer: &Visualizer,
        tolerance: &ToleranceConfig,
    ) -> IsoMap {
        let rings: Vec<IsoRing> = chains
            .par_iter()
            .map(|chain| {
                let faces: Vec<FaceVisualization> = chain
                    .faces
                    .par_iter()
                    .map(|face| visualizer.visualize(face))
                    .collect();
                let mut points: Vec<Point> = Vec::new();
                for face in &faces {
                    for point in &face.path {
                        if points
                            .last()
                            .map_or(true, |last| last.distance(*point) > tolerance.cleanup_epsilon)
                        {
                            points.push(*point);
                        }
                    }
                }
                IsoRing {
                    points: cleanup_ring(&points, tolerance.cleanup_epsilon),
                    diagnostic: join(faces.iter().filter_map(|face| face.diagnostic.clone())),
                    faces,
                }
            })
            .collect();

        let mut diagnostics = Vec::new();
        let mut polygons: Vec<IsoPolygon> = Vec::new();
        let mut holes: Vec<&IsoRing> = Vec::new();
        for ring in &rings {
            let area = signed_area(&ring.points);
            if ring.points.len() < 3 || area.abs() <= tolerance.cleanup_epsilon {
                diagnostics.push(format!(
                    "dropped a degenerate ring of {} points",
                    ring.points.len()
                ));
            } else if area > 0.0 {
                polygons.push(IsoPolygon {
                    outer: ring.points.clone(),
                    holes: Vec::new(),
                    diagnostic: ring.diagnostic.clone(),
                });
            } else {
                holes.push(ring);
            }
        }

        let epsilon = tolerance.endpoint_epsilon;
        for hole in holes {
            let container = polygons
                .iter()
                .enumerate()
                .filter(|(_, polygon)| {
                    hole.points.iter().any(|point| {
                        !point_on_ring(*point, &polygon.outer, epsilon)
                            && point_in_ring(*point, &polygon.outer)
                    })
                })
                .min_by(|(_, a), (_, b)| signed_area(&a.outer).total_cmp(&signed_area(&b.outer)))
                .map(|(index, _)| index);
            match container {
                Some(index) => {
                    let polygon = &mut polygons[index];
                    polygon.holes.push(hole.points.clone());
                    if let Some(diagnostic) = &hole.diagnostic {
                        let existing = polygon.diagnostic.iter().cloned();
                        polygon.diagnostic = join(existing.chain([diagnostic.clone()]));
                    }
                }
                None => {
                    log::warn!("hole of {} points lies in no outer ring", hole.points.len());
                    diagnostics.push(format!(
                        "dropped a hole of {} points outside every ring",
                        hole.points.len()
                    ));
                }
            }
        }

        log::debug!(
            "assembled {} rings into {} polygons",
            rings.len(),
            polygons.len()
        );
        IsoMap {
            rings,
            polygons,
            diagnostic: join(diagnostics.into_iter()),
        }
    }
}
