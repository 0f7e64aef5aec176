use cgmath::MetricSpace;
use serde::{Deserialize, Serialize};

use network::Point;
use planar::{ring_perimeter, ring_segments, signed_area};
use route::ColoredRoadGraph;

use crate::arrangement::build_arrangement;
use crate::config::{FaceStrategy, ToleranceConfig, VisualizationConfig};
use crate::identifier::{build_dcel, FaceIdentifier};
use crate::inserter::NodeInserter;
use crate::iso_map::{IsoMap, IsoPolygon};
use crate::turn_cost::{histogram_bin, is_octilinear, turn_angle, ANGLE_EPSILON, HISTOGRAM_BINS};
use crate::Error;

/** Confusion matrix of the polygons against the router's coloring of the road nodes. */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl Validation {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        if self.total() == 0 {
            return 1.0;
        }
        (self.true_positive + self.true_negative) as f64 / self.total() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub perimeter: f64,
    /** Share of the perimeter drawn at multiples of 45°. */
    pub octilinear_fraction: f64,
    pub area: f64,
    pub hole_count: usize,
    pub hole_area: f64,
    pub turn_count: usize,
    /** Turn angles in 22.5° bins, from -180° to 180°. */
    pub histogram: [usize; HISTOGRAM_BINS],
}

/** The area reachable within one budget. */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timezone {
    pub budget: f64,
    pub polygons: Vec<IsoPolygon>,
    pub validation: Validation,
    pub diagnostic: Option<String>,
}

impl Timezone {
    /**
     * Computes the polygons around the Reachable nodes of a colored road graph. Remaining
     * times turn into distances at `walking_speed`.
     */
    pub fn build(
        roads: &ColoredRoadGraph,
        budget: f64,
        walking_speed: f64,
        strategy: FaceStrategy,
        config: &VisualizationConfig,
        tolerance: &ToleranceConfig,
    ) -> Result<Timezone, Error> {
        let arrangement = build_arrangement(roads, budget, walking_speed, config, tolerance)?;
        let mut graph = arrangement.graph;
        let splits = NodeInserter::new(walking_speed).insert_split_nodes(&mut graph)?;
        let dcel = build_dcel(&graph)?;
        let chains = FaceIdentifier::new(&graph, &dcel, &splits).identify_faces()?;

        let visualizer = strategy.visualizer(config, tolerance);
        let map = IsoMap::build(&chains, &visualizer, tolerance);
        log::debug!(
            "budget {}: {} splits, {} chains, {} polygons",
            budget,
            splits.len(),
            chains.len(),
            map.polygons.len()
        );

        let mut timezone = Timezone {
            budget,
            polygons: map.polygons,
            validation: Validation::default(),
            diagnostic: map.diagnostic,
        };
        timezone.validate(roads);
        Ok(timezone)
    }

    pub fn contains(&self, point: Point) -> bool {
        self.polygons.iter().any(|polygon| polygon.contains(point))
    }

    /** Compares polygon membership of every road node with its color. */
    pub fn validate(&mut self, ground_truth: &ColoredRoadGraph) -> Validation {
        let mut validation = Validation::default();
        for node in ground_truth.graph().nodes() {
            match (self.contains(node.data.position), node.data.is_reachable()) {
                (true, true) => validation.true_positive += 1,
                (true, false) => validation.false_positive += 1,
                (false, false) => validation.true_negative += 1,
                (false, true) => validation.false_negative += 1,
            }
        }
        if validation.false_positive + validation.false_negative > 0 {
            log::info!(
                "budget {}: {} false positives, {} false negatives",
                self.budget,
                validation.false_positive,
                validation.false_negative
            );
        }
        self.validation = validation;
        validation
    }

    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        self.polygons
            .iter()
            .flat_map(|polygon| std::iter::once(&polygon.outer).chain(polygon.holes.iter()))
    }

    pub fn statistics(&self) -> Statistics {
        let mut octilinear = 0.0;
        let mut turn_count = 0;
        let mut histogram = [0; HISTOGRAM_BINS];
        for ring in self.rings() {
            for (a, b) in ring_segments(ring) {
                if is_octilinear(b - a) {
                    octilinear += a.distance(b);
                }
            }
            for index in 0..ring.len() {
                let previous = ring[(index + ring.len() - 1) % ring.len()];
                let next = ring[(index + 1) % ring.len()];
                let angle = turn_angle(ring[index] - previous, next - ring[index]);
                if angle.abs() > ANGLE_EPSILON {
                    turn_count += 1;
                    histogram[histogram_bin(angle)] += 1;
                }
            }
        }

        let perimeter: f64 = self.rings().map(|ring| ring_perimeter(ring)).sum();
        let holes = self.polygons.iter().flat_map(|polygon| polygon.holes.iter());
        Statistics {
            perimeter,
            octilinear_fraction: if perimeter > 0.0 {
                octilinear / perimeter
            } else {
                0.0
            },
            area: self.polygons.iter().map(|polygon| polygon.area()).sum(),
            hole_count: holes.clone().count(),
            hole_area: holes.map(|hole| signed_area(hole).abs()).sum(),
            turn_count,
            histogram,
        }
    }

    pub fn load(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn dump(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::timezone::*;

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ]
    }

    fn framed_square() -> Timezone {
        let mut hole = vec![
            Point::new(4.0, 4.0),
            Point::new(6.0, 4.0),
            Point::new(5.0, 6.0),
        ];
        hole.reverse();
        Timezone {
            budget: 60.0,
            polygons: vec![IsoPolygon {
                outer: square(0.0, 10.0),
                holes: vec![hole],
                diagnostic: None,
            }],
            validation: Validation::default(),
            diagnostic: None,
        }
    }

    #[test]
    fn statistics() {
        let statistics = framed_square().statistics();
        assert_eq!(statistics.hole_count, 1);
        assert_eq!(statistics.hole_area, 2.0);
        assert_eq!(statistics.area, 98.0);
        assert_eq!(statistics.turn_count, 7);
        // four left turns of the outer ring, three right turns of the hole
        assert_eq!(statistics.histogram[12], 4);
        assert_eq!(statistics.histogram.iter().sum::<usize>(), 7);
        let hole_perimeter = 2.0 + 2.0 * 5.0_f64.sqrt();
        assert!((statistics.perimeter - 40.0 - hole_perimeter).abs() < 1e-9);
        assert!((statistics.octilinear_fraction - 42.0 / statistics.perimeter).abs() < 1e-9);
    }

    #[test]
    fn json_round_trip() -> Result<(), Error> {
        let timezone = framed_square();
        assert_eq!(Timezone::load(&timezone.dump()?)?, timezone);
        Ok(())
    }
}
