use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryBuilder;
use crate::min_distance::MinimumDistanceBuilder;
use crate::octilinear::OctilinearBuilder;
use crate::visualization::Visualizer;

/** How the boundary between two split nodes is drawn across a face. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceStrategy {
    Octilinear,
    MinimumDistance,
    Boundary,
}

impl FaceStrategy {
    pub fn visualizer(
        &self,
        config: &VisualizationConfig,
        tolerance: &ToleranceConfig,
    ) -> Visualizer {
        use FaceStrategy::*;
        match self {
            Octilinear => OctilinearBuilder::new(*config, *tolerance).into(),
            MinimumDistance => MinimumDistanceBuilder::new(*config, *tolerance).into(),
            Boundary => BoundaryBuilder::new(*config).into(),
        }
    }
}

impl std::fmt::Display for FaceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use FaceStrategy::*;
        match self {
            Octilinear => write!(f, "octilinear"),
            MinimumDistance => write!(f, "minimum-distance"),
            Boundary => write!(f, "boundary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    pub strategy: FaceStrategy,
    /** Cost of one 45° step of turning. */
    pub turn_weight: f64,
    /** Cost of one meter of boundary. */
    pub distance_weight: f64,
    /** Length multiplier for segments that are not a multiple of 45°. */
    pub non_octilinear_malus: f64,
    /** Turn cost of a reversal, in 45° steps. */
    pub weight_uturn: f64,
    /** How many times the input-output segment may be halved for extra grid lines. */
    pub max_densify_levels: u32,
    /** Maximum distance between boundary samples, in meters. */
    pub sample_spacing: f64,
    pub max_samples: usize,
    /** In meters. */
    pub boundary_offset: f64,
    /** Extra distance between the network and the enclosing frame, in meters. */
    pub frame_margin: f64,
    /** Length of the unreachable stub at the road end of each anchor, in meters. */
    pub anchor_gap: f64,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            strategy: FaceStrategy::Octilinear,
            turn_weight: 50.0,
            distance_weight: 1.0,
            non_octilinear_malus: 2.0,
            weight_uturn: 100.0,
            max_densify_levels: 3,
            sample_spacing: 25.0,
            max_samples: 400,
            boundary_offset: 1.0,
            frame_margin: 100.0,
            anchor_gap: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /** Event points closer than this are merged by the sweep. */
    pub sweep_epsilon: f64,
    pub parallel_epsilon: f64,
    pub endpoint_epsilon: f64,
    /** Used when simplifying the final rings. */
    pub cleanup_epsilon: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            sweep_epsilon: 1e-5,
            parallel_epsilon: planar::PARALLEL_EPSILON,
            endpoint_epsilon: planar::ENDPOINT_EPSILON,
            cleanup_epsilon: 1e-12,
        }
    }
}

impl ToleranceConfig {
    pub fn planarizer(&self) -> planar::Planarizer {
        planar::Planarizer::new(planar::Tolerance {
            sweep: self.sweep_epsilon,
            parallel: self.parallel_epsilon,
            endpoint: self.endpoint_epsilon,
        })
    }
}
