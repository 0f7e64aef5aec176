mod arrangement;
mod boundary;
mod config;
mod dual;
mod identifier;
mod inserter;
mod iso_map;
mod min_distance;
mod octilinear;
mod region;
mod timezone;
mod turn_cost;
mod visualization;

pub use arrangement::{build_arrangement, Arrangement, ArrangementGraph};
pub use boundary::BoundaryBuilder;
pub use config::{FaceStrategy, ToleranceConfig, VisualizationConfig};
pub use dual::{DualNode, LinearDual, VisGraph};
pub use identifier::{build_dcel, FaceChain, FaceIdentifier, IsoDcel, IsoFace};
pub use inserter::{is_split_node, NodeInserter};
pub use iso_map::{IsoMap, IsoPolygon, IsoRing};
pub use min_distance::MinimumDistanceBuilder;
pub use octilinear::OctilinearBuilder;
pub use region::Region;
pub use timezone::{Statistics, Timezone, Validation};
pub use turn_cost::{compute_turn_cost, histogram_bin, is_octilinear, turn_angle};
pub use visualization::{FaceBuilder, FaceVisualization, Visualizer};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
    #[error("Planar error: {0}")]
    PlanarError(#[from] planar::Error),
    #[error("DCEL error: {0}")]
    DcelError(#[from] dcel::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Face boundary from split {0} never reaches another split")]
    BrokenChain(usize),
    #[error("Network has no nodes")]
    EmptyNetwork,
}
