mod geometry;
mod planarizer;
mod sweep;

pub use geometry::{
    centroid, cleanup_ring, cross, intersect, is_counter_clockwise, key_point, lexicographic,
    orientation, point_in_ring, point_key, point_on_ring, ring_perimeter, ring_segments,
    segment_crosses_ring, signed_area, LineSegment, Orientation, PointKey, ENDPOINT_EPSILON,
    PARALLEL_EPSILON,
};
pub use planarizer::{line_key, OriginalLine, PlanarGraph, Planarizer};
pub use sweep::{find_crossings, Crossing, Tolerance};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
}
