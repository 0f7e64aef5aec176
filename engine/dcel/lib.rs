mod dcel;

pub use crate::dcel::{
    find_outer_arc, Dcel, Face, FaceCycle, FaceId, HalfEdge, HalfEdgeId, Vertex, VertexId,
};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
    #[error("Arc {0} has no reverse arc")]
    MissingTwin(usize),
    #[error("More than one arc from {0} to {1}")]
    DuplicateArc(usize, usize),
    #[error("Ring through half-edge {0} does not close")]
    OpenRing(usize),
}
