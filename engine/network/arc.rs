use serde::{Deserialize, Serialize};

use crate::node::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArcHandle(pub usize);

impl ArcHandle {
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ArcHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc<T> {
    pub id: ArcHandle,
    pub data: T,
    pub(crate) source: NodeHandle,
    pub(crate) target: NodeHandle,
}

impl<T> Arc<T> {
    pub(crate) fn new(id: ArcHandle, data: T, source: NodeHandle, target: NodeHandle) -> Self {
        Self {
            id,
            data,
            source,
            target,
        }
    }

    pub fn source(&self) -> NodeHandle {
        self.source
    }

    pub fn target(&self) -> NodeHandle {
        self.target
    }

    /** The endpoint opposite to `node`. */
    pub fn opposite(&self, node: NodeHandle) -> NodeHandle {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}
