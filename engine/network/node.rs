use serde::{Deserialize, Serialize};

use crate::arc::ArcHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeHandle(pub usize);

impl NodeHandle {
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node<T> {
    pub id: NodeHandle,
    pub data: T,
    incoming: Vec<ArcHandle>,
    outgoing: Vec<ArcHandle>,
}

impl<T> Node<T> {
    pub(crate) fn new(id: NodeHandle, data: T) -> Self {
        Self {
            id,
            data,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn incoming_arcs(&self) -> &[ArcHandle] {
        &self.incoming
    }

    pub fn outgoing_arcs(&self) -> &[ArcHandle] {
        &self.outgoing
    }

    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }

    pub(crate) fn add_incoming(&mut self, id: ArcHandle) {
        self.incoming.push(id);
    }

    pub(crate) fn add_outgoing(&mut self, id: ArcHandle) {
        self.outgoing.push(id);
    }

    /// O(n), but the lists should be very small
    pub(crate) fn remove_incoming(&mut self, id: ArcHandle) {
        self.incoming.retain(|incoming| *incoming != id);
    }

    /// O(n), but the lists should be very small
    pub(crate) fn remove_outgoing(&mut self, id: ArcHandle) {
        self.outgoing.retain(|outgoing| *outgoing != id);
    }

    pub(crate) fn rename_arc(&mut self, from: ArcHandle, to: ArcHandle) {
        for arc in self.incoming.iter_mut().chain(self.outgoing.iter_mut()) {
            if *arc == from {
                *arc = to;
            }
        }
    }

    pub(crate) fn clear_arcs(&mut self) {
        self.incoming.clear();
        self.outgoing.clear();
    }

    pub(crate) fn outgoing_mut(&mut self) -> &mut Vec<ArcHandle> {
        &mut self.outgoing
    }
}
