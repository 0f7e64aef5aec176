use std::cmp::Ordering;
use std::collections::binary_heap::BinaryHeap;

use ordered_float::OrderedFloat;

use network::NodeHandle;

use crate::common::Error;
use crate::graph::RoutingGraph;
use crate::iterator::{NodeIterator, Successors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    distance: OrderedFloat<f64>,
    node: NodeHandle,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // always order by distance first
        if self.distance == other.distance {
            self.node.cmp(&other.node)
        } else {
            self.distance.cmp(&other.distance)
        }
        // NOTE: reverse ordering so that we get a min queue
        .reverse()
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/**
 * Time-dependent Dijkstra over a `RoutingGraph`. The per-node arrays survive between runs and
 * are invalidated by bumping a generation stamp, so repeated queries on the same graph do not
 * reallocate.
 */
#[derive(Debug, Clone)]
pub struct Router {
    iterator: NodeIterator,
    distance: Vec<f64>,
    predecessor: Vec<Option<NodeHandle>>,
    /// a node's entries are valid iff its stamp equals `generation`
    stamp: Vec<u32>,
    settled: Vec<u32>,
    generation: u32,
    heap: BinaryHeap<QueueEntry>,
    successors: Vec<(NodeHandle, f64)>,
    settled_count: usize,
    source: Option<NodeHandle>,
}

impl Router {
    pub fn new<I: Into<NodeIterator>>(iterator: I) -> Self {
        Self {
            iterator: iterator.into(),
            distance: Vec::new(),
            predecessor: Vec::new(),
            stamp: Vec::new(),
            settled: Vec::new(),
            generation: 0,
            heap: BinaryHeap::new(),
            successors: Vec::new(),
            settled_count: 0,
            source: None,
        }
    }

    pub fn iterator(&self) -> &NodeIterator {
        &self.iterator
    }

    fn reset(&mut self, node_count: usize) {
        if self.stamp.len() != node_count {
            self.distance = vec![f64::INFINITY; node_count];
            self.predecessor = vec![None; node_count];
            self.stamp = vec![0; node_count];
            self.settled = vec![0; node_count];
            self.generation = 0;
        }
        if self.generation == u32::MAX {
            self.stamp.iter_mut().for_each(|stamp| *stamp = 0);
            self.settled.iter_mut().for_each(|stamp| *stamp = 0);
            self.generation = 0;
        }
        self.generation += 1;
        self.heap.clear();
        self.settled_count = 0;
        self.source = None;
    }

    fn tentative(&self, node: NodeHandle) -> f64 {
        if self.stamp[node.0] == self.generation {
            self.distance[node.0]
        } else {
            f64::INFINITY
        }
    }

    /**
     * Runs from `source`, which is reached at absolute time `start_time`. Before a node is
     * settled, `visitor` is called with the node and its distance; the search stops without
     * settling it as soon as the visitor returns false.
     */
    pub fn run<F>(
        &mut self,
        graph: &RoutingGraph,
        source: NodeHandle,
        start_time: f64,
        mut visitor: F,
    ) -> Result<(), Error>
    where
        F: FnMut(NodeHandle, f64) -> bool,
    {
        if source.0 >= graph.node_count() {
            return Err(Error::UnknownSourceNode(source.0));
        }
        self.reset(graph.node_count());
        self.source = Some(source);

        let generation = self.generation;
        self.stamp[source.0] = generation;
        self.distance[source.0] = 0.0;
        self.predecessor[source.0] = None;
        self.heap.push(QueueEntry {
            distance: OrderedFloat(0.0),
            node: source,
        });

        let mut successors = std::mem::take(&mut self.successors);
        while let Some(QueueEntry { distance, node }) = self.heap.pop() {
            let distance = distance.into_inner();
            if self.settled[node.0] == generation || distance > self.distance[node.0] {
                continue;
            }
            if !visitor(node, distance) {
                break;
            }
            self.settled[node.0] = generation;
            self.settled_count += 1;

            successors.clear();
            self.iterator
                .successors(graph, node, start_time + distance, &mut successors);
            for (next, weight) in successors.iter() {
                if self.settled[next.0] == generation {
                    continue;
                }
                let candidate = distance + weight.max(0.0);
                if candidate < self.tentative(*next) {
                    self.stamp[next.0] = generation;
                    self.distance[next.0] = candidate;
                    self.predecessor[next.0] = Some(node);
                    self.heap.push(QueueEntry {
                        distance: OrderedFloat(candidate),
                        node: *next,
                    });
                }
            }
        }
        self.successors = successors;

        log::debug!(
            "settled {} of {} nodes from {}",
            self.settled_count,
            graph.node_count(),
            source
        );
        Ok(())
    }

    /** Settles every node within `budget + buffer` seconds of the source. */
    pub fn run_with_budget(
        &mut self,
        graph: &RoutingGraph,
        source: NodeHandle,
        start_time: f64,
        budget: f64,
        buffer: f64,
    ) -> Result<(), Error> {
        let limit = budget + buffer;
        self.run(graph, source, start_time, |_, distance| distance <= limit)
    }

    pub fn source(&self) -> Option<NodeHandle> {
        self.source
    }

    pub fn is_settled(&self, node: NodeHandle) -> bool {
        self.settled.get(node.0) == Some(&self.generation) && self.generation > 0
    }

    /** Travel time to a settled node, infinity for every other node. */
    pub fn distance(&self, node: NodeHandle) -> f64 {
        if self.is_settled(node) {
            self.distance[node.0]
        } else {
            f64::INFINITY
        }
    }

    pub fn predecessor(&self, node: NodeHandle) -> Option<NodeHandle> {
        if self.is_settled(node) {
            self.predecessor[node.0]
        } else {
            None
        }
    }

    /** Nodes from the source to `target`, empty if the target was not settled. */
    pub fn path(&self, target: NodeHandle) -> Vec<NodeHandle> {
        if !self.is_settled(target) {
            return Vec::new();
        }
        let mut path = vec![target];
        let mut current = target;
        while let Some(previous) = self.predecessor(current) {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        path
    }

    pub fn settled_count(&self) -> usize {
        self.settled_count
    }
}
