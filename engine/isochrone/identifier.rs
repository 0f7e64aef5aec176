use std::collections::{HashMap, VecDeque};

use cgmath::MetricSpace;

use dcel::{find_outer_arc, Dcel, FaceId, HalfEdgeId};
use network::{ColoredNode, NodeHandle, Point};
use planar::{intersect, LineSegment, PARALLEL_EPSILON};

use crate::arrangement::ArrangementGraph;
use crate::region::Region;
use crate::Error;

pub type IsoDcel = Dcel<ColoredNode, (), ()>;

pub fn build_dcel(graph: &ArrangementGraph) -> Result<IsoDcel, Error> {
    let outer = find_outer_arc(graph).ok_or(Error::EmptyNetwork)?;
    Ok(Dcel::from_graph(graph, outer, |node| node.data, |_| (), |_| ())?)
}

/**
 * The part of a face the isochrone boundary has to cross: it enters at the `input` split, and
 * leaves at the `output` split. Between the two, the face boundary runs along one reachable
 * side and one unreachable side. The way through the face has to keep the reachable side on
 * its left.
 */
#[derive(Debug, Clone)]
pub struct IsoFace {
    pub id: usize,
    pub face: FaceId,
    pub input: NodeHandle,
    pub output: NodeHandle,
    /** Face boundary from the input split, along the unreachable side, to the output split. */
    pub boundary: Vec<Point>,
    /**
     * Face boundary from the input split, back along the reachable side, to the output split.
     * The face lies on its right.
     */
    pub reachable: Vec<Point>,
    pub region: Region,
    pub predecessor: usize,
    pub successor: usize,
    pub diagnostic: Option<String>,
}

impl IsoFace {
    pub fn start(&self) -> Point {
        self.boundary[0]
    }

    pub fn end(&self) -> Point {
        self.boundary[self.boundary.len() - 1]
    }

    /** Leaves and re-enters the face at the same split, around a dead end of the component. */
    pub fn is_loop(&self) -> bool {
        self.input == self.output
    }

    /**
     * Whether the segment touches the reachable side anywhere but at the splits. A drawn
     * boundary doing so would leave reachable roads on the polygon outline.
     */
    pub fn touches_reachable(&self, a: Point, b: Point, epsilon: f64) -> bool {
        let at_split = |point: Point| {
            point.distance(self.start()) < epsilon || point.distance(self.end()) < epsilon
        };
        let segment = LineSegment::new(a, b);
        self.reachable.windows(2).any(|pair| {
            let side = LineSegment::new(pair[0], pair[1]);
            intersect(&segment, &side, PARALLEL_EPSILON, epsilon).is_some()
                || pair
                    .iter()
                    .any(|point| !at_split(*point) && segment.distance_to_point(*point) < epsilon)
                || [a, b]
                    .iter()
                    .any(|point| !at_split(*point) && side.distance_to_point(*point) < epsilon)
        })
    }

    fn add_diagnostic(&mut self, message: String) {
        self.diagnostic = Some(match self.diagnostic.take() {
            Some(existing) => format!("{}; {}", existing, message),
            None => message,
        });
    }
}

/** Faces in boundary order. The output of each face is the input of the next. */
#[derive(Debug, Clone)]
pub struct FaceChain {
    pub faces: Vec<IsoFace>,
    /** Reachable component the chain runs around. */
    pub component: usize,
}

impl FaceChain {
    pub fn is_closed(&self) -> bool {
        match (self.faces.first(), self.faces.last()) {
            (Some(first), Some(last)) => last.output == first.input,
            _ => false,
        }
    }
}

pub struct FaceIdentifier<'a> {
    graph: &'a ArrangementGraph,
    dcel: &'a IsoDcel,
    is_split: Vec<bool>,
    split_nodes: Vec<NodeHandle>,
}

impl<'a> FaceIdentifier<'a> {
    pub fn new(graph: &'a ArrangementGraph, dcel: &'a IsoDcel, split_nodes: &[NodeHandle]) -> Self {
        let mut is_split = vec![false; graph.graph().node_count()];
        for split in split_nodes {
            is_split[split.0] = true;
        }
        Self {
            graph,
            dcel,
            is_split,
            split_nodes: split_nodes.to_vec(),
        }
    }

    /**
     * Walks each face from the split entering it to the split leaving it, and links the faces
     * into closed chains. Every chain is one ring of the final isochrone: counter-clockwise
     * around a reachable component, or clockwise around an unreachable pocket inside one.
     *
     * A face is left through the unreachable arc of its input split. Its reachable side is
     * found by walking the face boundary backwards from there, until the split where that side
     * begins, which is the output. The reachable side only passes reachable nodes, so a chain
     * never leaves its component.
     */
    pub fn identify_faces(&self) -> Result<Vec<FaceChain>, Error> {
        let groups = self.group_splits();

        let mut component_of: HashMap<NodeHandle, usize> = HashMap::new();
        let mut by_input: HashMap<NodeHandle, IsoFace> = HashMap::new();
        for (component, group) in groups.iter().enumerate() {
            if group.len() < 2 {
                log::debug!("ignoring reachable component {} with a single split", component);
                continue;
            }
            for split in group {
                component_of.insert(*split, component);
                if let Some(face) = self.walk_face(*split)? {
                    by_input.insert(*split, face);
                }
            }
        }

        let mut starts: Vec<NodeHandle> = by_input.keys().copied().collect();
        starts.sort_by(|a, b| {
            planar::lexicographic(self.graph.position(*a), self.graph.position(*b))
        });

        let mut chains = Vec::new();
        let mut next_id = 0;
        for start in starts {
            if !by_input.contains_key(&start) {
                continue;
            }
            let mut faces: Vec<IsoFace> = Vec::new();
            let mut current = start;
            while let Some(face) = by_input.remove(&current) {
                current = face.output;
                faces.push(face);
                if current == start {
                    break;
                }
            }
            if current != start {
                log::warn!("face chain from split {} does not close at {}", start, current);
                if let Some(last) = faces.last_mut() {
                    last.add_diagnostic(format!("chain does not close at split {}", current));
                }
            }

            let count = faces.len();
            for (index, face) in faces.iter_mut().enumerate() {
                face.id = next_id + index;
                face.predecessor = next_id + (index + count - 1) % count;
                face.successor = next_id + (index + 1) % count;
            }
            next_id += count;
            chains.push(FaceChain {
                faces,
                component: component_of.get(&start).copied().unwrap_or_default(),
            });
        }

        log::debug!(
            "identified {} faces in {} chains",
            next_id,
            chains.len()
        );
        Ok(chains)
    }

    /** Splits grouped by the reachable component they border. */
    fn group_splits(&self) -> Vec<Vec<NodeHandle>> {
        let graph = self.graph.graph();
        let mut label = vec![usize::MAX; graph.node_count()];
        let mut groups = Vec::new();
        for split in &self.split_nodes {
            if label[split.0] != usize::MAX {
                continue;
            }
            let mut group = Vec::new();
            let mut queue = VecDeque::from([*split]);
            label[split.0] = groups.len();
            while let Some(node) = queue.pop_front() {
                if self.is_split[node.0] {
                    group.push(node);
                }
                for arc in graph.outgoing(node) {
                    let target = arc.target();
                    if label[target.0] == usize::MAX && graph.node(target).data.is_reachable() {
                        label[target.0] = groups.len();
                        queue.push_back(target);
                    }
                }
            }
            groups.push(group);
        }
        groups
    }

    fn walk_face(&self, split: NodeHandle) -> Result<Option<IsoFace>, Error> {
        let graph = self.graph.graph();
        let exits: Vec<HalfEdgeId> = graph
            .outgoing(split)
            .filter(|arc| !graph.node(arc.target()).data.is_reachable())
            .map(|arc| self.dcel.half_edge_of(arc.id))
            .collect();
        let exit = match exits.as_slice() {
            [exit] => *exit,
            _ => {
                log::warn!(
                    "split {} has {} unreachable neighbors, skipping it",
                    split,
                    exits.len()
                );
                return Ok(None);
            }
        };
        let face = self.dcel.incident_face(exit);
        let limit = self.dcel.half_edge_count();

        let mut reachable = vec![self.graph.position(split)];
        let mut first = self.dcel.prev(exit);
        let mut steps = 0;
        let output = loop {
            let origin = NodeHandle(self.dcel.origin(first).0);
            reachable.push(self.graph.position(origin));
            if self.is_split[origin.0] {
                break origin;
            }
            if !graph.node(origin).data.is_reachable() {
                log::warn!(
                    "reachable side of face {} from split {} ends at unreachable node {}",
                    face,
                    split,
                    origin
                );
                return Ok(None);
            }
            steps += 1;
            if steps > limit {
                return Err(Error::BrokenChain(split.0));
            }
            first = self.dcel.prev(first);
        };

        // the half-edge arriving at the output from its unreachable side
        let entry = self.dcel.prev(first);
        let mut boundary = vec![self.graph.position(split)];
        let mut current = exit;
        for _ in 0..=limit {
            boundary.push(self.graph.position(NodeHandle(self.dcel.target(current).0)));
            if current == entry {
                return Ok(Some(IsoFace {
                    id: 0,
                    face,
                    input: split,
                    output,
                    boundary,
                    reachable,
                    region: self.region(face),
                    predecessor: 0,
                    successor: 0,
                    diagnostic: None,
                }));
            }
            current = self.dcel.next(current);
        }
        Err(Error::BrokenChain(split.0))
    }

    fn region(&self, face: FaceId) -> Region {
        let mut rings = self
            .dcel
            .face_rings(face)
            .into_iter()
            .map(|ring| self.dcel.ring_points(&ring));
        if self.dcel.face(face).outer_component.is_some() {
            let outer = rings.next().unwrap_or_default();
            Region::new(outer, rings.collect())
        } else {
            Region::new(Vec::new(), rings.collect())
        }
    }
}
