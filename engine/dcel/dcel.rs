use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use network::{Arc, ArcHandle, GeometricGraph, Located, Node, NodeHandle, Point};
use planar::{point_in_ring, signed_area};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HalfEdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub usize);

impl FaceId {
    /** The unbounded face always comes first. */
    pub const UNBOUNDED: FaceId = FaceId(0);

    pub fn is_unbounded(&self) -> bool {
        *self == Self::UNBOUNDED
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for HalfEdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Vertex<V> {
    pub point: Point,
    pub incident: Option<HalfEdgeId>,
    pub data: V,
}

#[derive(Debug, Clone)]
pub struct HalfEdge<E> {
    pub origin: VertexId,
    pub twin: HalfEdgeId,
    pub next: HalfEdgeId,
    pub prev: HalfEdgeId,
    pub face: FaceId,
    pub data: E,
}

#[derive(Debug, Clone)]
pub struct Face<F> {
    /** `None` for the unbounded face. */
    pub outer_component: Option<HalfEdgeId>,
    /** One half-edge on each hole boundary. */
    pub inner_components: Vec<HalfEdgeId>,
    pub data: F,
}

/**
 * Half-edge structure over a planar graph in which every arc has a reverse arc. Vertex and
 * half-edge ids equal the node and arc handles of the source graph. Each half-edge has its
 * face on the left, so bounded faces run counter-clockwise and holes clockwise.
 */
#[derive(Debug, Clone)]
pub struct Dcel<V, E, F> {
    vertices: Vec<Vertex<V>>,
    half_edges: Vec<HalfEdge<E>>,
    faces: Vec<Face<F>>,
}

/**
 * The outgoing arc of the leftmost vertex with the largest angle, which has the unbounded
 * face on its left.
 */
pub fn find_outer_arc<N: Located, A>(graph: &GeometricGraph<N, A>) -> Option<ArcHandle> {
    let leftmost = graph
        .graph()
        .nodes()
        .iter()
        .filter(|node| !node.outgoing_arcs().is_empty())
        .min_by(|a, b| planar::lexicographic(a.data.position(), b.data.position()))?;
    let origin = leftmost.data.position();
    graph
        .graph()
        .outgoing(leftmost.id)
        .max_by(|a, b| {
            angle(origin, graph.position(a.target()))
                .total_cmp(&angle(origin, graph.position(b.target())))
        })
        .map(|arc| arc.id)
}

fn angle(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

impl<V, E, F> Dcel<V, E, F> {
    pub fn from_graph<N, A, VF, EF, FF>(
        graph: &GeometricGraph<N, A>,
        outer_arc: ArcHandle,
        mut vertex_data: VF,
        mut edge_data: EF,
        mut face_data: FF,
    ) -> Result<Self, Error>
    where
        N: Located,
        VF: FnMut(&Node<N>) -> V,
        EF: FnMut(&Arc<A>) -> E,
        FF: FnMut(FaceId) -> F,
    {
        let arcs = graph.graph().arcs();

        let mut by_endpoints: HashMap<(NodeHandle, NodeHandle), ArcHandle> = HashMap::new();
        for arc in arcs {
            if by_endpoints
                .insert((arc.source(), arc.target()), arc.id)
                .is_some()
            {
                return Err(Error::DuplicateArc(arc.source().0, arc.target().0));
            }
        }
        let mut twins = Vec::with_capacity(arcs.len());
        for arc in arcs {
            match by_endpoints.get(&(arc.target(), arc.source())) {
                Some(twin) if arc.source() != arc.target() => twins.push(HalfEdgeId(twin.0)),
                _ => return Err(Error::MissingTwin(arc.id.0)),
            }
        }

        // outgoing half-edges around each vertex, counter-clockwise
        let mut stars: Vec<Vec<HalfEdgeId>> = graph
            .graph()
            .nodes()
            .iter()
            .map(|node| {
                node.outgoing_arcs()
                    .iter()
                    .map(|arc| HalfEdgeId(arc.0))
                    .collect()
            })
            .collect();
        for (index, star) in stars.iter_mut().enumerate() {
            let origin = graph.position(NodeHandle(index));
            star.sort_by(|a, b| {
                angle(origin, graph.position(arcs[a.0].target()))
                    .total_cmp(&angle(origin, graph.position(arcs[b.0].target())))
            });
        }
        let mut star_position = vec![0; arcs.len()];
        for star in stars.iter() {
            for (position, he) in star.iter().enumerate() {
                star_position[he.0] = position;
            }
        }

        let vertices: Vec<Vertex<V>> = graph
            .graph()
            .nodes()
            .iter()
            .map(|node| Vertex {
                point: node.data.position(),
                incident: stars[node.id.0].first().copied(),
                data: vertex_data(node),
            })
            .collect();

        // next(u -> v) is the outgoing half-edge at v just clockwise of v -> u
        let mut next = vec![HalfEdgeId(0); arcs.len()];
        let mut prev = vec![HalfEdgeId(0); arcs.len()];
        for arc in arcs {
            let twin = twins[arc.id.0];
            let star = &stars[arc.target().0];
            let position = (star_position[twin.0] + star.len() - 1) % star.len();
            let successor = star[position];
            next[arc.id.0] = successor;
            prev[successor.0] = HalfEdgeId(arc.id.0);
        }

        let mut half_edges: Vec<HalfEdge<E>> = arcs
            .iter()
            .map(|arc| HalfEdge {
                origin: VertexId(arc.source().0),
                twin: twins[arc.id.0],
                next: next[arc.id.0],
                prev: prev[arc.id.0],
                face: FaceId::UNBOUNDED,
                data: edge_data(arc),
            })
            .collect();

        // flood-mark every ring, the outer ring first
        let mut ring_of = vec![usize::MAX; arcs.len()];
        let mut rings: Vec<Vec<HalfEdgeId>> = Vec::new();
        let starts =
            std::iter::once(HalfEdgeId(outer_arc.0)).chain((0..arcs.len()).map(HalfEdgeId));
        for start in starts {
            if ring_of[start.0] != usize::MAX {
                continue;
            }
            let mut ring = Vec::new();
            let mut current = start;
            loop {
                if ring_of[current.0] != usize::MAX {
                    return Err(Error::OpenRing(start.0));
                }
                ring_of[current.0] = rings.len();
                ring.push(current);
                current = next[current.0];
                if current == start {
                    break;
                }
            }
            rings.push(ring);
        }

        let ring_points = |ring: &Vec<HalfEdgeId>| -> Vec<Point> {
            ring.iter()
                .map(|he| vertices[half_edges[he.0].origin.0].point)
                .collect()
        };
        let components = connected_components(graph);

        let mut faces: Vec<Face<F>> = vec![Face {
            outer_component: None,
            inner_components: vec![HalfEdgeId(outer_arc.0)],
            data: face_data(FaceId::UNBOUNDED),
        }];
        let mut face_of_ring = vec![FaceId::UNBOUNDED; rings.len()];
        let mut bounded: Vec<(usize, f64)> = Vec::new();
        for (index, ring) in rings.iter().enumerate().skip(1) {
            let area = signed_area(&ring_points(ring));
            if area > 0.0 {
                let id = FaceId(faces.len());
                faces.push(Face {
                    outer_component: Some(ring[0]),
                    inner_components: Vec::new(),
                    data: face_data(id),
                });
                face_of_ring[index] = id;
                bounded.push((index, area));
            }
        }
        bounded.sort_by(|a, b| a.1.total_cmp(&b.1));

        for (index, ring) in rings.iter().enumerate().skip(1) {
            if face_of_ring[index] != FaceId::UNBOUNDED {
                continue;
            }
            let origin = half_edges[ring[0].0].origin;
            let component = components[origin.0];
            let sample = vertices[origin.0].point;
            let container = bounded
                .iter()
                .find(|(candidate, _)| {
                    let candidate_origin = half_edges[rings[*candidate][0].0].origin;
                    components[candidate_origin.0] != component
                        && point_in_ring(sample, &ring_points(&rings[*candidate]))
                })
                .map(|(candidate, _)| face_of_ring[*candidate])
                .unwrap_or(FaceId::UNBOUNDED);
            face_of_ring[index] = container;
            faces[container.0].inner_components.push(ring[0]);
        }

        for (index, ring) in rings.iter().enumerate() {
            for he in ring {
                half_edges[he.0].face = face_of_ring[index];
            }
        }

        log::debug!(
            "built DCEL: {} vertices, {} half-edges, {} faces",
            vertices.len(),
            half_edges.len(),
            faces.len()
        );

        Ok(Self {
            vertices,
            half_edges,
            faces,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex<V> {
        &self.vertices[id.0]
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> &HalfEdge<E> {
        &self.half_edges[id.0]
    }

    pub fn face(&self, id: FaceId) -> &Face<F> {
        &self.faces[id.0]
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face<F>)> {
        self.faces
            .iter()
            .enumerate()
            .map(|(index, face)| (FaceId(index), face))
    }

    pub fn twin(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id.0].twin
    }

    pub fn next(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id.0].next
    }

    pub fn prev(&self, id: HalfEdgeId) -> HalfEdgeId {
        self.half_edges[id.0].prev
    }

    pub fn origin(&self, id: HalfEdgeId) -> VertexId {
        self.half_edges[id.0].origin
    }

    pub fn target(&self, id: HalfEdgeId) -> VertexId {
        self.origin(self.twin(id))
    }

    pub fn incident_face(&self, id: HalfEdgeId) -> FaceId {
        self.half_edges[id.0].face
    }

    /** The half-edge standing for an arc of the source graph. */
    pub fn half_edge_of(&self, arc: ArcHandle) -> HalfEdgeId {
        HalfEdgeId(arc.0)
    }

    /** Half-edges of the ring through `start`, beginning with `start`. */
    pub fn face_cycle(&self, start: HalfEdgeId) -> FaceCycle<'_, V, E, F> {
        FaceCycle {
            dcel: self,
            start,
            current: Some(start),
            steps: 0,
        }
    }

    /** Outgoing half-edges of a vertex in counter-clockwise order. */
    pub fn vertex_star(&self, vertex: VertexId) -> Vec<HalfEdgeId> {
        let start = match self.vertices[vertex.0].incident {
            Some(start) => start,
            None => return Vec::new(),
        };
        let mut star = vec![start];
        let mut current = self.twin(self.prev(start));
        while current != start && star.len() <= self.half_edges.len() {
            star.push(current);
            current = self.twin(self.prev(current));
        }
        star
    }

    /** The outer ring (if bounded) followed by the hole rings. */
    pub fn face_rings(&self, face: FaceId) -> Vec<Vec<HalfEdgeId>> {
        let face = &self.faces[face.0];
        face.outer_component
            .iter()
            .chain(face.inner_components.iter())
            .map(|start| self.face_cycle(*start).collect())
            .collect()
    }

    pub fn ring_points(&self, ring: &[HalfEdgeId]) -> Vec<Point> {
        ring.iter()
            .map(|he| self.vertices[self.origin(*he).0].point)
            .collect()
    }

    pub fn outer_ring_points(&self, face: FaceId) -> Option<Vec<Point>> {
        self.faces[face.0]
            .outer_component
            .map(|start| self.ring_points(&self.face_cycle(start).collect::<Vec<_>>()))
    }

    pub fn neighbor_faces(&self, face: FaceId) -> Vec<FaceId> {
        let mut neighbors: Vec<FaceId> = self
            .face_rings(face)
            .iter()
            .flatten()
            .map(|he| self.incident_face(self.twin(*he)))
            .filter(|neighbor| *neighbor != face)
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /**
     * Validates the half-edge structure.
     *
     * Specifically, makes sure that for every half-edge:
     *  - twin(twin(e)) == e, and the twin has a different origin
     *  - prev(next(e)) == e and next(prev(e)) == e
     *  - e and next(e) share a face
     *  - following next from e returns to e within the half-edge count
     *
     * Panics if an issue is found.
     */
    pub fn validate(&self) {
        let mut issue_count = 0;

        for (index, half_edge) in self.half_edges.iter().enumerate() {
            let id = HalfEdgeId(index);
            if self.twin(half_edge.twin) != id {
                log::error!("twin of twin of {} is not itself", id);
                issue_count += 1;
            }
            if self.origin(half_edge.twin) == half_edge.origin {
                log::error!("{} and its twin share an origin", id);
                issue_count += 1;
            }
            if self.prev(half_edge.next) != id {
                log::error!("prev of next of {} is not itself", id);
                issue_count += 1;
            }
            if self.next(half_edge.prev) != id {
                log::error!("next of prev of {} is not itself", id);
                issue_count += 1;
            }
            if self.incident_face(half_edge.next) != half_edge.face {
                log::error!("{} and its successor lie on different faces", id);
                issue_count += 1;
            }
            if self.origin(half_edge.next) != self.target(id) {
                log::error!("successor of {} does not start at its target", id);
                issue_count += 1;
            }

            let mut current = half_edge.next;
            let mut steps = 1;
            while current != id && steps <= self.half_edges.len() {
                current = self.next(current);
                steps += 1;
            }
            if current != id {
                log::error!("ring through {} does not close", id);
                issue_count += 1;
            }
        }

        for (index, face) in self.faces.iter().enumerate() {
            for start in face.outer_component.iter().chain(face.inner_components.iter()) {
                if self.incident_face(*start) != FaceId(index) {
                    log::error!("component {} is not on face {}", start, index);
                    issue_count += 1;
                }
            }
        }

        if issue_count > 0 {
            panic!("Found {} issues", issue_count);
        }
    }
}

pub struct FaceCycle<'a, V, E, F> {
    dcel: &'a Dcel<V, E, F>,
    start: HalfEdgeId,
    current: Option<HalfEdgeId>,
    steps: usize,
}

impl<'a, V, E, F> Iterator for FaceCycle<'a, V, E, F> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        let current = self.current?;
        self.steps += 1;
        let next = self.dcel.next(current);
        self.current = if next == self.start || self.steps >= self.dcel.half_edge_count() {
            None
        } else {
            Some(next)
        };
        Some(current)
    }
}

/** Component label per node, ignoring arc direction. */
fn connected_components<N: Located, A>(graph: &GeometricGraph<N, A>) -> Vec<usize> {
    let count = graph.graph().node_count();
    let mut labels = vec![usize::MAX; count];
    let mut label = 0;
    for start in 0..count {
        if labels[start] != usize::MAX {
            continue;
        }
        let mut stack = vec![NodeHandle(start)];
        labels[start] = label;
        while let Some(node) = stack.pop() {
            for neighbor in graph.graph().neighbors(node) {
                if labels[neighbor.0] == usize::MAX {
                    labels[neighbor.0] = label;
                    stack.push(neighbor);
                }
            }
        }
        label += 1;
    }
    labels
}

#[cfg(test)]
mod tests {
    use crate::dcel::*;

    type TestGraph = GeometricGraph<Point, ()>;

    fn add_edge(graph: &mut TestGraph, a: NodeHandle, b: NodeHandle) {
        graph.add_arc(a, b, ());
        graph.add_arc(b, a, ());
    }

    fn build(graph: &TestGraph) -> Result<Dcel<(), (), ()>, Error> {
        let outer = find_outer_arc(graph).expect("non-empty graph");
        Dcel::from_graph(graph, outer, |_| (), |_| (), |_| ())
    }

    /** A square split by one diagonal. */
    fn square() -> Result<TestGraph, Error> {
        let mut graph = TestGraph::new();
        let a = graph.try_add_node(Point::new(0.0, 0.0))?;
        let b = graph.try_add_node(Point::new(1.0, 0.0))?;
        let c = graph.try_add_node(Point::new(1.0, 1.0))?;
        let d = graph.try_add_node(Point::new(0.0, 1.0))?;
        add_edge(&mut graph, a, b);
        add_edge(&mut graph, b, c);
        add_edge(&mut graph, c, d);
        add_edge(&mut graph, d, a);
        add_edge(&mut graph, a, c);
        Ok(graph)
    }

    #[test]
    fn square_with_diagonal() -> Result<(), Error> {
        let graph = square()?;
        let dcel = build(&graph)?;
        dcel.validate();

        assert_eq!(dcel.face_count(), 3);
        assert_eq!(dcel.face(FaceId::UNBOUNDED).outer_component, None);
        for (id, face) in dcel.faces().skip(1) {
            let ring = dcel.outer_ring_points(id).expect("bounded");
            assert_eq!(ring.len(), 3);
            assert!(signed_area(&ring) > 0.0);
            assert!(face.inner_components.is_empty());
            assert_eq!(dcel.neighbor_faces(id).len(), 2);
        }

        let outer = dcel.face_rings(FaceId::UNBOUNDED);
        assert_eq!(outer.len(), 1);
        assert_eq!(outer[0].len(), 4);
        assert!(signed_area(&dcel.ring_points(&outer[0])) < 0.0);
        Ok(())
    }

    #[test]
    fn vertex_star_is_counter_clockwise() -> Result<(), Error> {
        let graph = square()?;
        let dcel = build(&graph)?;
        let star = dcel.vertex_star(VertexId(0));
        let targets: Vec<VertexId> = star.iter().map(|he| dcel.target(*he)).collect();
        // (1, 0), then (1, 1), then (0, 1)
        assert_eq!(targets, vec![VertexId(1), VertexId(2), VertexId(3)]);
        Ok(())
    }

    #[test]
    fn nested_component_is_a_hole() -> Result<(), Error> {
        let mut graph = TestGraph::new();
        let corners = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let outer: Vec<NodeHandle> = corners
            .iter()
            .map(|(x, y)| graph.try_add_node(Point::new(*x, *y)))
            .collect::<Result<_, _>>()?;
        let inner: Vec<NodeHandle> = corners
            .iter()
            .map(|(x, y)| graph.try_add_node(Point::new(4.0 + x / 5.0, 4.0 + y / 5.0)))
            .collect::<Result<_, _>>()?;
        for ring in [&outer, &inner] {
            for index in 0..4 {
                add_edge(&mut graph, ring[index], ring[(index + 1) % 4]);
            }
        }

        let dcel = build(&graph)?;
        dcel.validate();
        assert_eq!(dcel.face_count(), 3);

        // the big square holds the small one's outside ring as a hole
        let (big, _) = dcel
            .faces()
            .skip(1)
            .max_by(|a, b| {
                let area = |face: FaceId| {
                    signed_area(&dcel.outer_ring_points(face).unwrap_or_default())
                };
                area(a.0).total_cmp(&area(b.0))
            })
            .expect("bounded faces");
        let rings = dcel.face_rings(big);
        assert_eq!(rings.len(), 2);
        assert!(signed_area(&dcel.ring_points(&rings[1])) < 0.0);
        Ok(())
    }

    #[test]
    fn missing_twin() -> Result<(), Error> {
        let mut graph = TestGraph::new();
        let a = graph.try_add_node(Point::new(0.0, 0.0))?;
        let b = graph.try_add_node(Point::new(1.0, 0.0))?;
        graph.add_arc(a, b, ());
        assert_eq!(
            Dcel::<(), (), ()>::from_graph(&graph, ArcHandle(0), |_| (), |_| (), |_| ()).err(),
            Some(Error::MissingTwin(0))
        );
        Ok(())
    }

    #[test]
    fn tree_has_single_ring() -> Result<(), Error> {
        let mut graph = TestGraph::new();
        let center = graph.try_add_node(Point::new(0.0, 0.0))?;
        for (x, y) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)] {
            let leaf = graph.try_add_node(Point::new(x, y))?;
            add_edge(&mut graph, center, leaf);
        }
        let dcel = build(&graph)?;
        dcel.validate();
        assert_eq!(dcel.face_count(), 1);
        assert_eq!(dcel.face_cycle(HalfEdgeId(0)).count(), 6);
        Ok(())
    }
}
