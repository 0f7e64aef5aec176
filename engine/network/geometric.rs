use cgmath::MetricSpace;

use quadtree::{Rect, SpatialIndex};

use crate::arc::{Arc, ArcHandle};
use crate::graph::DiGraph;
use crate::node::NodeHandle;
use crate::Error;

pub type Point = cgmath::Point2<f64>;

/** Two coordinates closer than this are considered the same vertex. */
pub const COORDINATE_EPSILON: f64 = 1e-5;

const INDEX_LOAD_FACTOR: usize = 8;
const INDEX_MAX_DEPTH: u32 = 24;

pub trait Located {
    fn position(&self) -> Point;
}

impl Located for Point {
    fn position(&self) -> Point {
        *self
    }
}

/**
 * A `DiGraph` whose nodes are embedded in the plane. No two nodes share a coordinate (up to
 * the epsilon), which is enforced by a spatial index kept in sync with the graph.
 */
#[derive(Debug, Clone)]
pub struct GeometricGraph<N: Located, A> {
    graph: DiGraph<N, A>,
    index: SpatialIndex<NodeHandle>,
    epsilon: f64,
}

impl<N: Located, A> Default for GeometricGraph<N, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Located, A> GeometricGraph<N, A> {
    pub fn new() -> Self {
        Self::with_epsilon(COORDINATE_EPSILON)
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            graph: DiGraph::new(),
            index: SpatialIndex::new(INDEX_LOAD_FACTOR, INDEX_MAX_DEPTH),
            epsilon,
        }
    }

    /** Indexes an existing graph. Fails if two of its nodes share a coordinate. */
    pub fn from_graph(graph: DiGraph<N, A>) -> Result<Self, Error> {
        let mut index = SpatialIndex::new(INDEX_LOAD_FACTOR, INDEX_MAX_DEPTH);
        for node in graph.nodes() {
            let point = node.data.position();
            if index.find_exact(point.x, point.y, COORDINATE_EPSILON).is_some() {
                return Err(Error::DuplicateCoordinate(point.x, point.y));
            }
            index.insert(point.x, point.y, node.id)?;
        }
        Ok(Self {
            graph,
            index,
            epsilon: COORDINATE_EPSILON,
        })
    }

    pub fn graph(&self) -> &DiGraph<N, A> {
        &self.graph
    }

    pub fn into_graph(self) -> DiGraph<N, A> {
        self.graph
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /**
     * Adds a node, unless another node already occupies its coordinate, in which case `None`
     * is returned and the data is dropped.
     */
    pub fn add_node(&mut self, data: N) -> Result<Option<NodeHandle>, Error> {
        let point = data.position();
        if self.node_at(point).is_some() {
            return Ok(None);
        }
        let id = self.graph.add_node(data);
        self.index.insert(point.x, point.y, id)?;
        Ok(Some(id))
    }

    /** Like `add_node`, but an occupied coordinate is an error. */
    pub fn try_add_node(&mut self, data: N) -> Result<NodeHandle, Error> {
        let point = data.position();
        self.add_node(data)?
            .ok_or(Error::DuplicateCoordinate(point.x, point.y))
    }

    pub fn add_or_get_node(&mut self, data: N) -> Result<NodeHandle, Error> {
        match self.node_at(data.position()) {
            Some(existing) => Ok(existing),
            None => self.try_add_node(data),
        }
    }

    pub fn node_at(&self, point: Point) -> Option<NodeHandle> {
        self.index.find_exact(point.x, point.y, self.epsilon)
    }

    pub fn nearest_node(&self, point: Point) -> Option<NodeHandle> {
        self.index.find_nearest(point.x, point.y)
    }

    pub fn position(&self, node: NodeHandle) -> Point {
        self.graph.node(node).data.position()
    }

    /**
     * Mutable access to node data. The position must not change through this reference,
     * otherwise the index goes stale.
     */
    pub fn node_data_mut(&mut self, node: NodeHandle) -> &mut N {
        &mut self.graph.node_mut(node).data
    }

    pub fn arc_data_mut(&mut self, arc: ArcHandle) -> &mut A {
        &mut self.graph.arc_mut(arc).data
    }

    pub fn add_arc(&mut self, source: NodeHandle, target: NodeHandle, data: A) -> ArcHandle {
        self.graph.add_arc(source, target, data)
    }

    pub fn remove_arc(&mut self, arc: ArcHandle) -> Arc<A> {
        self.graph.remove_arc(arc)
    }

    pub fn retain_arcs<F>(&mut self, keep: F)
    where
        F: FnMut(&Arc<A>) -> bool,
    {
        self.graph.retain_arcs(keep)
    }

    pub fn update_ids(&mut self) {
        self.graph.update_ids()
    }

    pub fn sort_outgoing_by<F>(&mut self, compare: F)
    where
        F: FnMut(&[crate::node::Node<N>], &Arc<A>, &Arc<A>) -> std::cmp::Ordering,
    {
        self.graph.sort_outgoing_by(compare)
    }

    pub fn remove_node(&mut self, node: NodeHandle) -> Result<N, Error> {
        if !self.graph.contains_node(node) {
            return Err(Error::InvalidNode(node.0));
        }
        let point = self.position(node);
        self.index.remove(point.x, point.y, |entry| *entry == node);

        let (data, moved) = self.graph.remove_node(node);
        if let Some(old) = moved {
            let moved_point = self.position(node);
            self.index
                .remove(moved_point.x, moved_point.y, |entry| *entry == old);
            self.index.insert(moved_point.x, moved_point.y, node)?;
        }
        Ok(data)
    }

    pub fn arc_segment(&self, arc: ArcHandle) -> (Point, Point) {
        let arc = self.graph.arc(arc);
        (self.position(arc.source()), self.position(arc.target()))
    }

    pub fn arc_length(&self, arc: ArcHandle) -> f64 {
        let (source, target) = self.arc_segment(arc);
        source.distance(target)
    }

    /** Bounding box of all nodes, or `None` for an empty graph. */
    pub fn bounds(&self) -> Option<Rect> {
        let mut nodes = self.graph.nodes().iter().map(|node| node.data.position());
        let first = nodes.next()?;
        Some(nodes.fold(
            Rect::xywh(first.x, first.y, 0.0, 0.0),
            |rect, point| Rect {
                min_x: rect.min_x.min(point.x),
                max_x: rect.max_x.max(point.x),
                min_y: rect.min_y.min(point.y),
                max_y: rect.max_y.max(point.y),
            },
        ))
    }

    pub fn map<N2: Located, A2, FN, FA>(
        &self,
        node_f: FN,
        arc_f: FA,
    ) -> Result<GeometricGraph<N2, A2>, Error>
    where
        FN: FnMut(&crate::node::Node<N>) -> N2,
        FA: FnMut(&Arc<A>) -> A2,
    {
        GeometricGraph::from_graph(self.graph.map(node_f, arc_f))
    }
}

#[cfg(test)]
mod tests {
    use crate::geometric::*;

    fn point(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn coordinate_uniqueness() -> Result<(), Error> {
        let mut graph: GeometricGraph<Point, ()> = GeometricGraph::new();
        let a = graph.add_node(point(0.0, 0.0))?;
        assert_eq!(a, Some(NodeHandle(0)));
        assert_eq!(graph.add_node(point(0.0, 0.000001))?, None);
        assert_eq!(
            graph.try_add_node(point(0.0, 0.0)),
            Err(Error::DuplicateCoordinate(0.0, 0.0))
        );
        assert_eq!(graph.add_or_get_node(point(0.0, 0.0))?, NodeHandle(0));
        assert_eq!(graph.add_or_get_node(point(5.0, -3.0))?, NodeHandle(1));
        assert_eq!(graph.graph().node_count(), 2);
        Ok(())
    }

    #[test]
    fn lookup_and_length() -> Result<(), Error> {
        let mut graph: GeometricGraph<Point, ()> = GeometricGraph::new();
        let a = graph.try_add_node(point(0.0, 0.0))?;
        let b = graph.try_add_node(point(3.0, 4.0))?;
        let arc = graph.add_arc(a, b, ());

        assert_eq!(graph.arc_length(arc), 5.0);
        assert_eq!(graph.node_at(point(3.0, 4.0)), Some(b));
        assert_eq!(graph.nearest_node(point(2.0, 2.0)), Some(b));
        assert_eq!(graph.bounds(), Some(quadtree::Rect::xywh(0.0, 0.0, 3.0, 4.0)));
        Ok(())
    }

    #[test]
    fn remove_node_keeps_index() -> Result<(), Error> {
        let mut graph: GeometricGraph<Point, ()> = GeometricGraph::new();
        let a = graph.try_add_node(point(0.0, 0.0))?;
        let b = graph.try_add_node(point(1.0, 0.0))?;
        let c = graph.try_add_node(point(2.0, 0.0))?;
        graph.add_arc(a, b, ());
        graph.add_arc(b, c, ());

        assert_eq!(graph.remove_node(a)?, point(0.0, 0.0));
        // c moved into slot 0
        assert_eq!(graph.node_at(point(2.0, 0.0)), Some(NodeHandle(0)));
        assert_eq!(graph.node_at(point(0.0, 0.0)), None);
        assert_eq!(graph.graph().arc_count(), 1);
        graph.graph().validate();

        assert_eq!(graph.remove_node(NodeHandle(7)), Err(Error::InvalidNode(7)));
        Ok(())
    }

    #[test]
    fn duplicate_in_source_graph() {
        let mut raw: DiGraph<Point, ()> = DiGraph::new();
        raw.add_node(point(1.0, 1.0));
        raw.add_node(point(1.0, 1.0));
        assert!(GeometricGraph::from_graph(raw).is_err());
    }
}
