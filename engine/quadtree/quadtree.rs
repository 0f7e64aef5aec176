use crate::quadrant::{QuadMap, Quadrant, QUADRANTS};
use crate::rect::Rect;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Expected branch, but got leaf")]
    ExpectedBranch(),
    #[error("Expected leaf, but got branch")]
    ExpectedLeaf(),
    #[error("Max depth exceeded: {0}")]
    MaxDepthExceeded(u32),
    #[error("Coordinates out of bounds: {0}, {1}")]
    CoordsOutOfBounds(f64, f64),
}

/** Sequence of quadrants leading from the root to a node. */
pub type Path = Vec<Quadrant>;

#[derive(Debug, PartialEq, Clone)]
pub struct VisitData {
    pub path: Path,
    pub depth: u32,
    pub bounds: Rect,
}

impl VisitData {
    pub fn child(&self, quadrant: Quadrant) -> Self {
        let mut path = self.path.clone();
        path.push(quadrant);
        Self {
            path,
            depth: self.depth + 1,
            bounds: self.bounds.child(quadrant),
        }
    }

    pub fn quadrant_for_coords(&self, x: f64, y: f64) -> Result<Quadrant, Error> {
        if self.bounds.contains(x, y) {
            Ok(self.bounds.quadrant_of(x, y))
        } else {
            Err(Error::CoordsOutOfBounds(x, y))
        }
    }
}

pub trait Visitor<B, L, E> {
    fn visit_branch_pre(&mut self, branch: &B, data: &VisitData) -> Result<bool, E>;
    fn visit_leaf(&mut self, leaf: &L, data: &VisitData) -> Result<(), E>;
    fn visit_branch_post(&mut self, branch: &B, data: &VisitData) -> Result<(), E>;
}

#[derive(Debug, Clone)]
enum Node<B, L> {
    Branch {
        data: B,
        children: QuadMap<Box<Node<B, L>>>,
    },
    Leaf {
        data: L,
    },
}

impl<B, L> Node<B, L> {
    fn get(&self, quadrant: Quadrant) -> Result<&Node<B, L>, Error> {
        match self {
            Node::Branch { children, .. } => Ok(&*children[quadrant]),
            Node::Leaf { .. } => Err(Error::ExpectedBranch()),
        }
    }

    fn get_mut(&mut self, quadrant: Quadrant) -> Result<&mut Node<B, L>, Error> {
        match self {
            Node::Branch { children, .. } => Ok(&mut *children[quadrant]),
            Node::Leaf { .. } => Err(Error::ExpectedBranch()),
        }
    }

    fn visit<V, E>(&self, visitor: &mut V, visit_data: VisitData) -> Result<(), E>
    where
        V: Visitor<B, L, E>,
    {
        match self {
            Node::Branch { data, children } => {
                if visitor.visit_branch_pre(data, &visit_data)? {
                    for quadrant in QUADRANTS {
                        children[quadrant].visit(visitor, visit_data.child(quadrant))?;
                    }
                }
                visitor.visit_branch_post(data, &visit_data)
            }
            Node::Leaf { data } => visitor.visit_leaf(data, &visit_data),
        }
    }

    fn into_leaves(self, leaves: &mut Vec<L>) {
        match self {
            Node::Branch { children, .. } => {
                for child in children.into_values() {
                    child.into_leaves(leaves);
                }
            }
            Node::Leaf { data } => leaves.push(data),
        }
    }
}

/**
 * A region quadtree over a square of world coordinates. Branches and leaves carry their own
 * data; leaves are only ever turned into branches through `split`.
 */
#[derive(Debug, Clone)]
pub struct Quadtree<B, L> {
    root: Box<Node<B, L>>,
    bounds: Rect,
    /** The maximum allowable depth of nodes below the root node */
    max_depth: u32,
}

impl<B, L> Quadtree<B, L> {
    pub fn new(data: L, bounds: Rect, max_depth: u32) -> Quadtree<B, L> {
        Quadtree {
            root: Box::new(Node::Leaf { data }),
            bounds,
            max_depth,
        }
    }

    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn get(&self, path: &[Quadrant]) -> Result<&Node<B, L>, Error> {
        let mut node: &Node<B, L> = &self.root;
        for quadrant in path {
            node = node.get(*quadrant)?;
        }
        Ok(node)
    }

    fn get_mut(&mut self, path: &[Quadrant]) -> Result<&mut Node<B, L>, Error> {
        let mut node: &mut Node<B, L> = &mut self.root;
        for quadrant in path {
            node = node.get_mut(*quadrant)?;
        }
        Ok(node)
    }

    pub fn get_branch(&self, path: &[Quadrant]) -> Result<&B, Error> {
        match self.get(path)? {
            Node::Branch { data, .. } => Ok(data),
            Node::Leaf { .. } => Err(Error::ExpectedBranch()),
        }
    }

    pub fn get_leaf(&self, path: &[Quadrant]) -> Result<&L, Error> {
        match self.get(path)? {
            Node::Leaf { data } => Ok(data),
            Node::Branch { .. } => Err(Error::ExpectedLeaf()),
        }
    }

    pub fn get_leaf_mut(&mut self, path: &[Quadrant]) -> Result<&mut L, Error> {
        match self.get_mut(path)? {
            Node::Leaf { data } => Ok(data),
            Node::Branch { .. } => Err(Error::ExpectedLeaf()),
        }
    }

    /**
     * Turns the leaf at `path` into a branch with four new leaves. The old leaf data is
     * returned so the caller can redistribute it.
     */
    pub fn split(
        &mut self,
        path: &[Quadrant],
        data: B,
        child_data: QuadMap<L>,
    ) -> Result<L, Error> {
        if path.len() as u32 + 1 > self.max_depth {
            return Err(Error::MaxDepthExceeded(self.max_depth));
        }

        let existing = self.get_mut(path)?;
        if let Node::Branch { .. } = existing {
            return Err(Error::ExpectedLeaf());
        }
        let branch = Node::Branch {
            data,
            children: child_data.map_into(|data| Box::new(Node::Leaf { data })),
        };
        match std::mem::replace(existing, branch) {
            Node::Leaf { data } => Ok(data),
            Node::Branch { .. } => Err(Error::ExpectedLeaf()),
        }
    }

    /** Descends to the leaf containing (x, y). */
    pub fn get_visit_data(&self, x: f64, y: f64) -> Result<VisitData, Error> {
        let mut visit_data = self.root_visit_data();
        let mut node: &Node<B, L> = &self.root;
        loop {
            match node {
                Node::Leaf { .. } => return Ok(visit_data),
                Node::Branch { children, .. } => {
                    let quadrant = visit_data.quadrant_for_coords(x, y)?;
                    node = &*children[quadrant];
                    visit_data = visit_data.child(quadrant);
                }
            }
        }
    }

    fn root_visit_data(&self) -> VisitData {
        VisitData {
            path: Vec::new(),
            depth: 0,
            bounds: self.bounds,
        }
    }

    pub fn visit<V, E>(&self, visitor: &mut V) -> Result<(), E>
    where
        V: Visitor<B, L, E>,
    {
        self.root.visit(visitor, self.root_visit_data())
    }

    pub fn visit_rect<V, E>(&self, visitor: &mut V, bounds: &Rect) -> Result<(), E>
    where
        V: Visitor<B, L, E>,
    {
        self.visit(&mut RectVisitor {
            bounds,
            inner: visitor,
            phantom: std::marker::PhantomData::default(),
        })
    }

    /** Consumes the tree, returning all leaf data in depth-first order. */
    pub fn into_leaves(self) -> Vec<L> {
        let mut leaves = Vec::new();
        self.root.into_leaves(&mut leaves);
        leaves
    }
}

struct RectVisitor<'a, 'b, V, B, L, E>
where
    V: Visitor<B, L, E>,
{
    bounds: &'a Rect,
    inner: &'b mut V,
    phantom: std::marker::PhantomData<(B, L, E)>,
}

impl<'a, 'b, V, B, L, E> Visitor<B, L, E> for RectVisitor<'a, 'b, V, B, L, E>
where
    V: Visitor<B, L, E>,
{
    fn visit_branch_pre(&mut self, branch: &B, data: &VisitData) -> Result<bool, E> {
        Ok(data.bounds.intersects(self.bounds) && self.inner.visit_branch_pre(branch, data)?)
    }

    fn visit_leaf(&mut self, leaf: &L, data: &VisitData) -> Result<(), E> {
        if data.bounds.intersects(self.bounds) {
            self.inner.visit_leaf(leaf, data)?;
        }
        Ok(())
    }

    fn visit_branch_post(&mut self, branch: &B, data: &VisitData) -> Result<(), E> {
        self.inner.visit_branch_post(branch, data)
    }
}
