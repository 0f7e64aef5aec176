use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::quadrant::{QuadMap, QUADRANTS};
use crate::quadtree::{Error, Quadtree, VisitData, Visitor};
use crate::rect::Rect;

#[derive(Debug, Clone)]
pub struct Entry<T> {
    pub x: f64,
    pub y: f64,
    pub data: T,
}

/**
 * Point store used to look up graph nodes by coordinate. Backed by a quadtree whose leaves
 * split once they hold more than `load_factor` entries. The root bounds grow on demand, so
 * any finite coordinate can be inserted.
 */
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    qtree: Quadtree<(), Vec<Entry<T>>>,
    load_factor: usize,
    count: usize,
}

pub trait NeighborsVisitor<T, E> {
    fn visit(&mut self, entry: &T, x: f64, y: f64, distance: f64) -> Result<(), E>;
}

impl<T> SpatialIndex<T> {
    pub fn new(load_factor: usize, max_depth: u32) -> Self {
        Self::with_bounds(Rect::xywh(0.0, 0.0, 1.0, 1.0), load_factor, max_depth)
    }

    pub fn with_bounds(bounds: Rect, load_factor: usize, max_depth: u32) -> Self {
        Self {
            qtree: Quadtree::new(Vec::new(), bounds, max_depth),
            load_factor: load_factor.max(1),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn bounds(&self) -> &Rect {
        self.qtree.bounds()
    }

    pub fn insert(&mut self, x: f64, y: f64, data: T) -> Result<(), Error> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::CoordsOutOfBounds(x, y));
        }
        if !self.qtree.bounds().contains(x, y) {
            self.grow_to(x, y)?;
        }
        let visit_data = self.qtree.get_visit_data(x, y)?;
        self.qtree
            .get_leaf_mut(&visit_data.path)?
            .push(Entry { x, y, data });
        self.count += 1;
        self.split_if_needed(visit_data)
    }

    /**
     * Removes the first entry at exactly (x, y) whose data matches `predicate`.
     */
    pub fn remove<F>(&mut self, x: f64, y: f64, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let visit_data = self.qtree.get_visit_data(x, y).ok()?;
        let leaf = self.qtree.get_leaf_mut(&visit_data.path).ok()?;
        let index = leaf
            .iter()
            .position(|entry| entry.x == x && entry.y == y && predicate(&entry.data))?;
        self.count -= 1;
        Some(leaf.swap_remove(index).data)
    }

    fn grow_to(&mut self, x: f64, y: f64) -> Result<(), Error> {
        let bounds = self.qtree.bounds().expanded_to(x, y);
        log::debug!(
            "growing spatial index to [{:.1}, {:.1}] x [{:.1}, {:.1}]",
            bounds.min_x,
            bounds.max_x,
            bounds.min_y,
            bounds.max_y
        );
        let max_depth = self.qtree.max_depth();
        let old = std::mem::replace(&mut self.qtree, Quadtree::new(Vec::new(), bounds, max_depth));
        self.count = 0;
        for entry in old.into_leaves().into_iter().flatten() {
            self.insert(entry.x, entry.y, entry.data)?;
        }
        Ok(())
    }

    fn split_if_needed(&mut self, visit_data: VisitData) -> Result<(), Error> {
        let max_depth = self.qtree.max_depth();
        let len = self.qtree.get_leaf(&visit_data.path)?.len();
        if len > self.load_factor && visit_data.depth < max_depth {
            let mut quads = QuadMap::each(Vec::new);
            let entries = self
                .qtree
                .split(&visit_data.path, (), QuadMap::each(Vec::new))?;
            for entry in entries {
                quads[visit_data.quadrant_for_coords(entry.x, entry.y)?].push(entry);
            }
            for quadrant in QUADRANTS {
                let child = visit_data.child(quadrant);
                *self.qtree.get_leaf_mut(&child.path)? = std::mem::take(&mut quads[quadrant]);
                // everything could have landed in one quadrant, so keep going down
                self.split_if_needed(child)?;
            }
        }
        Ok(())
    }

    pub fn visit_radius<V, E>(&self, visitor: &mut V, x: f64, y: f64, radius: f64) -> Result<(), E>
    where
        V: NeighborsVisitor<T, E>,
    {
        let mut visitor = CircleVisitor {
            x,
            y,
            radius,
            visitor,
            phantom: std::marker::PhantomData::default(),
        };
        self.qtree.visit(&mut visitor)
    }
}

impl<T: Clone> SpatialIndex<T> {
    /** The entry closest to (x, y), if it lies within `epsilon`. */
    pub fn find_exact(&self, x: f64, y: f64, epsilon: f64) -> Option<T> {
        let mut visitor = NearestNeighborsVisitor::new();
        let _: Result<(), ()> = self.visit_radius(&mut visitor, x, y, epsilon);
        visitor.nearest.into_values().flatten().next()
    }

    pub fn find_nearest_k(&self, x: f64, y: f64, k: usize) -> Vec<T> {
        if k == 0 || self.is_empty() {
            return Vec::new();
        }

        // start with a small neighborhood and double it until we have enough entries
        let bounds = self.qtree.bounds();
        let limit = (bounds.width().powi(2) + bounds.height().powi(2)).sqrt()
            + (x - bounds.center().0).abs()
            + (y - bounds.center().1).abs();
        let mut radius = (bounds.width() / 100.0).max(f64::EPSILON);
        loop {
            let mut visitor = NearestNeighborsVisitor::new();
            let _: Result<(), ()> = self.visit_radius(&mut visitor, x, y, radius);
            if visitor.count >= k || radius >= limit {
                return visitor.nearest.into_values().flatten().take(k).collect();
            }
            radius *= 2.0;
        }
    }

    pub fn find_nearest(&self, x: f64, y: f64) -> Option<T> {
        self.find_nearest_k(x, y, 1).into_iter().next()
    }
}

struct CircleVisitor<'a, V, T, E>
where
    V: NeighborsVisitor<T, E>,
{
    x: f64,
    y: f64,
    radius: f64,
    visitor: &'a mut V,
    phantom: std::marker::PhantomData<(T, E)>,
}

impl<'a, V, T, E> Visitor<(), Vec<Entry<T>>, E> for CircleVisitor<'a, V, T, E>
where
    V: NeighborsVisitor<T, E>,
{
    fn visit_branch_pre(&mut self, _branch: &(), data: &VisitData) -> Result<bool, E> {
        Ok(data.bounds.intersects_circle(self.x, self.y, self.radius))
    }

    fn visit_leaf(&mut self, leaf: &Vec<Entry<T>>, _data: &VisitData) -> Result<(), E> {
        for entry in leaf {
            let distance = ((entry.x - self.x).powi(2) + (entry.y - self.y).powi(2)).sqrt();
            if distance <= self.radius {
                self.visitor.visit(&entry.data, entry.x, entry.y, distance)?;
            }
        }
        Ok(())
    }

    fn visit_branch_post(&mut self, _branch: &(), _data: &VisitData) -> Result<(), E> {
        Ok(())
    }
}

struct NearestNeighborsVisitor<T> {
    // several entries can share a distance, so keep all of them in insertion order
    nearest: BTreeMap<OrderedFloat<f64>, Vec<T>>,
    count: usize,
}

impl<T> NearestNeighborsVisitor<T> {
    fn new() -> Self {
        Self {
            nearest: BTreeMap::new(),
            count: 0,
        }
    }
}

impl<T: Clone, E> NeighborsVisitor<T, E> for NearestNeighborsVisitor<T> {
    fn visit(&mut self, entry: &T, _x: f64, _y: f64, distance: f64) -> Result<(), E> {
        self.nearest
            .entry(OrderedFloat(distance))
            .or_insert_with(Vec::new)
            .push(entry.clone());
        self.count += 1;
        Ok(())
    }
}
