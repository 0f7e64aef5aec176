use serde::{Deserialize, Serialize};

/** Quadrants of a cell, with y growing towards the south. */
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    NW = 0,
    NE = 1,
    SW = 2,
    SE = 3,
}

pub static QUADRANTS: [Quadrant; 4] = [Quadrant::NW, Quadrant::NE, Quadrant::SW, Quadrant::SE];

impl Quadrant {
    fn index(self) -> usize {
        self as usize
    }

    pub fn from_sides(right: bool, bottom: bool) -> Self {
        use Quadrant::*;
        match (right, bottom) {
            (false, false) => NW,
            (true, false) => NE,
            (false, true) => SW,
            (true, true) => SE,
        }
    }
}

/** One value per quadrant. */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadMap<T> {
    data: [T; 4],
}

impl<T> QuadMap<T> {
    pub fn new(nw: T, ne: T, sw: T, se: T) -> Self {
        QuadMap {
            data: [nw, ne, sw, se],
        }
    }

    pub fn each<F>(f: F) -> Self
    where
        F: Fn() -> T,
    {
        Self::new(f(), f(), f(), f())
    }

    pub fn map_into<U, F>(self, f: F) -> QuadMap<U>
    where
        F: FnMut(T) -> U,
    {
        QuadMap {
            data: self.data.map(f),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn into_values(self) -> impl Iterator<Item = T> {
        self.data.into_iter()
    }
}

impl<T> std::ops::Index<Quadrant> for QuadMap<T> {
    type Output = T;
    fn index(&self, quadrant: Quadrant) -> &T {
        &self.data[quadrant.index()]
    }
}

impl<T> std::ops::IndexMut<Quadrant> for QuadMap<T> {
    fn index_mut(&mut self, quadrant: Quadrant) -> &mut T {
        &mut self.data[quadrant.index()]
    }
}
