use serde::{Deserialize, Serialize};

use crate::quadrant::Quadrant;

/**
 * Axis-aligned bounds in world coordinates. All bounds checks are inclusive, so points on
 * the edge of a rect belong to it.
 */
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        return Self {
            min_x: x,
            max_x: x + w,
            min_y: y,
            max_y: y + h,
        };
    }

    pub fn corners(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        return Self {
            min_x,
            max_x,
            min_y,
            max_y,
        };
    }

    /** A square centered on (x, y). */
    pub fn square(x: f64, y: f64, half_width: f64) -> Self {
        Self::corners(x - half_width, y - half_width, x + half_width, y + half_width)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn intersects_circle(&self, x: f64, y: f64, radius: f64) -> bool {
        let dx = x - x.clamp(self.min_x, self.max_x);
        let dy = y - y.clamp(self.min_y, self.max_y);
        dx * dx + dy * dy <= radius * radius
    }

    /** The quadrant that owns (x, y). Points on the center lines go right and down. */
    pub fn quadrant_of(&self, x: f64, y: f64) -> Quadrant {
        let (center_x, center_y) = self.center();
        Quadrant::from_sides(x >= center_x, y >= center_y)
    }

    pub fn child(&self, quadrant: Quadrant) -> Rect {
        use Quadrant::*;
        let (center_x, center_y) = self.center();
        let (min_x, max_x) = match quadrant {
            NW | SW => (self.min_x, center_x),
            NE | SE => (center_x, self.max_x),
        };
        let (min_y, max_y) = match quadrant {
            NW | NE => (self.min_y, center_y),
            SW | SE => (center_y, self.max_y),
        };
        Rect::corners(min_x, min_y, max_x, max_y)
    }

    /**
     * Returns a square that contains both this rect and (x, y), doubling the width around the
     * current center until the point fits.
     */
    pub fn expanded_to(&self, x: f64, y: f64) -> Rect {
        let (center_x, center_y) = self.center();
        let mut half_width = (self.width().max(self.height()) / 2.0).max(f64::EPSILON);
        let mut rect = Rect::square(center_x, center_y, half_width);
        while !rect.contains(x, y) {
            half_width *= 2.0;
            rect = Rect::square(center_x, center_y, half_width);
        }
        rect
    }
}
