use serde::{Deserialize, Serialize};

use network::Point;
use planar::{point_in_ring, point_on_ring, ring_segments};

/** A polygon with holes, used as the drawing area of one face. */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

impl Region {
    pub fn new(outer: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { outer, holes }
    }

    pub fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.rings().flat_map(|ring| ring_segments(ring))
    }

    pub fn on_boundary(&self, point: Point, epsilon: f64) -> bool {
        self.rings().any(|ring| point_on_ring(point, ring, epsilon))
    }

    /** Strictly inside: within the outer ring and outside every hole. */
    pub fn contains(&self, point: Point) -> bool {
        point_in_ring(point, &self.outer)
            && !self.holes.iter().any(|hole| point_in_ring(point, hole))
    }

    pub fn covers(&self, point: Point, epsilon: f64) -> bool {
        self.on_boundary(point, epsilon) || self.contains(point)
    }

    /** Perimeter of all rings. */
    pub fn perimeter(&self) -> f64 {
        self.rings().map(|ring| planar::ring_perimeter(ring)).sum()
    }
}

#[cfg(test)]
mod tests {
    use crate::region::*;

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ]
    }

    #[test]
    fn containment_with_hole() {
        let region = Region::new(square(0.0, 10.0), vec![square(4.0, 6.0)]);
        assert!(region.contains(Point::new(1.0, 1.0)));
        assert!(!region.contains(Point::new(5.0, 5.0)));
        assert!(!region.contains(Point::new(11.0, 5.0)));
        assert!(region.covers(Point::new(4.0, 5.0), 1e-9));
        assert!(region.covers(Point::new(10.0, 3.0), 1e-9));
        assert_eq!(region.perimeter(), 48.0);
    }
}
