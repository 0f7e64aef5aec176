use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Vector2};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use network::Point;

/** Rejects segment pairs whose cross product falls below this. */
pub const PARALLEL_EPSILON: f64 = 1e-6;
/** Crossings this close to a segment endpoint are touches, not crossings. */
pub const ENDPOINT_EPSILON: f64 = 1e-6;

pub type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>);

pub fn point_key(point: Point) -> PointKey {
    (OrderedFloat(point.x), OrderedFloat(point.y))
}

pub fn key_point(key: &PointKey) -> Point {
    Point::new(key.0 .0, key.1 .0)
}

pub fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/** Lexicographic (x, y) order of two points. */
pub fn lexicographic(a: Point, b: Point) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    Collinear,
}

pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let value = cross(b - a, c - a);
    if value.abs() < PARALLEL_EPSILON {
        Orientation::Collinear
    } else if value > 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Clockwise
    }
}

/**
 * An undirected segment. The endpoints are stored in lexicographic order, so `a` is where a
 * left-to-right sweep first meets the segment.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub a: Point,
    pub b: Point,
}

impl LineSegment {
    pub fn new(p: Point, q: Point) -> Self {
        if lexicographic(p, q) == std::cmp::Ordering::Greater {
            Self { a: q, b: p }
        } else {
            Self { a: p, b: q }
        }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn direction(&self) -> Vector2<f64> {
        self.b - self.a
    }

    pub fn is_vertical(&self) -> bool {
        (self.b.x - self.a.x).abs() < f64::EPSILON
    }

    /** Slope used to order segments through a common point; vertical is steepest. */
    pub fn slope(&self) -> f64 {
        if self.is_vertical() {
            f64::INFINITY
        } else {
            (self.b.y - self.a.y) / (self.b.x - self.a.x)
        }
    }

    /** The y coordinate at `x`. Vertical segments report `fallback` clamped to their span. */
    pub fn y_at(&self, x: f64, fallback: f64) -> f64 {
        if self.is_vertical() {
            fallback.max(self.a.y.min(self.b.y)).min(self.a.y.max(self.b.y))
        } else {
            let t = (x - self.a.x) / (self.b.x - self.a.x);
            self.a.y + t * (self.b.y - self.a.y)
        }
    }

    /** Position of `point` projected on the segment, 0 at `a` and 1 at `b`. */
    pub fn parameter(&self, point: Point) -> f64 {
        let direction = self.direction();
        let length2 = direction.magnitude2();
        if length2 == 0.0 {
            0.0
        } else {
            (point - self.a).dot(direction) / length2
        }
    }

    pub fn point_at(&self, t: f64) -> Point {
        self.a + self.direction() * t
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    pub fn distance_to_point(&self, point: Point) -> f64 {
        let t = self.parameter(point).max(0.0).min(1.0);
        self.point_at(t).distance(point)
    }
}

/**
 * Proper crossing point of two segments. Near-parallel pairs and crossings close to any of the
 * four endpoints are not crossings.
 */
pub fn intersect(
    first: &LineSegment,
    second: &LineSegment,
    parallel_epsilon: f64,
    endpoint_epsilon: f64,
) -> Option<Point> {
    let r = first.direction();
    let s = second.direction();
    let denominator = cross(r, s);
    if denominator.abs() < parallel_epsilon {
        return None;
    }

    let offset = second.a - first.a;
    let t = cross(offset, s) / denominator;
    let u = cross(offset, r) / denominator;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let point = first.point_at(t);
    let endpoints = [first.a, first.b, second.a, second.b];
    if endpoints
        .iter()
        .any(|endpoint| endpoint.distance(point) < endpoint_epsilon)
    {
        return None;
    }
    Some(point)
}

/** Shoelace area, positive for counter-clockwise rings. The ring is implicitly closed. */
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (index, point) in ring.iter().enumerate() {
        let next = ring[(index + 1) % ring.len()];
        sum += point.x * next.y - next.x * point.y;
    }
    sum / 2.0
}

pub fn is_counter_clockwise(ring: &[Point]) -> bool {
    signed_area(ring) > 0.0
}

pub fn ring_perimeter(ring: &[Point]) -> f64 {
    ring_segments(ring).map(|(a, b)| a.distance(b)).sum()
}

pub fn ring_segments(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |index| (ring[index], ring[(index + 1) % ring.len()]))
}

pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::origin();
    }
    let sum = points
        .iter()
        .fold(Vector2::new(0.0, 0.0), |sum, point| sum + point.to_vec());
    Point::from_vec(sum / points.len() as f64)
}

/** Even-odd ray casting. Points on the boundary may land on either side. */
pub fn point_in_ring(point: Point, ring: &[Point]) -> bool {
    let mut inside = false;
    for (a, b) in ring_segments(ring) {
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

pub fn point_on_ring(point: Point, ring: &[Point], epsilon: f64) -> bool {
    ring_segments(ring).any(|(a, b)| LineSegment::new(a, b).distance_to_point(point) < epsilon)
}

/** Whether the open segment `a`-`b` properly crosses any edge of the ring. */
pub fn segment_crosses_ring(a: Point, b: Point, ring: &[Point]) -> bool {
    let segment = LineSegment::new(a, b);
    ring_segments(ring).any(|(p, q)| {
        intersect(
            &segment,
            &LineSegment::new(p, q),
            PARALLEL_EPSILON,
            ENDPOINT_EPSILON,
        )
        .is_some()
    })
}

/**
 * Drops consecutive duplicates and collinear points, which also removes the tips of zero-area
 * spikes. The closing duplicate of a closed ring is removed as well.
 */
pub fn cleanup_ring(ring: &[Point], epsilon: f64) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(ring.len());
    for point in ring {
        if points
            .last()
            .map_or(true, |last| last.distance(*point) > epsilon)
        {
            points.push(*point);
        }
    }
    while points.len() > 1 && points[0].distance(points[points.len() - 1]) <= epsilon {
        points.pop();
    }

    let mut changed = true;
    while changed && points.len() >= 3 {
        changed = false;
        let mut index = 0;
        while index < points.len() && points.len() >= 3 {
            let previous = points[(index + points.len() - 1) % points.len()];
            let current = points[index];
            let next = points[(index + 1) % points.len()];
            if current.distance(previous) <= epsilon
                || cross(current - previous, next - current).abs() <= epsilon
            {
                points.remove(index);
                changed = true;
            } else {
                index += 1;
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use crate::geometry::*;
    use float_cmp::assert_approx_eq;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn canonical_order() {
        let segment = LineSegment::new(p(1.0, 0.0), p(0.0, 5.0));
        assert_eq!(segment.a, p(0.0, 5.0));
        assert_eq!(segment.b, p(1.0, 0.0));
        let vertical = LineSegment::new(p(0.0, 3.0), p(0.0, 1.0));
        assert_eq!(vertical.a, p(0.0, 1.0));
        assert!(vertical.is_vertical());
    }

    #[test]
    fn crossing() {
        let first = LineSegment::new(p(0.0, 0.0), p(2.0, 2.0));
        let second = LineSegment::new(p(0.0, 2.0), p(2.0, 0.0));
        let point = intersect(&first, &second, PARALLEL_EPSILON, ENDPOINT_EPSILON);
        assert_eq!(point, Some(p(1.0, 1.0)));
    }

    #[test]
    fn touching_is_not_crossing() {
        let first = LineSegment::new(p(0.0, 0.0), p(2.0, 0.0));
        let touching = LineSegment::new(p(1.0, 0.0), p(1.0, 3.0));
        assert_eq!(
            intersect(&first, &touching, PARALLEL_EPSILON, ENDPOINT_EPSILON),
            None
        );
        let parallel = LineSegment::new(p(0.0, 1.0), p(2.0, 1.0));
        assert_eq!(
            intersect(&first, &parallel, PARALLEL_EPSILON, ENDPOINT_EPSILON),
            None
        );
        let apart = LineSegment::new(p(3.0, -1.0), p(3.0, 1.0));
        assert_eq!(
            intersect(&first, &apart, PARALLEL_EPSILON, ENDPOINT_EPSILON),
            None
        );
    }

    #[test]
    fn rings() {
        let square = vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        assert_approx_eq!(f64, signed_area(&square), 4.0);
        assert!(is_counter_clockwise(&square));
        let reversed: Vec<Point> = square.iter().rev().copied().collect();
        assert_approx_eq!(f64, signed_area(&reversed), -4.0);

        assert!(point_in_ring(p(1.0, 1.0), &square));
        assert!(!point_in_ring(p(3.0, 1.0), &square));
        assert!(point_on_ring(p(2.0, 1.0), &square, 1e-9));
        assert!(segment_crosses_ring(p(1.0, 1.0), p(3.0, 1.0), &square));
        assert!(!segment_crosses_ring(p(0.5, 0.5), p(1.5, 1.5), &square));
        assert_approx_eq!(f64, ring_perimeter(&square), 8.0);
    }

    #[test]
    fn cleanup() {
        let ring = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(0.0, 0.0),
        ];
        assert_eq!(
            cleanup_ring(&ring, 1e-12),
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]
        );

        // spike out and back along the same line
        let spiky = vec![p(0.0, 0.0), p(2.0, 0.0), p(3.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)];
        assert_eq!(
            cleanup_ring(&spiky, 1e-12),
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)]
        );
    }
}
