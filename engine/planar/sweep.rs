use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Unbounded};
use std::rc::Rc;

use cgmath::MetricSpace;
use ordered_float::OrderedFloat;

use network::Point;

use crate::geometry::{intersect, point_key, LineSegment, PointKey};

/** Numeric tolerances of the sweep. */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /** Event points closer than this (per axis) are merged. */
    pub sweep: f64,
    pub parallel: f64,
    pub endpoint: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            sweep: 1e-5,
            parallel: crate::geometry::PARALLEL_EPSILON,
            endpoint: crate::geometry::ENDPOINT_EPSILON,
        }
    }
}

/** A point where two or more segments cross in their interiors. */
#[derive(Debug, Clone, PartialEq)]
pub struct Crossing {
    pub point: Point,
    /** Indices into the input slice, ascending. */
    pub segments: Vec<usize>,
}

#[derive(Debug, Default)]
struct Event {
    point: Option<Point>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    crossings: Vec<usize>,
}

/** The sweep line sits at `point`, infinitesimally before or after it. */
#[derive(Debug, Clone, Copy)]
struct Position {
    point: Point,
    after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Entry {
    Segment(usize),
    /** A height on the sweep line, above every segment passing through it. */
    Level(f64),
}

/**
 * Element of the status tree. All keys share the sweep position, so they compare by their
 * height where the sweep line currently is. Segments at the same height are ordered by slope,
 * reversed before the event point.
 */
#[derive(Debug, Clone)]
struct StatusKey<'a> {
    entry: Entry,
    segments: &'a [LineSegment],
    position: Rc<Cell<Position>>,
    epsilon: f64,
}

impl StatusKey<'_> {
    fn segment(&self) -> Option<usize> {
        match self.entry {
            Entry::Segment(segment) => Some(segment),
            Entry::Level(_) => None,
        }
    }

    fn y(&self) -> f64 {
        let point = self.position.get().point;
        match self.entry {
            Entry::Segment(segment) => self.segments[segment].y_at(point.x, point.y),
            Entry::Level(y) => y,
        }
    }
}

impl Ord for StatusKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let (y, other_y) = (self.y(), other.y());
        match (self.entry, other.entry) {
            (Entry::Segment(a), Entry::Segment(b)) => {
                if (y - other_y).abs() > self.epsilon {
                    return y.total_cmp(&other_y);
                }
                let slope = self.segments[a]
                    .slope()
                    .total_cmp(&self.segments[b].slope());
                let slope = if self.position.get().after {
                    slope
                } else {
                    slope.reverse()
                };
                slope.then(a.cmp(&b))
            }
            (Entry::Level(_), Entry::Segment(_)) => y.total_cmp(&other_y).then(Ordering::Greater),
            (Entry::Segment(_), Entry::Level(_)) => y.total_cmp(&other_y).then(Ordering::Less),
            (Entry::Level(_), Entry::Level(_)) => y.total_cmp(&other_y),
        }
    }
}

impl PartialOrd for StatusKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StatusKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StatusKey<'_> {}

struct Sweep<'a> {
    segments: &'a [LineSegment],
    tolerance: Tolerance,
    events: BTreeMap<PointKey, Event>,
    position: Rc<Cell<Position>>,
    /** Active segments, bottom to top at the current sweep position. */
    status: BTreeSet<StatusKey<'a>>,
    crossings: Vec<Crossing>,
}

impl<'a> Sweep<'a> {
    fn new(segments: &'a [LineSegment], tolerance: Tolerance) -> Self {
        Self {
            segments,
            tolerance,
            events: BTreeMap::new(),
            position: Rc::new(Cell::new(Position {
                point: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
                after: true,
            })),
            status: BTreeSet::new(),
            crossings: Vec::new(),
        }
    }

    fn key(&self, entry: Entry) -> StatusKey<'a> {
        StatusKey {
            entry,
            segments: self.segments,
            position: Rc::clone(&self.position),
            epsilon: self.tolerance.sweep,
        }
    }

    fn remove(&mut self, segment: usize) {
        let key = self.key(Entry::Segment(segment));
        if !self.status.remove(&key) {
            // out of order after a crossing lost to tolerance
            self.status.retain(|key| key.entry != Entry::Segment(segment));
        }
    }

    /** Whether `q` comes strictly after `p` in sweep order. */
    fn is_after(&self, q: Point, p: Point) -> bool {
        let eps = self.tolerance.sweep;
        q.x > p.x + eps || ((q.x - p.x).abs() <= eps && q.y > p.y + eps)
    }

    /** The event within tolerance of `point`, creating it if there is none. */
    fn event_at(&mut self, point: Point) -> &mut Event {
        let eps = self.tolerance.sweep;
        let existing = self
            .events
            .range(
                (OrderedFloat(point.x - eps), OrderedFloat(f64::NEG_INFINITY))
                    ..=(OrderedFloat(point.x + eps), OrderedFloat(f64::INFINITY)),
            )
            .map(|(key, _)| *key)
            .find(|key| (key.1 .0 - point.y).abs() <= eps);
        let key = existing.unwrap_or_else(|| point_key(point));
        let event = self.events.entry(key).or_default();
        if event.point.is_none() {
            event.point = Some(point);
        }
        event
    }

    fn check(&mut self, lower: usize, upper: usize, current: Point) {
        let crossing = intersect(
            &self.segments[lower],
            &self.segments[upper],
            self.tolerance.parallel,
            self.tolerance.endpoint,
        );
        if let Some(point) = crossing {
            if self.is_after(point, current) {
                let event = self.event_at(point);
                for segment in [lower, upper] {
                    if !event.crossings.contains(&segment) {
                        event.crossings.push(segment);
                    }
                }
            }
        }
    }

    fn run(mut self) -> Vec<Crossing> {
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.length() <= self.tolerance.sweep {
                continue;
            }
            self.event_at(segment.a).starts.push(index);
            self.event_at(segment.b).ends.push(index);
        }

        while let Some((key, event)) = self.events.pop_first() {
            let point = event.point.unwrap_or_else(|| crate::geometry::key_point(&key));
            self.handle(point, event);
        }

        self.crossings
    }

    fn handle(&mut self, point: Point, event: Event) {
        let eps = self.tolerance.sweep;
        self.position.set(Position {
            point,
            after: false,
        });

        // segments having the event point in their interior
        let mut through: Vec<usize> = event.crossings;
        let low = self.key(Entry::Level(point.y - eps));
        for key in self.status.range(low..) {
            let segment = match key.entry {
                Entry::Segment(segment) => segment,
                Entry::Level(_) => continue,
            };
            if key.y() > point.y + eps {
                break;
            }
            let line = &self.segments[segment];
            if !event.ends.contains(&segment)
                && !through.contains(&segment)
                && line.distance_to_point(point) <= eps
                && line.a.distance(point) > eps
                && line.b.distance(point) > eps
            {
                through.push(segment);
            }
        }
        through.retain(|segment| !event.ends.contains(segment));
        through.sort_unstable();
        through.dedup();

        if through.len() >= 2 && self.has_proper_pair(&through) {
            self.crossings.push(Crossing {
                point,
                segments: through.clone(),
            });
        }

        for segment in event.ends.iter().chain(through.iter()) {
            self.remove(*segment);
        }

        self.position.set(Position { point, after: true });
        let mut inserted: Vec<StatusKey<'a>> = event
            .starts
            .iter()
            .chain(through.iter())
            .map(|segment| self.key(Entry::Segment(*segment)))
            .collect();

        if inserted.is_empty() {
            let level = self.key(Entry::Level(point.y));
            let below = self.status.range(..level.clone()).next_back();
            let above = self.status.range(level..).next();
            if let (Some(lower), Some(upper)) = (
                below.and_then(StatusKey::segment),
                above.and_then(StatusKey::segment),
            ) {
                self.check(lower, upper, point);
            }
            return;
        }

        inserted.sort();
        inserted.dedup();
        let lowest = inserted[0].clone();
        let highest = inserted[inserted.len() - 1].clone();
        self.status.extend(inserted);

        let below = self
            .status
            .range(..lowest.clone())
            .next_back()
            .and_then(StatusKey::segment);
        if let (Some(lower), Some(upper)) = (below, lowest.segment()) {
            self.check(lower, upper, point);
        }
        let above = self
            .status
            .range((Excluded(highest.clone()), Unbounded))
            .next()
            .and_then(StatusKey::segment);
        if let (Some(lower), Some(upper)) = (highest.segment(), above) {
            self.check(lower, upper, point);
        }
    }

    /** Collinear overlaps pass through the same points without crossing. */
    fn has_proper_pair(&self, segments: &[usize]) -> bool {
        segments.iter().enumerate().any(|(index, a)| {
            segments[index + 1..].iter().any(|b| {
                crate::geometry::cross(
                    self.segments[*a].direction(),
                    self.segments[*b].direction(),
                )
                .abs()
                    >= self.tolerance.parallel
            })
        })
    }
}

/**
 * Finds every point where segments cross in their interiors with a left-to-right sweep.
 * Touching endpoints and collinear overlaps are not reported.
 */
pub fn find_crossings(segments: &[LineSegment], tolerance: Tolerance) -> Vec<Crossing> {
    let crossings = Sweep::new(segments, tolerance).run();
    log::debug!(
        "sweep found {} crossings among {} segments",
        crossings.len(),
        segments.len()
    );
    crossings
}

#[cfg(test)]
mod tests {
    use crate::geometry::*;
    use crate::sweep::*;

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
        LineSegment::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn single_crossing() {
        let segments = vec![segment(0.0, 0.0, 2.0, 2.0), segment(0.0, 2.0, 2.0, 0.0)];
        let crossings = find_crossings(&segments, Tolerance::default());
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].segments, vec![0, 1]);
        assert!((crossings[0].point.x - 1.0).abs() < 1e-9);
        assert!((crossings[0].point.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn grid_with_verticals() {
        // three horizontals and three verticals
        let mut segments = Vec::new();
        for i in 1..=3 {
            segments.push(segment(0.0, i as f64, 4.0, i as f64));
        }
        for i in 1..=3 {
            segments.push(segment(i as f64, 0.0, i as f64, 4.0));
        }
        let crossings = find_crossings(&segments, Tolerance::default());
        assert_eq!(crossings.len(), 9);
        assert!(crossings.iter().all(|crossing| crossing.segments.len() == 2));
    }

    #[test]
    fn three_lines_through_one_point() {
        let segments = vec![
            segment(-1.0, 0.0, 1.0, 0.0),
            segment(0.0, -1.0, 0.0, 1.0),
            segment(-1.0, -1.0, 1.0, 1.0),
        ];
        let crossings = find_crossings(&segments, Tolerance::default());
        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].segments, vec![0, 1, 2]);
    }

    #[test]
    fn shared_endpoints_do_not_cross() {
        let segments = vec![
            segment(0.0, 0.0, 1.0, 0.0),
            segment(1.0, 0.0, 1.0, 1.0),
            segment(1.0, 1.0, 0.0, 0.0),
        ];
        assert!(find_crossings(&segments, Tolerance::default()).is_empty());
    }

    #[test]
    fn random_segments_match_pairwise() {
        use rand::{Rng, SeedableRng};

        let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(7);
        let segments: Vec<LineSegment> = (0..200)
            .map(|_| {
                let a = Point::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0));
                let b = Point::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0));
                LineSegment::new(a, b)
            })
            .collect();

        let mut expected = 0;
        for (index, first) in segments.iter().enumerate() {
            for second in segments[index + 1..].iter() {
                if intersect(first, second, PARALLEL_EPSILON, ENDPOINT_EPSILON).is_some() {
                    expected += 1;
                }
            }
        }
        let crossings = find_crossings(&segments, Tolerance::default());
        let pairs: usize = crossings
            .iter()
            .map(|crossing| crossing.segments.len() * (crossing.segments.len() - 1) / 2)
            .sum();
        assert!(expected > 100);
        assert_eq!(pairs, expected);
    }
}
