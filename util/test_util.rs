mod fixtures;

pub use fixtures::{grid_roads, hexagon_roads, ring_roads};

use network::Point;

pub fn assert_equal_vec_unordered<T: Eq + std::fmt::Debug>(vec1: Vec<T>, vec2: Vec<T>) {
    // Without assuming anything about T besides Eq and Debug (like Hash or Ord),
    // the best we can do is O(n^2). This is OK for tests. Please don't use this
    // for non-test code.
    assert_eq!(
        vec1.len(),
        vec2.len(),
        "Vectors have different lengths: {:?}, {:?}",
        vec1,
        vec2
    );
    'outer: for item1 in vec1.iter() {
        for item2 in vec2.iter() {
            if item1 == item2 {
                continue 'outer;
            }
        }
        panic!(
            "Vectors are not order-independent equal:\n  {:?}\n  {:?}",
            vec1, vec2
        );
    }
}

pub fn points_approx_eq(a: Point, b: Point, epsilon: f64) -> bool {
    float_cmp::approx_eq!(f64, a.x, b.x, epsilon = epsilon)
        && float_cmp::approx_eq!(f64, a.y, b.y, epsilon = epsilon)
}

pub fn assert_point_approx_eq(actual: Point, expected: Point, epsilon: f64) {
    assert!(
        points_approx_eq(actual, expected, epsilon),
        "Points differ: {:?} != {:?}",
        actual,
        expected
    );
}

/** Rings are compared up to rotation of their starting point. */
pub fn assert_ring_approx_eq(actual: &[Point], expected: &[Point], epsilon: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Rings have different lengths: {:?}, {:?}",
        actual,
        expected
    );
    let matches = (0..actual.len()).any(|offset| {
        expected.iter().enumerate().all(|(i, point)| {
            points_approx_eq(actual[(i + offset) % actual.len()], *point, epsilon)
        })
    });
    assert!(matches, "Rings differ:\n  {:?}\n  {:?}", actual, expected);
}

/** Safe to call from every test; only the first call installs the logger. */
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
