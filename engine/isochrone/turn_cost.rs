use std::f64::consts::{FRAC_PI_4, PI};

use cgmath::{InnerSpace, Vector2};

/** Directions within this many radians are considered the same. */
pub const ANGLE_EPSILON: f64 = 1e-6;

pub const HISTOGRAM_BINS: usize = 16;

/** Signed angle from `incoming` to `outgoing` in (-π, π], counter-clockwise positive. */
pub fn turn_angle(incoming: Vector2<f64>, outgoing: Vector2<f64>) -> f64 {
    let cross = incoming.x * outgoing.y - incoming.y * outgoing.x;
    cross.atan2(incoming.dot(outgoing))
}

/**
 * Cost of continuing from `incoming` into `outgoing`, in 45° steps: going straight is free,
 * every other turn costs one to four steps, and a reversal costs `weight_uturn`.
 */
pub fn compute_turn_cost(incoming: Vector2<f64>, outgoing: Vector2<f64>, weight_uturn: f64) -> f64 {
    let angle = turn_angle(incoming, outgoing).abs();
    if angle < ANGLE_EPSILON {
        0.0
    } else if PI - angle < ANGLE_EPSILON {
        weight_uturn
    } else {
        (angle / FRAC_PI_4 - ANGLE_EPSILON).ceil().max(1.0).min(4.0)
    }
}

/** Whether the direction is a multiple of 45°. */
pub fn is_octilinear(direction: Vector2<f64>) -> bool {
    if direction.magnitude2() == 0.0 {
        return false;
    }
    let steps = direction.y.atan2(direction.x) / FRAC_PI_4;
    (steps - steps.round()).abs() * FRAC_PI_4 < ANGLE_EPSILON
}

/** Bin of a signed turn angle, with 16 bins of 22.5° covering the full circle. */
pub fn histogram_bin(angle: f64) -> usize {
    let width = 2.0 * PI / HISTOGRAM_BINS as f64;
    (((angle + PI) / width).floor().max(0.0) as usize).min(HISTOGRAM_BINS - 1)
}

#[cfg(test)]
mod tests {
    use crate::turn_cost::*;

    fn v(x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x, y)
    }

    #[test]
    fn turn_costs() {
        let east = v(1.0, 0.0);
        assert_eq!(compute_turn_cost(east, v(3.0, 0.0), 100.0), 0.0);
        assert_eq!(compute_turn_cost(east, v(1.0, 1.0), 100.0), 1.0);
        assert_eq!(compute_turn_cost(east, v(0.0, -1.0), 100.0), 2.0);
        assert_eq!(compute_turn_cost(east, v(-1.0, 1.0), 100.0), 3.0);
        assert_eq!(compute_turn_cost(east, v(-1.0, 0.0), 100.0), 100.0);
        // anything between steps rounds up
        assert_eq!(compute_turn_cost(east, v(1.0, 0.1), 100.0), 1.0);
        assert_eq!(compute_turn_cost(east, v(-1.0, -0.01), 100.0), 4.0);
    }

    #[test]
    fn octilinear_directions() {
        assert!(is_octilinear(v(0.0, 2.0)));
        assert!(is_octilinear(v(-3.0, 3.0)));
        assert!(is_octilinear(v(-1.0, 0.0)));
        assert!(!is_octilinear(v(2.0, 1.0)));
        assert!(!is_octilinear(v(0.0, 0.0)));
    }

    #[test]
    fn histogram_bins() {
        assert_eq!(histogram_bin(-PI), 0);
        assert_eq!(histogram_bin(0.0), 8);
        assert_eq!(histogram_bin(-0.1), 7);
        assert_eq!(histogram_bin(PI), 15);
    }
}
