use serde::{Deserialize, Serialize};

use crate::geometric::{GeometricGraph, Located, Point};
use crate::node::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Undefined,
    Reachable,
    Unreachable,
    Buffer,
}

impl Color {
    fn precedence(&self) -> u8 {
        match self {
            Color::Undefined => 3,
            Color::Unreachable => 2,
            Color::Buffer => 1,
            Color::Reachable => 0,
        }
    }

    /** The color of an arc is the dominant color of its endpoints. */
    pub fn for_arc(a: Color, b: Color) -> Color {
        if a.precedence() >= b.precedence() {
            a
        } else {
            b
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Color::*;
        match self {
            Undefined => write!(f, "undefined"),
            Reachable => write!(f, "reachable"),
            Unreachable => write!(f, "unreachable"),
            Buffer => write!(f, "buffer"),
        }
    }
}

/**
 * Node payload of every graph past routing. `remaining_time` is in seconds: the budget minus
 * the travel time to the node, negative beyond the budget and `-inf` if the node was never
 * reached.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredNode {
    pub position: Point,
    color: Color,
    pub remaining_time: f64,
    fixed: bool,
}

impl ColoredNode {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            color: Color::Undefined,
            remaining_time: f64::NEG_INFINITY,
            fixed: false,
        }
    }

    pub fn with_color(position: Point, color: Color, remaining_time: f64) -> Self {
        Self {
            position,
            color,
            remaining_time,
            fixed: false,
        }
    }

    /** A node whose color can no longer change, like the arrangement frame. */
    pub fn fixed(position: Point, color: Color, remaining_time: f64) -> Self {
        Self {
            position,
            color,
            remaining_time,
            fixed: true,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_reachable(&self) -> bool {
        self.color == Color::Reachable
    }

    pub fn is_unreachable(&self) -> bool {
        self.color == Color::Unreachable
    }

    /** Has no effect on fixed nodes. */
    pub fn set_color(&mut self, color: Color) {
        if !self.fixed {
            self.color = color;
        }
    }

    /** Remaining walking distance in meters. */
    pub fn remaining_distance(&self, walking_speed: f64) -> f64 {
        self.remaining_time * walking_speed
    }
}

impl Located for ColoredNode {
    fn position(&self) -> Point {
        self.position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorSnapshot {
    entries: Vec<(Color, f64)>,
}

impl<A> GeometricGraph<ColoredNode, A> {
    pub fn snapshot(&self) -> ColorSnapshot {
        ColorSnapshot {
            entries: self
                .graph()
                .nodes()
                .iter()
                .map(|node| (node.data.color, node.data.remaining_time))
                .collect(),
        }
    }

    /**
     * Restores colors and remaining times, ignoring the fixed flag. Nodes added after the
     * snapshot was taken are left alone.
     */
    pub fn restore(&mut self, snapshot: &ColorSnapshot) {
        for (index, (color, remaining_time)) in snapshot.entries.iter().enumerate() {
            if index >= self.graph().node_count() {
                break;
            }
            let data = self.node_data_mut(NodeHandle(index));
            data.color = *color;
            data.remaining_time = *remaining_time;
        }
    }

    pub fn color_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for node in self.graph().nodes() {
            let slot = match node.data.color {
                Color::Undefined => 0,
                Color::Reachable => 1,
                Color::Unreachable => 2,
                Color::Buffer => 3,
            };
            counts[slot] += 1;
        }
        counts
    }
}
