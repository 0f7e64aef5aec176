use serde::{Deserialize, Serialize};

use crate::common::RoadArc;

/**
 * Arc of the routing graph. Only road arcs carry a static weight. Transit arcs are weighted
 * at query time from the event times of their endpoints.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RouteArc {
    Road(RoadArc),
    /** Waiting passenger to departing vehicle. */
    Board,
    /** Departure to the arrival at the next stop of the same trip. */
    Ride,
    /** Staying on the vehicle at an intermediate stop. */
    Stay,
    /** Waiting at the stop for the following departure. */
    Wait,
}

impl RouteArc {
    pub fn road(&self) -> Option<&RoadArc> {
        match self {
            RouteArc::Road(road) => Some(road),
            _ => None,
        }
    }
}

impl std::fmt::Display for RouteArc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RouteArc::*;
        match self {
            Road(road) => write!(f, "{}:{:.1}m", road.class, road.length),
            Board => write!(f, "board"),
            Ride => write!(f, "ride"),
            Stay => write!(f, "stay"),
            Wait => write!(f, "wait"),
        }
    }
}
