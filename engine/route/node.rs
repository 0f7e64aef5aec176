use serde::{Deserialize, Serialize};

use network::Point;
use transit::{StopId, TripId, WeekTime};

/**
 * Node of the routing graph. Road nodes come first and keep the handles of the road graph
 * they were copied from. The other variants are transit events: a vehicle leaving or reaching
 * a stop, or a passenger waiting at a stop for a given departure.
 */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RouteNode {
    Road {
        position: Point,
    },
    Departure {
        stop: StopId,
        trip: TripId,
        time: WeekTime,
    },
    Arrival {
        stop: StopId,
        trip: TripId,
        time: WeekTime,
    },
    Transfer {
        stop: StopId,
        time: WeekTime,
    },
}

impl RouteNode {
    pub fn is_road(&self) -> bool {
        matches!(self, RouteNode::Road { .. })
    }

    /** The scheduled time of a transit event, `None` for road nodes. */
    pub fn event_time(&self) -> Option<WeekTime> {
        use RouteNode::*;
        match self {
            Road { .. } => None,
            Departure { time, .. } | Arrival { time, .. } | Transfer { time, .. } => Some(*time),
        }
    }

    pub fn stop(&self) -> Option<StopId> {
        use RouteNode::*;
        match self {
            Road { .. } => None,
            Departure { stop, .. } | Arrival { stop, .. } | Transfer { stop, .. } => Some(*stop),
        }
    }
}

impl std::fmt::Display for RouteNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RouteNode::*;

        match self {
            Road { position } => write!(f, "road:({:.1}, {:.1})", position.x, position.y),
            Departure { stop, trip, time } => write!(f, "departure:{}:{}:{}", stop, trip, time),
            Arrival { stop, trip, time } => write!(f, "arrival:{}:{}:{}", stop, trip, time),
            Transfer { stop, time } => write!(f, "transfer:{}:{}", stop, time),
        }
    }
}
