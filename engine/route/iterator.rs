use network::NodeHandle;
use transit::{week_diff, WeekTime, WEEK};

use crate::common::RoutingConfig;
use crate::edge::RouteArc;
use crate::graph::RoutingGraph;
use crate::node::RouteNode;

/** Waits this close to a full week are rounding noise on an event that is due right now. */
const WAIT_EPSILON: f64 = 1e-6;

#[enum_dispatch::enum_dispatch]
pub trait Successors {
    /**
     * Pushes the successors of `node` with their travel times onto `out`, given that the node
     * is reached at absolute time `now`.
     */
    fn successors(
        &self,
        graph: &RoutingGraph,
        node: NodeHandle,
        now: f64,
        out: &mut Vec<(NodeHandle, f64)>,
    );
}

// NOTE: all implementations of Successors must be listed here
#[enum_dispatch::enum_dispatch(Successors)]
#[derive(Debug, Clone)]
pub enum NodeIterator {
    RoadIterator,
    TransitIterator,
}

/** Static weights on the road network only. Transit events are never expanded. */
#[derive(Debug, Clone)]
pub struct RoadIterator {
    pub config: RoutingConfig,
}

impl RoadIterator {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }
}

impl Successors for RoadIterator {
    fn successors(
        &self,
        graph: &RoutingGraph,
        node: NodeHandle,
        _now: f64,
        out: &mut Vec<(NodeHandle, f64)>,
    ) {
        road_successors(&self.config, graph, node, out);
    }
}

/**
 * Road weights plus the timetable. Boarding is only possible after the transfer time of a
 * stop, and every transit arc costs the time until its target event next happens.
 */
#[derive(Debug, Clone)]
pub struct TransitIterator {
    pub config: RoutingConfig,
}

impl TransitIterator {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }
}

impl Successors for TransitIterator {
    fn successors(
        &self,
        graph: &RoutingGraph,
        node: NodeHandle,
        now: f64,
        out: &mut Vec<(NodeHandle, f64)>,
    ) {
        let transit = graph.transit();
        match graph.graph().node(node).data {
            RouteNode::Road { .. } => {
                road_successors(&self.config, graph, node, out);
                for stop in transit.road_stops(node) {
                    let schedule = match transit.schedule(*stop) {
                        Some(schedule) => schedule,
                        None => continue,
                    };
                    let ready = now + transit.transfer_time(*stop);
                    if let Some((k, departure)) = schedule.next_departure_index(ready) {
                        if let Some(transfer) = transit.transfers(*stop).get(k) {
                            out.push((*transfer, departure - now));
                        }
                    }
                }
            }
            RouteNode::Arrival { stop, .. } => {
                if let Some(road) = transit.stop_road(stop) {
                    out.push((road, 0.0));
                }
                event_successors(graph, node, now, out);
            }
            RouteNode::Departure { .. } | RouteNode::Transfer { .. } => {
                event_successors(graph, node, now, out);
            }
        }
    }
}

fn road_successors(
    config: &RoutingConfig,
    graph: &RoutingGraph,
    node: NodeHandle,
    out: &mut Vec<(NodeHandle, f64)>,
) {
    let graph = graph.graph();
    for arc in graph.outgoing(node) {
        if let RouteArc::Road(road) = &arc.data {
            if let Some(time) = config.road_time(road) {
                out.push((arc.target(), time));
            }
        }
    }
    if config.mode.respects_one_way() {
        return;
    }
    // one-way roads are walked against their direction too
    for arc in graph.incoming(node) {
        if let RouteArc::Road(road) = &arc.data {
            if road.one_way {
                if let Some(time) = config.road_time(road) {
                    out.push((arc.source(), time));
                }
            }
        }
    }
}

fn event_successors(
    graph: &RoutingGraph,
    node: NodeHandle,
    now: f64,
    out: &mut Vec<(NodeHandle, f64)>,
) {
    let graph = graph.graph();
    for arc in graph.outgoing(node) {
        if let Some(time) = graph.node(arc.target()).data.event_time() {
            out.push((arc.target(), wait_until(time, now)));
        }
    }
}

/** Time from `now` until `event` next occurs in the weekly cycle. */
pub fn wait_until(event: WeekTime, now: f64) -> f64 {
    let wait = week_diff(event.time_of_week() as f64, now);
    if wait > WEEK as f64 - WAIT_EPSILON {
        0.0
    } else {
        wait
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use crate::iterator::*;

    #[test]
    fn wait_until_wraps() {
        let event = WeekTime::hms(Weekday::Mon, 1, 0, 0);
        assert_eq!(wait_until(event, 0.0), 3600.0);
        assert_eq!(wait_until(event, 3600.0), 0.0);
        assert_eq!(wait_until(event, 3600.0 + 1e-9), 0.0);
        assert_eq!(wait_until(event, 3601.0), (WEEK - 1) as f64);
        // the same event seen from the following week
        assert_eq!(wait_until(event, WEEK as f64 + 1800.0), 1800.0);
    }
}
