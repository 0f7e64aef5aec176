use std::collections::{BTreeMap, HashMap};

use network::{ColoredNode, DiGraph, GeometricGraph, NodeHandle, Point};
use quadtree::SpatialIndex;
use transit::{Schedule, StopId, Timetable, TripId};

use crate::common::{Error, RoadArc};
use crate::edge::RouteArc;
use crate::node::RouteNode;

/**
 * Road network as handed over by the loader. A two-way road is a pair of opposite arcs; a
 * one-way road is a single arc with `one_way` set.
 */
pub type RoadGraph = GeometricGraph<Point, RoadArc>;

/** Road network after routing, carrying the reachability of every node. */
pub type ColoredRoadGraph = GeometricGraph<ColoredNode, RoadArc>;

const INDEX_LOAD_FACTOR: usize = 8;
const INDEX_MAX_DEPTH: u32 = 24;

/** Lookup tables from stops to the event nodes of the routing graph. */
#[derive(Debug, Clone, Default)]
pub struct TransitIndex {
    /** Transfer nodes of each stop, in the order of the stop's schedule. */
    transfers: BTreeMap<StopId, Vec<NodeHandle>>,
    schedules: BTreeMap<StopId, Schedule>,
    stop_road: BTreeMap<StopId, NodeHandle>,
    road_stops: HashMap<NodeHandle, Vec<StopId>>,
    transfer_time: BTreeMap<StopId, f64>,
}

impl TransitIndex {
    pub fn transfers(&self, stop: StopId) -> &[NodeHandle] {
        self.transfers.get(&stop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn schedule(&self, stop: StopId) -> Option<&Schedule> {
        self.schedules.get(&stop)
    }

    /** The road node a stop is attached to. */
    pub fn stop_road(&self, stop: StopId) -> Option<NodeHandle> {
        self.stop_road.get(&stop).copied()
    }

    /** Stops attached to a road node. */
    pub fn road_stops(&self, road: NodeHandle) -> &[StopId] {
        self.road_stops.get(&road).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn transfer_time(&self, stop: StopId) -> f64 {
        self.transfer_time.get(&stop).copied().unwrap_or(0.0)
    }

    pub fn stop_count(&self) -> usize {
        self.stop_road.len()
    }
}

/**
 * The graph the router runs on: the road network followed by the time-expanded transit
 * events. Road node `i` of the source road graph is routing node `i`.
 */
#[derive(Debug, Clone)]
pub struct RoutingGraph {
    graph: DiGraph<RouteNode, RouteArc>,
    road_nodes: usize,
    index: SpatialIndex<NodeHandle>,
    transit: TransitIndex,
}

impl RoutingGraph {
    pub fn from_roads(roads: &RoadGraph) -> Result<Self, Error> {
        let graph = roads.graph().map(
            |node| RouteNode::Road {
                position: node.data,
            },
            |arc| RouteArc::Road(arc.data),
        );

        let mut index = SpatialIndex::new(INDEX_LOAD_FACTOR, INDEX_MAX_DEPTH);
        for node in roads.graph().nodes() {
            index.insert(node.data.x, node.data.y, node.id)?;
        }

        Ok(Self {
            graph,
            road_nodes: roads.graph().node_count(),
            index,
            transit: TransitIndex::default(),
        })
    }

    pub fn graph(&self) -> &DiGraph<RouteNode, RouteArc> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn road_node_count(&self) -> usize {
        self.road_nodes
    }

    pub fn is_road(&self, node: NodeHandle) -> bool {
        node.0 < self.road_nodes
    }

    pub fn transit(&self) -> &TransitIndex {
        &self.transit
    }

    pub fn nearest_road_node(&self, point: Point) -> Option<NodeHandle> {
        self.index.find_nearest(point.x, point.y)
    }

    /**
     * Adds the events of a timetable. Every stop is attached to its nearest road node and gets
     * one transfer node per departure, chained by wait arcs that wrap around the week. Every
     * trip becomes a chain of departure and arrival nodes linked by ride and stay arcs.
     */
    pub fn merge_timetable(&mut self, timetable: &Timetable) -> Result<&TransitIndex, Error> {
        let mut boarding: HashMap<(TripId, usize), NodeHandle> = HashMap::new();

        for stop in timetable.stops().values() {
            let road = self
                .nearest_road_node(stop.position)
                .ok_or(Error::NoRoadForStop(stop.id.0))?;

            let departures = timetable.departures(stop.id)?;
            let schedule = Schedule::new(departures.iter().map(|d| d.time.seconds()));

            let mut transfers = Vec::with_capacity(departures.len());
            for departure in departures.iter() {
                let transfer = self.graph.add_node(RouteNode::Transfer {
                    stop: stop.id,
                    time: departure.time,
                });
                boarding.insert((departure.trip, departure.index), transfer);
                transfers.push(transfer);
            }
            if transfers.len() > 1 {
                for (k, transfer) in transfers.iter().enumerate() {
                    let next = transfers[(k + 1) % transfers.len()];
                    self.graph.add_arc(*transfer, next, RouteArc::Wait);
                }
            }

            self.transit.stop_road.insert(stop.id, road);
            self.transit
                .road_stops
                .entry(road)
                .or_insert_with(Vec::new)
                .push(stop.id);
            self.transit.transfer_time.insert(stop.id, stop.transfer_time);
            self.transit.transfers.insert(stop.id, transfers);
            self.transit.schedules.insert(stop.id, schedule);
        }

        for trip in timetable.trips().values() {
            let last = trip.stop_times.len().saturating_sub(1);
            let mut previous_departure: Option<NodeHandle> = None;
            for (index, stop_time) in trip.stop_times.iter().enumerate() {
                if let Some(departure) = previous_departure {
                    let arrival = self.graph.add_node(RouteNode::Arrival {
                        stop: stop_time.stop,
                        trip: trip.id,
                        time: stop_time.arrival,
                    });
                    self.graph.add_arc(departure, arrival, RouteArc::Ride);
                    previous_departure = None;

                    if index < last {
                        let next = self.add_departure(trip.id, index, stop_time, &boarding);
                        self.graph.add_arc(arrival, next, RouteArc::Stay);
                        previous_departure = Some(next);
                    }
                } else if index < last {
                    previous_departure =
                        Some(self.add_departure(trip.id, index, stop_time, &boarding));
                }
            }
        }

        log::debug!(
            "merged {} stops and {} trips, routing graph has {} nodes and {} arcs",
            timetable.stops().len(),
            timetable.trips().len(),
            self.graph.node_count(),
            self.graph.arc_count()
        );
        Ok(&self.transit)
    }

    fn add_departure(
        &mut self,
        trip: TripId,
        index: usize,
        stop_time: &transit::StopTime,
        boarding: &HashMap<(TripId, usize), NodeHandle>,
    ) -> NodeHandle {
        let departure = self.graph.add_node(RouteNode::Departure {
            stop: stop_time.stop,
            trip,
            time: stop_time.departure,
        });
        if let Some(transfer) = boarding.get(&(trip, index)) {
            self.graph.add_arc(*transfer, departure, RouteArc::Board);
        }
        departure
    }
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use transit::{Stop, StopTime, Trip, WeekTime};

    use crate::graph::*;

    fn line_roads() -> Result<RoadGraph, Error> {
        let mut roads = RoadGraph::new();
        let a = roads.try_add_node(Point::new(0.0, 0.0))?;
        let b = roads.try_add_node(Point::new(100.0, 0.0))?;
        roads.add_arc(a, b, RoadArc::residential(100.0));
        roads.add_arc(b, a, RoadArc::residential(100.0));
        Ok(roads)
    }

    #[test]
    fn merge_builds_event_chains() -> Result<(), Error> {
        let mut timetable = Timetable::new();
        for (id, x) in [(1, 1.0), (2, 40.0), (3, 99.0)] {
            timetable.add_stop(Stop {
                id: StopId(id),
                name: format!("{}", id),
                position: Point::new(x, 0.0),
                transfer_time: 30.0,
            })?;
        }
        timetable.add_trip(Trip {
            id: TripId(7),
            route: "U1".to_owned(),
            stop_times: vec![
                StopTime::at(StopId(1), WeekTime::hms(Weekday::Mon, 8, 0, 0)),
                StopTime::new(
                    StopId(2),
                    WeekTime::hms(Weekday::Mon, 8, 2, 0),
                    WeekTime::hms(Weekday::Mon, 8, 3, 0),
                ),
                StopTime::at(StopId(3), WeekTime::hms(Weekday::Mon, 8, 5, 0)),
            ],
        })?;

        let mut graph = RoutingGraph::from_roads(&line_roads()?)?;
        let index = graph.merge_timetable(&timetable)?.clone();

        // two transfers (stops 1 and 2), two departures and two arrivals
        assert_eq!(graph.node_count(), 2 + 2 + 2 + 2);
        assert_eq!(index.stop_road(StopId(1)), Some(NodeHandle(0)));
        assert_eq!(index.stop_road(StopId(3)), Some(NodeHandle(1)));
        assert_eq!(index.road_stops(NodeHandle(0)), &[StopId(1), StopId(2)]);
        assert!(index.transfers(StopId(3)).is_empty());

        let arcs: Vec<String> = graph
            .graph()
            .arcs()
            .iter()
            .map(|arc| format!("{}", arc.data))
            .collect();
        assert_eq!(
            arcs,
            vec![
                "residential:100.0m",
                "residential:100.0m",
                "board",
                "ride",
                "board",
                "stay",
                "ride"
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_roads() -> Result<(), Error> {
        let mut timetable = Timetable::new();
        timetable.add_stop(Stop {
            id: StopId(1),
            name: "lonely".to_owned(),
            position: Point::new(0.0, 0.0),
            transfer_time: 0.0,
        })?;
        let mut graph = RoutingGraph::from_roads(&RoadGraph::new())?;
        assert_eq!(
            graph.merge_timetable(&timetable).map(|_| ()),
            Err(Error::NoRoadForStop(1))
        );
        Ok(())
    }
}
