use chrono::Weekday;

use network::{Color, NodeHandle, Point};
use route::{
    blue_to_red, color_road_graph, colored_road_graph, Error, Mode, RoadArc, RoadClass,
    RoadGraph, RoadIterator, Router, RoutingConfig, RoutingGraph, TransitIterator,
};
use transit::{Stop, StopId, StopTime, Timetable, Trip, TripId, WeekTime, DAY, HOUR, WEEK};

fn walking(speed: f64) -> RoutingConfig {
    RoutingConfig {
        mode: Mode::Walking,
        walking_speed: speed,
        avoid_motorways: true,
    }
}

#[test]
fn grid_center_budget() -> Result<(), Error> {
    test_util::init_logger();
    let roads = test_util::grid_roads(3, 3, 1.0);
    let graph = RoutingGraph::from_roads(&roads)?;

    let mut colorings = Vec::new();
    for _ in 0..2 {
        let mut router = Router::new(RoadIterator::new(walking(1.0)));
        router.run_with_budget(&graph, NodeHandle(4), 0.0, 1.5, 0.0)?;
        let mut colored = colored_road_graph(&roads)?;
        color_road_graph(&router, &mut colored, 1.5, 0.0);
        blue_to_red(&mut colored);
        colorings.push(
            colored
                .graph()
                .nodes()
                .iter()
                .map(|node| node.data.color())
                .collect::<Vec<Color>>(),
        );
    }

    let reachable: Vec<usize> = colorings[0]
        .iter()
        .enumerate()
        .filter(|(_, color)| **color == Color::Reachable)
        .map(|(i, _)| i)
        .collect();
    test_util::assert_equal_vec_unordered(reachable, vec![1, 3, 4, 5, 7]);
    assert_eq!(colorings[0], colorings[1]);
    Ok(())
}

#[test]
fn settled_distances_are_monotone() -> Result<(), Error> {
    let roads = test_util::grid_roads(12, 9, 35.0);
    let graph = RoutingGraph::from_roads(&roads)?;
    let mut router = Router::new(RoadIterator::new(walking(1.4)));

    let mut order = Vec::new();
    router.run(&graph, NodeHandle(17), 0.0, |node, distance| {
        order.push((node, distance));
        true
    })?;
    assert_eq!(order.len(), roads.graph().node_count());
    assert!(order.windows(2).all(|pair| pair[0].1 <= pair[1].1));

    // every settled distance is consistent with its predecessor
    for (node, distance) in order.iter() {
        if let Some(previous) = router.predecessor(*node) {
            assert!(router.distance(previous) <= *distance);
        }
    }

    // same query, same answer
    let first: Vec<f64> = (0..graph.node_count())
        .map(|i| router.distance(NodeHandle(i)))
        .collect();
    router.run(&graph, NodeHandle(17), 0.0, |_, _| true)?;
    let second: Vec<f64> = (0..graph.node_count())
        .map(|i| router.distance(NodeHandle(i)))
        .collect();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn walking_ignores_one_way() -> Result<(), Error> {
    let mut roads = RoadGraph::new();
    let a = roads.try_add_node(Point::new(0.0, 0.0))?;
    let b = roads.try_add_node(Point::new(10.0, 0.0))?;
    roads.add_arc(
        a,
        b,
        RoadArc::new(10.0, RoadClass::Secondary, true, None, false, false),
    );
    let graph = RoutingGraph::from_roads(&roads)?;

    let mut router = Router::new(RoadIterator::new(walking(1.0)));
    router.run(&graph, b, 0.0, |_, _| true)?;
    assert_eq!(router.distance(a), 10.0);

    let mut router = Router::new(RoadIterator::new(RoutingConfig {
        mode: Mode::Driving,
        ..walking(1.0)
    }));
    router.run(&graph, b, 0.0, |_, _| true)?;
    assert!(!router.is_settled(a));
    Ok(())
}

/**
 * Two road islands 10km apart, connected only by a weekly train on Monday at 06:00. Starting
 * on Sunday night, the router has to wait for next Monday's train.
 */
#[test]
fn transit_departure_wraps_to_next_week() -> Result<(), Error> {
    let mut roads = RoadGraph::new();
    let home = roads.try_add_node(Point::new(0.0, 0.0))?;
    let station = roads.try_add_node(Point::new(100.0, 0.0))?;
    let far_station = roads.try_add_node(Point::new(10_000.0, 0.0))?;
    roads.add_arc(home, station, RoadArc::residential(100.0));
    roads.add_arc(station, home, RoadArc::residential(100.0));

    let mut timetable = Timetable::new();
    for (id, x) in [(1, 100.0), (2, 10_000.0)] {
        timetable.add_stop(Stop {
            id: StopId(id),
            name: format!("station {}", id),
            position: Point::new(x, 0.0),
            transfer_time: 120.0,
        })?;
    }
    timetable.add_trip(Trip {
        id: TripId(1),
        route: "S".to_owned(),
        stop_times: vec![
            StopTime::at(StopId(1), WeekTime::hms(Weekday::Mon, 6, 0, 0)),
            StopTime::at(StopId(2), WeekTime::hms(Weekday::Mon, 6, 10, 0)),
        ],
    })?;

    let mut graph = RoutingGraph::from_roads(&roads)?;
    graph.merge_timetable(&timetable)?;

    // 100s walk, then wait for the train the following Monday at 06:00, 10 minutes ride
    let sunday_night = (6 * DAY + 23 * HOUR) as f64;
    let mut router = Router::new(TransitIterator::new(walking(1.0)));
    router.run(&graph, home, sunday_night, |_, _| true)?;
    let expected = (WEEK + 6 * HOUR + 600) as f64 - sunday_night;
    assert!((router.distance(far_station) - expected).abs() < 1e-6);
    assert_eq!(router.path(far_station).first(), Some(&home));

    // on the platform at 05:59 on Monday, one minute short of the transfer time
    let late = (6 * HOUR - 100 - 60) as f64;
    router.run(&graph, home, late, |_, _| true)?;
    let expected = (WEEK + 6 * HOUR + 600) as f64 - late;
    assert!((router.distance(far_station) - expected).abs() < 1e-6);

    // with time to spare, the same Monday's train
    let early = (5 * HOUR) as f64;
    router.run(&graph, home, early, |_, _| true)?;
    assert!((router.distance(far_station) - (HOUR + 600) as f64).abs() < 1e-6);

    // road-only routing never reaches the other island
    let mut router = Router::new(RoadIterator::new(walking(1.0)));
    router.run(&graph, home, sunday_night, |_, _| true)?;
    assert!(!router.is_settled(far_station));
    Ok(())
}
