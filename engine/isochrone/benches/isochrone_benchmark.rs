use bencher::{benchmark_group, benchmark_main, Bencher};

use network::NodeHandle;
use route::{
    blue_to_red, color_road_graph, colored_road_graph, ColoredRoadGraph, RoadIterator, Router,
    RoutingConfig, RoutingGraph,
};

use isochrone::{FaceStrategy, Timezone, ToleranceConfig, VisualizationConfig};

fn colored_grid() -> ColoredRoadGraph {
    let roads = test_util::grid_roads(20, 20, 50.0);
    let graph = RoutingGraph::from_roads(&roads).expect("grid is valid");
    let mut router = Router::new(RoadIterator::new(RoutingConfig::default()));
    router
        .run_with_budget(&graph, NodeHandle(210), 0.0, 300.0, 0.0)
        .expect("source exists");
    let mut colored = colored_road_graph(&roads).expect("grid is valid");
    color_road_graph(&router, &mut colored, 300.0, 0.0);
    blue_to_red(&mut colored);
    colored
}

fn build(bench: &mut Bencher, strategy: FaceStrategy) {
    let colored = colored_grid();
    let config = VisualizationConfig::default();
    let tolerance = ToleranceConfig::default();
    let speed = RoutingConfig::default().walking_speed;

    bench.iter(|| {
        Timezone::build(&colored, 300.0, speed, strategy, &config, &tolerance)
            .expect("grid isochrone")
            .polygons
            .len()
    });
}

fn grid_octilinear(bench: &mut Bencher) {
    build(bench, FaceStrategy::Octilinear)
}

fn grid_minimum_distance(bench: &mut Bencher) {
    build(bench, FaceStrategy::MinimumDistance)
}

fn grid_boundary(bench: &mut Bencher) {
    build(bench, FaceStrategy::Boundary)
}

benchmark_group!(benches, grid_octilinear, grid_minimum_distance, grid_boundary);
benchmark_main!(benches);
