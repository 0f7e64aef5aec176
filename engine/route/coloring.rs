use std::collections::VecDeque;

use network::{Color, ColoredNode, NodeHandle};

use crate::common::Error;
use crate::graph::{ColoredRoadGraph, RoadGraph};
use crate::router::Router;

/** A copy of the road network with every node still undefined. */
pub fn colored_road_graph(roads: &RoadGraph) -> Result<ColoredRoadGraph, Error> {
    Ok(roads.map(|node| ColoredNode::new(node.data), |arc| arc.data)?)
}

fn color_for(remaining: f64, buffer: f64) -> Color {
    if remaining >= 0.0 {
        Color::Reachable
    } else if remaining >= -buffer {
        Color::Buffer
    } else {
        Color::Unreachable
    }
}

/**
 * Colors the road nodes from the router's last run: Reachable within `budget`, Buffer within
 * `budget + buffer`, Unreachable otherwise. The remaining time `budget - distance` is kept on
 * every node, `-inf` for nodes the router never settled.
 */
pub fn color_road_graph(router: &Router, graph: &mut ColoredRoadGraph, budget: f64, buffer: f64) {
    for id in 0..graph.graph().node_count() {
        let node = NodeHandle(id);
        let distance = router.distance(node);
        let data = graph.node_data_mut(node);
        if data.is_fixed() {
            continue;
        }
        data.remaining_time = if distance.is_finite() {
            budget - distance
        } else {
            f64::NEG_INFINITY
        };
        data.set_color(color_for(data.remaining_time, buffer));
    }

    let [undefined, reachable, unreachable, buffered] = graph.color_counts();
    log::debug!(
        "colored road graph: {} reachable, {} buffer, {} unreachable, {} undefined",
        reachable,
        buffered,
        unreachable,
        undefined
    );
}

/**
 * Recolors a graph colored for a larger budget as if it had been colored for a budget
 * `shift` seconds smaller. Used to serve several budgets from one router run.
 */
pub fn recolor(graph: &mut ColoredRoadGraph, shift: f64, buffer: f64) {
    for id in 0..graph.graph().node_count() {
        let data = graph.node_data_mut(NodeHandle(id));
        if data.is_fixed() {
            continue;
        }
        data.remaining_time -= shift;
        data.set_color(color_for(data.remaining_time, buffer));
    }
}

/**
 * Resolves the buffer zone. Buffer nodes connected to an unreachable node through other
 * buffer nodes become unreachable; the remaining buffer pockets are enclosed by reachable
 * nodes and become reachable with no time left.
 */
pub fn blue_to_red(graph: &mut ColoredRoadGraph) {
    let count = graph.graph().node_count();
    let mut visited = vec![false; count];
    let mut queue: VecDeque<NodeHandle> = graph
        .graph()
        .nodes()
        .iter()
        .filter(|node| node.data.is_unreachable())
        .map(|node| node.id)
        .collect();
    for node in queue.iter() {
        visited[node.0] = true;
    }

    while let Some(node) = queue.pop_front() {
        let neighbors: Vec<NodeHandle> = graph
            .graph()
            .neighbors(node)
            .filter(|neighbor| graph.graph().node(*neighbor).data.color() == Color::Buffer)
            .collect();
        for neighbor in neighbors {
            if visited[neighbor.0] {
                continue;
            }
            visited[neighbor.0] = true;
            graph.node_data_mut(neighbor).set_color(Color::Unreachable);
            queue.push_back(neighbor);
        }
    }

    let mut pockets = 0;
    for id in 0..count {
        let data = graph.node_data_mut(NodeHandle(id));
        if data.color() == Color::Buffer {
            data.set_color(Color::Reachable);
            data.remaining_time = 0.0;
            pockets += 1;
        }
    }
    if pockets > 0 {
        log::debug!("{} enclosed buffer nodes recolored reachable", pockets);
    }
}
