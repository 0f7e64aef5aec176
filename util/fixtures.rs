use std::f64::consts::PI;

use network::{NodeHandle, Point};
use route::{RoadArc, RoadClass, RoadGraph};

fn two_way(roads: &mut RoadGraph, a: NodeHandle, b: NodeHandle, class: RoadClass) {
    let (from, to) = (roads.position(a), roads.position(b));
    let length = (to.x - from.x).hypot(to.y - from.y);
    roads.add_arc(a, b, RoadArc::with_class(length, class));
    roads.add_arc(b, a, RoadArc::with_class(length, class));
}

/**
 * A `columns` x `rows` grid of two-way residential roads. Node `row * columns + column` sits
 * at `(column * spacing, row * spacing)`.
 */
pub fn grid_roads(columns: usize, rows: usize, spacing: f64) -> RoadGraph {
    let mut roads = RoadGraph::new();
    for row in 0..rows {
        for column in 0..columns {
            let point = Point::new(column as f64 * spacing, row as f64 * spacing);
            roads
                .try_add_node(point)
                .expect("grid points are distinct");
        }
    }
    for row in 0..rows {
        for column in 0..columns {
            let node = NodeHandle(row * columns + column);
            if column + 1 < columns {
                two_way(&mut roads, node, NodeHandle(node.0 + 1), RoadClass::Residential);
            }
            if row + 1 < rows {
                two_way(&mut roads, node, NodeHandle(node.0 + columns), RoadClass::Residential);
            }
        }
    }
    roads
}

/** A closed ring of `count` two-way roads around `center`. Node `i` sits at angle `2πi/count`. */
pub fn ring_roads(center: Point, radius: f64, count: usize) -> RoadGraph {
    let mut roads = RoadGraph::new();
    add_ring(&mut roads, center, radius, count);
    roads
}

fn add_ring(roads: &mut RoadGraph, center: Point, radius: f64, count: usize) -> Vec<NodeHandle> {
    let nodes: Vec<NodeHandle> = (0..count)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            let point = Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            roads.try_add_node(point).expect("ring points are distinct")
        })
        .collect();
    for i in 0..count {
        two_way(roads, nodes[i], nodes[(i + 1) % count], RoadClass::Residential);
    }
    nodes
}

/**
 * A hexagonal ring road (nodes 0 to 5) around a center node (node 6) that is only connected
 * through motorway spokes, so walkers can circle the center but never reach it.
 */
pub fn hexagon_roads(radius: f64) -> RoadGraph {
    let center = Point::new(0.0, 0.0);
    let mut roads = RoadGraph::new();
    let ring = add_ring(&mut roads, center, radius, 6);
    let hub = roads.try_add_node(center).expect("center is not on the ring");
    for node in ring {
        two_way(&mut roads, node, hub, RoadClass::Motorway);
    }
    roads
}
