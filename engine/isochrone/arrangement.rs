use std::collections::{HashSet, VecDeque};

use cgmath::MetricSpace;

use network::{Color, ColoredNode, DiGraph, GeometricGraph, NodeHandle, Point};
use planar::{line_key, OriginalLine};
use quadtree::Rect;
use route::ColoredRoadGraph;

use crate::config::{ToleranceConfig, VisualizationConfig};
use crate::Error;

/** Planar graph of the colored roads inside their frame. Arc data is the arc length. */
pub type ArrangementGraph = GeometricGraph<ColoredNode, f64>;

#[derive(Debug, Clone)]
pub struct Arrangement {
    pub graph: ArrangementGraph,
    pub frame: Rect,
    /** Road node `i` is arrangement node `i`; the frame and crossings come after. */
    pub road_nodes: usize,
    pub crossings: usize,
}

fn color_of(remaining: f64) -> Color {
    if remaining >= 0.0 {
        Color::Reachable
    } else {
        Color::Unreachable
    }
}

/**
 * Builds the undirected, planar arrangement the faces are identified on:
 *
 * 1. every road becomes a pair of opposite arcs, weighted by length;
 * 2. a rectangular frame of fixed unreachable nodes encloses the network with a margin of
 *    `budget * speed + frame_margin`;
 * 3. each connected component is tied to the frame by four axis-parallel anchor arcs from its
 *    extreme nodes, so the arrangement is connected. Anchors begin with an unreachable stub of
 *    `anchor_gap`;
 * 4. crossings are split. A crossing node gets the best remaining time interpolated along the
 *    roads crossing there, and anchors never carry time.
 */
pub fn build_arrangement(
    roads: &ColoredRoadGraph,
    budget: f64,
    speed: f64,
    config: &VisualizationConfig,
    tolerance: &ToleranceConfig,
) -> Result<Arrangement, Error> {
    let bounds = roads.bounds().ok_or(Error::EmptyNetwork)?;

    let mut base: DiGraph<ColoredNode, f64> = DiGraph::new();
    for node in roads.graph().nodes() {
        let mut data = node.data;
        data.set_color(color_of(data.remaining_time));
        base.add_node(data);
    }
    let mut seen = HashSet::new();
    for arc in roads.graph().arcs() {
        let (source, target) = (arc.source(), arc.target());
        if source == target || !seen.insert(line_key(source, target)) {
            continue;
        }
        let length = roads.position(source).distance(roads.position(target));
        base.add_arc(source, target, length);
        base.add_arc(target, source, length);
    }
    let mut graph = GeometricGraph::from_graph(base)?;
    let road_nodes = graph.graph().node_count();

    let reach = if budget.is_finite() && speed.is_finite() {
        (budget * speed).max(0.0)
    } else {
        0.0
    };
    let margin = reach + config.frame_margin.max(1.0);
    let frame = Rect::corners(
        bounds.min_x - margin,
        bounds.min_y - margin,
        bounds.max_x + margin,
        bounds.max_y + margin,
    );

    let anchors = anchors(roads, &frame);
    add_frame(&mut graph, &frame, &anchors, config.anchor_gap)?;

    let remaining: Vec<(Point, f64)> = graph
        .graph()
        .nodes()
        .iter()
        .map(|node| (node.data.position, node.data.remaining_time))
        .collect();
    let interpolate = |point: Point, lines: &[OriginalLine]| -> ColoredNode {
        let best = lines
            .iter()
            .filter(|line| line.first.0 < road_nodes && line.second.0 < road_nodes)
            .flat_map(|line| [line.first, line.second])
            .map(|node| {
                let (position, remaining) = remaining[node.0];
                remaining - position.distance(point) / speed
            })
            .fold(f64::NEG_INFINITY, f64::max);
        ColoredNode::with_color(point, color_of(best), best)
    };
    let planar = tolerance
        .planarizer()
        .planarize(&graph, interpolate, |_, length| length)?;
    let crossings = planar.crossing_count();

    let mut graph = planar.into_graph();
    let mut arcs = HashSet::new();
    graph.retain_arcs(|arc| arcs.insert((arc.source(), arc.target())));

    log::debug!(
        "arrangement: {} road nodes, {} anchors, {} crossings, {} nodes in total",
        road_nodes,
        anchors.len(),
        crossings,
        graph.graph().node_count()
    );

    Ok(Arrangement {
        graph,
        frame,
        road_nodes,
        crossings,
    })
}

/**
 * For every component, its extreme nodes paired with their projections on the frame. Among
 * nodes sharing an extreme coordinate, reachable ones are picked first.
 */
fn anchors(roads: &ColoredRoadGraph, frame: &Rect) -> Vec<(NodeHandle, Point)> {
    let mut anchors = Vec::new();
    for component in connected_components(roads) {
        let extremes = [
            extreme(roads, &component, |p| (p.x, p.y)),
            extreme(roads, &component, |p| (-p.x, p.y)),
            extreme(roads, &component, |p| (p.y, p.x)),
            extreme(roads, &component, |p| (-p.y, p.x)),
        ];
        if let [Some(left), Some(right), Some(bottom), Some(top)] = extremes {
            let position = |node: NodeHandle| roads.position(node);
            anchors.push((left, Point::new(frame.min_x, position(left).y)));
            anchors.push((right, Point::new(frame.max_x, position(right).y)));
            anchors.push((bottom, Point::new(position(bottom).x, frame.min_y)));
            anchors.push((top, Point::new(position(top).x, frame.max_y)));
        }
    }
    anchors
}

/** The node with the smallest `key`. Ties on the first part go to reachable nodes. */
fn extreme(
    roads: &ColoredRoadGraph,
    component: &[NodeHandle],
    key: fn(Point) -> (f64, f64),
) -> Option<NodeHandle> {
    let reachable = |node: NodeHandle| roads.graph().node(node).data.is_reachable();
    component.iter().copied().min_by(|a, b| {
        let (first, second) = (key(roads.position(*a)), key(roads.position(*b)));
        first
            .0
            .total_cmp(&second.0)
            .then(reachable(*b).cmp(&reachable(*a)))
            .then(first.1.total_cmp(&second.1))
    })
}

/** Position along the frame, counter-clockwise from the bottom left corner. */
fn frame_parameter(frame: &Rect, point: Point) -> f64 {
    let (width, height) = (frame.width(), frame.height());
    if point.y <= frame.min_y {
        point.x - frame.min_x
    } else if point.x >= frame.max_x {
        width + point.y - frame.min_y
    } else if point.y >= frame.max_y {
        width + height + frame.max_x - point.x
    } else {
        2.0 * width + height + frame.max_y - point.y
    }
}

fn add_frame(
    graph: &mut ArrangementGraph,
    frame: &Rect,
    anchors: &[(NodeHandle, Point)],
    anchor_gap: f64,
) -> Result<(), Error> {
    let corners = [
        Point::new(frame.min_x, frame.min_y),
        Point::new(frame.max_x, frame.min_y),
        Point::new(frame.max_x, frame.max_y),
        Point::new(frame.min_x, frame.max_y),
    ];
    let mut points: Vec<Point> = corners
        .iter()
        .copied()
        .chain(anchors.iter().map(|(_, point)| *point))
        .collect();
    points.sort_by(|a, b| frame_parameter(frame, *a).total_cmp(&frame_parameter(frame, *b)));

    let mut ring: Vec<NodeHandle> = Vec::with_capacity(points.len());
    for point in points {
        let node = graph.add_or_get_node(ColoredNode::fixed(
            point,
            Color::Unreachable,
            f64::NEG_INFINITY,
        ))?;
        if ring.last() != Some(&node) {
            ring.push(node);
        }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    for (index, node) in ring.iter().enumerate() {
        let next = ring[(index + 1) % ring.len()];
        add_pair(graph, *node, next);
    }

    // each anchor starts with a short unreachable stub, so no reach flows along it
    for (road, point) in anchors {
        let end = match graph.node_at(*point) {
            Some(end) => end,
            None => continue,
        };
        let from = graph.position(*road);
        let length = from.distance(*point);
        let gap = anchor_gap.min(length / 2.0);
        let stub = if gap > 0.0 {
            graph.add_node(ColoredNode::fixed(
                from + (*point - from) * (gap / length),
                Color::Unreachable,
                f64::NEG_INFINITY,
            ))?
        } else {
            None
        };
        match stub {
            Some(stub) => {
                add_pair(graph, *road, stub);
                add_pair(graph, stub, end);
            }
            None if graph.graph().find_arc(*road, end).is_none() => add_pair(graph, *road, end),
            None => {}
        }
    }
    Ok(())
}

fn add_pair(graph: &mut ArrangementGraph, a: NodeHandle, b: NodeHandle) {
    let length = graph.position(a).distance(graph.position(b));
    graph.add_arc(a, b, length);
    graph.add_arc(b, a, length);
}

fn connected_components(roads: &ColoredRoadGraph) -> Vec<Vec<NodeHandle>> {
    let count = roads.graph().node_count();
    let mut visited = vec![false; count];
    let mut components = Vec::new();
    for start in 0..count {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut component = vec![NodeHandle(start)];
        let mut queue = VecDeque::from([NodeHandle(start)]);
        while let Some(node) = queue.pop_front() {
            for neighbor in roads.graph().neighbors(node) {
                if !visited[neighbor.0] {
                    visited[neighbor.0] = true;
                    component.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        components.push(component);
    }
    components
}
