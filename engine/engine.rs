use serde::{Deserialize, Serialize};

use isochrone::{FaceStrategy, Timezone};
use network::{DiGraph, NodeHandle, Point};
use route::{
    blue_to_red, color_road_graph, colored_road_graph, recolor, ColoredRoadGraph, NodeIterator,
    RoadArc, RoadGraph, RoadIterator, Router, RoutingGraph, TransitIterator,
};
use state::Config;
use transit::Timetable;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] state::Error),
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
    #[error("Transit error: {0}")]
    TransitError(#[from] transit::Error),
    #[error("Route error: {0}")]
    RouteError(#[from] route::Error),
    #[error("Isochrone error: {0}")]
    IsochroneError(#[from] isochrone::Error),
    #[error("Start node {0} is not a road node")]
    InvalidStartNode(NodeHandle),
}

/** What gets written to disk: the routing graph is rebuilt on load. */
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineData {
    config: Config,
    roads: DiGraph<Point, RoadArc>,
    timetable: Timetable,
}

/**
 * A road network with an optional timetable, ready to answer isochrone queries. Every query
 * builds its own router, so an engine is never mutated by a query.
 */
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "EngineData", into = "EngineData")]
pub struct Engine {
    pub config: Config,
    roads: RoadGraph,
    timetable: Timetable,
    routing: RoutingGraph,
}

impl TryFrom<EngineData> for Engine {
    type Error = Error;

    fn try_from(data: EngineData) -> Result<Self, Error> {
        Engine::new(data.config, RoadGraph::from_graph(data.roads)?, data.timetable)
    }
}

impl From<Engine> for EngineData {
    fn from(engine: Engine) -> Self {
        Self {
            config: engine.config,
            roads: engine.roads.into_graph(),
            timetable: engine.timetable,
        }
    }
}

impl Engine {
    pub fn new(config: Config, roads: RoadGraph, timetable: Timetable) -> Result<Self, Error> {
        let mut routing = RoutingGraph::from_roads(&roads)?;
        if !timetable.is_empty() {
            let index = routing.merge_timetable(&timetable)?;
            log::info!("merged timetable with {} stops", index.stop_count());
        }
        log::info!(
            "engine ready: {} road nodes, {} routing nodes",
            roads.graph().node_count(),
            routing.node_count()
        );
        Ok(Self {
            config,
            roads,
            timetable,
            routing,
        })
    }

    pub fn load(data: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn load_file(path: &std::path::Path) -> Result<Self, Error> {
        Ok(Self::load(&std::fs::read_to_string(path)?)?)
    }

    pub fn dump(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn dump_file(&self, path: &std::path::Path) -> Result<(), Error> {
        Ok(std::fs::write(path, self.dump()?)?)
    }

    pub fn roads(&self) -> &RoadGraph {
        &self.roads
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn nearest_node(&self, point: Point) -> Option<NodeHandle> {
        self.routing.nearest_road_node(point)
    }

    fn router(&self) -> Router {
        let iterator: NodeIterator = if self.timetable.is_empty() {
            RoadIterator::new(self.config.routing).into()
        } else {
            TransitIterator::new(self.config.routing).into()
        };
        Router::new(iterator)
    }

    /** Routes from `start_node` and colors a copy of the road network for `budget`. */
    fn color(
        &self,
        start_node: NodeHandle,
        start_time: f64,
        budget: f64,
        buffer_time: f64,
    ) -> Result<ColoredRoadGraph, Error> {
        if !self.routing.is_road(start_node) {
            return Err(Error::InvalidStartNode(start_node));
        }
        let mut router = self.router();
        router.run_with_budget(&self.routing, start_node, start_time, budget, buffer_time)?;
        log::info!(
            "routed from {}: {} nodes settled",
            start_node,
            router.settled_count()
        );

        let mut colored = colored_road_graph(&self.roads)?;
        color_road_graph(&router, &mut colored, budget, buffer_time);
        Ok(colored)
    }

    fn build(
        &self,
        colored: &ColoredRoadGraph,
        budget: f64,
        strategy: FaceStrategy,
    ) -> Result<Timezone, Error> {
        let timezone = Timezone::build(
            colored,
            budget,
            self.config.routing.walking_speed,
            strategy,
            &self.config.visualization,
            &self.config.tolerance,
        )?;
        log::info!(
            "budget {} ({}): {} polygons, accuracy {:.3}",
            budget,
            strategy,
            timezone.polygons.len(),
            timezone.validation.accuracy()
        );
        Ok(timezone)
    }

    /**
     * The area reachable from `start_node` within `budget` seconds of `start_time`, counted
     * in seconds since Monday 00:00. Nodes within `buffer_time` past the budget count as
     * reachable when unreachable nodes do not reach them through other buffer nodes. Without
     * a strategy the configured one is used.
     */
    pub fn create_isochrone(
        &self,
        start_node: NodeHandle,
        start_time: f64,
        budget: f64,
        buffer_time: f64,
        strategy: Option<FaceStrategy>,
    ) -> Result<Timezone, Error> {
        let mut colored = self.color(start_node, start_time, budget, buffer_time)?;
        blue_to_red(&mut colored);
        self.build(&colored, budget, self.config.strategy(strategy))
    }

    /**
     * One timezone per budget, in the order given, from a single router run at the largest
     * budget.
     */
    pub fn create_isochrones(
        &self,
        start_node: NodeHandle,
        start_time: f64,
        budgets: &[f64],
        buffer_time: f64,
        strategy: Option<FaceStrategy>,
    ) -> Result<Vec<Timezone>, Error> {
        let max_budget = match budgets.iter().copied().reduce(f64::max) {
            Some(budget) => budget,
            None => return Ok(Vec::new()),
        };
        let strategy = self.config.strategy(strategy);
        let mut colored = self.color(start_node, start_time, max_budget, buffer_time)?;
        let snapshot = colored.snapshot();

        let mut timezones = Vec::with_capacity(budgets.len());
        for budget in budgets {
            recolor(&mut colored, max_budget - budget, buffer_time);
            blue_to_red(&mut colored);
            let timezone = self.build(&colored, *budget, strategy);
            colored.restore(&snapshot);
            timezones.push(timezone?);
        }
        Ok(timezones)
    }
}

#[cfg(test)]
mod tests {
    use network::ArcHandle;

    use crate::engine::*;

    fn line_engine() -> Result<Engine, Error> {
        let mut roads = RoadGraph::new();
        let a = roads.try_add_node(Point::new(0.0, 0.0))?;
        let b = roads.try_add_node(Point::new(10.0, 0.0))?;
        roads.add_arc(a, b, RoadArc::residential(10.0));
        roads.add_arc(b, a, RoadArc::residential(10.0));
        Engine::new(Config::default(), roads, Timetable::new())
    }

    #[test]
    fn rejects_unknown_start_node() -> Result<(), Error> {
        let engine = line_engine()?;
        assert!(matches!(
            engine.create_isochrone(NodeHandle(7), 0.0, 60.0, 0.0, None),
            Err(Error::InvalidStartNode(NodeHandle(7)))
        ));
        Ok(())
    }

    #[test]
    fn no_budgets() -> Result<(), Error> {
        let engine = line_engine()?;
        assert!(engine
            .create_isochrones(NodeHandle(0), 0.0, &[], 0.0, None)?
            .is_empty());
        Ok(())
    }

    #[test]
    fn nearest_node() -> Result<(), Error> {
        let engine = line_engine()?;
        assert_eq!(engine.nearest_node(Point::new(8.0, 1.0)), Some(NodeHandle(1)));
        Ok(())
    }

    #[test]
    fn dump_keeps_every_float_bit() -> Result<(), Error> {
        let mut roads = RoadGraph::new();
        let a = roads.try_add_node(Point::new(0.1 + 0.2, 0.0))?;
        let b = roads.try_add_node(Point::new(100.0, 1.0 / 3.0))?;
        roads.add_arc(a, b, RoadArc::residential(99.99999999999999));
        roads.add_arc(b, a, RoadArc::residential(99.99999999999999));
        let engine = Engine::new(Config::default(), roads, Timetable::new())?;

        let loaded = Engine::load(&engine.dump()?)?;
        let arc = loaded.roads().graph().arc(ArcHandle(0));
        assert_eq!(arc.data.length.to_bits(), 99.99999999999999f64.to_bits());
        assert_eq!(loaded.roads().position(a), Point::new(0.1 + 0.2, 0.0));
        assert_eq!(loaded.roads().position(b), Point::new(100.0, 1.0 / 3.0));
        Ok(())
    }

    #[test]
    fn load_rejects_empty_trip() -> Result<(), Error> {
        let mut data: serde_json::Value = serde_json::from_str(&line_engine()?.dump()?)?;
        data["timetable"]["trips"]
            .as_array_mut()
            .expect("trips are a list")
            .push(serde_json::json!({ "id": 1, "route": "X", "stop_times": [] }));
        let result = Engine::load(&data.to_string());
        assert!(matches!(result, Err(Error::JsonError(_))));
        Ok(())
    }
}
