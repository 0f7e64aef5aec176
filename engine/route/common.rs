use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("Quadtree error: {0}")]
    QuadtreeError(#[from] quadtree::Error),
    #[error("Network error: {0}")]
    NetworkError(#[from] network::Error),
    #[error("Transit error: {0}")]
    TransitError(#[from] transit::Error),
    #[error("Unknown source node: {0}")]
    UnknownSourceNode(usize),
    #[error("No road node to attach stop {0} to")]
    NoRoadForStop(u64),
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Mode {
    Walking,
    Biking,
    Driving,
}

pub static MODES: &[Mode] = &[Mode::Walking, Mode::Biking, Mode::Driving];

impl Mode {
    /**
     * Average speed, in m/s.
     */
    pub fn linear_speed(&self) -> f64 {
        use Mode::*;
        match self {
            Walking => 1.5,  // normal walking speed
            Biking => 6.7,   // 15mph, average biking speed
            Driving => 13.4, // 30mph, a standard city driving speed limit
        }
    }

    /** Walkers and cyclists are not allowed on motorways. */
    pub fn may_use(&self, class: RoadClass) -> bool {
        !(class == RoadClass::Motorway && *self != Mode::Driving)
    }

    pub fn respects_one_way(&self) -> bool {
        *self != Mode::Walking
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Mode::*;
        match self {
            Walking => write!(f, "walking"),
            Biking => write!(f, "biking"),
            Driving => write!(f, "driving"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum RoadClass {
    Motorway,
    Primary,
    Secondary,
    Residential,
    Footway,
    Other,
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use RoadClass::*;
        match self {
            Motorway => write!(f, "motorway"),
            Primary => write!(f, "primary"),
            Secondary => write!(f, "secondary"),
            Residential => write!(f, "residential"),
            Footway => write!(f, "footway"),
            Other => write!(f, "other"),
        }
    }
}

/** Attributes of one road segment, as delivered by the road loader. */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, derive_more::Constructor)]
pub struct RoadArc {
    /** In meters. */
    pub length: f64,
    pub class: RoadClass,
    pub one_way: bool,
    /** In m/s, if signposted. */
    pub max_speed: Option<f64>,
    pub bridge: bool,
    pub tunnel: bool,
}

impl RoadArc {
    pub fn residential(length: f64) -> Self {
        Self::new(length, RoadClass::Residential, false, None, false, false)
    }

    pub fn with_class(length: f64, class: RoadClass) -> Self {
        Self::new(length, class, false, None, false, false)
    }
}

/** Router parameters. */
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    pub mode: Mode,
    /** In m/s. Also converts remaining time into remaining distance. */
    pub walking_speed: f64,
    pub avoid_motorways: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Walking,
            walking_speed: Mode::Walking.linear_speed(),
            avoid_motorways: true,
        }
    }
}

impl RoutingConfig {
    /** Travel speed on roads without a speed limit, in m/s. */
    pub fn speed(&self) -> f64 {
        match self.mode {
            Mode::Walking => self.walking_speed,
            mode => mode.linear_speed(),
        }
    }

    /** Travel time along a road arc, or `None` if the arc may not be used. */
    pub fn road_time(&self, arc: &RoadArc) -> Option<f64> {
        if self.avoid_motorways && !self.mode.may_use(arc.class) {
            return None;
        }
        let speed = match (self.mode, arc.max_speed) {
            (Mode::Driving, Some(max_speed)) => max_speed.min(self.speed()),
            _ => self.speed(),
        };
        Some(arc.length / speed)
    }
}
