use isochrone::{FaceStrategy, ToleranceConfig, VisualizationConfig};
use route::RoutingConfig;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error parsing TOML: {0}")]
    TomlParsingError(#[from] toml::de::Error),
    #[error("Error serializing TOML: {0}")]
    TomlSerializingError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/** Every tunable of a query, from routing to the final ring cleanup. */
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
}

impl Config {
    pub fn load(data: &str) -> Result<Self, Error> {
        return Ok(toml::from_str(data)?);
    }

    pub fn load_file(path: &std::path::Path) -> Result<Self, Error> {
        return Ok(Self::load(&std::fs::read_to_string(path)?)?);
    }

    pub fn dump(&self) -> Result<String, Error> {
        return Ok(toml::to_string(self)?);
    }

    pub fn dump_file(&self, path: &std::path::Path) -> Result<(), Error> {
        return Ok(std::fs::write(path, self.dump()?)?);
    }

    /** The configured strategy, unless the caller asks for another one. */
    pub fn strategy(&self, strategy: Option<FaceStrategy>) -> FaceStrategy {
        strategy.unwrap_or(self.visualization.strategy)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::*;

    #[test]
    fn round_trip() -> Result<(), Error> {
        let mut config = Config::default();
        config.visualization.strategy = FaceStrategy::Boundary;
        config.routing.walking_speed = 1.1;
        assert_eq!(Config::load(&config.dump()?)?, config);
        Ok(())
    }

    #[test]
    fn missing_sections_take_defaults() -> Result<(), Error> {
        let config = Config::load(
            r#"
            [routing]
            mode = "Biking"
            walking_speed = 1.2
            avoid_motorways = false
            "#,
        )?;
        assert_eq!(config.routing.mode, route::Mode::Biking);
        assert!(!config.routing.avoid_motorways);
        assert_eq!(config.visualization, VisualizationConfig::default());
        assert_eq!(config.tolerance.sweep_epsilon, 1e-5);
        assert_eq!(config.strategy(None), FaceStrategy::Octilinear);
        assert_eq!(config.strategy(Some(FaceStrategy::Boundary)), FaceStrategy::Boundary);
        Ok(())
    }

    #[test]
    fn bad_toml() {
        assert!(matches!(
            Config::load("routing = 3"),
            Err(Error::TomlParsingError(_))
        ));
    }
}
