use config::{Config, ConfigError, Environment, File, FileFormat};
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::{error, info};
use voxnav_navigation::grid::Subscript;
use voxnav_navigation::{
    Connectivity, MapParams, Point, ReplanPolicy, SensorFootprint, Strategy, Vehicle,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "VOXNAV";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub map: MapSettings,
    pub vehicle: Vehicle,
    pub planner: PlannerSettings,
    #[serde(default)]
    pub sensor: SensorFootprint,
    pub scenario: ScenarioSettings,
    pub mission: MissionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapSettings {
    pub bounds: [f64; 3],
    pub dims: [usize; 3],
    #[serde(default)]
    pub connectivity: Connectivity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerSettings {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub replan: ReplanPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSettings {
    pub seed: u64,
    pub pillars: usize,
    pub hidden_obstacles: usize,
    pub clearance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionSettings {
    pub start: [f64; 3],
    pub target: [f64; 3],
    pub max_steps: usize,
}

impl Settings {
    pub fn map_params(&self) -> MapParams {
        let [x, y, z] = self.map.dims;
        MapParams {
            bounds: Vector3::from(self.map.bounds),
            dims: Subscript::new(x, y, z),
            vehicle: self.vehicle,
            connectivity: self.map.connectivity,
        }
    }

    pub fn start(&self) -> Point {
        let [x, y, z] = self.mission.start;
        Point::new(x, y, z)
    }

    pub fn target(&self) -> Point {
        let [x, y, z] = self.mission.target;
        Point::new(x, y, z)
    }
}

/// Loads the raw configuration from `path`, with `VOXNAV_*` environment
/// overrides on top (`__` separates section and key).
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match settings {
        Ok(config) => {
            info!("Successfully loaded configuration: {:?}", config);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

pub fn load_settings(path: &str) -> Result<Settings, ConfigError> {
    load_config(path)?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [map]
        bounds = [10.0, 8.0, 2.0]
        dims = [10, 8, 2]
        connectivity = "twenty_six"

        [vehicle]
        radius = 0.3
        height = 0.3

        [planner]
        strategy = "astar"

        [scenario]
        seed = 3
        pillars = 2
        hidden_obstacles = 4
        clearance = 1.0

        [mission]
        start = [0.5, 0.5, 0.5]
        target = [9.5, 7.5, 1.5]
        max_steps = 50
    "#;

    fn parse(text: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_parse_settings() {
        let settings = parse(SAMPLE);
        assert_eq!(settings.map.connectivity, Connectivity::TwentySix);
        assert_eq!(settings.planner.strategy, Strategy::AStar);
        assert_eq!(settings.planner.replan, ReplanPolicy::OnPathConflict);
        assert_eq!(settings.sensor, SensorFootprint::default());
        assert_eq!(settings.target(), Point::new(9.5, 7.5, 1.5));

        let params = settings.map_params();
        assert_eq!(params.dims, Subscript::new(10, 8, 2));
        assert_eq!(params.bounds, Vector3::new(10.0, 8.0, 2.0));
        assert_eq!(params.vehicle.radius, 0.3);
    }

    #[test]
    fn test_default_file_parses() {
        let text = include_str!("../config/default.toml");
        let settings = parse(text);
        assert_eq!(settings.planner.strategy, Strategy::Lpa);
        assert_eq!(settings.map.connectivity, Connectivity::Ten);
        assert_eq!(settings.start(), Point::new(17.5, 4.5, 1.5));
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let result: Result<Settings, _> = Config::builder()
            .add_source(File::from_str("[map]\nbounds = [1.0, 1.0, 1.0]", FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize();
        assert!(result.is_err());
    }
}
