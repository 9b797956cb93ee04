mod config;
mod mission;
mod scenario;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CONFIG_PATH, load_settings};
use crate::scenario::Scenario;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let settings = load_settings(&path).with_context(|| format!("Invalid configuration in {}", path))?;
    info!(
        strategy = ?settings.planner.strategy,
        replan = ?settings.planner.replan,
        connectivity = ?settings.map.connectivity,
        "Voxnav mission driver started"
    );

    let scenario = Scenario::generate(&settings);
    match mission::run(&settings, &scenario) {
        Ok(report) if report.reached => {
            info!(steps = report.steps, replans = report.replans, "Mission complete");
            Ok(())
        }
        Ok(report) => {
            error!(?report, "Mission stopped short of the target");
            anyhow::bail!("target not reached within {} steps", settings.mission.max_steps)
        }
        Err(e) => {
            error!("Mission failed: {:?}", e);
            Err(e)
        }
    }
}
