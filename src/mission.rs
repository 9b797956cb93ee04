use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};
use voxnav_navigation::{NavigationError, Planner, VoxelMap};

use crate::config::Settings;
use crate::scenario::Scenario;

/// Summary of a finished mission.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub steps: usize,
    pub replans: usize,
    pub discovered: usize,
    pub reached: bool,
}

/// Drives the vehicle from the configured start to the target, feeding the
/// planner whatever the sensor sees before every move.
pub fn run(settings: &Settings, scenario: &Scenario) -> Result<MissionReport> {
    let map = VoxelMap::new(&settings.map_params(), &scenario.known)
        .context("Failed to build the voxel map")?;
    info!(cells = map.len(), connectivity = ?map.connectivity(), "Map built");
    debug!("\n{}", map);

    let mut planner = Planner::new(map, settings.planner.strategy, settings.planner.replan);
    let route = planner
        .plan(&settings.start(), &settings.target())
        .context("Initial planning failed")?;
    info!(cells = route.len(), strategy = ?settings.planner.strategy, "Initial route ready");

    let mut report = MissionReport {
        steps: 0,
        replans: 0,
        discovered: 0,
        reached: planner.is_finished(),
    };

    while !planner.is_finished() {
        if report.steps >= settings.mission.max_steps {
            warn!(steps = report.steps, "Step limit reached before the target");
            return Ok(report);
        }
        let Some(here) = planner.current_point() else {
            bail!("Planner has no current cell");
        };

        let seen = settings
            .sensor
            .visible(&here, planner.heading(), &scenario.hidden);
        match planner.update(&seen) {
            Ok(outcome) => {
                report.discovered += outcome.changed.len();
                if outcome.replanned {
                    report.replans += 1;
                    debug!(
                        changed = outcome.changed.len(),
                        remaining = planner.path().len(),
                        "Route repaired"
                    );
                }
            }
            Err(err @ NavigationError::NoPath { .. }) => {
                warn!(at = %here, "Target no longer reachable");
                return Err(err).context("Mission aborted");
            }
            Err(err) => return Err(err).context("Sensor update failed"),
        }

        let Some(next) = planner.advance() else {
            bail!("Route ended before the target");
        };
        report.steps += 1;
        if let Some(cell) = planner.map().cell(next) {
            info!(
                step = report.steps,
                cell = next,
                at = %cell.center,
                heading = planner.heading(),
                "Moved"
            );
        }
    }

    report.reached = true;
    info!(?report, "Target reached");
    Ok(report)
}
