//! Incremental route planning for a vehicle moving through the voxel map.
//!
//! The [`Planner`] owns the map and one search engine. It plans a route once,
//! then alternates between sensor updates (which may add obstacles) and
//! single-cell moves along the route. With [`Strategy::AStar`] the route is
//! searched again from the current cell whenever the [`ReplanPolicy`] asks
//! for it. With [`Strategy::Lpa`] the cost field is rooted at the mission
//! target, so the vehicle moving does not invalidate it and every update is
//! a local repair.

#![warn(missing_docs)]

use tracing::{debug, info, warn};

use crate::error::NavigationError;
use crate::geometry::Point;
use crate::map::VoxelMap;
use crate::search::{AStar, LpaStar, PathResult, check_endpoint, locate};

/// Search engine used by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    /// Full A* search on every replan.
    #[cfg_attr(feature = "serde", serde(rename = "astar"))]
    AStar,
    /// Incremental LPA* repair.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "lpa"))]
    Lpa,
}

/// When an A* planner searches again after a sensor update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReplanPolicy {
    /// Only when a newly busy cell lies on the remaining route.
    #[default]
    OnPathConflict,
    /// Whenever any cell changed.
    OnAnyChange,
}

/// What a sensor update did to the plan.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateOutcome {
    /// Cells that became busy, in ascending order.
    pub changed: Vec<usize>,
    /// Whether the remaining route was recomputed.
    pub replanned: bool,
}

#[derive(Debug)]
enum Engine {
    AStar(AStar),
    Lpa(LpaStar),
}

/// Route planner driving a vehicle cell by cell.
#[derive(Debug)]
pub struct Planner {
    map: VoxelMap,
    engine: Engine,
    policy: ReplanPolicy,
    target: Option<usize>,
    /// Route from the cell of the last (re)plan to the target.
    route: Vec<usize>,
    /// Position of the current cell within `route`.
    progress: usize,
    heading: f64,
}

impl Planner {
    /// Creates a planner over `map`.
    pub fn new(map: VoxelMap, strategy: Strategy, policy: ReplanPolicy) -> Self {
        let engine = match strategy {
            Strategy::AStar => Engine::AStar(AStar::new(&map)),
            Strategy::Lpa => Engine::Lpa(LpaStar::new(&map)),
        };
        Self {
            map,
            engine,
            policy,
            target: None,
            route: Vec::new(),
            progress: 0,
            heading: 0.0,
        }
    }

    /// Plans a route between two world points.
    ///
    /// # Returns
    /// * `Result<&[usize], NavigationError>` - The route, current cell first, or the
    ///   reason planning failed
    pub fn plan(&mut self, start: &Point, target: &Point) -> Result<&[usize], NavigationError> {
        let start = locate(&self.map, start)?;
        let target = locate(&self.map, target)?;
        check_endpoint(&self.map, start, NavigationError::StartBlocked)?;
        check_endpoint(&self.map, target, NavigationError::TargetBlocked)?;

        let result = match &mut self.engine {
            Engine::AStar(astar) => {
                astar.set_target(&self.map, target)?;
                astar.search(&self.map, start)?
            }
            Engine::Lpa(lpa) => {
                lpa.set_start(&self.map, target)?;
                lpa.set_target(&self.map, start)?;
                lpa.compute_shortest_path(&self.map)?;
                reversed(lpa.path(&self.map)?)
            }
        };

        info!(start, target, %result, "Route planned");
        self.target = Some(target);
        self.adopt(result.path);
        Ok(self.path())
    }

    /// Applies a sensor batch and repairs the route if needed.
    pub fn update(&mut self, points: &[Point]) -> Result<UpdateOutcome, NavigationError> {
        let changed = self.map.sensor_update(points);
        let Some(current) = self.current() else {
            return Ok(UpdateOutcome {
                changed,
                replanned: false,
            });
        };
        if changed.is_empty() {
            return Ok(UpdateOutcome {
                changed,
                replanned: false,
            });
        }

        let conflict = self
            .path()
            .iter()
            .any(|cell| changed.binary_search(cell).is_ok());
        let outcome = match &mut self.engine {
            Engine::AStar(astar) => {
                astar.invalidate(&changed);
                if conflict || self.policy == ReplanPolicy::OnAnyChange {
                    Some(astar.search(&self.map, current))
                } else {
                    None
                }
            }
            Engine::Lpa(lpa) => Some(repair(lpa, &self.map, &changed, current)),
        };

        let replanned = match outcome {
            None => false,
            Some(Ok(result)) => {
                debug!(current, conflict, %result, "Route repaired");
                self.adopt(result.path);
                true
            }
            Some(Err(err)) => {
                warn!(current, error = %err, "No route after sensor update, holding position");
                self.adopt(vec![current]);
                return Err(err);
            }
        };

        Ok(UpdateOutcome { changed, replanned })
    }

    /// Moves to the next cell of the route and returns it.
    ///
    /// Returns `None` once the route is exhausted. The heading only changes
    /// on horizontal moves.
    pub fn advance(&mut self) -> Option<usize> {
        let current = self.current()?;
        let next = *self.route.get(self.progress + 1)?;
        if let (Some(from), Some(to)) = (self.map.cell(current), self.map.cell(next))
            && (from.center.x != to.center.x || from.center.y != to.center.y)
        {
            self.heading = from.center.angle_xy(&to.center);
        }
        self.progress += 1;
        Some(next)
    }

    /// Cell the vehicle occupies, once a route exists.
    pub fn current(&self) -> Option<usize> {
        self.route.get(self.progress).copied()
    }

    /// Center of the current cell.
    pub fn current_point(&self) -> Option<Point> {
        self.current()
            .and_then(|c| self.map.cell(c))
            .map(|c| c.center)
    }

    /// Mission target cell.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Remaining route, current cell first.
    pub fn path(&self) -> &[usize] {
        self.route.get(self.progress..).unwrap_or(&[])
    }

    /// Cell centers along the remaining route.
    pub fn waypoints(&self) -> Vec<Point> {
        self.path()
            .iter()
            .filter_map(|&i| self.map.cell(i).map(|c| c.center))
            .collect()
    }

    /// Heading of the last horizontal move, in radians.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Returns true once the vehicle stands on the target.
    pub fn is_finished(&self) -> bool {
        self.target.is_some() && self.current() == self.target
    }

    /// The map the planner works on.
    pub fn map(&self) -> &VoxelMap {
        &self.map
    }

    fn adopt(&mut self, route: Vec<usize>) {
        self.route = route;
        self.progress = 0;
    }
}

/// Flips an LPA* result rooted at the mission target so it runs from the vehicle.
fn reversed(mut result: PathResult) -> PathResult {
    result.path.reverse();
    result
}

fn repair(
    lpa: &mut LpaStar,
    map: &VoxelMap,
    changed: &[usize],
    current: usize,
) -> Result<PathResult, NavigationError> {
    // the root of the cost field is the mission target
    let root = lpa.start().ok_or(NavigationError::TargetNotSet)?;
    check_endpoint(map, root, NavigationError::TargetBlocked)?;
    check_endpoint(map, current, NavigationError::StartBlocked)?;
    lpa.notify_changed(map, changed)?;
    lpa.relocate_target(map, current)?;
    lpa.compute_shortest_path(map)?;
    Ok(reversed(lpa.path(map)?))
}
