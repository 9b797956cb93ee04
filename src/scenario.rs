//! Synthetic worlds for the mission driver.
//!
//! A scenario is two point clouds: pillars known when the map is built, and
//! hidden obstacles the vehicle can only discover through its sensor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use voxnav_navigation::Point;

use crate::config::Settings;

/// Horizontal spacing of the points making up a pillar or a wall.
const POINT_SPACING: f64 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub known: Vec<Point>,
    pub hidden: Vec<Point>,
}

impl Scenario {
    /// Generates a reproducible scenario from the configured seed.
    pub fn generate(settings: &Settings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.scenario.seed);
        let [xlen, ylen, zlen] = settings.map.bounds;
        let keep_clear = [settings.start(), settings.target()];
        let clearance = settings.scenario.clearance;
        let clear = |p: &Point| keep_clear.iter().all(|c| c.dist_xy(p) > clearance);

        let known: Vec<Point> = (0..settings.scenario.pillars)
            .flat_map(|_| {
                let x = rng.random_range(0.0..xlen);
                let y = rng.random_range(0.0..ylen);
                column(x, y, zlen)
            })
            .filter(|p| clear(p))
            .collect();

        let hidden: Vec<Point> = (0..settings.scenario.hidden_obstacles)
            .flat_map(|_| {
                let x = rng.random_range(0.0..xlen);
                let y = rng.random_range(0.0..ylen);
                let length = rng.random_range(1.0..4.0);
                if rng.random_bool(0.5) {
                    wall(x, y, x + length, y, zlen)
                } else {
                    wall(x, y, x, y + length, zlen)
                }
            })
            .filter(|p| p.x < xlen && p.y < ylen && clear(p))
            .collect();

        info!(
            seed = settings.scenario.seed,
            known = known.len(),
            hidden = hidden.len(),
            "Scenario generated"
        );
        Self { known, hidden }
    }
}

/// Vertical column of points from the floor to `height`.
fn column(x: f64, y: f64, height: f64) -> Vec<Point> {
    let levels = (height / POINT_SPACING).floor() as usize;
    (0..levels)
        .map(|k| Point::new(x, y, (k as f64 + 0.5) * POINT_SPACING))
        .collect()
}

/// Straight wall between two floor points, full height.
fn wall(x0: f64, y0: f64, x1: f64, y1: f64, height: f64) -> Vec<Point> {
    let length = (x1 - x0).hypot(y1 - y0);
    let steps = (length / POINT_SPACING).ceil().max(1.0) as usize;
    (0..=steps)
        .flat_map(|s| {
            let t = s as f64 / steps as f64;
            column(x0 + t * (x1 - x0), y0 + t * (y1 - y0), height)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_spans_height() {
        let points = column(1.0, 2.0, 2.0);
        assert_eq!(points.len(), 8);
        assert!(points.iter().all(|p| p.x == 1.0 && p.y == 2.0));
        assert!(points.iter().all(|p| p.z > 0.0 && p.z < 2.0));
    }

    #[test]
    fn test_wall_endpoints() {
        let points = wall(0.0, 0.0, 1.0, 0.0, 1.0);
        // 5 columns of 4 points
        assert_eq!(points.len(), 20);
        assert!(points.iter().any(|p| p.x == 0.0));
        assert!(points.iter().any(|p| p.x == 1.0));
    }
}
