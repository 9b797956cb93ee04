//! Field of view of the on-board sensor.
//!
//! The footprint is a rectangle in the XY plane, attached to the vehicle and
//! turned with its heading, plus a vertical tolerance. Points of a world
//! cloud that fall inside it are what the sensor reports on one update.

use crate::geometry::Point;

/// Rectangular sensor footprint around the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorFootprint {
    /// Reach behind the vehicle along its heading.
    pub behind: f64,
    /// Reach ahead of the vehicle along its heading.
    pub ahead: f64,
    /// Reach to either side.
    pub half_width: f64,
    /// Maximum height difference of a visible point.
    pub vertical: f64,
}

impl Default for SensorFootprint {
    fn default() -> Self {
        Self {
            behind: 1.0,
            ahead: 3.0,
            half_width: 1.0,
            vertical: 1.0,
        }
    }
}

impl SensorFootprint {
    /// Corners of the footprint for a vehicle at `center` heading `yaw`,
    /// counter-clockwise from the rear right.
    pub fn outline(&self, center: &Point, yaw: f64) -> [Point; 4] {
        let corner = |dx: f64, dy: f64| {
            Point::new(center.x + dx, center.y + dy, center.z).rotated_xy(center, yaw)
        };
        [
            corner(-self.behind, -self.half_width),
            corner(self.ahead, -self.half_width),
            corner(self.ahead, self.half_width),
            corner(-self.behind, self.half_width),
        ]
    }

    /// Points of `cloud` the sensor sees from `center` heading `yaw`.
    pub fn visible(&self, center: &Point, yaw: f64, cloud: &[Point]) -> Vec<Point> {
        let outline = self.outline(center, yaw);
        cloud
            .iter()
            .filter(|p| center.dist_z(p) <= self.vertical && p.is_inside_xy(&outline))
            .copied()
            .collect()
    }
}
