//! World-space points and the planar geometry used by the map and sensor
//! footprint.
//!
//! Every derived quantity (distances, angles, rotated coordinates) passes
//! through [`round`], so values computed along different code paths compare
//! equal when they describe the same geometry.

#![warn(missing_docs)]

use nalgebra::Vector3;
use std::fmt;

/// Number of rounding steps per world unit (six decimal places).
pub const ROUNDING_SCALE: f64 = 1e6;

/// Rounds `value` to the fixed resolution used throughout the crate.
///
/// Halves round away from zero. Non-finite values pass through unchanged so
/// an unreachable cost stays unreachable.
pub fn round(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    (value * ROUNDING_SCALE).round() / ROUNDING_SCALE
}

/// A point in world coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate (height).
    pub z: f64,
}

impl Point {
    /// Creates a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the point as a nalgebra vector.
    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance in 3D.
    pub fn dist(&self, other: &Point) -> f64 {
        round((other.to_vector() - self.to_vector()).norm())
    }

    /// Euclidean distance in the XY plane.
    pub fn dist_xy(&self, other: &Point) -> f64 {
        round((other.x - self.x).hypot(other.y - self.y))
    }

    /// Absolute height difference.
    pub fn dist_z(&self, other: &Point) -> f64 {
        round((other.z - self.z).abs())
    }

    /// Planar heading from `self` towards `other`, in radians within `[-π, π]`.
    pub fn angle_xy(&self, other: &Point) -> f64 {
        round((other.y - self.y).atan2(other.x - self.x))
    }

    /// Rotates the point about `pivot` in the XY plane by `theta` radians
    /// (counter-clockwise). Height is kept.
    pub fn rotated_xy(&self, pivot: &Point, theta: f64) -> Point {
        let (sin, cos) = theta.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point::new(
            round(pivot.x + dx * cos - dy * sin),
            round(pivot.y + dx * sin + dy * cos),
            self.z,
        )
    }

    /// Even-odd test of the point's XY projection against a closed ring.
    ///
    /// The ring is given as its vertices in order; the closing edge is
    /// implied. Rings with fewer than three vertices contain nothing.
    pub fn is_inside_xy(&self, ring: &[Point]) -> bool {
        if ring.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (a, b) = (&ring[i], &ring[j]);
            if (a.y > self.y) != (b.y > self.y) {
                let crossing = (b.x - a.x) * (self.y - a.y) / (b.y - a.y) + a.x;
                if self.x < crossing {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

impl From<Vector3<f64>> for Point {
    fn from(v: Vector3<f64>) -> Self {
        Point::new(v.x, v.y, v.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(p: Point) -> Self {
        p.to_vector()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_round() {
        assert_eq!(round(1.234_567_4), 1.234_567);
        assert_eq!(round(1.234_567_6), 1.234_568);
        assert_eq!(round(-0.000_000_4), 0.0);
        assert_eq!(round(f64::INFINITY), f64::INFINITY);
        assert!(round(f64::NAN).is_nan());
    }

    #[test]
    fn test_distances() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 12.0);
        assert_eq!(a.dist(&b), 13.0);
        assert_eq!(a.dist_xy(&b), 5.0);
        assert_eq!(a.dist_z(&b), 12.0);
        assert_eq!(b.dist_z(&a), 12.0);

        let diag = Point::new(1.0, 1.0, 1.0);
        assert_eq!(a.dist(&diag), 1.732_051);
    }

    #[test]
    fn test_angle_xy() {
        let origin = Point::default();
        assert!((origin.angle_xy(&Point::new(1.0, 0.0, 5.0))).abs() < EPSILON);
        assert!((origin.angle_xy(&Point::new(0.0, 2.0, 0.0)) - round(FRAC_PI_2)).abs() < EPSILON);
        assert!((origin.angle_xy(&Point::new(-1.0, 0.0, 0.0)) - round(PI)).abs() < EPSILON);
        assert!((origin.angle_xy(&Point::new(1.0, 1.0, 0.0)) - round(FRAC_PI_4)).abs() < EPSILON);
    }

    #[test]
    fn test_rotated_xy() {
        let pivot = Point::new(1.0, 1.0, 0.0);
        let p = Point::new(2.0, 1.0, 3.0);

        let quarter = p.rotated_xy(&pivot, FRAC_PI_2);
        assert_eq!(quarter, Point::new(1.0, 2.0, 3.0));

        let half = p.rotated_xy(&pivot, PI);
        assert_eq!(half, Point::new(0.0, 1.0, 3.0));

        // rotating a full turn lands back on the input
        assert_eq!(p.rotated_xy(&pivot, 2.0 * PI), p);
    }

    #[test]
    fn test_is_inside_square() {
        let square = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.0, 2.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        ];
        assert!(Point::new(1.0, 1.0, 9.0).is_inside_xy(&square));
        assert!(!Point::new(3.0, 1.0, 0.0).is_inside_xy(&square));
        assert!(!Point::new(1.0, -0.5, 0.0).is_inside_xy(&square));
    }

    #[test]
    fn test_is_inside_concave() {
        // U shape opening upwards
        let ring = [
            Point::new(0.0, 0.0, 0.0),
            Point::new(3.0, 0.0, 0.0),
            Point::new(3.0, 3.0, 0.0),
            Point::new(2.0, 3.0, 0.0),
            Point::new(2.0, 1.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(1.0, 3.0, 0.0),
            Point::new(0.0, 3.0, 0.0),
        ];
        assert!(Point::new(0.5, 2.0, 0.0).is_inside_xy(&ring));
        assert!(Point::new(2.5, 2.0, 0.0).is_inside_xy(&ring));
        assert!(!Point::new(1.5, 2.0, 0.0).is_inside_xy(&ring), "notch is outside");
        assert!(Point::new(1.5, 0.5, 0.0).is_inside_xy(&ring));
    }

    #[test]
    fn test_degenerate_ring() {
        let segment = [Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 0.0)];
        assert!(!Point::new(0.5, 0.5, 0.0).is_inside_xy(&segment));
        assert!(!Point::default().is_inside_xy(&[]));
    }

    #[test]
    fn test_vector_conversion() {
        let p = Point::new(1.5, -2.0, 0.25);
        let v: Vector3<f64> = p.into();
        assert_eq!(Point::from(v), p);
        assert_eq!(format!("{}", p), "(1.500, -2.000, 0.250)");
    }
}
