//! Cells and edges of the voxel map.

use crate::geometry::Point;

/// Weighted link from one free cell to another.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Linear index of the linked cell.
    pub target: usize,
    /// Distance between the two cell centers.
    pub weight: f64,
}

/// A single voxel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// Linear index of this cell.
    pub index: usize,
    /// Center in world coordinates.
    pub center: Point,
    /// Whether the vehicle, centered here, stays inside the map bounds.
    pub in_bounds: bool,
    /// Whether no obstacle point lies within the vehicle envelope around the center.
    pub free: bool,
    /// Obstacle points known when the map was built.
    pub static_points: Vec<Point>,
    /// Obstacle points from the latest sensor update that touched this cell.
    pub sensor_points: Vec<Point>,
    /// Cells whose points can reach this one through the vehicle envelope,
    /// this cell included.
    pub neighbors: Vec<usize>,
    /// Links to adjacent traversable cells, fixed at build time.
    pub edges: Vec<Edge>,
}

impl Cell {
    pub(crate) fn new(index: usize, center: Point, in_bounds: bool, neighbors: Vec<usize>) -> Self {
        Self {
            index,
            center,
            in_bounds,
            free: true,
            static_points: Vec::new(),
            sensor_points: Vec::new(),
            neighbors,
            edges: Vec::new(),
        }
    }

    /// A cell the vehicle may occupy: inside the bounds and currently free.
    pub fn is_traversable(&self) -> bool {
        self.in_bounds && self.free
    }
}
