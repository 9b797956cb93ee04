//! Shortest-path search over the voxel map graph.
//!
//! Two engines share the same inputs and outputs: [`AStar`] runs a full search
//! per call, [`LpaStar`] keeps its cost field across sensor updates and
//! repairs it locally. Both keep their vertex state privately, indexed like
//! the map's cells, and read the map only through shared references.

pub mod astar;
pub mod lpastar;

pub use astar::AStar;
pub use lpastar::{LpaKey, LpaStar};

use std::fmt;

use crate::error::NavigationError;
use crate::geometry::Point;
use crate::map::VoxelMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cost of a vertex that cannot currently be reached.
pub const INFINITE_COST: f64 = f64::INFINITY;

/// Represents the result of a successful search with metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathResult {
    /// Cell indices from the start to the target, both included.
    pub path: Vec<usize>,
    /// The total cost of the path.
    pub cost: f64,
    /// The number of vertices expanded during the search.
    pub nodes_explored: usize,
}

impl PathResult {
    /// Creates a new PathResult.
    pub fn new(path: Vec<usize>, cost: f64, nodes_explored: usize) -> Self {
        Self {
            path,
            cost,
            nodes_explored,
        }
    }

    /// The length of the path (number of cells).
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Returns true if the path holds no cells.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Cell centers along the path.
    pub fn waypoints(&self, map: &VoxelMap) -> Vec<Point> {
        self.path
            .iter()
            .filter_map(|&i| map.cell(i).map(|c| c.center))
            .collect()
    }

    /// Returns the path.
    pub fn into_path(self) -> Vec<usize> {
        self.path
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PathResult {{ path_length: {}, cost: {:.6}, nodes_explored: {} }}",
            self.path.len(),
            self.cost,
            self.nodes_explored
        )
    }
}

/// Resolves a world point to the index of the cell containing it.
///
/// # Returns
/// * `Result<usize, NavigationError>` - The cell index, or `OutOfBounds` if the
///   point lies outside the grid
pub fn locate(map: &VoxelMap, point: &Point) -> Result<usize, NavigationError> {
    map.point_to_index(point)
        .ok_or(NavigationError::OutOfBounds("Point lies outside the map"))
}

/// Checks that `index` names a traversable cell, reporting `blocked` otherwise.
pub(crate) fn check_endpoint(
    map: &VoxelMap,
    index: usize,
    blocked: fn(usize) -> NavigationError,
) -> Result<(), NavigationError> {
    if index >= map.len() {
        return Err(NavigationError::OutOfBounds("Cell index outside the map"));
    }
    if !map.is_traversable(index) {
        return Err(blocked(index));
    }
    Ok(())
}

/// Euclidean distance from every cell center to `target`'s center, with
/// non-traversable cells pinned at [`INFINITE_COST`].
pub(crate) fn heuristic_field(map: &VoxelMap, target: usize) -> Vec<f64> {
    let Some(goal) = map.cell(target).map(|c| c.center) else {
        return vec![INFINITE_COST; map.len()];
    };
    map.cells()
        .iter()
        .map(|cell| {
            if cell.is_traversable() {
                cell.center.dist(&goal)
            } else {
                INFINITE_COST
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Maps shared by the search tests.

    use crate::geometry::Point;
    use crate::grid::{Connectivity, Subscript};
    use crate::map::{MapParams, Vehicle, VoxelMap};
    use nalgebra::Vector3;

    /// Unit cells, vehicle small enough that every cell is in bounds.
    pub fn unit_params(x: usize, y: usize, z: usize, connectivity: Connectivity) -> MapParams {
        MapParams {
            bounds: Vector3::new(x as f64, y as f64, z as f64),
            dims: Subscript::new(x, y, z),
            vehicle: Vehicle {
                radius: 0.4,
                height: 0.4,
            },
            connectivity,
        }
    }

    /// Center of the unit cell `(x, y, z)`.
    pub fn center(x: usize, y: usize, z: usize) -> Point {
        Point::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5)
    }

    pub fn index(map: &VoxelMap, x: usize, y: usize, z: usize) -> usize {
        map.shape()
            .subscript_to_index(&Subscript::new(x, y, z))
            .unwrap()
    }

    /// 5×5×1 with a wall along x = 2 open only at y = 4.
    pub fn wall_with_gap(connectivity: Connectivity) -> VoxelMap {
        let wall: Vec<Point> = (0..4).map(|y| center(2, y, 0)).collect();
        VoxelMap::new(&unit_params(5, 5, 1, connectivity), &wall).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::grid::Connectivity;

    #[test]
    fn test_locate() {
        let map = wall_with_gap(Connectivity::Six);
        assert_eq!(locate(&map, &center(1, 3, 0)), Ok(index(&map, 1, 3, 0)));
        assert!(matches!(
            locate(&map, &Point::new(5.5, 0.5, 0.5)),
            Err(NavigationError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_check_endpoint() {
        let map = wall_with_gap(Connectivity::Six);
        let wall = index(&map, 2, 0, 0);
        assert_eq!(
            check_endpoint(&map, wall, NavigationError::TargetBlocked),
            Err(NavigationError::TargetBlocked(wall))
        );
        assert!(check_endpoint(&map, 0, NavigationError::StartBlocked).is_ok());
        assert!(matches!(
            check_endpoint(&map, 25, NavigationError::StartBlocked),
            Err(NavigationError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_heuristic_field() {
        let map = wall_with_gap(Connectivity::Six);
        let h = heuristic_field(&map, 0);
        assert_eq!(h[0], 0.0);
        assert_eq!(h[index(&map, 0, 3, 0)], 3.0);
        assert_eq!(h[index(&map, 2, 1, 0)], INFINITE_COST);
    }

    #[test]
    fn test_path_result_display() {
        let map = wall_with_gap(Connectivity::Six);
        let result = PathResult::new(vec![0, 1], 1.0, 2);
        assert_eq!(
            format!("{}", result),
            "PathResult { path_length: 2, cost: 1.000000, nodes_explored: 2 }"
        );
        assert_eq!(result.waypoints(&map), vec![center(0, 0, 0), center(1, 0, 0)]);
    }
}
