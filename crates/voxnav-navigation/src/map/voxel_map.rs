//! Voxel map with vehicle-sized obstacle inflation.
//!
//! The map divides a box `[0, xlen] × [0, ylen] × [0, zlen]` into cells and
//! classifies each one as busy when any obstacle point lies within the
//! vehicle's cylinder (horizontal `radius`, vertical `height`) around the
//! cell center. Free, in-bounds cells are linked into a weighted graph.
//!
//! Sensor updates only add obstacles. Cells that were busy because of the
//! static point cloud are frozen and ignore sensor points entirely.

#![warn(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use nalgebra::Vector3;
use tracing::{debug, trace};

use super::cell::{Cell, Edge};
use crate::error::NavigationError;
use crate::geometry::{Point, round};
use crate::grid::{Connectivity, GridShape, Subscript};

/// Size of the vehicle's collision cylinder.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    /// Horizontal clearance radius.
    pub radius: f64,
    /// Vertical clearance above and below the center.
    pub height: f64,
}

impl Vehicle {
    /// Returns true if `point` lies within the envelope centered at `center`.
    pub fn covers(&self, center: &Point, point: &Point) -> bool {
        center.dist_xy(point) <= self.radius && center.dist_z(point) <= self.height
    }
}

/// Parameters for building a [`VoxelMap`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapParams {
    /// World extent along x, y and z (meters).
    pub bounds: Vector3<f64>,
    /// Cell counts along x, y and z.
    pub dims: Subscript,
    /// Vehicle envelope used for inflation and bounds checks.
    pub vehicle: Vehicle,
    /// Link pattern for graph edges.
    pub connectivity: Connectivity,
}

/// The voxel map: cells, their adjacency graph and the updatable mask.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelMap {
    bounds: Vector3<f64>,
    shape: GridShape,
    /// Cell size along each axis.
    step: Vector3<f64>,
    vehicle: Vehicle,
    connectivity: Connectivity,
    /// Neighbor-box half widths derived from the vehicle size.
    levels: Subscript,
    cells: Vec<Cell>,
    /// False for cells whose busy state came from the static cloud.
    updatable: Vec<bool>,
}

fn inflation_level(reach: f64, step: f64) -> usize {
    ((reach - step / 2.0) / step).ceil().max(0.0) as usize
}

fn static_points(cell: &Cell) -> &[Point] {
    &cell.static_points
}

fn sensor_points(cell: &Cell) -> &[Point] {
    &cell.sensor_points
}

impl VoxelMap {
    /// Builds the map from its parameters and the static obstacle cloud.
    ///
    /// # Arguments
    /// * `params` - Extent, cell counts, vehicle size and connectivity
    /// * `obstacles` - Obstacles known up front; points outside the grid are ignored
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The built map or an error if parameters are invalid
    pub fn new(params: &MapParams, obstacles: &[Point]) -> Result<Self, NavigationError> {
        let shape = GridShape::new(params.dims)?;

        if params.bounds.iter().any(|&b| !b.is_finite() || b <= 0.0) {
            return Err(NavigationError::InvalidParameter(
                "Map extent must be positive along every axis",
            ));
        }
        let Vehicle { radius, height } = params.vehicle;
        if !(radius.is_finite() && radius >= 0.0 && height.is_finite() && height >= 0.0) {
            return Err(NavigationError::InvalidParameter(
                "Vehicle radius and height must be non-negative",
            ));
        }

        let step = Vector3::from_fn(|axis, _| round(params.bounds[axis] / params.dims[axis] as f64));
        if step.iter().any(|&s| s <= 0.0) {
            return Err(NavigationError::InvalidParameter(
                "Cell size rounds to zero, use fewer cells",
            ));
        }

        let levels = Subscript::new(
            inflation_level(radius, step.x),
            inflation_level(radius, step.y),
            inflation_level(height, step.z),
        );

        let mut map = Self {
            bounds: params.bounds,
            shape,
            step,
            vehicle: params.vehicle,
            connectivity: params.connectivity,
            levels,
            cells: Vec::with_capacity(shape.len()),
            updatable: vec![true; shape.len()],
        };

        for index in 0..shape.len() {
            let center = map.center_of(index);
            let in_bounds = map.envelope_in_bounds(&center);
            let neighbors = shape.neighbors(index, &levels);
            map.cells.push(Cell::new(index, center, in_bounds, neighbors));
        }

        let mut ignored = 0usize;
        for point in obstacles {
            match map.point_to_index(point) {
                Some(index) => map.cells[index].static_points.push(*point),
                None => ignored += 1,
            }
        }

        let busy: Vec<bool> = (0..shape.len())
            .map(|index| map.is_covered(index, static_points))
            .collect();
        for (index, busy) in busy.into_iter().enumerate() {
            if busy {
                map.cells[index].free = false;
                map.updatable[index] = false;
            }
        }

        let mut edge_count = 0usize;
        for index in 0..shape.len() {
            if !map.cells[index].is_traversable() {
                continue;
            }
            let center = map.cells[index].center;
            let edges: Vec<Edge> = shape
                .links(index, map.connectivity)
                .into_iter()
                .filter(|&target| map.cells[target].is_traversable())
                .map(|target| Edge {
                    target,
                    weight: center.dist(&map.cells[target].center),
                })
                .collect();
            edge_count += edges.len();
            map.cells[index].edges = edges;
        }

        debug!(
            cells = shape.len(),
            busy = map.cells.iter().filter(|c| !c.free).count(),
            out_of_bounds = map.cells.iter().filter(|c| !c.in_bounds).count(),
            edges = edge_count,
            ignored_points = ignored,
            "Voxel map built"
        );

        Ok(map)
    }

    /// Folds a batch of sensor points into the map.
    ///
    /// Points are binned only into updatable cells; each touched cell's sensor
    /// points are replaced by the new batch. Every updatable cell near a
    /// touched one is re-tested, and the indices of cells that went from free
    /// to busy are returned in ascending order. Busy cells never become free.
    pub fn sensor_update(&mut self, points: &[Point]) -> Vec<usize> {
        let mut incoming: BTreeMap<usize, Vec<Point>> = BTreeMap::new();
        let mut dropped = 0usize;
        for point in points {
            match self.point_to_index(point) {
                Some(index) if self.updatable[index] => {
                    incoming.entry(index).or_default().push(*point)
                }
                _ => dropped += 1,
            }
        }

        let touched = incoming.len();
        let mut to_verify = BTreeSet::new();
        for (index, batch) in incoming {
            self.cells[index].sensor_points = batch;
            to_verify.extend(
                self.cells[index]
                    .neighbors
                    .iter()
                    .copied()
                    .filter(|&n| self.updatable[n]),
            );
        }

        let mut changed = Vec::new();
        for index in to_verify {
            if self.cells[index].free && self.is_covered(index, sensor_points) {
                trace!(cell = index, center = %self.cells[index].center, "Cell became busy");
                self.cells[index].free = false;
                changed.push(index);
            }
        }

        debug!(
            points = points.len(),
            dropped,
            touched,
            changed = changed.len(),
            "Sensor update applied"
        );
        changed
    }

    /// Index of the cell containing `point`, or `None` outside the grid.
    pub fn point_to_index(&self, point: &Point) -> Option<usize> {
        let coords = [point.x, point.y, point.z];
        let mut sub = Subscript::zeros();
        for axis in 0..3 {
            let cell = coords[axis] / self.step[axis];
            // also rejects NaN
            if !(cell >= 0.0) {
                return None;
            }
            sub[axis] = cell.floor() as usize;
        }
        self.shape.subscript_to_index(&sub)
    }

    /// Returns the cell at `index`.
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// All cells in index order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Edges leaving `index`; empty for unknown or non-traversable cells.
    pub fn edges(&self, index: usize) -> &[Edge] {
        self.cells.get(index).map(|c| c.edges.as_slice()).unwrap_or(&[])
    }

    /// Returns true if `index` is in bounds and currently free.
    pub fn is_traversable(&self, index: usize) -> bool {
        self.cells.get(index).is_some_and(Cell::is_traversable)
    }

    /// Returns true if sensor updates may still change `index`.
    pub fn is_updatable(&self, index: usize) -> bool {
        self.updatable.get(index).copied().unwrap_or(false)
    }

    /// Subscript of `index`.
    pub fn index_to_subscript(&self, index: usize) -> Option<Subscript> {
        self.shape.index_to_subscript(index)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the map has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Grid shape.
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Cell size along each axis.
    pub fn step(&self) -> &Vector3<f64> {
        &self.step
    }

    /// World extent along each axis.
    pub fn bounds(&self) -> &Vector3<f64> {
        &self.bounds
    }

    /// Vehicle envelope the map was inflated for.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// Link pattern of the graph.
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Half widths of the neighbor box used for inflation.
    pub fn inflation_levels(&self) -> &Subscript {
        &self.levels
    }

    fn center_of(&self, index: usize) -> Point {
        let sub = self
            .shape
            .index_to_subscript(index)
            .unwrap_or_else(Subscript::zeros);
        let axis = |a: usize| round(self.step[a] * sub[a] as f64 + self.step[a] / 2.0);
        Point::new(axis(0), axis(1), axis(2))
    }

    fn envelope_in_bounds(&self, center: &Point) -> bool {
        let Vehicle { radius, height } = self.vehicle;
        center.x - radius >= 0.0
            && center.x + radius <= self.bounds.x
            && center.y - radius >= 0.0
            && center.y + radius <= self.bounds.y
            && center.z - height >= 0.0
            && center.z + height <= self.bounds.z
    }

    /// Tests the cell at `index` against the points `select` picks from
    /// each cell of its neighbor box.
    fn is_covered(&self, index: usize, select: fn(&Cell) -> &[Point]) -> bool {
        let cell = &self.cells[index];
        cell.neighbors.iter().any(|&n| {
            select(&self.cells[n])
                .iter()
                .any(|p| self.vehicle.covers(&cell.center, p))
        })
    }
}

impl fmt::Display for VoxelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = self.shape.dims();
        writeln!(
            f,
            "VoxelMap ({}x{}x{}, cell: {:.3}x{:.3}x{:.3}m)",
            dims[0], dims[1], dims[2], self.step.x, self.step.y, self.step.z
        )?;
        writeln!(
            f,
            "Vehicle: radius {:.3}m, height {:.3}m",
            self.vehicle.radius, self.vehicle.height
        )?;
        writeln!(f)?;

        // Print each Z-layer separately
        for z_idx in 0..dims[2] {
            writeln!(
                f,
                "Layer Z={} (height: {:.3}m):",
                z_idx,
                self.step.z * (z_idx as f64 + 0.5)
            )?;
            for y_idx in 0..dims[1] {
                for x_idx in 0..dims[0] {
                    let sub = Subscript::new(x_idx, y_idx, z_idx);
                    if let Some(cell) = self
                        .shape
                        .subscript_to_index(&sub)
                        .and_then(|i| self.cells.get(i))
                    {
                        let symbol = match (cell.in_bounds, cell.free) {
                            (_, false) => '#',
                            (true, true) => '.',
                            (false, true) => 'o',
                        };
                        write!(f, "{} ", symbol)?;
                    }
                }
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
