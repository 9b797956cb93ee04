//! Map-related functionality for navigation.
//!
//! This module provides the voxel map: a grid of cells classified as free or
//! busy for a vehicle of given size, the adjacency graph between free cells,
//! and the incremental sensor update that only ever adds obstacles.

pub mod cell;
pub mod voxel_map;

pub use cell::{Cell, Edge};
pub use voxel_map::{MapParams, Vehicle, VoxelMap};
