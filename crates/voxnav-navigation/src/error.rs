//! This module defines the error types used by the `voxnav-navigation` crate.

#![warn(missing_docs)]

use thiserror::Error;
use voxnav_heap::HeapError;

/// Error type for navigation operations.
///
/// This enum encapsulates all possible errors that can occur while building
/// a map or searching it, from invalid map parameters to a search that runs
/// out of open vertices.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavigationError {
    /// Cell counts are zero or their product overflows.
    #[error("Invalid map dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// Extents or vehicle sizes are not usable.
    #[error("Invalid map parameter: {0}")]
    InvalidParameter(&'static str),
    /// A point or cell index lies outside the grid.
    #[error("Map access out of bounds: {0}")]
    OutOfBounds(&'static str),
    /// The start cell is out of bounds or occupied.
    #[error("Start cell {0} is not traversable")]
    StartBlocked(usize),
    /// The target cell is out of bounds or occupied.
    #[error("Target cell {0} is not traversable")]
    TargetBlocked(usize),
    /// A search was requested before a start was chosen.
    #[error("No start has been set")]
    StartNotSet,
    /// A search was requested before a target was chosen.
    #[error("No target has been set")]
    TargetNotSet,
    /// The open set emptied before the target was reached.
    #[error("No path to the target after exploring {explored} cells")]
    NoPath {
        /// Number of cells expanded before giving up.
        explored: usize,
    },
    /// The open set rejected a handle it issued; indicates corrupted search state.
    #[error("Priority queue error: {0}")]
    Queue(#[from] HeapError),
}
