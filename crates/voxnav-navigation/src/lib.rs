//! Path planning over a 3D voxel map for a vehicle of given size.
//!
//! The map inflates obstacles by the vehicle envelope and links free cells
//! into a weighted graph. Sensor updates only ever add obstacles. Routes are
//! found with A* or repaired incrementally with LPA*, both driven by the
//! Fibonacci heap from `voxnav-heap`.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod map;
pub mod planner;
pub mod search;
pub mod sensor;

pub use error::NavigationError;
pub use geometry::Point;
pub use grid::{Connectivity, GridShape};
pub use map::{MapParams, Vehicle, VoxelMap};
pub use planner::{Planner, ReplanPolicy, Strategy, UpdateOutcome};
pub use search::{AStar, LpaStar, PathResult};
pub use sensor::SensorFootprint;
