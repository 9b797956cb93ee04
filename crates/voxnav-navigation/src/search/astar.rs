//! One-shot A* search with reopening of closed vertices.

use std::cmp::Ordering;

use tracing::{debug, trace};
use voxnav_heap::{FibonacciHeap, Handle};

use super::{INFINITE_COST, PathResult, check_endpoint, heuristic_field};
use crate::error::NavigationError;
use crate::geometry::round;
use crate::map::VoxelMap;

/// Where a vertex stands in the current search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Unseen,
    Open(Handle),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenEntry {
    f: f64,
    h: f64,
    vertex: usize,
}

/// Orders by f, then by h so deeper vertices win ties, then by index.
fn compare_open(a: &OpenEntry, b: &OpenEntry) -> Ordering {
    a.f.total_cmp(&b.f)
        .then_with(|| a.h.total_cmp(&b.h))
        .then_with(|| a.vertex.cmp(&b.vertex))
}

type OpenSet = FibonacciHeap<OpenEntry>;

/// A* search engine bound to one map's cell layout.
///
/// The heuristic is computed once per [`AStar::set_target`] call. Sensor
/// updates should be reported through [`AStar::invalidate`] before the next
/// [`AStar::search`]; the search also checks each cell's live free flag, so
/// a stale heuristic can only cost time, never route through an obstacle.
#[derive(Debug)]
pub struct AStar {
    target: Option<usize>,
    g: Vec<f64>,
    h: Vec<f64>,
    predecessor: Vec<Option<usize>>,
    membership: Vec<Membership>,
    open: OpenSet,
}

impl AStar {
    /// Creates an engine sized for `map`, with no target.
    pub fn new(map: &VoxelMap) -> Self {
        let n = map.len();
        Self {
            target: None,
            g: vec![INFINITE_COST; n],
            h: vec![INFINITE_COST; n],
            predecessor: vec![None; n],
            membership: vec![Membership::Unseen; n],
            open: OpenSet::with_comparator(compare_open),
        }
    }

    /// Sets the target cell and recomputes the heuristic towards it.
    pub fn set_target(&mut self, map: &VoxelMap, target: usize) -> Result<(), NavigationError> {
        check_endpoint(map, target, NavigationError::TargetBlocked)?;
        self.h = heuristic_field(map, target);
        self.target = Some(target);
        debug!(target, "A* target set");
        Ok(())
    }

    /// The current target, if any.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Marks cells reported busy by a sensor update as unreachable.
    pub fn invalidate(&mut self, changed: &[usize]) {
        for &index in changed {
            if let Some(h) = self.h.get_mut(index) {
                *h = INFINITE_COST;
            }
        }
    }

    /// Cost-to-reach of `index` from the last search's start.
    pub fn g(&self, index: usize) -> f64 {
        self.g.get(index).copied().unwrap_or(INFINITE_COST)
    }

    /// Searches from `start` to the current target.
    ///
    /// # Returns
    /// * `Result<PathResult, NavigationError>` - The path with its cost, or the reason
    ///   no path could be produced
    pub fn search(&mut self, map: &VoxelMap, start: usize) -> Result<PathResult, NavigationError> {
        let target = self.target.ok_or(NavigationError::TargetNotSet)?;
        check_endpoint(map, start, NavigationError::StartBlocked)?;
        if !map.is_traversable(target) {
            return Err(NavigationError::TargetBlocked(target));
        }

        self.reset(map.len());
        if start == target {
            return Ok(PathResult::new(vec![start], 0.0, 0));
        }

        self.g[start] = 0.0;
        let handle = self.open.insert(OpenEntry {
            f: self.h[start],
            h: self.h[start],
            vertex: start,
        });
        self.membership[start] = Membership::Open(handle);

        let mut nodes_explored = 0;
        while let Some(OpenEntry { vertex: current, .. }) = self.open.pop_min() {
            self.membership[current] = Membership::Closed;
            nodes_explored += 1;

            if current == target {
                let path = self.reconstruct_path(start, target, nodes_explored)?;
                let result = PathResult::new(path, self.g[target], nodes_explored);
                debug!(start, target, %result, "A* path found");
                return Ok(result);
            }

            for edge in map.edges(current) {
                let next = edge.target;
                if !map.is_traversable(next) || self.h[next] == INFINITE_COST {
                    continue;
                }

                let tentative = round(self.g[current] + edge.weight);
                if tentative >= self.g[next] {
                    continue;
                }

                self.g[next] = tentative;
                self.predecessor[next] = Some(current);
                let entry = OpenEntry {
                    f: round(tentative + self.h[next]),
                    h: self.h[next],
                    vertex: next,
                };

                match self.membership[next] {
                    Membership::Open(handle) => self.open.decrease_key(handle, entry)?,
                    Membership::Closed => {
                        trace!(vertex = next, g = tentative, "Reopening closed vertex");
                        self.membership[next] = Membership::Open(self.open.insert(entry));
                    }
                    Membership::Unseen => {
                        self.membership[next] = Membership::Open(self.open.insert(entry));
                    }
                }
            }
        }

        debug!(start, target, nodes_explored, "A* exhausted the open set");
        Err(NavigationError::NoPath {
            explored: nodes_explored,
        })
    }

    fn reset(&mut self, n: usize) {
        self.g.clear();
        self.g.resize(n, INFINITE_COST);
        self.predecessor.clear();
        self.predecessor.resize(n, None);
        self.membership.clear();
        self.membership.resize(n, Membership::Unseen);
        self.h.resize(n, INFINITE_COST);
        self.open.clear();
    }

    /// Follows predecessor links from `target` back to `start`.
    fn reconstruct_path(
        &self,
        start: usize,
        target: usize,
        explored: usize,
    ) -> Result<Vec<usize>, NavigationError> {
        let mut path = vec![target];
        let mut current = target;
        while current != start {
            match self.predecessor[current] {
                Some(previous) if path.len() <= self.g.len() => {
                    path.push(previous);
                    current = previous;
                }
                _ => return Err(NavigationError::NoPath { explored }),
            }
        }
        path.reverse();
        Ok(path)
    }
}
