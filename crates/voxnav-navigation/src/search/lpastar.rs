//! Lifelong Planning A* (LPA*).
//!
//! The engine keeps a cost-to-reach estimate `g` and a one-step lookahead
//! `rhs` per vertex. Only inconsistent vertices (`g != rhs`) are queued. After
//! a sensor update, feeding the changed cells to [`LpaStar::notify_changed`]
//! and calling [`LpaStar::compute_shortest_path`] repairs the cost field
//! locally instead of searching from scratch. Paths are read off the
//! converged field by greedy descent from the target; no predecessor links
//! are kept.

use std::cmp::Ordering;

use tracing::{debug, trace};
use voxnav_heap::{FibonacciHeap, Handle};

use super::{INFINITE_COST, PathResult, check_endpoint, heuristic_field};
use crate::error::NavigationError;
use crate::geometry::round;
use crate::map::VoxelMap;

/// Queue priority of an LPA* vertex, compared lexicographically.
#[derive(Debug, Clone, Copy)]
pub struct LpaKey {
    /// `min(g, rhs) + h`.
    pub k1: f64,
    /// `min(g, rhs)`.
    pub k2: f64,
}

impl Ord for LpaKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.k1
            .total_cmp(&other.k1)
            .then_with(|| self.k2.total_cmp(&other.k2))
    }
}

impl PartialOrd for LpaKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for LpaKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LpaKey {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    key: LpaKey,
    vertex: usize,
}

/// LPA* engine bound to one map's cell layout.
#[derive(Debug)]
pub struct LpaStar {
    start: Option<usize>,
    target: Option<usize>,
    g: Vec<f64>,
    rhs: Vec<f64>,
    h: Vec<f64>,
    queued: Vec<Option<Handle>>,
    queue: FibonacciHeap<QueueEntry>,
    last_expanded: usize,
}

impl LpaStar {
    /// Creates an engine sized for `map`, with neither start nor target.
    pub fn new(map: &VoxelMap) -> Self {
        let n = map.len();
        Self {
            start: None,
            target: None,
            g: vec![INFINITE_COST; n],
            rhs: vec![INFINITE_COST; n],
            h: vec![INFINITE_COST; n],
            queued: vec![None; n],
            queue: FibonacciHeap::new(),
            last_expanded: 0,
        }
    }

    /// Sets the root of the cost field and re-initializes.
    pub fn set_start(&mut self, map: &VoxelMap, start: usize) -> Result<(), NavigationError> {
        check_endpoint(map, start, NavigationError::StartBlocked)?;
        self.start = Some(start);
        self.initialize();
        Ok(())
    }

    /// Sets the target, recomputes the heuristic towards it and re-initializes.
    pub fn set_target(&mut self, map: &VoxelMap, target: usize) -> Result<(), NavigationError> {
        check_endpoint(map, target, NavigationError::TargetBlocked)?;
        self.h = heuristic_field(map, target);
        self.target = Some(target);
        self.initialize();
        Ok(())
    }

    /// Moves the target without discarding the cost field.
    ///
    /// The heuristic keeps pointing at the cell given to
    /// [`LpaStar::set_target`]. Distance to any fixed cell is a consistent
    /// heuristic, so the next [`LpaStar::compute_shortest_path`] still
    /// converges to the exact cost of the new target.
    pub fn relocate_target(&mut self, map: &VoxelMap, target: usize) -> Result<(), NavigationError> {
        check_endpoint(map, target, NavigationError::TargetBlocked)?;
        if self.target.is_none() {
            self.h = heuristic_field(map, target);
        }
        self.target = Some(target);
        Ok(())
    }

    /// The root of the cost field, if set.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// The current target, if set.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Resets every vertex to unreached and queues the start.
    pub fn initialize(&mut self) {
        self.g.fill(INFINITE_COST);
        self.rhs.fill(INFINITE_COST);
        self.queued.fill(None);
        self.queue.clear();
        self.last_expanded = 0;

        if let Some(start) = self.start {
            self.rhs[start] = 0.0;
            let entry = QueueEntry {
                key: self.key(start),
                vertex: start,
            };
            self.queued[start] = Some(self.queue.insert(entry));
        }
    }

    /// Current cost-to-reach estimate of `index`.
    pub fn g(&self, index: usize) -> f64 {
        self.g.get(index).copied().unwrap_or(INFINITE_COST)
    }

    /// One-step lookahead cost of `index`.
    pub fn rhs(&self, index: usize) -> f64 {
        self.rhs.get(index).copied().unwrap_or(INFINITE_COST)
    }

    /// Priority `index` would be queued with.
    pub fn key(&self, index: usize) -> LpaKey {
        let best = self.g(index).min(self.rhs(index));
        let h = self.h.get(index).copied().unwrap_or(INFINITE_COST);
        LpaKey {
            k1: round(best + h),
            k2: best,
        }
    }

    /// Returns true if `g` and `rhs` agree at `index`.
    pub fn is_consistent(&self, index: usize) -> bool {
        self.g(index) == self.rhs(index)
    }

    /// Number of queued (inconsistent) vertices.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Recomputes `rhs` for `vertex` and fixes its queue membership.
    pub fn update_vertex(&mut self, map: &VoxelMap, vertex: usize) -> Result<(), NavigationError> {
        if vertex >= self.g.len() {
            return Err(NavigationError::OutOfBounds("Cell index outside the map"));
        }
        if self.start != Some(vertex) {
            self.rhs[vertex] = self.lookahead(map, vertex);
        }

        let entry = QueueEntry {
            key: self.key(vertex),
            vertex,
        };
        match (self.queued[vertex], self.is_consistent(vertex)) {
            (Some(handle), true) => {
                self.queue.remove(handle)?;
                self.queued[vertex] = None;
            }
            (Some(handle), false) => {
                self.queued[vertex] = Some(self.queue.update(handle, entry)?);
            }
            (None, false) => {
                self.queued[vertex] = Some(self.queue.insert(entry));
            }
            (None, true) => {}
        }
        Ok(())
    }

    /// Propagates cells that a sensor update turned busy.
    ///
    /// Every edge touching a changed cell now costs infinity, so the cell and
    /// each of its graph neighbors get their lookahead recomputed.
    pub fn notify_changed(&mut self, map: &VoxelMap, changed: &[usize]) -> Result<(), NavigationError> {
        for &cell in changed {
            if cell >= self.g.len() {
                continue;
            }
            self.update_vertex(map, cell)?;
            for edge in map.edges(cell) {
                self.update_vertex(map, edge.target)?;
            }
        }
        debug!(changed = changed.len(), queued = self.queue.len(), "LPA* notified of changes");
        Ok(())
    }

    /// Expands inconsistent vertices until the target's cost is settled.
    ///
    /// # Returns
    /// * `Result<usize, NavigationError>` - The number of expansions performed
    pub fn compute_shortest_path(&mut self, map: &VoxelMap) -> Result<usize, NavigationError> {
        let start = self.start.ok_or(NavigationError::StartNotSet)?;
        let target = self.target.ok_or(NavigationError::TargetNotSet)?;
        if !map.is_traversable(start) {
            return Err(NavigationError::StartBlocked(start));
        }
        if !map.is_traversable(target) {
            return Err(NavigationError::TargetBlocked(target));
        }

        let mut expanded = 0;
        while let Some(&top) = self.queue.peek_min() {
            if top.key >= self.key(target) && self.is_consistent(target) {
                break;
            }
            self.queue.pop_min();
            let u = top.vertex;
            self.queued[u] = None;
            expanded += 1;

            if self.g[u] > self.rhs[u] {
                self.g[u] = self.rhs[u];
            } else {
                trace!(vertex = u, g = self.g[u], rhs = self.rhs[u], "Invalidating under-consistent vertex");
                self.g[u] = INFINITE_COST;
                self.update_vertex(map, u)?;
            }
            for edge in map.edges(u) {
                self.update_vertex(map, edge.target)?;
            }
        }

        self.last_expanded = expanded;
        debug!(start, target, expanded, g = self.g[target], "LPA* converged");
        Ok(expanded)
    }

    /// Reads the start-to-target path off the converged cost field.
    ///
    /// Walks back from the target, each step choosing the traversable
    /// neighbor that minimizes `g(neighbor) + weight`.
    pub fn path(&self, map: &VoxelMap) -> Result<PathResult, NavigationError> {
        let start = self.start.ok_or(NavigationError::StartNotSet)?;
        let target = self.target.ok_or(NavigationError::TargetNotSet)?;
        let no_path = NavigationError::NoPath {
            explored: self.last_expanded,
        };
        if self.g(target) == INFINITE_COST {
            return Err(no_path);
        }

        let mut path = vec![target];
        let mut current = target;
        while current != start {
            let best = map
                .edges(current)
                .iter()
                .filter(|e| map.is_traversable(e.target))
                .map(|e| (round(self.g[e.target] + e.weight), e.target))
                .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            match best {
                Some((cost, next)) if cost < INFINITE_COST && path.len() <= self.g.len() => {
                    path.push(next);
                    current = next;
                }
                _ => return Err(no_path),
            }
        }
        path.reverse();

        Ok(PathResult::new(path, self.g[target], self.last_expanded))
    }

    fn lookahead(&self, map: &VoxelMap, vertex: usize) -> f64 {
        if !map.is_traversable(vertex) {
            return INFINITE_COST;
        }
        map.edges(vertex)
            .iter()
            .filter(|e| map.is_traversable(e.target))
            .map(|e| round(self.g[e.target] + e.weight))
            .fold(INFINITE_COST, f64::min)
    }
}
