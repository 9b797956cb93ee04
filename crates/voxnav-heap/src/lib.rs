//! Mergeable priority queue backed by a Fibonacci heap.
//!
//! Entries live in an arena owned by the heap. Inserting returns a [`Handle`]
//! that stays valid until the entry leaves the heap, and is the only way to
//! change an entry's key afterwards (`decrease_key`, `update`, `remove`).
//! Handles carry the identity of the heap that issued them and a slot
//! generation, so a handle from another heap or one whose entry was already
//! popped is rejected with [`HeapError::StaleHandle`] instead of touching an
//! unrelated entry.
//!
//! Ordering comes from a comparator. [`FibonacciHeap::new`] uses the key's
//! `Ord` implementation; [`FibonacciHeap::with_comparator`] accepts any
//! three-way comparison.

#![warn(missing_docs)]

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use thiserror::Error;

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(0);

/// Error type for handle-based heap operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The handle was issued by another heap, or its entry already left this one.
    #[error("handle does not refer to a live entry of this heap")]
    StaleHandle,
    /// `decrease_key` was asked to move an entry later in the order.
    #[error("new key orders after the current key")]
    KeyIncrease,
}

/// Reference to an entry inside a specific [`FibonacciHeap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    heap: u64,
    slot: usize,
    generation: u32,
}

struct Node<T> {
    key: Option<T>,
    generation: u32,
    parent: Option<usize>,
    child: Option<usize>,
    // circular sibling list
    left: usize,
    right: usize,
    degree: usize,
    marked: bool,
}

/// Fibonacci heap with amortized O(1) insert and decrease-key and
/// O(log n) extract-min.
pub struct FibonacciHeap<T, C = fn(&T, &T) -> Ordering> {
    nodes: Vec<Node<T>>,
    vacant: Vec<usize>,
    min: Option<usize>,
    len: usize,
    id: u64,
    compare: C,
}

impl<T: Ord> FibonacciHeap<T> {
    /// Creates an empty min-heap ordered by `T`'s `Ord` implementation.
    pub fn new() -> Self {
        Self::with_comparator(T::cmp)
    }
}

impl<T: Ord> Default for FibonacciHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> FibonacciHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty heap that pops the entry `compare` orders first.
    pub fn with_comparator(compare: C) -> Self {
        Self {
            nodes: Vec::new(),
            vacant: Vec::new(),
            min: None,
            len: 0,
            id: NEXT_HEAP_ID.fetch_add(1, AtomicOrdering::Relaxed),
            compare,
        }
    }

    /// Number of entries in the heap.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key` and returns the handle that addresses it.
    pub fn insert(&mut self, key: T) -> Handle {
        let slot = match self.vacant.pop() {
            Some(slot) => {
                let node = &mut self.nodes[slot];
                node.key = Some(key);
                node.parent = None;
                node.child = None;
                node.left = slot;
                node.right = slot;
                node.degree = 0;
                node.marked = false;
                slot
            }
            None => {
                let slot = self.nodes.len();
                self.nodes.push(Node {
                    key: Some(key),
                    generation: 0,
                    parent: None,
                    child: None,
                    left: slot,
                    right: slot,
                    degree: 0,
                    marked: false,
                });
                slot
            }
        };
        self.add_root(slot);
        self.len += 1;
        self.handle_of(slot)
    }

    /// Returns the minimum entry without removing it.
    pub fn peek_min(&self) -> Option<&T> {
        self.min.map(|m| self.key(m))
    }

    /// Removes and returns the minimum entry.
    pub fn pop_min(&mut self) -> Option<T> {
        let z = self.min?;

        let mut roots = self.siblings(z);
        roots.retain(|&r| r != z);
        if let Some(child) = self.nodes[z].child {
            for c in self.siblings(child) {
                self.nodes[c].parent = None;
                self.nodes[c].marked = false;
                roots.push(c);
            }
        }

        let key = self.release(z);
        self.len -= 1;
        self.consolidate(roots);
        key
    }

    /// Moves the entry behind `handle` earlier in the order.
    ///
    /// Replacing a key with an equal one is allowed; a key that orders after
    /// the current one is rejected with [`HeapError::KeyIncrease`].
    pub fn decrease_key(&mut self, handle: Handle, key: T) -> Result<(), HeapError> {
        let x = self.resolve(handle)?;
        if (self.compare)(&key, self.key(x)) == Ordering::Greater {
            return Err(HeapError::KeyIncrease);
        }
        self.nodes[x].key = Some(key);

        if let Some(parent) = self.nodes[x].parent {
            if self.less(x, parent) {
                self.cut(x, parent);
                self.cascading_cut(parent);
            }
        }
        if let Some(min) = self.min {
            if self.less(x, min) {
                self.min = Some(x);
            }
        }
        Ok(())
    }

    /// Removes the entry behind `handle` and returns its key.
    pub fn remove(&mut self, handle: Handle) -> Result<T, HeapError> {
        let x = self.resolve(handle)?;
        if let Some(parent) = self.nodes[x].parent {
            self.cut(x, parent);
            self.cascading_cut(parent);
        }
        // x is now a root; extracting it as if it were the minimum
        // recomputes the real minimum during consolidation.
        self.min = Some(x);
        self.pop_min().ok_or(HeapError::StaleHandle)
    }

    /// Replaces the key behind `handle`, in either direction.
    ///
    /// Decreases happen in place and keep the handle. An increase removes and
    /// reinserts the entry, so the returned handle must replace the old one.
    pub fn update(&mut self, handle: Handle, key: T) -> Result<Handle, HeapError> {
        let x = self.resolve(handle)?;
        if (self.compare)(&key, self.key(x)) == Ordering::Greater {
            self.remove(handle)?;
            Ok(self.insert(key))
        } else {
            self.decrease_key(handle, key)?;
            Ok(handle)
        }
    }

    /// Finds an entry equal to `key`.
    ///
    /// Subtrees whose root orders after `key` are skipped, since heap order
    /// guarantees none of their descendants can match.
    pub fn find(&self, key: &T) -> Option<Handle>
    where
        T: PartialEq,
    {
        let mut stack = self.siblings(self.min?);
        while let Some(n) = stack.pop() {
            let candidate = self.key(n);
            if (self.compare)(candidate, key) == Ordering::Greater {
                continue;
            }
            if candidate == key {
                return Some(self.handle_of(n));
            }
            if let Some(child) = self.nodes[n].child {
                stack.extend(self.siblings(child));
            }
        }
        None
    }

    /// Returns the key behind `handle`, if the entry is still queued.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.resolve(handle).ok().map(|slot| self.key(slot))
    }

    /// Returns true if `handle` addresses a queued entry of this heap.
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Drops every entry. Handles issued before the call become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.vacant.clear();
        self.min = None;
        self.len = 0;
        self.id = NEXT_HEAP_ID.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn resolve(&self, handle: Handle) -> Result<usize, HeapError> {
        match self.nodes.get(handle.slot) {
            Some(node)
                if handle.heap == self.id
                    && node.generation == handle.generation
                    && node.key.is_some() =>
            {
                Ok(handle.slot)
            }
            _ => Err(HeapError::StaleHandle),
        }
    }

    fn handle_of(&self, slot: usize) -> Handle {
        Handle {
            heap: self.id,
            slot,
            generation: self.nodes[slot].generation,
        }
    }

    fn key(&self, slot: usize) -> &T {
        // Only reachable for slots linked into the heap, which always hold a key.
        self.nodes[slot]
            .key
            .as_ref()
            .expect("linked heap node without a key")
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(self.key(a), self.key(b)) == Ordering::Less
    }

    fn release(&mut self, slot: usize) -> Option<T> {
        let node = &mut self.nodes[slot];
        node.generation = node.generation.wrapping_add(1);
        node.parent = None;
        node.child = None;
        node.degree = 0;
        self.vacant.push(slot);
        node.key.take()
    }

    fn siblings(&self, start: usize) -> Vec<usize> {
        let mut out = vec![start];
        let mut cursor = self.nodes[start].right;
        while cursor != start {
            out.push(cursor);
            cursor = self.nodes[cursor].right;
        }
        out
    }

    fn splice_after(&mut self, anchor: usize, x: usize) {
        let right = self.nodes[anchor].right;
        self.nodes[x].left = anchor;
        self.nodes[x].right = right;
        self.nodes[anchor].right = x;
        self.nodes[right].left = x;
    }

    fn unlink(&mut self, x: usize) {
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        self.nodes[x].left = x;
        self.nodes[x].right = x;
    }

    fn add_root(&mut self, x: usize) {
        match self.min {
            None => {
                self.nodes[x].left = x;
                self.nodes[x].right = x;
                self.min = Some(x);
            }
            Some(min) => {
                self.splice_after(min, x);
                if self.less(x, min) {
                    self.min = Some(x);
                }
            }
        }
    }

    fn link(&mut self, child: usize, parent: usize) {
        self.nodes[child].parent = Some(parent);
        self.nodes[child].marked = false;
        match self.nodes[parent].child {
            None => {
                self.nodes[child].left = child;
                self.nodes[child].right = child;
                self.nodes[parent].child = Some(child);
            }
            Some(first) => self.splice_after(first, child),
        }
        self.nodes[parent].degree += 1;
    }

    fn consolidate(&mut self, roots: Vec<usize>) {
        let mut by_degree: Vec<Option<usize>> = Vec::new();
        for root in roots {
            let mut x = root;
            let mut degree = self.nodes[x].degree;
            loop {
                if degree >= by_degree.len() {
                    by_degree.resize(degree + 1, None);
                }
                match by_degree[degree].take() {
                    Some(mut y) => {
                        if self.less(y, x) {
                            std::mem::swap(&mut x, &mut y);
                        }
                        self.link(y, x);
                        degree += 1;
                    }
                    None => {
                        by_degree[degree] = Some(x);
                        break;
                    }
                }
            }
        }

        self.min = None;
        for root in by_degree.into_iter().flatten() {
            self.add_root(root);
        }
    }

    fn cut(&mut self, x: usize, parent: usize) {
        let next = self.nodes[x].right;
        if next == x {
            self.nodes[parent].child = None;
        } else {
            if self.nodes[parent].child == Some(x) {
                self.nodes[parent].child = Some(next);
            }
            self.unlink(x);
        }
        self.nodes[parent].degree -= 1;
        self.nodes[x].parent = None;
        self.nodes[x].marked = false;
        self.add_root(x);
    }

    fn cascading_cut(&mut self, mut y: usize) {
        while let Some(parent) = self.nodes[y].parent {
            if !self.nodes[y].marked {
                self.nodes[y].marked = true;
                return;
            }
            self.cut(y, parent);
            y = parent;
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for FibonacciHeap<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibonacciHeap")
            .field("len", &self.len)
            .field("min", &self.min.and_then(|m| self.nodes[m].key.as_ref()))
            .finish()
    }
}
