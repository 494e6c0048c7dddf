//! Fixed-capacity FIFO that evicts its oldest entry when full

use std::collections::VecDeque;

/// Bounded FIFO queue
///
/// Pushing never fails: at capacity the oldest entry is returned to the
/// caller and dropped from the queue.
#[derive(Debug, Clone)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, returning the evicted oldest one if the queue was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Remove and return the oldest entry
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Keep only entries matching `f`, returning how many were removed
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) -> usize {
        let before = self.items.len();
        self.items.retain(f);
        before - self.items.len()
    }

    /// Mutable access for in-place updates, oldest first
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove every entry, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.items.drain(..)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
