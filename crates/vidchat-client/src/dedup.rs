//! Recency window of emitted record ids.

use std::collections::VecDeque;

/// Default number of ids remembered; matches the live page size.
pub const DEFAULT_CAPACITY: usize = 25;

/// Bounded FIFO of recently seen ids.
///
/// Membership only. Once an id is evicted it will be accepted again.
#[derive(Debug, Clone)]
pub struct DedupWindow {
    ids: VecDeque<String>,
    capacity: usize,
}

impl DedupWindow {
    /// A window holding at most `capacity` ids (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Record `id`, evicting the oldest entry when full.
    ///
    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        if self.ids.len() == self.capacity {
            self.ids.pop_front();
        }
        self.ids.push_back(id);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Ids oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
