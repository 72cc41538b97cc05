//! Indexed binary min-heap with decrease-key.
//!
//! `std::collections::BinaryHeap` cannot reposition an item whose priority
//! changed, so A* on it has to push duplicates. This heap tracks where every
//! item lives, which gives O(log n) `update` and O(1) `contains`.
//!
//! Items name their own slot through [`HeapItem::slot`]; for grid searches
//! the slot is the cell's row-major index. The slot -> position table lives
//! inside the heap, never on the items' owners.

use crate::error::{GameError, Result};

/// An item that can live in an [`IndexedHeap`].
///
/// Ordering decides priority: the *smallest* item is the best one.
pub trait HeapItem: Ord {
    /// Dense identity of the item, used to find it again.
    fn slot(&self) -> usize;
}

/// Binary min-heap keyed by [`HeapItem::slot`].
#[derive(Debug, Clone)]
pub struct IndexedHeap<T> {
    items: Vec<T>,
    positions: Vec<Option<usize>>,
}

impl<T: HeapItem> IndexedHeap<T> {
    /// Create a heap sized for slots `0..capacity`.
    ///
    /// Slots beyond the capacity are accepted; the table grows on demand.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    /// Number of items in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the heap holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if an item with this slot is queued.
    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        self.positions.get(slot).is_some_and(Option::is_some)
    }

    /// The best item without removing it.
    #[must_use]
    pub fn peek_best(&self) -> Option<&T> {
        self.items.first()
    }

    /// Insert an item. If its slot is already queued the item is replaced instead.
    pub fn push(&mut self, item: T) {
        let slot = item.slot();
        debug_assert!(!self.contains(slot), "slot {slot} pushed twice; use update");
        if self.contains(slot) {
            self.update(item);
            return;
        }
        if slot >= self.positions.len() {
            self.positions.resize(slot + 1, None);
        }
        let position = self.items.len();
        self.items.push(item);
        self.positions[slot] = Some(position);
        self.sift_up(position);
        self.debug_validate();
    }

    /// Remove and return the best item.
    pub fn pop_best(&mut self) -> Result<T> {
        if self.items.is_empty() {
            return Err(GameError::EmptyQueue);
        }
        let last = self.items.len() - 1;
        self.swap(0, last);
        let best = self.items.pop().ok_or(GameError::EmptyQueue)?;
        self.positions[best.slot()] = None;
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        self.debug_validate();
        Ok(best)
    }

    /// Replace the queued item sharing `item`'s slot and restore heap order.
    ///
    /// Returns `false` (and leaves the heap untouched) if the slot is not queued.
    pub fn update(&mut self, item: T) -> bool {
        let Some(position) = self.positions.get(item.slot()).copied().flatten() else {
            return false;
        };
        self.items[position] = item;
        let position = self.sift_up(position);
        self.sift_down(position);
        self.debug_validate();
        true
    }

    /// Remove every item, keeping allocations.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            self.positions[item.slot()] = None;
        }
    }

    fn sift_up(&mut self, mut position: usize) -> usize {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.items[position] < self.items[parent] {
                self.swap(position, parent);
                position = parent;
            } else {
                break;
            }
        }
        position
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.items.len();
        loop {
            let left = position * 2 + 1;
            let right = left + 1;
            let mut best = position;
            if left < len && self.items[left] < self.items[best] {
                best = left;
            }
            if right < len && self.items[right] < self.items[best] {
                best = right;
            }
            if best == position {
                return;
            }
            self.swap(position, best);
            position = best;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.items.swap(a, b);
        self.positions[self.items[a].slot()] = Some(a);
        self.positions[self.items[b].slot()] = Some(b);
    }

    #[cfg(any(test, feature = "debug-validation"))]
    fn debug_validate(&self) {
        for (position, item) in self.items.iter().enumerate() {
            assert_eq!(
                self.positions[item.slot()],
                Some(position),
                "heap index table out of sync"
            );
            if position > 0 {
                let parent = (position - 1) / 2;
                assert!(self.items[parent] <= *item, "heap order violated at {position}");
            }
        }
    }

    #[cfg(not(any(test, feature = "debug-validation")))]
    #[inline]
    fn debug_validate(&self) {}
}
