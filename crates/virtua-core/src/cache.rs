//! Bounded pool of retired cells available for reuse (spec §4.2).

use std::collections::VecDeque;

use crate::cell::Cell;

/// A bounded double-ended pool of retired cells for a single factory.
///
/// Eviction discipline: LIFO. [`CellCache::take`] reuses the most recently
/// retired cell first, to maximize locality of recently touched cells.
/// Capacity overflow in [`CellCache::cache`] disposes from the *oldest* end
/// (spec §4.2: "Capacity overflow disposes from the oldest end").
///
/// Invariant: cells held by the cache never appear in any live `State`; after
/// `cache(c)` no reference to `c` is retained by any state (enforced by the
/// engine, which is the only caller).
pub struct CellCache<C> {
    capacity: usize,
    cells: VecDeque<C>,
}

impl<C> CellCache<C> {
    pub fn new(capacity: usize) -> Self {
        CellCache {
            capacity,
            cells: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.cells.len() > self.capacity {
            self.drop_oldest();
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<Item, N, C: Cell<Item, Node = N>> CellCache<C> {
    /// Retires `cells`, calling `on_cache()` on each. Cells beyond `capacity`
    /// are disposed immediately rather than retained (spec §4.2).
    pub fn cache(&mut self, cells: impl IntoIterator<Item = C>) {
        for mut c in cells {
            c.on_cache();
            if self.capacity == 0 {
                log::debug!("cell cache has zero capacity, disposing overflow");
                c.dispose();
                continue;
            }
            if self.cells.len() >= self.capacity {
                self.drop_oldest();
            }
            self.cells.push_back(c);
        }
    }

    /// Pops the most recently retired cell, calling `on_de_cache()` on it.
    pub fn take(&mut self) -> Option<C> {
        let mut c = self.cells.pop_back()?;
        c.on_de_cache();
        Some(c)
    }

    /// Disposes every held cell.
    pub fn clear(&mut self) {
        while let Some(c) = self.cells.pop_front() {
            c.dispose();
        }
    }

    fn drop_oldest(&mut self) {
        if let Some(c) = self.cells.pop_front() {
            log::debug!("cell cache dropping surplus cell for reduced capacity");
            c.dispose();
        }
    }

    /// The cache is a pure function of the factory; any factory change
    /// invalidates retired cells built by the old one (spec §4.2).
    pub fn on_factory_change(&mut self) {
        self.clear();
    }
}
