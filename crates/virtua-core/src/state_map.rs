//! Indexed container of live cells for a state snapshot (spec §4.3).

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::cell::Cell;
use crate::index::Index;

/// `index -> Cell` map with a secondary `item -> indices` index, so that
/// "remove by item" is cheap even when items repeat (spec §4.3, §9
/// "Duplicate items").
///
/// `values_by_index` iterates in ascending index order without a sort:
/// `IndexMap` preserves insertion order, and the engine always inserts in
/// ascending index order during a transition (spec §4.4.2), so insertion
/// order and index order coincide by construction. [`StateMap::sorted`]
/// exists for callers (e.g. diagnostics) that cannot make that assumption.
pub struct StateMap<Item, C> {
    by_index: IndexMap<Index, C>,
    by_item: HashMap<Item, SmallVec<[Index; 4]>>,
    /// Current item per live index, so [`StateMap::put`] can find and drop
    /// the stale `by_item` entry when an index is re-`put` with a different
    /// item (without it, `by_item` would retain a dangling index under the
    /// old item and break [`StateMap::remove_by_item`]'s contract).
    index_item: HashMap<Index, Item>,
}

impl<Item, N, C> StateMap<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
{
    pub fn new() -> Self {
        StateMap {
            by_index: IndexMap::new(),
            by_item: HashMap::new(),
            index_item: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn contains_index(&self, index: Index) -> bool {
        self.by_index.contains_key(&index)
    }

    pub fn get(&self, index: Index) -> Option<&C> {
        self.by_index.get(&index)
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut C> {
        self.by_index.get_mut(&index)
    }

    /// Replaces any prior entry at `index`. If a prior entry existed it is
    /// returned to the caller rather than disposed here (spec §4.3: "the
    /// displaced cell is not disposed here").
    ///
    /// If `index` was previously associated with a *different* item, that
    /// stale `by_item` entry is dropped first, otherwise `remove_by_item`
    /// could resolve an index whose item has since changed underneath it.
    pub fn put(&mut self, index: Index, item: Item, cell: C) -> Option<C> {
        if let Some(old_item) = self.index_item.get(&index) {
            if *old_item != item {
                if let Some(indices) = self.by_item.get_mut(old_item) {
                    indices.retain(|&i| i != index);
                    if indices.is_empty() {
                        let old_item = old_item.clone();
                        self.by_item.remove(&old_item);
                    }
                }
            }
        }

        let previous = self.by_index.shift_remove(&index);
        let indices = self.by_item.entry(item.clone()).or_insert_with(SmallVec::new);
        if !indices.contains(&index) {
            indices.push(index);
        }
        self.index_item.insert(index, item);
        self.by_index.insert(index, cell);
        previous
    }

    /// Removes and returns the cell at `index`.
    pub fn remove(&mut self, index: Index) -> Option<C> {
        let removed = self.by_index.shift_remove(&index);
        if removed.is_some() {
            if let Some(item) = self.index_item.remove(&index) {
                if let Some(indices) = self.by_item.get_mut(&item) {
                    indices.retain(|&i| i != index);
                    if indices.is_empty() {
                        self.by_item.remove(&item);
                    }
                }
            }
        }
        removed
    }

    /// Removes one entry whose item equals `item`, preferring the lowest
    /// index (spec §4.3).
    pub fn remove_by_item(&mut self, item: &Item) -> Option<C> {
        let index = {
            let indices = self.by_item.get_mut(item)?;
            indices.sort_unstable();
            indices.first().copied()
        }?;
        self.remove(index)
    }

    /// Iterates cells in ascending index order. See the type-level doc for
    /// why insertion order already matches index order under normal use.
    pub fn values_by_index(&self) -> impl Iterator<Item = (&Index, &C)> {
        self.by_index.iter()
    }

    /// Mutable iteration in arbitrary order, used by transitions that patch
    /// items in place without moving any cell (permute/set mutations).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Index, &mut C)> {
        self.by_index.iter_mut()
    }

    /// Like [`StateMap::values_by_index`], but explicitly sorted, for
    /// callers that cannot rely on insertion order, e.g. after an
    /// out-of-order bulk `put` sequence.
    pub fn sorted(&self) -> Vec<(Index, &C)> {
        let mut v: Vec<(Index, &C)> = self.by_index.iter().map(|(i, c)| (*i, c)).collect();
        v.sort_unstable_by_key(|(i, _)| *i);
        v
    }

    /// Iterates `(item, cell)` pairs, tolerant of duplicate items.
    pub fn resolve(&self) -> Vec<(Item, &C)> {
        self.by_index
            .iter()
            .filter_map(|(index, cell)| {
                self.index_item.get(index).map(|item| (item.clone(), cell))
            })
            .collect()
    }

    /// Removes all entries without disposing them (the caller decides the
    /// fate of the removed cells, e.g. draining them into a [`crate::cache::CellCache`]).
    pub fn clear(&mut self) {
        self.by_index.clear();
        self.by_item.clear();
        self.index_item.clear();
    }

    /// Drains all entries in ascending index order, consuming the map.
    pub fn drain_sorted(self) -> Vec<C> {
        self.drain_sorted_with_index()
            .into_iter()
            .map(|(_, c)| c)
            .collect()
    }

    /// Like [`StateMap::drain_sorted`], but keeps each cell's index alongside
    /// it. The transition engine needs this to tell which old cells still
    /// fall in the new range (spec §4.4.2 steps 3-4), information the
    /// index-dropping [`StateMap::drain_sorted`] throws away.
    pub fn drain_sorted_with_index(self) -> Vec<(Index, C)> {
        let mut entries: Vec<(Index, C)> = self.by_index.into_iter().collect();
        entries.sort_unstable_by_key(|(i, _)| *i);
        entries
    }
}

impl<Item, N, C> Default for StateMap<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
{
    fn default() -> Self {
        Self::new()
    }
}
