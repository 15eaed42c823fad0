//! Immutable snapshot bound to one container (spec §3 "State").

use std::hash::Hash;

use crate::cell::Cell;
use crate::index::{Index, IntegerRange};
use crate::state_map::StateMap;

/// 2-D bookkeeping carried by grid states (spec §3: "for 2-D cores
/// (grid/table): `rows_range`, `columns_range` and ... `linear_range` plus a
/// `columns_per_row` reading").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows_range: IntegerRange,
    pub columns_range: IntegerRange,
    pub columns_per_row: usize,
}

/// Immutable snapshot bound to one container.
///
/// Two well-known states exist: [`State::invalid`] (no container bound; a
/// no-op target for all mutations) and [`State::empty`] (bound but carrying
/// no cells, with `range = IntegerRange::INVALID`).
pub struct State<Item, C> {
    range: IntegerRange,
    cells: StateMap<Item, C>,
    cells_changed: bool,
    grid: Option<GridLayout>,
    bound: bool,
}

impl<Item, N, C> State<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
{
    /// No container bound; every mutation against this state is a no-op.
    pub fn invalid() -> Self {
        State {
            range: IntegerRange::INVALID,
            cells: StateMap::new(),
            cells_changed: false,
            grid: None,
            bound: false,
        }
    }

    /// Bound to a container but carrying no cells.
    pub fn empty() -> Self {
        State {
            range: IntegerRange::INVALID,
            cells: StateMap::new(),
            cells_changed: false,
            grid: None,
            bound: true,
        }
    }

    pub fn is_invalid(&self) -> bool {
        !self.bound
    }

    pub fn is_empty(&self) -> bool {
        self.bound && self.cells.is_empty()
    }

    pub fn range(&self) -> IntegerRange {
        self.range
    }

    pub fn cells(&self) -> &StateMap<Item, C> {
        &self.cells
    }

    pub fn cells_changed(&self) -> bool {
        self.cells_changed
    }

    pub fn grid_layout(&self) -> Option<GridLayout> {
        self.grid
    }

    pub(crate) fn new_linear(range: IntegerRange, cells: StateMap<Item, C>, cells_changed: bool) -> Self {
        State {
            range,
            cells,
            cells_changed,
            grid: None,
            bound: true,
        }
    }

    pub(crate) fn new_grid(
        range: IntegerRange,
        cells: StateMap<Item, C>,
        cells_changed: bool,
        grid: GridLayout,
    ) -> Self {
        State {
            range,
            cells,
            cells_changed,
            grid: Some(grid),
            bound: true,
        }
    }

    /// Drains this state's cells in ascending index order, consuming it.
    /// Used at ownership-transfer points (spec §3: `State::dispose` moves
    /// cells to the cache).
    pub fn dispose_into_cells(self) -> Vec<C> {
        self.cells.drain_sorted()
    }

    /// Like [`State::dispose_into_cells`] but keeps each cell's prior index,
    /// for callers (the transition engine) that need to tell which old
    /// cells still fall within a new range.
    pub(crate) fn into_sorted_entries(self) -> Vec<(Index, C)> {
        self.cells.drain_sorted_with_index()
    }

    /// Mutable access to the cell map, for transitions that patch cells in
    /// place (permute/set mutations) without moving any of them.
    pub(crate) fn cells_mut(&mut self) -> &mut StateMap<Item, C> {
        &mut self.cells
    }

    /// Rebinds this state to a new range and `cells_changed` flag, keeping
    /// its cell map as-is. Used when a transition only patches items in
    /// place (spec §4.4.1: permuted/set mutations never move a cell).
    pub(crate) fn with_range(mut self, range: IntegerRange, cells_changed: bool) -> Self {
        self.range = range;
        self.cells_changed = cells_changed;
        self
    }
}
