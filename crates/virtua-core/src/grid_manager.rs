//! The grid manager (spec §4.5, specialized for the 2-D case of §4.4.3).
//!
//! Grid is a first-class container variant, not one of the "thin
//! adaptations" spec §1 carves out of scope (that carve-out names only the
//! paginated and table variants). [`GridManager`] is the 2-D sibling of
//! [`crate::manager::LinearManager`]: same state machine, same reentrancy
//! coalescing, but driving [`crate::helper::GridHelper`] and
//! [`crate::engine::grid_transition`] instead of the single-axis range and
//! the linear [`crate::engine::intersection_transition`].

use std::hash::Hash;

use crate::buffer::BufferSize;
use crate::cache::CellCache;
use crate::cell::Cell;
use crate::change::ItemsMutation;
use crate::engine::{self, CellFactory};
use crate::error::{Result, VirtError};
use crate::helper::GridHelper;
use crate::index::Index;
use crate::items::ItemSource;
use crate::manager::{LayoutSignal, ManagerPhase};
use crate::state::{GridLayout, State};

/// Drives a 2-D (grid) container through the state machine described in
/// spec §4.5. Not `Send`: spec §5 places the whole core on one thread.
pub struct GridManager<Item, N, C, F> {
    helper: GridHelper,
    buffer: BufferSize,
    cache_capacity: usize,
    row_scroll: f64,
    col_scroll: f64,
    state: State<Item, C>,
    cache: CellCache<C>,
    factory: F,
    phase: ManagerPhase,
    transitioning: bool,
    pending: Option<PendingGridChange>,
    _node: std::marker::PhantomData<N>,
}

/// Grid's change classification is simpler than the linear one: there is no
/// distinct `Orientation` axis, and `Added`/`Removed` item mutations fall
/// back to a full recompute (spec §4.4.1 `Other`: "Safe fallback: recompute
/// as Geometry") rather than a dedicated linear-index-shifting transition,
/// since shifting a 1-D insertion/removal through a 2-D row/column grid has no
/// single canonical mapping in spec §4.4.3, which only commits to the
/// overlap-reuse algorithm over the *current* target set. Decision recorded
/// in DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingGridChange {
    GeometryOrPosition,
    Factory,
    ItemsReplaced,
    Recompute,
}

impl PendingGridChange {
    fn coalesce(self, other: PendingGridChange) -> PendingGridChange {
        use PendingGridChange::*;
        match (self, other) {
            (Factory, _) | (_, Factory) => Factory,
            (ItemsReplaced, _) | (_, ItemsReplaced) => ItemsReplaced,
            (Recompute, _) | (_, Recompute) => Recompute,
            _ => GeometryOrPosition,
        }
    }
}

impl<Item, N, C, F> GridManager<Item, N, C, F>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    F: CellFactory<Item, C>,
{
    pub fn new(helper: GridHelper, buffer: BufferSize, cache_capacity: usize, factory: F) -> Self {
        GridManager {
            helper,
            buffer,
            cache_capacity,
            row_scroll: 0.0,
            col_scroll: 0.0,
            state: State::invalid(),
            cache: CellCache::new(cache_capacity),
            factory,
            phase: ManagerPhase::Uninitialized,
            transitioning: false,
            pending: None,
            _node: std::marker::PhantomData,
        }
    }

    pub fn phase(&self) -> ManagerPhase {
        self.phase
    }

    pub fn observe_state(&self) -> &State<Item, C> {
        &self.state
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn virtual_max_x(&mut self) -> f64 {
        self.helper.virtual_max_x()
    }

    pub fn virtual_max_y(&mut self) -> f64 {
        self.helper.virtual_max_y()
    }

    pub fn max_h_scroll(&mut self) -> f64 {
        self.helper.max_h_scroll()
    }

    pub fn max_v_scroll(&mut self) -> f64 {
        self.helper.max_v_scroll()
    }

    pub fn row_position(&self, row: Index) -> f64 {
        self.helper.row_position(row)
    }

    pub fn column_position(&self, col: Index) -> f64 {
        self.helper.column_position(col)
    }

    pub fn notify_geometry(
        &mut self,
        viewport_width: f64,
        viewport_height: f64,
        cell_width: f64,
        cell_height: f64,
        spacing: f64,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        self.helper.set_viewport_size(viewport_width, viewport_height);
        self.helper.set_cell_size(cell_width, cell_height);
        self.helper.set_spacing(spacing);
        self.run_transition(PendingGridChange::GeometryOrPosition, items)
    }

    pub fn scroll_to_pixel(
        &mut self,
        x: f64,
        y: f64,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        let max_x = self.helper.max_h_scroll();
        let max_y = self.helper.max_v_scroll();
        self.col_scroll = x.clamp(0.0, max_x);
        self.row_scroll = y.clamp(0.0, max_y);
        self.run_transition(PendingGridChange::GeometryOrPosition, items)
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.scroll_to_pixel(self.col_scroll + dx, self.row_scroll + dy, items)
    }

    /// `columns_per_row` changed (spec §4.4.3: "the engine treats this as a
    /// full rebuild but still drains the old cells into the cache first").
    pub fn set_columns_per_row(
        &mut self,
        columns_per_row: usize,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        self.helper.set_columns_per_row(columns_per_row);
        let old = std::mem::replace(&mut self.state, State::invalid());
        let entries = old.into_sorted_entries();
        self.cache.cache(entries.into_iter().map(|(_, c)| c));
        self.run_transition(PendingGridChange::Recompute, items)
    }

    pub fn notify_items_replaced(&mut self, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.helper.set_item_count(items.len());
        self.run_transition(PendingGridChange::ItemsReplaced, items)
    }

    /// `Added`/`Removed` mutations fall back to a full recompute over the
    /// current target set (see [`PendingGridChange`]); `Permuted`/`Set`
    /// patch displayed items in place with no cell movement, matching spec
    /// §4.4.1 exactly for those two kinds.
    pub fn notify_items_mutated(
        &mut self,
        mutation: ItemsMutation,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        self.helper.set_item_count(items.len());
        match mutation {
            ItemsMutation::Permuted(_) => {
                let targets = self.current_targets();
                let old = std::mem::replace(&mut self.state, State::invalid());
                self.state = engine::grid_permuted_transition(old, &targets, items);
                self.publish_signal()
            }
            ItemsMutation::Set(changed) => {
                let targets = self.current_targets();
                let old = std::mem::replace(&mut self.state, State::invalid());
                self.state = engine::grid_set_transition(old, &targets, &changed, items);
                self.publish_signal()
            }
            ItemsMutation::Added { .. } | ItemsMutation::Removed(_) => {
                self.run_transition(PendingGridChange::Recompute, items)
            }
        }
    }

    pub fn notify_factory_changed(&mut self, factory: F, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.factory = factory;
        self.run_transition(PendingGridChange::Factory, items)
    }

    /// Forces a content refresh on every currently live cell at the given
    /// linear indices (spec §6 "Rendering Host Interface": `update(indices…)`).
    /// Indices outside the current target set are silently ignored.
    pub fn update(&mut self, indices: &[Index]) {
        for &idx in indices {
            if let Some(cell) = self.state.cells_mut().get_mut(idx) {
                cell.force_refresh();
            }
        }
    }

    pub fn set_buffer_size(&mut self, buffer: BufferSize) {
        self.buffer = buffer;
        self.helper.set_buffer(buffer);
    }

    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.cache_capacity = capacity;
        self.cache.set_capacity(capacity);
    }

    pub fn request_viewport_layout(&mut self) -> LayoutSignal {
        if self.phase == ManagerPhase::Uninitialized {
            LayoutSignal::Unchanged
        } else {
            LayoutSignal::Repositioned
        }
    }

    pub fn invalidate(&mut self, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        let old = std::mem::replace(&mut self.state, State::invalid());
        let entries = old.into_sorted_entries();
        self.cache.cache(entries.into_iter().map(|(_, c)| c));
        self.run_transition(PendingGridChange::Recompute, items)
    }

    fn current_targets(&self) -> Vec<Index> {
        match self.state.grid_layout() {
            Some(layout) => self
                .helper
                .linear_indices(layout.rows_range, layout.columns_range),
            None => Vec::new(),
        }
    }

    fn run_transition(
        &mut self,
        kind: PendingGridChange,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        if self.transitioning {
            self.pending = Some(match self.pending.take() {
                Some(existing) => existing.coalesce(kind),
                None => kind,
            });
            return Ok(LayoutSignal::Unchanged);
        }
        self.transitioning = true;
        let outcome = self.execute(kind, items);
        self.transitioning = false;

        if outcome.is_ok() {
            if let Some(pending) = self.pending.take() {
                log::debug!("grid manager: draining coalesced follow-up transition {pending:?}");
                return self.run_transition(pending, items);
            }
        }
        outcome
    }

    fn execute(&mut self, kind: PendingGridChange, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        let rows_range = self.helper.rows_range(self.row_scroll);
        let columns_range = self.helper.columns_range(self.col_scroll);
        let targets = self.helper.linear_indices(rows_range, columns_range);
        let layout = GridLayout {
            rows_range,
            columns_range,
            columns_per_row: self.helper.columns_per_row(),
        };

        log::debug!(
            "grid manager: transition kind={kind:?} rows={rows_range:?} cols={columns_range:?}"
        );

        let old = std::mem::replace(&mut self.state, State::invalid());
        let new_state = match kind {
            PendingGridChange::Factory => {
                for (_, cell) in old.into_sorted_entries() {
                    cell.dispose();
                }
                self.cache.on_factory_change();
                engine::grid_transition(
                    State::empty(),
                    &targets,
                    items,
                    &mut self.cache,
                    &mut self.factory,
                    layout,
                    true,
                )?
            }
            PendingGridChange::ItemsReplaced => engine::grid_transition(
                old,
                &targets,
                items,
                &mut self.cache,
                &mut self.factory,
                layout,
                true,
            )?,
            PendingGridChange::GeometryOrPosition | PendingGridChange::Recompute => {
                engine::grid_transition(
                    old,
                    &targets,
                    items,
                    &mut self.cache,
                    &mut self.factory,
                    layout,
                    false,
                )?
            }
        };

        let new_state = self.recover_if_inconsistent(new_state, &targets, layout, items)?;

        self.state = new_state;
        self.publish_signal()
    }

    /// Verifies every cell in `state` sits at an index still among `targets`
    /// (spec §7 "StateInconsistency"). A grid's live set isn't a contiguous
    /// range (the ragged last row is excluded), so membership in `targets`
    /// is the invariant, not range containment. Debug builds panic; release
    /// builds log and rebuild the same target set from scratch.
    fn recover_if_inconsistent(
        &mut self,
        state: State<Item, C>,
        targets: &[Index],
        layout: GridLayout,
        items: &impl ItemSource<Item>,
    ) -> Result<State<Item, C>> {
        let target_set: std::collections::HashSet<Index> = targets.iter().copied().collect();
        let consistent = state.is_invalid()
            || state.cells().values_by_index().all(|(idx, _)| target_set.contains(idx));
        if consistent {
            return Ok(state);
        }

        let err = VirtError::state_inconsistency("cell index outside grid target set");
        debug_assert!(false, "{err}");
        log::warn!("grid manager: {err}, rebuilding {} targets from scratch", targets.len());
        self.cache.cache(state.into_sorted_entries().into_iter().map(|(_, c)| c));
        engine::grid_transition(State::empty(), targets, items, &mut self.cache, &mut self.factory, layout, false)
    }

    fn publish_signal(&mut self) -> Result<LayoutSignal> {
        let signal = if self.state.is_empty() {
            self.phase = ManagerPhase::Empty;
            LayoutSignal::Repositioned
        } else {
            self.phase = ManagerPhase::Ready;
            if self.state.cells_changed() {
                LayoutSignal::CellsRebuilt
            } else {
                LayoutSignal::Repositioned
            }
        };
        Ok(signal)
    }
}
