//! The manager (spec §4.5): observes inputs, classifies each change,
//! invokes the engine, and decides the minimum layout signal.
//!
//! The teacher's lazy-list state (`compose-foundation::lazy::lazy_list_state`)
//! wires this through a reactive `MutableState`-backed property graph tied to
//! a composition runtime. Spec §9 explicitly tells us to collapse that into
//! a flat subscription API; this module is the plain, non-reactive
//! equivalent, the host calls `notify_*` whenever an input changes and
//! reads the result back, instead of a dependency graph recomputing it.

use std::hash::Hash;

use crate::buffer::BufferSize;
use crate::cache::CellCache;
use crate::cell::Cell;
use crate::change::{ChangeKind, ItemsMutation};
use crate::config::Configuration;
use crate::engine::{self, CellFactory};
use crate::error::{Result, VirtError};
use crate::helper::LinearHelper;
use crate::index::IntegerRange;
use crate::items::ItemSource;
use crate::state::State;

/// The manager's own lifecycle, independent of the published `State`'s
/// `INVALID`/`EMPTY`/bound-with-cells distinction (spec §4.5: "A state
/// machine with states `{ Uninitialized, Empty, Ready }`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerPhase {
    /// No geometry/items observed yet; `observe_state()` returns `State::invalid()`.
    Uninitialized,
    /// Bound, but the current range is empty (no items, or no viewport extent).
    Empty,
    /// Bound with a non-empty range of materialized cells.
    Ready,
}

/// The minimum downstream signal implied by a transition (spec §4.5:
/// "exposes the resulting state ... downstream rendering reconciles children
/// ... iff `cells_changed`, otherwise only repositions").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSignal {
    /// Nothing to do; the call was a no-op (e.g. a coalesced follow-up that
    /// produced no change once applied).
    Unchanged,
    /// Cell set is identical; only pixel positions must be recomputed.
    Repositioned,
    /// The live cell set changed; the host must reconcile its children list
    /// from `observe_state().cells().values_by_index()`.
    CellsRebuilt,
}

/// Drives a single-axis (list) container through the state machine described
/// in spec §4.5.
///
/// Not `Send`: spec §5 places the whole core on one designated thread.
pub struct LinearManager<Item, N, C, F> {
    config: Configuration,
    helper: LinearHelper,
    scroll: f64,
    state: State<Item, C>,
    cache: CellCache<C>,
    factory: F,
    phase: ManagerPhase,
    item_count: usize,
    transitioning: bool,
    pending: Option<ChangeKind>,
    _node: std::marker::PhantomData<N>,
}

impl<Item, N, C, F> LinearManager<Item, N, C, F>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    F: CellFactory<Item, C>,
{
    pub fn new(config: Configuration, factory: F) -> Self {
        let helper = LinearHelper::new(0, 0.0, config.cell_size(), config.spacing(), config.buffer_size());
        let cache = CellCache::new(config.cache_capacity());
        LinearManager {
            config,
            helper,
            scroll: 0.0,
            state: State::invalid(),
            cache,
            factory,
            phase: ManagerPhase::Uninitialized,
            item_count: 0,
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

    /// Number of retired cells currently held in the cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn virtual_max(&mut self) -> f64 {
        self.helper.virtual_max()
    }

    pub fn max_scroll(&mut self) -> f64 {
        self.helper.max_scroll()
    }

    pub fn scroll_position(&self) -> f64 {
        self.scroll
    }

    /// The pixel position of `index` along the main axis (spec §4.4.5
    /// `pos(i) = i * (cell + spacing) - scroll`). The host subtracts its own
    /// scroll offset for on-screen placement; this returns the un-scrolled
    /// content position, matching [`crate::helper::LinearHelper::position_of`].
    pub fn position_of(&self, index: crate::index::Index) -> f64 {
        self.helper.position_of(index)
    }

    pub fn is_in_viewport(&self, index: crate::index::Index) -> bool {
        self.helper.is_in_viewport(index, self.scroll)
    }

    /// Viewport/cell-size geometry changed (spec §6 Configuration:
    /// `cell_size`; Rendering Host Interface: `request_viewport_layout` is
    /// the "no cell-set change" sibling of this, see [`Self::request_viewport_layout`]).
    pub fn notify_geometry(
        &mut self,
        viewport_extent: f64,
        cell_extent: f64,
        spacing: f64,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        self.helper.set_viewport_extent(viewport_extent);
        self.helper.set_cell_extent(cell_extent);
        self.helper.set_spacing(spacing);
        self.run_transition(ChangeKind::Geometry, items)
    }

    /// A pixel-based scroll request, clamped to `[0, max_scroll]` (spec §6,
    /// §7: "Scrolling past `max_scroll` clamps silently").
    pub fn scroll_to_pixel(&mut self, pixel: f64, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.scroll = self.helper.clamp_scroll(pixel);
        self.run_transition(ChangeKind::Position, items)
    }

    pub fn scroll_by(&mut self, delta: f64, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.scroll_to_pixel(self.scroll + delta, items)
    }

    pub fn scroll_to_index(&mut self, index: crate::index::Index, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        let pixel = self.helper.position_of(index);
        self.scroll_to_pixel(pixel, items)
    }

    /// The items sequence was replaced wholesale (spec §6: "If only the
    /// wholesale change is available, it is treated as `ItemsReplaced`").
    pub fn notify_items_replaced(&mut self, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.item_count = items.len();
        self.helper.set_count(self.item_count);
        self.run_transition(ChangeKind::ItemsReplaced, items)
    }

    /// A granular items-sequence mutation (spec §6 "Items Sequence").
    pub fn notify_items_mutated(
        &mut self,
        mutation: ItemsMutation,
        items: &impl ItemSource<Item>,
    ) -> Result<LayoutSignal> {
        self.item_count = items.len();
        self.helper.set_count(self.item_count);
        self.run_transition(ChangeKind::ItemsMutated(mutation), items)
    }

    /// Replaces the cell factory. Disposes every live cell and clears the
    /// cache (spec §6: "replacement disposes all live cells").
    pub fn notify_factory_changed(&mut self, factory: F, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.factory = factory;
        self.run_transition(ChangeKind::Factory, items)
    }

    /// Orientation changed: scroll resets to 0 on this axis (spec §4.4.1).
    pub fn notify_orientation_changed(&mut self, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        self.scroll = 0.0;
        self.run_transition(ChangeKind::Orientation, items)
    }

    /// Forces a content refresh on every currently live cell at `indices`
    /// (spec §6 "Rendering Host Interface": `update(indices…)`, "propagated
    /// to each cell's content; the core itself does not interpret it").
    /// Indices outside the current range are silently ignored; this never
    /// changes the cell set or range.
    pub fn update(&mut self, indices: &[crate::index::Index]) {
        for &idx in indices {
            if let Some(cell) = self.state.cells_mut().get_mut(idx) {
                cell.force_refresh();
            }
        }
    }

    pub fn set_buffer_size(&mut self, buffer: BufferSize) {
        self.config.set_buffer_size(buffer);
        self.helper.set_buffer(buffer);
    }

    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.config.set_cache_capacity(capacity);
        self.cache.set_capacity(capacity);
    }

    /// Signals that positions must be recomputed without changing the cell
    /// set (spec §6 "Rendering Host Interface": `request_viewport_layout`).
    /// The cell set is never touched; this always reports `Repositioned`
    /// (or `Unchanged` while uninitialized).
    pub fn request_viewport_layout(&mut self) -> LayoutSignal {
        if self.phase == ManagerPhase::Uninitialized {
            LayoutSignal::Unchanged
        } else {
            LayoutSignal::Repositioned
        }
    }

    /// Forces a full rebuild: old cells are drained to the cache (not
    /// disposed, this isn't a factory change) and state recomputed from
    /// scratch (spec §4.5 "`invalidate()` forces full rebuild").
    pub fn invalidate(&mut self, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        let old = std::mem::replace(&mut self.state, State::invalid());
        let entries = old.into_sorted_entries();
        self.cache.cache(entries.into_iter().map(|(_, c)| c));
        self.run_transition(ChangeKind::Other, items)
    }

    fn run_transition(&mut self, kind: ChangeKind, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
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
                log::debug!("manager: draining coalesced follow-up transition {pending:?}");
                return self.run_transition(pending, items);
            }
        }
        outcome
    }

    fn execute(&mut self, kind: ChangeKind, items: &impl ItemSource<Item>) -> Result<LayoutSignal> {
        let new_range = self.helper.range(self.scroll);
        let old = std::mem::replace(&mut self.state, State::invalid());

        log::debug!(
            "manager: transition kind={kind:?} old_range={:?} new_range_candidate={:?}",
            old.range(),
            new_range
        );

        let new_state = match &kind {
            ChangeKind::Factory => {
                engine::full_rebuild_transition(old, new_range, items, &mut self.cache, &mut self.factory)?
            }
            ChangeKind::Orientation => {
                engine::full_rebuild_transition(old, new_range, items, &mut self.cache, &mut self.factory)?
            }
            ChangeKind::ItemsReplaced => engine::intersection_transition(
                old,
                new_range,
                items,
                &mut self.cache,
                &mut self.factory,
                true,
            )?,
            ChangeKind::ItemsMutated(mutation) => engine::items_mutated_transition(
                old,
                new_range,
                mutation,
                items,
                &mut self.cache,
                &mut self.factory,
            )?,
            ChangeKind::Geometry | ChangeKind::Position | ChangeKind::Other => {
                engine::intersection_transition(
                    old,
                    new_range,
                    items,
                    &mut self.cache,
                    &mut self.factory,
                    false,
                )?
            }
        };

        let new_state = self.recover_if_inconsistent(new_state, new_range, items)?;

        let signal = if new_state.is_empty() {
            self.phase = ManagerPhase::Empty;
            LayoutSignal::Repositioned
        } else {
            self.phase = ManagerPhase::Ready;
            if new_state.cells_changed() {
                LayoutSignal::CellsRebuilt
            } else {
                LayoutSignal::Repositioned
            }
        };
        log::debug!(
            "manager: transition complete new_range={:?} cells_changed={} signal={:?}",
            new_state.range(),
            new_state.cells_changed(),
            signal
        );
        self.state = new_state;
        Ok(signal)
    }

    /// Verifies the invariant every transition must uphold: every cell the
    /// new state holds lives at an index within that state's own range
    /// (spec §7 "StateInconsistency"). Debug builds panic as soon as this
    /// drifts, since it can only mean a bug in a transition function;
    /// release builds log it and rebuild `new_range` from scratch rather
    /// than hand the caller a state with a dangling cell.
    fn recover_if_inconsistent(
        &mut self,
        state: State<Item, C>,
        new_range: IntegerRange,
        items: &impl ItemSource<Item>,
    ) -> Result<State<Item, C>> {
        let range = state.range();
        let consistent = state.is_invalid()
            || state.cells().values_by_index().all(|(idx, _)| range.contains(*idx));
        if consistent {
            return Ok(state);
        }

        let err = VirtError::state_inconsistency(format!(
            "cell index outside state range {range:?}"
        ));
        debug_assert!(false, "{err}");
        log::warn!("manager: {err}, rebuilding range {new_range:?} from scratch");
        self.cache.cache(state.into_sorted_entries().into_iter().map(|(_, c)| c));
        engine::intersection_transition(State::invalid(), new_range, items, &mut self.cache, &mut self.factory, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::test_support::RecordingCell;
    use crate::error::Infallible;
    use crate::state_map::StateMap;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct SeqFactory {
        next_id: AtomicU64,
        built: Rc<RefCell<usize>>,
    }

    impl SeqFactory {
        fn new() -> Self {
            SeqFactory {
                next_id: AtomicU64::new(1),
                built: Rc::new(RefCell::new(0)),
            }
        }
    }

    impl CellFactory<i64, RecordingCell> for SeqFactory {
        type Err = Infallible;
        fn build(&mut self, item: &i64) -> std::result::Result<RecordingCell, Infallible> {
            *self.built.borrow_mut() += 1;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let log = Rc::new(RefCell::new(Vec::new()));
            Ok(RecordingCell::new(id, 0, *item, log))
        }
    }

    fn mgr() -> LinearManager<i64, i64, RecordingCell, SeqFactory> {
        let mut config = Configuration::new();
        config.set_cell_size(32.0).unwrap();
        LinearManager::new(config, SeqFactory::new())
    }

    #[test]
    fn uninitialized_until_first_notification() {
        let m = mgr();
        assert_eq!(m.phase(), ManagerPhase::Uninitialized);
        assert!(m.observe_state().is_invalid());
    }

    #[test]
    fn scenario_a_initial_geometry_and_items_yields_fourteen_cells() {
        let mut m = mgr();
        let items: Vec<i64> = (0..100).collect();
        m.notify_items_replaced(&items).unwrap();
        let signal = m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        assert_eq!(signal, LayoutSignal::CellsRebuilt);
        assert_eq!(m.phase(), ManagerPhase::Ready);
        assert_eq!(m.observe_state().range(), IntegerRange::new(0, 13));
        assert_eq!(m.observe_state().cells().len(), 14);
    }

    #[test]
    fn scenario_b_scroll_repositions_without_rebuilding_everything() {
        let mut m = mgr();
        let items: Vec<i64> = (0..100).collect();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        let signal = m.scroll_to_pixel(160.0, &items).unwrap();
        assert_eq!(m.observe_state().range(), IntegerRange::new(3, 16));
        // All 14 cell identities survive: 11 carried over in the overlap,
        // 3 reused in place from the displaced remainder. cells_changed is
        // the identity-set delta (spec §3, §4.4.2 step 7), not "did the
        // range shift", so this is a reposition, not a rebuild.
        assert_eq!(signal, LayoutSignal::Repositioned);
    }

    #[test]
    fn empty_items_yields_empty_state() {
        let mut m = mgr();
        let items: Vec<i64> = Vec::new();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        assert_eq!(m.phase(), ManagerPhase::Empty);
        assert!(m.observe_state().is_empty());
        assert_eq!(m.observe_state().range(), IntegerRange::INVALID);
    }

    #[test]
    fn factory_swap_produces_all_new_cells_with_empty_cache() {
        let mut m = mgr();
        let items: Vec<i64> = (0..20).collect();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        let new_factory = SeqFactory::new();
        let built = new_factory.built.clone();
        m.notify_factory_changed(new_factory, &items).unwrap();

        assert_eq!(*built.borrow(), m.observe_state().cells().len());
    }

    #[test]
    fn update_force_refreshes_only_live_cells_at_given_indices() {
        let mut m = mgr();
        let items: Vec<i64> = (0..50).collect();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        // index 5 is live, index 999 is not (out of range): the latter must
        // be silently ignored rather than panicking.
        m.update(&[5, 999]);
        assert_eq!(m.observe_state().cells().get(5).unwrap().index, 5);
    }

    #[test]
    #[should_panic(expected = "state inconsistency")]
    fn recover_if_inconsistent_panics_in_debug_on_dangling_index() {
        let mut m = mgr();
        let items: Vec<i64> = (0..10).collect();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cells = StateMap::new();
        cells.put(999, 999, RecordingCell::new(1, 999, 999, log));
        let bogus = State::new_linear(IntegerRange::new(0, 5), cells, false);

        let _ = m.recover_if_inconsistent(bogus, IntegerRange::new(0, 5), &items);
    }

    #[test]
    fn reentrant_notification_coalesces_into_a_follow_up() {
        // Simulates a host that, inside the callback driven by one
        // notification, immediately issues another: the second must not be
        // lost, and must run only once the first completes.
        let mut m = mgr();
        let items: Vec<i64> = (0..50).collect();
        m.notify_items_replaced(&items).unwrap();
        m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

        m.transitioning = true;
        let signal = m
            .run_transition(ChangeKind::Position, &items)
            .unwrap();
        assert_eq!(signal, LayoutSignal::Unchanged);
        assert!(m.pending.is_some());
        m.transitioning = false;

        // Draining it explicitly, as the real run_transition would at the
        // end of the in-progress call.
        let pending = m.pending.take().unwrap();
        m.run_transition(pending, &items).unwrap();
        assert!(m.pending.is_none());
    }
}
