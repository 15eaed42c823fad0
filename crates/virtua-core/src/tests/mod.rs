//! Cross-cutting scenario and invariant suites.
//!
//! Individual components carry their own `#[cfg(test)]` unit tests next to
//! the code they exercise; this module is for behavior that spans more than
//! one component: the end-to-end scenarios and the quantified invariants
//! that only make sense against a running [`crate::manager::LinearManager`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cell::test_support::RecordingCell;
use crate::config::Configuration;
use crate::engine::CellFactory;
use crate::error::Infallible;
use crate::index::IntegerRange;
use crate::manager::{LayoutSignal, LinearManager, ManagerPhase};

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
        Ok(RecordingCell::new(id, 0, *item, Rc::new(RefCell::new(Vec::new()))))
    }
}

type TestManager = LinearManager<i64, i64, RecordingCell, SeqFactory>;

fn manager_with(cell_size: f64, cache_capacity: usize) -> (TestManager, Rc<RefCell<usize>>) {
    let mut config = Configuration::new();
    config.set_cell_size(cell_size).unwrap();
    config.set_cache_capacity(cache_capacity);
    let factory = SeqFactory::new();
    let built = factory.built.clone();
    (LinearManager::new(config, factory), built)
}

/// Invariant 1 (spec §8): `R = R*` whenever `n > 0` and viewport extent > 0;
/// otherwise `R = INVALID_RANGE`.
#[test]
fn invariant_range_matches_helper_computation() {
    let (mut m, _built) = manager_with(32.0, 10);
    let items: Vec<i64> = (0..100).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();
    assert_eq!(m.observe_state().range(), IntegerRange::new(0, 13));

    // Viewport collapses to zero -> INVALID_RANGE (boundary behavior).
    m.notify_geometry(0.0, 32.0, 0.0, &items).unwrap();
    assert_eq!(m.observe_state().range(), IntegerRange::INVALID);
    assert!(m.observe_state().is_empty());
}

/// Invariant 2 (spec §8): every index in `R` occurs exactly once as a key.
#[test]
fn invariant_every_range_index_has_exactly_one_cell() {
    let (mut m, _built) = manager_with(32.0, 10);
    let items: Vec<i64> = (0..200).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

    let range = m.observe_state().range();
    let cells = m.observe_state().cells();
    assert_eq!(cells.len(), range.len());
    for idx in range.iter() {
        assert!(cells.get(idx).is_some(), "missing cell at index {idx}");
    }
}

/// Invariant 3 (spec §8): every cell's index is in `R` and its item matches
/// `items[index]` after the transition.
#[test]
fn invariant_cell_index_and_item_are_consistent_after_scroll() {
    let (mut m, _built) = manager_with(32.0, 10);
    let items: Vec<i64> = (0..200).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();
    m.scroll_to_pixel(500.0, &items).unwrap();

    let range = m.observe_state().range();
    for (idx, cell) in m.observe_state().cells().values_by_index() {
        assert!(range.contains(*idx));
        assert_eq!(cell.item, *idx as i64);
    }
}

/// Invariant 5 (spec §8): over a bounded sequence of scroll events, factory
/// invocations stay bounded: small scrolls within the buffer margin should
/// need zero additional factory calls once the initial range is built.
#[test]
fn invariant_small_scrolls_do_not_grow_factory_invocations() {
    let (mut m, built) = manager_with(32.0, 64);
    let items: Vec<i64> = (0..500).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

    let built_after_initial = *built.borrow();
    for step in 1..=20 {
        m.scroll_to_pixel(step as f64 * 8.0, &items).unwrap();
    }
    // A scroll of 160px total, well within the 14-cell * 32px window plus
    // buffer, must be coverable entirely by cells already materialized.
    assert_eq!(*built.borrow(), built_after_initial);
}

/// Invariant 6 (spec §8): round trip. Scrolling by `+delta` then `-delta`
/// restores both position and the cell-set (as a set, not necessarily
/// identity).
#[test]
fn invariant_scroll_round_trip_restores_position_and_cell_set() {
    let (mut m, _built) = manager_with(32.0, 64);
    let items: Vec<i64> = (0..200).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

    let start_pos = m.scroll_position();
    let mut start_items: Vec<i64> = m
        .observe_state()
        .cells()
        .values_by_index()
        .map(|(_, c)| c.item)
        .collect();
    start_items.sort_unstable();

    m.scroll_by(240.0, &items).unwrap();
    m.scroll_by(-240.0, &items).unwrap();

    assert_eq!(m.scroll_position(), start_pos);
    let mut end_items: Vec<i64> = m
        .observe_state()
        .cells()
        .values_by_index()
        .map(|(_, c)| c.item)
        .collect();
    end_items.sort_unstable();
    assert_eq!(start_items, end_items);
}

/// Invariant 7 (spec §8): after a factory swap, every cell in the new state
/// was produced by the new factory, and the cache is empty.
#[test]
fn invariant_factory_swap_empties_cache_and_rebuilds_from_new_factory() {
    let (mut m, _built) = manager_with(32.0, 64);
    let items: Vec<i64> = (0..50).collect();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();
    // Scroll to populate the cache with some retired cells.
    m.scroll_to_pixel(1000.0, &items).unwrap();
    m.scroll_to_pixel(0.0, &items).unwrap();

    let new_factory = SeqFactory::new();
    let new_built = new_factory.built.clone();
    m.notify_factory_changed(new_factory, &items).unwrap();

    assert_eq!(*new_built.borrow(), m.observe_state().cells().len());
    assert_eq!(m.cache_len(), 0);
}

/// Boundary (spec §8): `n = 0` yields `EMPTY`.
#[test]
fn boundary_zero_items_yields_empty_state() {
    let (mut m, _built) = manager_with(32.0, 10);
    let items: Vec<i64> = Vec::new();
    m.notify_items_replaced(&items).unwrap();
    m.notify_geometry(320.0, 32.0, 0.0, &items).unwrap();

    assert!(m.observe_state().is_empty());
    assert_eq!(m.virtual_max(), 0.0);
    assert_eq!(m.max_scroll(), 0.0);
    assert_eq!(m.phase(), ManagerPhase::Empty);
}

/// Boundary (spec §8): `cell_size = 0` yields `EMPTY`.
#[test]
fn boundary_zero_cell_size_yields_empty_state() {
    let (mut m, _built) = manager_with(0.0, 10);
    let items: Vec<i64> = (0..10).collect();
    m.notify_items_replaced(&items).unwrap();
    let signal = m.notify_geometry(320.0, 0.0, 0.0, &items).unwrap();

    assert!(m.observe_state().is_empty());
    assert_eq!(signal, LayoutSignal::Repositioned);
}

/// Scenario E (spec §8): switching to paginated semantics and requesting an
/// unsupported pixel scroll leaves the prior state untouched.
#[test]
fn scenario_e_paginated_pixel_scroll_is_unsupported() {
    use crate::helper::PaginatedHelper;

    let mut helper = PaginatedHelper::new(100, 8);
    helper.set_page(3);
    assert_eq!(helper.range(), IntegerRange::new(24, 31));
    assert!(helper.scroll_by(16.0).is_err());
    assert!(helper.scroll_to_pixel(16.0).is_err());
    // The page itself is untouched by the rejected pixel operations.
    assert_eq!(helper.page(), 3);
}
