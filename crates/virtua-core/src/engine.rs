//! The state-transition engine (spec §4.4): maps an old [`State`] plus a new
//! range to a new `State`, reusing as many old cells as possible before
//! consulting the cache, and the cache before invoking the factory.

use std::collections::VecDeque;
use std::hash::Hash;

use crate::cache::CellCache;
use crate::cell::Cell;
use crate::change::ItemsMutation;
use crate::error::{Result, VirtError};
use crate::index::{Index, IntegerRange};
use crate::items::ItemSource;
use crate::state::State;
use crate::state_map::StateMap;

/// A cell factory: builds a cell to display `item`, or fails.
///
/// Spec §4.4.6: "Failures during factory invocation propagate upward; the
/// transition is aborted and the old state remains current." The engine
/// functions below uphold this by never mutating their `old: State` input
/// before every fallible factory call has already succeeded for that cell.
pub trait CellFactory<Item, C> {
    type Err: std::error::Error + 'static;
    fn build(&mut self, item: &Item) -> std::result::Result<C, Self::Err>;
}

impl<Item, C, E, F> CellFactory<Item, C> for F
where
    F: FnMut(&Item) -> std::result::Result<C, E>,
    E: std::error::Error + 'static,
{
    type Err = E;
    fn build(&mut self, item: &Item) -> std::result::Result<C, E> {
        (self)(item)
    }
}

/// The canonical intersection algorithm (spec §4.4.2), the transition used
/// for `Geometry`, `Position`, `ItemsReplaced`, and the `Other` fallback.
///
/// `update_kept_items`: when `true`, every surviving cell (not just newly
/// placed ones) also receives `update_item`, the one difference
/// between `Geometry`/`Position` (`false`) and `ItemsReplaced` (`true`),
/// per the spec §4.4.1 dispatch table.
pub fn intersection_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_range: IntegerRange,
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
    update_kept_items: bool,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    // Step 1: an invalid new range means every old cell is retired.
    if new_range.is_invalid() {
        let entries = old.into_sorted_entries();
        cache.cache(entries.into_iter().map(|(_, c)| c));
        return Ok(State::empty());
    }

    let old_range = old.range();
    let overlap = IntegerRange::intersect(old_range, new_range);

    // Step 3-4: partition the old cells into "kept" (index survives in the
    // overlap) and "remainder" (everything else, in ascending index order,
    // reassigned to the new indices needed before the cache/factory are
    // consulted).
    let entries = old.into_sorted_entries();
    let mut kept: Vec<(Index, C)> = Vec::with_capacity(overlap.len());
    let mut remainder: VecDeque<C> = VecDeque::new();
    for (idx, cell) in entries {
        if overlap.contains(idx) {
            kept.push((idx, cell));
        } else {
            remainder.push_back(cell);
        }
    }
    let mut kept = kept.into_iter().peekable();

    let mut new_map: StateMap<Item, C> = StateMap::new();
    let mut cells_changed = false;

    // Step 5: walk the new range ascending, filling every index either from
    // the kept set (already in place), the remainder (reused in place), the
    // cache, or finally the factory. `cells_changed` tracks the identity-set
    // delta (spec §3, §4.4.2 step 7), not "did any bookkeeping happen": a
    // remainder cell reused in place keeps its identity in the new state, so
    // it must not flip the flag; only a cell drawn from cache/factory (a
    // genuinely new identity) does.
    for j in new_range.iter() {
        if kept.peek().is_some_and(|(idx, _)| *idx == j) {
            let (_, mut cell) = kept.next().unwrap();
            if update_kept_items {
                let item = items.get(j);
                cell.update_item(&item);
            }
            new_map.put(j, items.get(j), cell);
            continue;
        }

        let item = items.get(j);
        if let Some(mut cell) = remainder.pop_front() {
            cell.update_index(j);
            cell.update_item(&item);
            new_map.put(j, item, cell);
        } else {
            cells_changed = true;
            let mut cell = match cache.take() {
                Some(c) => c,
                None => factory
                    .build(&item)
                    .map_err(|e| VirtError::factory_failure(j as usize, e))?,
            };
            cell.update_index(j);
            cell.update_item(&item);
            new_map.put(j, item, cell);
        }
    }

    // Step 6: any cell left over (old range larger than new, or orphaned by
    // the overlap) is retired to the cache.
    if !remainder.is_empty() {
        cells_changed = true;
        cache.cache(remainder);
    }

    Ok(State::new_linear(new_range, new_map, cells_changed))
}

/// `Factory` classification (spec §4.4.1): every old cell is disposed (not
/// cached, since it was built by a factory about to be replaced), the cache
/// is cleared, and the new state is built entirely from scratch.
pub fn full_rebuild_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_range: IntegerRange,
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    for (_, cell) in old.into_sorted_entries() {
        cell.dispose();
    }
    cache.on_factory_change();

    if new_range.is_invalid() {
        return Ok(State::empty());
    }

    let mut new_map: StateMap<Item, C> = StateMap::new();
    for j in new_range.iter() {
        let item = items.get(j);
        let mut cell = factory
            .build(&item)
            .map_err(|e| VirtError::factory_failure(j as usize, e))?;
        cell.update_index(j);
        cell.update_item(&item);
        new_map.put(j, item, cell);
    }
    Ok(State::new_linear(new_range, new_map, true))
}

/// `ItemsMutated::Permuted` (spec §4.4.1): indices are unchanged, items were
/// shuffled. Every cell whose index is in `new_range` receives
/// `update_item`; no cell is built, cached, or moved.
pub fn permuted_transition<Item, N, C, S>(
    mut old: State<Item, C>,
    new_range: IntegerRange,
    items: &S,
) -> State<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
{
    for (idx, cell) in old.cells_mut().iter_mut() {
        if new_range.contains(*idx) {
            let item = items.get(*idx);
            cell.update_item(&item);
        }
    }
    old.with_range(new_range, false)
}

/// `ItemsMutated::Set(indices)` (spec §4.4.1): only cells whose index is
/// both in `new_range` and in the change set receive `update_item`.
pub fn set_transition<Item, N, C, S>(
    mut old: State<Item, C>,
    new_range: IntegerRange,
    changed: &[Index],
    items: &S,
) -> State<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
{
    for (idx, cell) in old.cells_mut().iter_mut() {
        if new_range.contains(*idx) && changed.contains(idx) {
            let item = items.get(*idx);
            cell.update_item(&item);
        }
    }
    old.with_range(new_range, false)
}

/// `ItemsMutated::Added { at, count }` (spec §4.4.1): cells below `at` stay
/// put; cells at or above `at` shift to `index + count`. A shifted cell that
/// now falls outside `new_range` is cached; the freshly opened indices in
/// `[at, at + count - 1] ∩ new_range` are filled by reuse/cache/factory, same
/// priority order as the intersection algorithm.
pub fn added_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_range: IntegerRange,
    at: usize,
    count: usize,
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    let at = at as Index;
    let count = count as Index;

    let mut new_map: StateMap<Item, C> = StateMap::new();
    let mut cells_changed = false;
    let mut overflow: Vec<C> = Vec::new();

    for (idx, mut cell) in old.into_sorted_entries() {
        let new_idx = if idx >= at { idx + count } else { idx };
        if new_idx != idx {
            cells_changed = true;
            cell.update_index(new_idx);
        }
        if new_range.contains(new_idx) {
            new_map.put(new_idx, items.get(new_idx), cell);
        } else {
            overflow.push(cell);
        }
    }
    if !overflow.is_empty() {
        cells_changed = true;
        cache.cache(overflow);
    }

    if new_range.is_invalid() {
        return Ok(State::new_linear(new_range, new_map, cells_changed));
    }

    // Any index in `new_range` not yet placed, whether freshly opened by
    // the insertion or simply newly entering the buffer, is filled from the
    // cache first, the factory as a last resort.
    for j in new_range.iter() {
        if new_map.contains_index(j) {
            continue;
        }
        cells_changed = true;
        let item = items.get(j);
        let mut cell = match cache.take() {
            Some(c) => c,
            None => factory
                .build(&item)
                .map_err(|e| VirtError::factory_failure(j as usize, e))?,
        };
        cell.update_index(j);
        cell.update_item(&item);
        new_map.put(j, item, cell);
    }

    Ok(State::new_linear(new_range, new_map, cells_changed))
}

/// `ItemsMutated::Removed(indices)` (spec §4.4.1): surviving indices shift
/// down by the count of removed indices strictly below them; cells owned by
/// a removed index are cached; shortfall is filled from cache/factory.
pub fn removed_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_range: IntegerRange,
    removed: &[Index],
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    let mut removed_sorted = removed.to_vec();
    removed_sorted.sort_unstable();

    let mut new_map: StateMap<Item, C> = StateMap::new();
    let mut cells_changed = false;
    let mut overflow: Vec<C> = Vec::new();

    for (idx, mut cell) in old.into_sorted_entries() {
        if removed_sorted.binary_search(&idx).is_ok() {
            cells_changed = true;
            overflow.push(cell);
            continue;
        }
        let shift = removed_sorted.iter().filter(|&&r| r < idx).count() as Index;
        let new_idx = idx - shift;
        if new_idx != idx {
            cells_changed = true;
            cell.update_index(new_idx);
        }
        if new_range.contains(new_idx) {
            new_map.put(new_idx, items.get(new_idx), cell);
        } else {
            overflow.push(cell);
        }
    }
    if !overflow.is_empty() {
        cells_changed = true;
        cache.cache(overflow);
    }

    if new_range.is_invalid() {
        return Ok(State::new_linear(new_range, new_map, cells_changed));
    }

    for j in new_range.iter() {
        if new_map.contains_index(j) {
            continue;
        }
        cells_changed = true;
        let item = items.get(j);
        let mut cell = match cache.take() {
            Some(c) => c,
            None => factory
                .build(&item)
                .map_err(|e| VirtError::factory_failure(j as usize, e))?,
        };
        cell.update_index(j);
        cell.update_item(&item);
        new_map.put(j, item, cell);
    }

    Ok(State::new_linear(new_range, new_map, cells_changed))
}

/// The 2-D (grid) variant of the intersection algorithm (spec §4.4.3).
///
/// Grid linear indices are generally *not* contiguous (a partial column
/// range punches a gap into every row), so this cannot reuse the
/// `IntegerRange`-based [`intersection_transition`] directly; it runs the
/// same kept/remainder/cache/factory priority over an explicit sorted set of
/// target linear indices instead. `new_targets` must already be sorted
/// ascending (as returned by [`crate::helper::GridHelper::linear_indices`]).
pub fn grid_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_targets: &[Index],
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
    grid: crate::state::GridLayout,
    update_kept_items: bool,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    use std::collections::HashSet;

    if new_targets.is_empty() {
        let entries = old.into_sorted_entries();
        cache.cache(entries.into_iter().map(|(_, c)| c));
        return Ok(State::empty());
    }

    let target_set: HashSet<Index> = new_targets.iter().copied().collect();
    let entries = old.into_sorted_entries();

    let mut kept: std::collections::HashMap<Index, C> = std::collections::HashMap::new();
    let mut remainder: VecDeque<C> = VecDeque::new();
    for (idx, cell) in entries {
        if target_set.contains(&idx) {
            kept.insert(idx, cell);
        } else {
            remainder.push_back(cell);
        }
    }

    let mut new_map: StateMap<Item, C> = StateMap::new();
    let mut cells_changed = false;
    for &j in new_targets {
        if let Some(mut cell) = kept.remove(&j) {
            if update_kept_items {
                let item = items.get(j);
                cell.update_item(&item);
            }
            new_map.put(j, items.get(j), cell);
            continue;
        }
        let item = items.get(j);
        if let Some(mut cell) = remainder.pop_front() {
            cell.update_index(j);
            cell.update_item(&item);
            new_map.put(j, item, cell);
        } else {
            cells_changed = true;
            let mut cell = match cache.take() {
                Some(c) => c,
                None => factory
                    .build(&item)
                    .map_err(|e| VirtError::factory_failure(j as usize, e))?,
            };
            cell.update_index(j);
            cell.update_item(&item);
            new_map.put(j, item, cell);
        }
    }
    if !remainder.is_empty() {
        cells_changed = true;
        cache.cache(remainder);
    }

    let range = IntegerRange::new(
        *new_targets.first().unwrap(),
        *new_targets.last().unwrap(),
    );
    Ok(State::new_grid(range, new_map, cells_changed, grid))
}

/// Grid counterpart of [`permuted_transition`]: the target linear-index set
/// is unchanged (same rows/columns range), only displayed items shuffled, so
/// every kept cell receives `update_item` in place with no cell built,
/// cached, or moved (spec §4.4.3: "the same algorithm applies to the set of
/// linear indices").
pub fn grid_permuted_transition<Item, N, C, S>(
    mut old: State<Item, C>,
    targets: &[Index],
    items: &S,
) -> State<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
{
    let target_set: std::collections::HashSet<Index> = targets.iter().copied().collect();
    for (idx, cell) in old.cells_mut().iter_mut() {
        if target_set.contains(idx) {
            let item = items.get(*idx);
            cell.update_item(&item);
        }
    }
    old.with_range(old.range(), false)
}

/// Grid counterpart of [`set_transition`]: only cells whose linear index is
/// both a current target and in the change set receive `update_item`.
pub fn grid_set_transition<Item, N, C, S>(
    mut old: State<Item, C>,
    targets: &[Index],
    changed: &[Index],
    items: &S,
) -> State<Item, C>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
{
    let target_set: std::collections::HashSet<Index> = targets.iter().copied().collect();
    for (idx, cell) in old.cells_mut().iter_mut() {
        if target_set.contains(idx) && changed.contains(idx) {
            let item = items.get(*idx);
            cell.update_item(&item);
        }
    }
    old.with_range(old.range(), false)
}

/// Dispatches an [`ItemsMutation`] to its dedicated transition (spec
/// §4.4.1's dispatch table).
pub fn items_mutated_transition<Item, N, C, S, F>(
    old: State<Item, C>,
    new_range: IntegerRange,
    mutation: &ItemsMutation,
    items: &S,
    cache: &mut CellCache<C>,
    factory: &mut F,
) -> Result<State<Item, C>>
where
    Item: Eq + Hash + Clone,
    C: Cell<Item, Node = N>,
    S: ItemSource<Item> + ?Sized,
    F: CellFactory<Item, C>,
{
    match mutation {
        ItemsMutation::Permuted(_) => Ok(permuted_transition(old, new_range, items)),
        ItemsMutation::Set(indices) => Ok(set_transition(old, new_range, indices, items)),
        ItemsMutation::Added { at, count } => {
            added_transition(old, new_range, *at, *count, items, cache, factory)
        }
        ItemsMutation::Removed(indices) => {
            removed_transition(old, new_range, indices, items, cache, factory)
        }
    }
}
