//! The cell contract (spec §3 "Cell").

use crate::index::Index;

/// An owned node that displays one item at one index.
///
/// Implementors are the "views" the host toolkit renders; this crate never
/// constructs a cell's renderable contents itself (spec §1: "rendering of
/// individual cell contents" is out of scope, supplied by the user's cell
/// factory).
///
/// Invariants (spec §3): at most one live cell per index in any [`crate::state::State`];
/// a cached cell has no owner outside the cache; a disposed cell is never
/// reused.
pub trait Cell<Item> {
    /// The renderable handle exposed by [`Cell::as_node`].
    type Node;

    /// Informs the cell of its new logical index.
    fn update_index(&mut self, index: Index);

    /// Informs the cell of its new displayed item.
    ///
    /// Must be idempotent if `item` equals the cell's current item. This is
    /// the caller's responsibility to avoid paying for redundant updates, but
    /// implementations must still behave correctly if called anyway.
    fn update_item(&mut self, item: &Item);

    /// Called when the cell is moved into the cache. Must detach visuals and
    /// release transient resources; the cell is otherwise unreferenced after
    /// this call returns.
    fn on_cache(&mut self);

    /// Called when the cell is retrieved from the cache for reuse.
    fn on_de_cache(&mut self);

    /// Called when the cell is permanently discarded. A disposed cell is
    /// never reused.
    fn dispose(self);

    /// Forces the cell to refresh its displayed content without changing its
    /// index or item (spec §6 "Rendering Host Interface": `update(indices…)`
    /// broadcasts this directly to each live cell; the core never interprets
    /// it itself, only routes it).
    fn force_refresh(&mut self);

    /// Exposes the underlying renderable handle.
    fn as_node(&self) -> &Self::Node;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lifecycle events a [`RecordingCell`] reports to its shared log, so
    /// tests can assert on call order/count even across moves into the cache
    /// or disposal (which consumes the cell by value).
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum CellEvent {
        Built(u64),
        Cached(u64),
        DeCached(u64),
        Disposed(u64),
        Refreshed(u64),
    }

    /// Minimal [`Cell`] used across this crate's unit tests: records every
    /// lifecycle call it receives into a shared log so tests can assert on
    /// call order/count, including disposal.
    #[derive(Debug, Clone)]
    pub struct RecordingCell {
        pub id: u64,
        pub index: Index,
        pub item: i64,
        log: Rc<RefCell<Vec<CellEvent>>>,
    }

    impl RecordingCell {
        pub fn new(id: u64, index: Index, item: i64, log: Rc<RefCell<Vec<CellEvent>>>) -> Self {
            log.borrow_mut().push(CellEvent::Built(id));
            RecordingCell {
                id,
                index,
                item,
                log,
            }
        }
    }

    impl Cell<i64> for RecordingCell {
        type Node = i64;

        fn update_index(&mut self, index: Index) {
            self.index = index;
        }

        fn update_item(&mut self, item: &i64) {
            self.item = *item;
        }

        fn on_cache(&mut self) {
            self.log.borrow_mut().push(CellEvent::Cached(self.id));
        }

        fn on_de_cache(&mut self) {
            self.log.borrow_mut().push(CellEvent::DeCached(self.id));
        }

        fn dispose(self) {
            self.log.borrow_mut().push(CellEvent::Disposed(self.id));
        }

        fn force_refresh(&mut self) {
            self.log.borrow_mut().push(CellEvent::Refreshed(self.id));
        }

        fn as_node(&self) -> &i64 {
            &self.item
        }
    }
}
