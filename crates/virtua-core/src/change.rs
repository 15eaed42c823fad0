//! Change classification driving transition dispatch (spec §4.4.1).

use crate::index::Index;

/// Fine-grained description of an items-sequence mutation (spec §6 "Items
/// Sequence").
#[derive(Debug, Clone)]
pub enum ItemsMutation {
    /// Same size, `indices[i]` is the new index of the item that used to be
    /// at index `i`.
    Permuted(Vec<usize>),
    /// `m` items inserted at `k`.
    Added { at: usize, count: usize },
    /// Items removed at the given (ascending) indices.
    Removed(Vec<Index>),
    /// Item-level replacements at specific indices, old/new value not needed
    /// by the engine (it always re-reads the current item sequence).
    Set(Vec<Index>),
}

/// Classification of the change that triggered a transition (spec §4.4.1).
///
/// The manager maps every observed change to exactly one of these before
/// calling the engine; when several inputs change within one event turn the
/// manager coalesces them into the least-specific classification that covers
/// all of them (spec §5 "Ordering guarantees").
#[derive(Debug, Clone)]
pub enum ChangeKind {
    /// Viewport or cell-size geometry changed.
    Geometry,
    /// Scroll position changed.
    Position,
    /// The entire items sequence was replaced.
    ItemsReplaced,
    /// A granular items-sequence mutation.
    ItemsMutated(ItemsMutation),
    /// The cell factory was replaced.
    Factory,
    /// List/grid orientation changed.
    Orientation,
    /// Anything else; treated as the safe `Geometry`-equivalent fallback.
    Other,
}

impl ChangeKind {
    /// The least-specific classification covering both `self` and `other`,
    /// per the manager's coalescing rule (spec §4.4.1, §9).
    pub fn coalesce(self, other: ChangeKind) -> ChangeKind {
        use ChangeKind::*;
        match (&self, &other) {
            (Factory, _) | (_, Factory) => Factory,
            (Orientation, _) | (_, Orientation) => Orientation,
            (ItemsReplaced, _) | (_, ItemsReplaced) => ItemsReplaced,
            (ItemsMutated(_), ItemsMutated(_)) => Other,
            (ItemsMutated(_), _) | (_, ItemsMutated(_)) => Other,
            (Geometry, Geometry) => Geometry,
            (Position, Position) => Position,
            _ => Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_change_dominates_any_coalescing() {
        let c = ChangeKind::Geometry.coalesce(ChangeKind::Factory);
        assert!(matches!(c, ChangeKind::Factory));
    }

    #[test]
    fn two_distinct_items_mutations_coalesce_to_other() {
        let c = ChangeKind::ItemsMutated(ItemsMutation::Added { at: 0, count: 1 })
            .coalesce(ChangeKind::ItemsMutated(ItemsMutation::Removed(vec![2])));
        assert!(matches!(c, ChangeKind::Other));
    }

    #[test]
    fn same_geometry_change_stays_geometry() {
        let c = ChangeKind::Geometry.coalesce(ChangeKind::Geometry);
        assert!(matches!(c, ChangeKind::Geometry));
    }
}
