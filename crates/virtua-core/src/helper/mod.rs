//! Per-variant pure arithmetic for ranges, pixel positions, and virtual
//! extents (spec §4.1).

mod grid;
mod linear;
mod paginated;
mod table;

pub use grid::GridHelper;
pub use linear::LinearHelper;
pub use paginated::PaginatedHelper;
pub use table::TableHelper;

use crate::index::{Index, IntegerRange};

/// Computes the inclusive index range whose projection intersects
/// `[scroll, scroll + viewport]`, extended by `buffer` indices on each side
/// and clamped to `[0, count - 1]` (spec §4.1 "Range formula (linear)").
///
/// Returns [`IntegerRange::INVALID`] when `count == 0` or `viewport <= 0.0`.
///
/// Near an edge, a side whose buffer would clamp to `0`/`count-1` donates its
/// unused budget to the opposite side instead of simply dropping it. This
/// is what scenario A/B in spec §8 require: at `scroll = 0` the range is
/// `[0, 13]` (14 cells) rather than `[0, 11]`, because two of the four
/// `STANDARD` buffer slots that would have landed below index `0` are
/// reallocated past the end instead of being lost.
pub(crate) fn range_formula(
    count: usize,
    viewport: f64,
    scroll: f64,
    stride: f64,
    buffer: Index,
) -> IntegerRange {
    if count == 0 || viewport <= 0.0 || stride <= 0.0 {
        return IntegerRange::INVALID;
    }
    let lo: Index = 0;
    let hi: Index = (count - 1) as Index;
    let mut first = (scroll / stride).floor() as Index - buffer;
    let mut last = ((scroll + viewport) / stride).ceil() as Index - 1 + buffer;

    if first < lo {
        let deficit = lo - first;
        first = lo;
        last += deficit;
    }
    if last > hi {
        let deficit = last - hi;
        last = hi;
        first -= deficit;
    }
    IntegerRange::new(first, last).clamp(count)
}

/// `index * stride` (spec §4.1 "position_of").
pub(crate) fn position_of(index: Index, stride: f64) -> f64 {
    index as f64 * stride
}

/// `count * stride - spacing`, i.e. total content extent including inter-item
/// spacing but excluding the trailing gap (spec §3 "Geometry").
pub(crate) fn virtual_max(count: usize, stride: f64, spacing: f64) -> f64 {
    if count == 0 {
        0.0
    } else {
        count as f64 * stride - spacing
    }
}

/// `max(0, virtual_extent - viewport_extent)` (spec §3 "Geometry").
pub(crate) fn max_scroll(virtual_extent: f64, viewport_extent: f64) -> f64 {
    (virtual_extent - viewport_extent).max(0.0)
}
