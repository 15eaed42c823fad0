//! Helper for 2-D (grid) containers (spec §4.1 "2-D case (grid)").

use crate::buffer::BufferSize;
use crate::index::{Index, IntegerRange};

use super::linear::LinearHelper;

/// Pure arithmetic for a grid: independent row/column ranges computed with
/// the same [`super::range_formula`], composed into linear indices via a
/// fixed `columns_per_row` (spec: "`columns_per_row` is a parameter, not
/// derived from width").
#[derive(Debug, Clone, Copy)]
pub struct GridHelper {
    rows: LinearHelper,
    columns: LinearHelper,
    columns_per_row: usize,
    item_count: usize,
}

impl GridHelper {
    pub fn new(
        item_count: usize,
        columns_per_row: usize,
        viewport_width: f64,
        viewport_height: f64,
        cell_width: f64,
        cell_height: f64,
        spacing: f64,
        buffer: BufferSize,
    ) -> Self {
        let row_count = row_count_for(item_count, columns_per_row);
        GridHelper {
            rows: LinearHelper::new(row_count, viewport_height, cell_height, spacing, buffer),
            columns: LinearHelper::new(columns_per_row, viewport_width, cell_width, spacing, buffer),
            columns_per_row,
            item_count,
        }
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.rows.set_count(row_count_for(item_count, self.columns_per_row));
    }

    pub fn set_columns_per_row(&mut self, columns_per_row: usize) {
        self.columns_per_row = columns_per_row.max(1);
        self.columns.set_count(self.columns_per_row);
        self.rows.set_count(row_count_for(self.item_count, self.columns_per_row));
    }

    pub fn columns_per_row(&self) -> usize {
        self.columns_per_row
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.columns.set_viewport_extent(width);
        self.rows.set_viewport_extent(height);
    }

    pub fn set_cell_size(&mut self, width: f64, height: f64) {
        self.columns.set_cell_extent(width);
        self.rows.set_cell_extent(height);
    }

    pub fn set_spacing(&mut self, spacing: f64) {
        self.columns.set_spacing(spacing);
        self.rows.set_spacing(spacing);
    }

    pub fn set_buffer(&mut self, buffer: BufferSize) {
        self.columns.set_buffer(buffer);
        self.rows.set_buffer(buffer);
    }

    pub fn rows_range(&self, row_scroll: f64) -> IntegerRange {
        self.rows.range(row_scroll)
    }

    pub fn columns_range(&self, col_scroll: f64) -> IntegerRange {
        self.columns.range(col_scroll)
    }

    pub fn virtual_max_y(&mut self) -> f64 {
        self.rows.virtual_max()
    }

    pub fn virtual_max_x(&mut self) -> f64 {
        self.columns.virtual_max()
    }

    pub fn max_v_scroll(&mut self) -> f64 {
        self.rows.max_scroll()
    }

    pub fn max_h_scroll(&mut self) -> f64 {
        self.columns.max_scroll()
    }

    pub fn row_position(&self, row: Index) -> f64 {
        self.rows.position_of(row)
    }

    pub fn column_position(&self, col: Index) -> f64 {
        self.columns.position_of(col)
    }

    pub fn invalidate_virtual_sizes(&mut self) {
        self.rows.invalidate_virtual_sizes();
        self.columns.invalidate_virtual_sizes();
    }

    /// Linear indices of `{ r * cpr + c | r in rows_range, c in columns_range,
    /// linear < item_count }`, in ascending order. The ragged last row's
    /// trailing columns are excluded (spec §4.4.3: "Cells whose linear index
    /// >= n ... are excluded from S' and cached").
    pub fn linear_indices(&self, rows_range: IntegerRange, columns_range: IntegerRange) -> Vec<Index> {
        if rows_range.is_invalid() || columns_range.is_invalid() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for r in rows_range.iter() {
            for c in columns_range.iter() {
                let linear = r * self.columns_per_row as Index + c;
                if (linear as usize) < self.item_count {
                    out.push(linear);
                }
            }
        }
        out
    }

    pub fn linear_index(&self, row: Index, col: Index) -> Index {
        row * self.columns_per_row as Index + col
    }

    pub fn row_of(&self, linear: Index) -> Index {
        linear / self.columns_per_row as Index
    }

    pub fn column_of(&self, linear: Index) -> Index {
        linear % self.columns_per_row as Index
    }
}

fn row_count_for(item_count: usize, columns_per_row: usize) -> usize {
    if item_count == 0 {
        0
    } else {
        (item_count + columns_per_row - 1) / columns_per_row.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridHelper {
        // 100 items, cpr=10 -> 10 rows. cell 64x64, viewport 192x192, buffer SMALL(1).
        GridHelper::new(100, 10, 192.0, 192.0, 64.0, 64.0, 0.0, BufferSize::Small)
    }

    #[test]
    fn row_count_rounds_up_for_ragged_last_row() {
        assert_eq!(row_count_for(95, 10), 10);
        assert_eq!(row_count_for(100, 10), 10);
        assert_eq!(row_count_for(0, 10), 0);
    }

    #[test]
    fn ragged_last_row_excludes_phantom_linear_indices() {
        let g = GridHelper::new(95, 10, 10_000.0, 10_000.0, 64.0, 64.0, 0.0, BufferSize::Small);
        let rows = IntegerRange::new(9, 9);
        let cols = IntegerRange::new(0, 9);
        let indices = g.linear_indices(rows, cols);
        assert_eq!(indices, vec![90, 91, 92, 93, 94]);
    }

    #[test]
    fn linear_index_round_trips_row_and_column() {
        let g = grid();
        let linear = g.linear_index(3, 7);
        assert_eq!(linear, 37);
        assert_eq!(g.row_of(linear), 3);
        assert_eq!(g.column_of(linear), 7);
    }

    #[test]
    fn scenario_f_row_scroll_shifts_one_row_worth_of_linear_indices() {
        // Grid: 100 items, cpr=10, cell 64x64, viewport 192x192, buffer SMALL.
        // viewport/64 = 3 visible rows/cols, +1 buffer each side -> 5.
        let mut g = grid();
        let old_rows = g.rows_range(0.0);
        let old_cols = g.columns_range(0.0);
        assert_eq!(old_rows, IntegerRange::new(0, 4));
        assert_eq!(old_cols, IntegerRange::new(0, 4));

        // Scroll down by two rows (128px): range shifts by exactly one row,
        // since the buffer absorbs the first row of scroll.
        let new_rows = g.rows_range(128.0);
        let new_cols = g.columns_range(0.0);
        assert_eq!(new_rows, IntegerRange::new(1, 5));

        let old_linear: std::collections::HashSet<Index> =
            g.linear_indices(old_rows, old_cols).into_iter().collect();
        let new_linear: std::collections::HashSet<Index> =
            g.linear_indices(new_rows, new_cols).into_iter().collect();
        let intersection: Vec<_> = old_linear.intersection(&new_linear).collect();
        // Old covered rows 0..=4, new covers rows 1..=5; intersection is rows
        // 1..=4 (4 rows, 20 cells); exactly one row's worth of cells (5) is
        // newly indexed to the new bottom row, and one row's worth (5) falls
        // out of range entirely.
        assert_eq!(intersection.len(), 20);
        let fresh = new_linear.difference(&old_linear).count();
        assert_eq!(fresh, 5);
        let dropped = old_linear.difference(&new_linear).count();
        assert_eq!(dropped, 5);
    }
}
