//! Helper for table containers (spec §4.1 "Table (variable column widths)").

use crate::buffer::BufferSize;
use crate::index::{Index, IntegerRange};

use super::linear::LinearHelper;

/// Column range/position arithmetic for a table, in either layout mode.
///
/// `Fixed` columns share one width and are computed the same way grid
/// columns are (division by stride). `Variable` columns have independent
/// widths; the column range is found by walking a cached prefix sum instead
/// of dividing (spec: "The prefix sum is cached and invalidated on any
/// column-width change").
#[derive(Debug, Clone)]
pub enum ColumnAxis {
    Fixed(LinearHelper),
    Variable(VariableColumns),
}

#[derive(Debug, Clone)]
pub struct VariableColumns {
    widths: Vec<f64>,
    spacing: f64,
    viewport_width: f64,
    buffer: BufferSize,
    prefix: Option<Vec<f64>>,
}

impl VariableColumns {
    pub fn new(widths: Vec<f64>, spacing: f64, viewport_width: f64, buffer: BufferSize) -> Self {
        VariableColumns {
            widths,
            spacing,
            viewport_width,
            buffer,
            prefix: None,
        }
    }

    pub fn set_widths(&mut self, widths: Vec<f64>) {
        self.widths = widths;
        self.prefix = None;
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn set_spacing(&mut self, spacing: f64) {
        self.spacing = spacing;
        self.prefix = None;
    }

    pub fn set_buffer(&mut self, buffer: BufferSize) {
        self.buffer = buffer;
    }

    /// `prefix[i]` is the x-position of column `i`'s left edge. Rebuilt
    /// lazily after any width/spacing change.
    fn prefix_sum(&mut self) -> &[f64] {
        if self.prefix.is_none() {
            let mut sums = Vec::with_capacity(self.widths.len());
            let mut pos = 0.0;
            for w in &self.widths {
                sums.push(pos);
                pos += w + self.spacing;
            }
            self.prefix = Some(sums);
        }
        self.prefix.as_deref().unwrap()
    }

    pub fn position_of(&mut self, col: Index) -> f64 {
        if col < 0 {
            return 0.0;
        }
        self.prefix_sum().get(col as usize).copied().unwrap_or(0.0)
    }

    pub fn virtual_max_x(&mut self) -> f64 {
        if self.widths.is_empty() {
            return 0.0;
        }
        let last = self.widths.len() - 1;
        self.position_of(last as Index) + self.widths[last]
    }

    pub fn max_h_scroll(&mut self) -> f64 {
        (self.virtual_max_x() - self.viewport_width).max(0.0)
    }

    /// Column range via a linear walk over the prefix sum rather than
    /// division, since columns are not uniformly sized.
    pub fn range(&mut self, scroll: f64) -> IntegerRange {
        let n = self.widths.len();
        if n == 0 || self.viewport_width <= 0.0 {
            return IntegerRange::INVALID;
        }
        let viewport_end = scroll + self.viewport_width;
        self.prefix_sum();
        let prefix = self.prefix.as_ref().unwrap();
        let widths = &self.widths;

        let mut first = None;
        let mut last = None;
        for i in 0..n {
            let start = prefix[i];
            let end = start + widths[i];
            if end > scroll && start < viewport_end {
                if first.is_none() {
                    first = Some(i);
                }
                last = Some(i);
            }
        }
        let (first, last) = match (first, last) {
            (Some(a), Some(b)) => (a, b),
            _ => return IntegerRange::INVALID,
        };
        let buffer = self.buffer.items();
        IntegerRange::new((first as Index) - buffer, (last as Index) + buffer).clamp(n)
    }

    pub fn invalidate(&mut self) {
        self.prefix = None;
    }
}

/// Full table helper: independent row axis (always uniform row height) and a
/// column axis in either layout mode.
#[derive(Debug, Clone)]
pub struct TableHelper {
    rows: LinearHelper,
    columns: ColumnAxis,
}

impl TableHelper {
    pub fn fixed(
        row_count: usize,
        column_count: usize,
        viewport_width: f64,
        viewport_height: f64,
        column_width: f64,
        row_height: f64,
        spacing: f64,
        buffer: BufferSize,
    ) -> Self {
        TableHelper {
            rows: LinearHelper::new(row_count, viewport_height, row_height, spacing, buffer),
            columns: ColumnAxis::Fixed(LinearHelper::new(
                column_count,
                viewport_width,
                column_width,
                spacing,
                buffer,
            )),
        }
    }

    pub fn variable(
        row_count: usize,
        column_widths: Vec<f64>,
        viewport_width: f64,
        viewport_height: f64,
        row_height: f64,
        spacing: f64,
        buffer: BufferSize,
    ) -> Self {
        TableHelper {
            rows: LinearHelper::new(row_count, viewport_height, row_height, spacing, buffer),
            columns: ColumnAxis::Variable(VariableColumns::new(
                column_widths,
                spacing,
                viewport_width,
                buffer,
            )),
        }
    }

    pub fn set_row_count(&mut self, row_count: usize) {
        self.rows.set_count(row_count);
    }

    pub fn rows_range(&self, scroll: f64) -> IntegerRange {
        self.rows.range(scroll)
    }

    pub fn row_position(&self, row: Index) -> f64 {
        self.rows.position_of(row)
    }

    pub fn columns_range(&mut self, scroll: f64) -> IntegerRange {
        match &mut self.columns {
            ColumnAxis::Fixed(h) => h.range(scroll),
            ColumnAxis::Variable(v) => v.range(scroll),
        }
    }

    pub fn column_position(&mut self, col: Index) -> f64 {
        match &mut self.columns {
            ColumnAxis::Fixed(h) => h.position_of(col),
            ColumnAxis::Variable(v) => v.position_of(col),
        }
    }

    pub fn virtual_max_x(&mut self) -> f64 {
        match &mut self.columns {
            ColumnAxis::Fixed(h) => h.virtual_max(),
            ColumnAxis::Variable(v) => v.virtual_max_x(),
        }
    }

    pub fn virtual_max_y(&mut self) -> f64 {
        self.rows.virtual_max()
    }

    pub fn max_h_scroll(&mut self) -> f64 {
        match &mut self.columns {
            ColumnAxis::Fixed(h) => h.max_scroll(),
            ColumnAxis::Variable(v) => v.max_h_scroll(),
        }
    }

    pub fn max_v_scroll(&mut self) -> f64 {
        self.rows.max_scroll()
    }

    /// Sets new per-column widths. Only meaningful in `Variable` mode; a
    /// no-op (besides storing nothing) in `Fixed` mode, where a column
    /// resize is a uniform `set_cell_extent` instead.
    pub fn set_column_widths(&mut self, widths: Vec<f64>) {
        if let ColumnAxis::Variable(v) = &mut self.columns {
            v.set_widths(widths);
        }
    }

    /// A column resize in variable mode triggers only a layout pass: the
    /// prefix sum is invalidated and positions are recomputed, but the state
    /// (cell set) is unchanged (spec §4.4.4).
    pub fn invalidate_column_layout(&mut self) {
        if let ColumnAxis::Variable(v) = &mut self.columns {
            v.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_mode_behaves_like_linear_columns() {
        let mut h = TableHelper::fixed(50, 5, 320.0, 320.0, 64.0, 32.0, 0.0, BufferSize::Standard);
        assert_eq!(h.columns_range(0.0), IntegerRange::new(0, 4));
    }

    #[test]
    fn variable_mode_uses_prefix_sum_not_division() {
        let widths = vec![50.0, 100.0, 30.0, 80.0, 40.0];
        let mut h = TableHelper::variable(10, widths, 120.0, 320.0, 32.0, 0.0, BufferSize::Small);
        // prefix: [0, 50, 150, 180, 260]; viewport [0,120) intersects
        // columns 0 (0-50) and 1 (50-150); buffer SMALL=1 extends to [−1,2] -> clamp [0,2].
        assert_eq!(h.columns_range(0.0), IntegerRange::new(0, 2));
    }

    #[test]
    fn variable_mode_virtual_max_sums_all_widths() {
        let widths = vec![50.0, 100.0, 30.0];
        let mut h = TableHelper::variable(1, widths, 100.0, 100.0, 32.0, 5.0, BufferSize::Small);
        // 50 + 5 + 100 + 5 + 30 = 190
        assert_eq!(h.virtual_max_x(), 190.0);
    }

    #[test]
    fn column_resize_invalidates_prefix_cache_not_state() {
        let widths = vec![50.0, 100.0];
        let mut h = TableHelper::variable(1, widths, 200.0, 100.0, 32.0, 0.0, BufferSize::Small);
        let before = h.virtual_max_x();
        h.set_column_widths(vec![200.0, 200.0]);
        let after = h.virtual_max_x();
        assert_ne!(before, after);
    }

    #[test]
    fn empty_columns_is_invalid_range() {
        let mut h = TableHelper::variable(1, Vec::new(), 100.0, 100.0, 32.0, 0.0, BufferSize::Small);
        assert_eq!(h.columns_range(0.0), IntegerRange::INVALID);
    }
}
