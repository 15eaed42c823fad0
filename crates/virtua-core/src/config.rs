//! Recognized configuration options (spec §6 "Configuration").

use crate::buffer::BufferSize;
use crate::error::{Result, VirtError};

/// Orientation for linear containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Table column-width mode (spec §4.1 "Table (variable column widths)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnLayoutMode {
    #[default]
    Fixed,
    Variable,
}

/// The recognized configuration bag (spec §6). Constructed via
/// [`Configuration::new`] or mutated via the typed setters, both of which
/// validate eagerly and return [`VirtError::InvalidConfiguration`] rather
/// than silently clamping (unlike scroll position, which clamps silently
/// per spec §7).
#[derive(Debug, Clone)]
pub struct Configuration {
    orientation: Orientation,
    buffer_size: BufferSize,
    cell_size: f64,
    columns_per_row: usize,
    cells_per_page: usize,
    column_layout_mode: ColumnLayoutMode,
    cache_capacity: usize,
    spacing: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            orientation: Orientation::Vertical,
            buffer_size: BufferSize::Standard,
            cell_size: 32.0,
            columns_per_row: 1,
            cells_per_page: 1,
            column_layout_mode: ColumnLayoutMode::Fixed,
            cache_capacity: 10,
            spacing: 0.0,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn buffer_size(&self) -> BufferSize {
        self.buffer_size
    }

    pub fn set_buffer_size(&mut self, buffer_size: BufferSize) {
        self.buffer_size = buffer_size;
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn set_cell_size(&mut self, cell_size: f64) -> Result<()> {
        if cell_size < 0.0 {
            return Err(VirtError::invalid_configuration(format!(
                "cell_size must be >= 0, got {cell_size}"
            )));
        }
        self.cell_size = cell_size;
        Ok(())
    }

    pub fn columns_per_row(&self) -> usize {
        self.columns_per_row
    }

    pub fn set_columns_per_row(&mut self, columns_per_row: usize) -> Result<()> {
        if columns_per_row == 0 {
            return Err(VirtError::invalid_configuration(
                "columns_per_row must be > 0",
            ));
        }
        self.columns_per_row = columns_per_row;
        Ok(())
    }

    pub fn cells_per_page(&self) -> usize {
        self.cells_per_page
    }

    pub fn set_cells_per_page(&mut self, cells_per_page: usize) -> Result<()> {
        if cells_per_page == 0 {
            return Err(VirtError::invalid_configuration(
                "cells_per_page must be > 0",
            ));
        }
        self.cells_per_page = cells_per_page;
        Ok(())
    }

    pub fn column_layout_mode(&self) -> ColumnLayoutMode {
        self.column_layout_mode
    }

    pub fn set_column_layout_mode(&mut self, mode: ColumnLayoutMode) {
        self.column_layout_mode = mode;
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn set_cache_capacity(&mut self, cache_capacity: usize) {
        self.cache_capacity = cache_capacity;
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: f64) -> Result<()> {
        if spacing < 0.0 {
            return Err(VirtError::invalid_configuration(format!(
                "spacing must be >= 0, got {spacing}"
            )));
        }
        self.spacing = spacing;
        Ok(())
    }

    /// Per-item stride along the main axis: `cell_size + spacing`.
    pub fn stride(&self) -> f64 {
        self.cell_size + self.spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_cell_size_is_rejected() {
        let mut cfg = Configuration::new();
        let err = cfg.set_cell_size(-1.0).unwrap_err();
        assert!(matches!(err, VirtError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_columns_per_row_is_rejected() {
        let mut cfg = Configuration::new();
        let err = cfg.set_columns_per_row(0).unwrap_err();
        assert!(matches!(err, VirtError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_cells_per_page_is_rejected() {
        let mut cfg = Configuration::new();
        let err = cfg.set_cells_per_page(0).unwrap_err();
        assert!(matches!(err, VirtError::InvalidConfiguration(_)));
    }

    #[test]
    fn negative_spacing_is_rejected() {
        let mut cfg = Configuration::new();
        let err = cfg.set_spacing(-5.0).unwrap_err();
        assert!(matches!(err, VirtError::InvalidConfiguration(_)));
    }

    #[test]
    fn valid_values_are_accepted() {
        let mut cfg = Configuration::new();
        cfg.set_cell_size(32.0).unwrap();
        cfg.set_columns_per_row(4).unwrap();
        cfg.set_cells_per_page(8).unwrap();
        cfg.set_spacing(2.0).unwrap();
        assert_eq!(cfg.stride(), 34.0);
    }
}
