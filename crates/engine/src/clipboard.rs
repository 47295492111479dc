//! Internal clipboard for copied/cut cell blocks.
//!
//! The buffer is a rectangle of text, row-major, one row per grid row spanned by the
//! source range. Every row has the same length (the range's column span).

use cellgrid_core::Range;

use crate::error::GridError;
use crate::grid::SparseGrid;
use crate::history::{EditKind, History};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    rows: Vec<Vec<String>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer with the text of every cell in `range`. Missing cells become "".
    ///
    /// Visits every coordinate, so callers clip `range` to the grid first.
    pub fn copy_from(&mut self, grid: &SparseGrid, range: &Range) {
        let mut rows = Vec::new();
        let mut current = Vec::new();
        range.for_each_cell(|row, col| {
            current.push(grid.get(row, col).to_string());
            if col == range.right_col {
                rows.push(std::mem::take(&mut current));
            }
        });
        log::debug!("copied {}x{} block", range.rows(), range.cols());
        self.rows = rows;
    }

    /// Copy, then clear the range and record the cleared cells as one undo batch.
    ///
    /// Returns the number of cells cleared, exactly as `History::delete` would.
    pub fn cut_from(&mut self, grid: &mut SparseGrid, range: &Range, history: &mut History) -> usize {
        self.copy_from(grid, range);
        history.clear_and_record(grid, range, EditKind::Cut)
    }

    /// Write the buffer with its top-left at (anchor_row, anchor_col).
    ///
    /// Empty buffer values clear the target cell. A strict grid rejects the paste
    /// as a whole when any target cell is out of bounds. Returns the written
    /// coordinates in row-major order; paste is not recorded for undo.
    pub fn paste_to(
        &self,
        grid: &mut SparseGrid,
        anchor_row: usize,
        anchor_col: usize,
    ) -> Result<Vec<(usize, usize)>, GridError> {
        let (height, width) = self.dims();
        if height == 0 || width == 0 {
            return Ok(Vec::new());
        }

        let overflow = || GridError::OutOfBounds {
            row: anchor_row,
            col: anchor_col,
            rows: grid.rows(),
            cols: grid.cols(),
        };
        let last_row = anchor_row.checked_add(height - 1).ok_or_else(overflow)?;
        let last_col = anchor_col.checked_add(width - 1).ok_or_else(overflow)?;
        grid.ensure_extent(last_row, last_col)?;

        let mut written = Vec::with_capacity(height * width);
        for (i, row) in self.rows.iter().enumerate() {
            for (j, text) in row.iter().enumerate() {
                let pos = (anchor_row + i, anchor_col + j);
                grid.set(pos.0, pos.1, text)?;
                written.push(pos);
            }
        }
        log::debug!("pasted {height}x{width} block at ({anchor_row}, {anchor_col})");
        Ok(written)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// (rows, cols) of the buffered block
    pub fn dims(&self) -> (usize, usize) {
        (self.rows.len(), self.rows.first().map_or(0, Vec::len))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

}
