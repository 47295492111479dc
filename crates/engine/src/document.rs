//! The editing core a shell drives: one grid plus its clipboard, undo history and
//! current selection.
//!
//! Every mutating call returns the cells it touched (with their new text) so the
//! shell can re-render without re-reading the whole grid.

use serde::{Deserialize, Serialize};

use cellgrid_core::{Range, Selection};

use crate::clipboard::Clipboard;
use crate::error::GridError;
use crate::grid::SparseGrid;
use crate::history::History;
use crate::stats::{self, RangeStats};

/// A cell's text after an operation touched it ("" = now empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

impl CellChange {
    pub fn new(row: usize, col: usize, value: impl Into<String>) -> Self {
        Self { row, col, value: value.into() }
    }
}

pub struct Document {
    grid: SparseGrid,
    clipboard: Clipboard,
    history: History,
    selection: Selection,
}

impl Document {
    pub fn new(grid: SparseGrid) -> Self {
        Self::with_history(grid, History::new())
    }

    pub fn with_history(grid: SparseGrid, history: History) -> Self {
        Self {
            grid,
            clipboard: Clipboard::new(),
            history,
            selection: Selection::empty(),
        }
    }

    pub fn grid(&self) -> &SparseGrid {
        &self.grid
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    // Selection

    pub fn select(&mut self, range: Range) {
        self.select_drag(range.top_row, range.left_col, range.bottom_row, range.right_col);
    }

    /// Select a rectangle dragged from (r1, c1) to (r2, c2).
    ///
    /// The range is clipped to the grid's declared extent; a rectangle entirely
    /// outside it leaves no active range. (r1, c1) becomes the anchor either way.
    pub fn select_drag(&mut self, r1: usize, c1: usize, r2: usize, c2: usize) {
        let range = Range::new(r1, c1, r2, c2).clamp_to(self.grid.rows(), self.grid.cols());
        if range.is_none() {
            log::debug!("selection from ({r1}, {c1}) to ({r2}, {c2}) is outside the grid");
        }
        self.selection.set(range, (r1, c1));
    }

    pub fn select_cell(&mut self, row: usize, col: usize) {
        self.select_drag(row, col, row, col);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Sum, mean, variance etc. of the numeric cells in the selection.
    ///
    /// None with no selection or when no selected cell holds a number.
    pub fn selection_stats(&self) -> Option<RangeStats> {
        let range = self.selection.range()?;
        stats::range_stats(&self.grid, &range)
    }

    // Clipboard

    /// Copy the selection. Returns the buffered (rows, cols), or None with no selection.
    pub fn copy(&mut self) -> Option<(usize, usize)> {
        let range = self.selection.range()?;
        self.clipboard.copy_from(&self.grid, &range);
        Some(self.clipboard.dims())
    }

    /// Copy the selection, then clear it as one undoable batch.
    pub fn cut(&mut self) -> Vec<CellChange> {
        let Some(range) = self.selection.range() else {
            return Vec::new();
        };
        let count = self.clipboard.cut_from(&mut self.grid, &range, &mut self.history);
        self.newest_batch_cleared(count)
    }

    /// Paste the clipboard at the anchor cell. Not recorded for undo.
    pub fn paste(&mut self) -> Result<Vec<CellChange>, GridError> {
        let (row, col) = self.selection.anchor();
        self.paste_at(row, col)
    }

    pub fn paste_at(&mut self, row: usize, col: usize) -> Result<Vec<CellChange>, GridError> {
        let written = self.clipboard.paste_to(&mut self.grid, row, col)?;
        Ok(self.changes_at(written))
    }

    // Destructive edits

    /// Clear every populated cell in the selection as one undoable batch.
    pub fn delete(&mut self) -> Vec<CellChange> {
        let Some(range) = self.selection.range() else {
            return Vec::new();
        };
        let count = self.history.delete(&mut self.grid, &range);
        self.newest_batch_cleared(count)
    }

    /// Restore the most recent delete/cut. An empty result means nothing to restore.
    pub fn undo(&mut self) -> Result<Vec<CellChange>, GridError> {
        let restored = self.history.undo(&mut self.grid)?;
        Ok(restored
            .map(|batch| {
                batch
                    .cells
                    .into_iter()
                    .map(|cell| CellChange::new(cell.row, cell.col, cell.text))
                    .collect()
            })
            .unwrap_or_default())
    }

    // Direct cell access

    pub fn get_cell(&self, row: usize, col: usize) -> &str {
        self.grid.get(row, col)
    }

    /// Edit one cell in place (typing into the grid). Not recorded for undo.
    pub fn set_cell(&mut self, row: usize, col: usize, value: &str) -> Result<CellChange, GridError> {
        self.grid.set(row, col, value)?;
        Ok(CellChange::new(row, col, value))
    }

    /// Swap in a freshly imported grid.
    ///
    /// History is cleared because its batches address the old grid. The clipboard
    /// and selection survive.
    pub fn replace_grid(&mut self, grid: SparseGrid) -> SparseGrid {
        log::info!(
            "grid replaced: {}x{} with {} populated cell(s)",
            grid.rows(),
            grid.cols(),
            grid.populated_count()
        );
        self.history.clear();
        std::mem::replace(&mut self.grid, grid)
    }

    /// Every populated cell in row-major order, for an initial full render.
    pub fn snapshot(&self) -> Vec<CellChange> {
        let mut cells: Vec<CellChange> = self
            .grid
            .cells_iter()
            .map(|((row, col), text)| CellChange::new(row, col, text))
            .collect();
        cells.sort_unstable_by_key(|c| (c.row, c.col));
        cells
    }

    fn newest_batch_cleared(&self, count: usize) -> Vec<CellChange> {
        if count == 0 {
            return Vec::new();
        }
        self.history
            .peek()
            .map(|batch| {
                batch
                    .cells
                    .iter()
                    .map(|cell| CellChange::new(cell.row, cell.col, ""))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn changes_at(&self, positions: Vec<(usize, usize)>) -> Vec<CellChange> {
        positions
            .into_iter()
            .map(|(row, col)| CellChange::new(row, col, self.grid.get(row, col)))
            .collect()
    }
}
