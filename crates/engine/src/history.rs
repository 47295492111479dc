//! Undo history for destructive grid edits

use serde::{Deserialize, Serialize};

use cellgrid_core::Range;

use crate::error::GridError;
use crate::grid::SparseGrid;

/// One cell cleared by an edit, with the text it held before.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRestore {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

/// Which operation produced a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKind {
    Delete,
    Cut,
}

impl EditKind {
    pub fn label(&self) -> &'static str {
        match self {
            EditKind::Delete => "Delete",
            EditKind::Cut => "Cut",
        }
    }
}

/// Cells cleared together by one operation, in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoBatch {
    pub kind: EditKind,
    pub cells: Vec<CellRestore>,
}

impl UndoBatch {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Strict LIFO stack of undo batches. There is no redo: a popped batch is gone.
pub struct History {
    batches: Vec<UndoBatch>,
    /// 0 = unbounded
    max_entries: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// Keep at most `max_entries` batches, evicting the oldest. 0 disables the cap.
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            batches: Vec::new(),
            max_entries,
        }
    }

    /// Push a batch. Empty batches are dropped so undo never restores a no-op.
    pub fn push(&mut self, batch: UndoBatch) -> bool {
        if batch.is_empty() {
            return false;
        }
        self.batches.push(batch);

        if self.max_entries > 0 && self.batches.len() > self.max_entries {
            self.batches.remove(0);
        }
        true
    }

    /// Clear every populated cell in `range` and record them as one batch.
    ///
    /// Returns the number of cells cleared; nothing is pushed when that is 0.
    pub fn delete(&mut self, grid: &mut SparseGrid, range: &Range) -> usize {
        self.clear_and_record(grid, range, EditKind::Delete)
    }

    /// Shared by delete and cut: both clear the same way and record the same way.
    pub(crate) fn clear_and_record(&mut self, grid: &mut SparseGrid, range: &Range, kind: EditKind) -> usize {
        let cells: Vec<CellRestore> = grid
            .cells_in_range(range)
            .into_iter()
            .map(|(row, col)| CellRestore { row, col, text: grid.clear(row, col) })
            .filter(|restore| !restore.text.is_empty())
            .collect();

        let count = cells.len();
        if self.push(UndoBatch { kind, cells }) {
            log::debug!("{}: recorded {count} cell(s), history depth {}", kind.label(), self.batches.len());
        }
        count
    }

    /// Pop the newest batch and write every recorded value back.
    ///
    /// Restored values overwrite whatever the cells hold now. Returns `Ok(None)` when
    /// there is nothing to restore. If the batch no longer fits a strict grid (it was
    /// shrunk since), the batch is kept and nothing is written.
    pub fn undo(&mut self, grid: &mut SparseGrid) -> Result<Option<UndoBatch>, GridError> {
        let Some(batch) = self.batches.pop() else {
            log::debug!("undo: nothing to restore");
            return Ok(None);
        };

        let (last_row, last_col) = batch
            .cells
            .iter()
            .fold((0, 0), |(r, c), cell| (r.max(cell.row), c.max(cell.col)));
        if let Err(e) = grid.ensure_extent(last_row, last_col) {
            self.batches.push(batch);
            return Err(e);
        }

        for cell in &batch.cells {
            grid.set(cell.row, cell.col, &cell.text)?;
        }
        log::debug!("undo {}: restored {} cell(s)", batch.kind.label(), batch.len());
        Ok(Some(batch))
    }

    /// The batch the next undo would restore.
    pub fn peek(&self) -> Option<&UndoBatch> {
        self.batches.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.batches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
