use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use cellgrid_core::Range;

use crate::error::GridError;

/// What happens when a write lands outside the declared extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityPolicy {
    /// Reject with `GridError::OutOfBounds`.
    #[default]
    Strict,
    /// Enlarge the declared extent just enough to fit the write.
    Grow,
}

/// A two-dimensional table that only stores populated cells.
///
/// `rows` and `cols` are declared capacity bounds, independent of how many cells
/// hold text. Memory use follows the populated count, never the declared extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseGrid {
    cells: FxHashMap<(usize, usize), String>,
    rows: usize,
    cols: usize,
    policy: CapacityPolicy,
}

impl SparseGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_policy(rows, cols, CapacityPolicy::Strict)
    }

    pub fn with_policy(rows: usize, cols: usize, policy: CapacityPolicy) -> Self {
        Self {
            cells: FxHashMap::default(),
            rows,
            cols,
            policy,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: CapacityPolicy) {
        self.policy = policy;
    }

    /// Text at (row, col), or "" when unpopulated or outside the extent.
    pub fn get(&self, row: usize, col: usize) -> &str {
        self.cells.get(&(row, col)).map(String::as_str).unwrap_or("")
    }

    /// Write `text` into a cell. Empty text clears the cell instead of storing it.
    pub fn set(&mut self, row: usize, col: usize, text: &str) -> Result<(), GridError> {
        self.ensure_extent(row, col)?;
        if text.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), text.to_string());
        }
        Ok(())
    }

    /// Remove a cell and return what it held ("" if nothing was there).
    pub fn clear(&mut self, row: usize, col: usize) -> String {
        self.cells.remove(&(row, col)).unwrap_or_default()
    }

    /// Change the declared extent. Shrinking evicts cells that fall outside.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if rows < self.rows || cols < self.cols {
            let before = self.cells.len();
            self.cells.retain(|&(r, c), _| r < rows && c < cols);
            let evicted = before - self.cells.len();
            if evicted > 0 {
                log::debug!("resize to {rows}x{cols} evicted {evicted} cell(s)");
            }
        }
        self.rows = rows;
        self.cols = cols;
    }

    /// Make sure (last_row, last_col) is addressable, growing if the policy allows.
    ///
    /// Bulk writers call this once with the bottom-right corner of their target so a
    /// strict grid rejects the whole write before any cell changes.
    pub fn ensure_extent(&mut self, last_row: usize, last_col: usize) -> Result<(), GridError> {
        if last_row < self.rows && last_col < self.cols {
            return Ok(());
        }
        match self.policy {
            CapacityPolicy::Strict => {
                log::warn!(
                    "rejected write at ({last_row}, {last_col}) outside {}x{} grid",
                    self.rows,
                    self.cols
                );
                Err(GridError::OutOfBounds {
                    row: last_row,
                    col: last_col,
                    rows: self.rows,
                    cols: self.cols,
                })
            }
            CapacityPolicy::Grow => {
                let rows = self.rows.max(last_row.saturating_add(1));
                let cols = self.cols.max(last_col.saturating_add(1));
                log::debug!("grid grows from {}x{} to {rows}x{cols}", self.rows, self.cols);
                self.rows = rows;
                self.cols = cols;
                Ok(())
            }
        }
    }

    pub fn is_populated(&self, row: usize, col: usize) -> bool {
        self.cells.contains_key(&(row, col))
    }

    pub fn populated_count(&self) -> usize {
        self.cells.len()
    }

    /// Iterate over all populated cells (unordered)
    pub fn cells_iter(&self) -> impl Iterator<Item = ((usize, usize), &str)> {
        self.cells.iter().map(|(&pos, text)| (pos, text.as_str()))
    }

    /// Coordinates of populated cells inside `range`, in row-major order.
    pub fn cells_in_range(&self, range: &Range) -> Vec<(usize, usize)> {
        let mut found: Vec<(usize, usize)> = if range.cell_count() <= self.cells.len() {
            range.cells().filter(|pos| self.cells.contains_key(pos)).collect()
        } else {
            self.cells
                .keys()
                .filter(|(r, c)| range.contains(*r, *c))
                .copied()
                .collect()
        };
        found.sort_unstable();
        found
    }
}
