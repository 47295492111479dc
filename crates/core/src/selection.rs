use serde::{Deserialize, Serialize};

/// A rectangular range of cells, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub top_row: usize,
    pub left_col: usize,
    pub bottom_row: usize,
    pub right_col: usize,
}

impl Range {
    /// Create a new range, automatically normalizing so top <= bottom and left <= right.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self {
            top_row: r1.min(r2),
            left_col: c1.min(c2),
            bottom_row: r1.max(r2),
            right_col: c1.max(c2),
        }
    }

    /// Create a single-cell range.
    pub fn single(row: usize, col: usize) -> Self {
        Self {
            top_row: row,
            left_col: col,
            bottom_row: row,
            right_col: col,
        }
    }

    /// Check if this range contains a cell.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top_row && row <= self.bottom_row &&
        col >= self.left_col && col <= self.right_col
    }

    /// Number of rows spanned (saturates at `usize::MAX`).
    pub fn rows(&self) -> usize {
        (self.bottom_row - self.top_row).saturating_add(1)
    }

    /// Number of columns spanned (saturates at `usize::MAX`).
    pub fn cols(&self) -> usize {
        (self.right_col - self.left_col).saturating_add(1)
    }

    /// Number of cells in this range (saturates at `usize::MAX`).
    pub fn cell_count(&self) -> usize {
        self.rows().saturating_mul(self.cols())
    }

    /// Iterate over all cells in this range (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let top_row = self.top_row;
        let bottom_row = self.bottom_row;
        let left_col = self.left_col;
        let right_col = self.right_col;

        (top_row..=bottom_row).flat_map(move |r| {
            (left_col..=right_col).map(move |c| (r, c))
        })
    }

    /// Invoke `f` for every cell, top-to-bottom and left-to-right within a row.
    ///
    /// Clipboard rows are built in this order and pasted back in the same order,
    /// so callers must not rely on any other traversal.
    pub fn for_each_cell<F: FnMut(usize, usize)>(&self, mut f: F) {
        for row in self.top_row..=self.bottom_row {
            for col in self.left_col..=self.right_col {
                f(row, col);
            }
        }
    }

    /// Clip the range to a grid of `rows` x `cols`. Returns None when nothing remains.
    pub fn clamp_to(&self, rows: usize, cols: usize) -> Option<Range> {
        if rows == 0 || cols == 0 || self.top_row >= rows || self.left_col >= cols {
            return None;
        }
        Some(Range {
            top_row: self.top_row,
            left_col: self.left_col,
            bottom_row: self.bottom_row.min(rows - 1),
            right_col: self.right_col.min(cols - 1),
        })
    }
}

/// The shell's current selection: an optional active range plus the anchor cell.
///
/// The anchor doubles as the current cell, which is where paste lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    range: Option<Range>,
    anchor: (usize, usize),
}

impl Selection {
    /// A selection with no active range. Bulk operations against it are no-ops.
    pub fn empty() -> Self {
        Self {
            range: None,
            anchor: (0, 0),
        }
    }

    /// The active range, if any.
    pub fn range(&self) -> Option<Range> {
        self.range
    }

    /// The anchor cell: where the selection started, and the paste target.
    pub fn anchor(&self) -> (usize, usize) {
        self.anchor
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }

    /// Total number of selected cells.
    pub fn cell_count(&self) -> usize {
        self.range.map_or(0, |r| r.cell_count())
    }

    /// Replace the active range and move the anchor.
    ///
    /// `range` is None when the requested rectangle lies outside the grid; the anchor
    /// still moves so a later paste targets it.
    pub fn set(&mut self, range: Option<Range>, anchor: (usize, usize)) {
        self.range = range;
        self.anchor = anchor;
    }

    /// Drop the active range but keep the anchor.
    pub fn clear(&mut self) {
        self.range = None;
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::empty()
    }
}
