//! Summary statistics over the numeric cells of a range.
//!
//! A cell counts when its trimmed text parses as a finite `f64`; everything else
//! (words, empty cells, "inf", "NaN") is skipped. Variance and standard deviation
//! are population figures: squared deviations are divided by the count.

use serde::{Deserialize, Serialize};

use cellgrid_core::Range;

use crate::grid::SparseGrid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeStats {
    /// Numeric cells that contributed
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl RangeStats {
    /// Statistics of `values`, or None when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            sum,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Numeric value of a cell's text, if it has one.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Statistics of the numeric populated cells in `range`. None when no cell is numeric.
pub fn range_stats(grid: &SparseGrid, range: &Range) -> Option<RangeStats> {
    let values: Vec<f64> = grid
        .cells_in_range(range)
        .into_iter()
        .filter_map(|(row, col)| parse_number(grid.get(row, col)))
        .collect();
    log::debug!("stats over {} numeric cell(s)", values.len());
    RangeStats::from_values(&values)
}
