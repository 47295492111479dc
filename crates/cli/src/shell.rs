//! Intent dispatch: the thin layer between a presentation shell and the core.
//!
//! The shell owns no data. It forwards each [`Intent`] here and renders the
//! [`Outcome`]. User-facing failures (bad file, malformed text, out-of-range write)
//! come back as a failed outcome, never as a panic, and leave the grid unchanged.

use cellgrid_config::{CapacitySetting, DelimiterSetting, Settings};
use cellgrid_engine::{CapacityPolicy, CellChange, Document, GridError, History, RangeStats, SparseGrid};
use cellgrid_io::{CsvOptions, Delimiter};
use cellgrid_protocol::{CellUpdate, ErrorInfo, Intent, Outcome, SelectionStats};

pub struct Shell {
    doc: Document,
    csv: CsvOptions,
}

impl Shell {
    pub fn new(doc: Document, csv: CsvOptions) -> Self {
        Self { doc, csv }
    }

    /// An empty grid sized and configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let policy = capacity_policy(settings.capacity_policy);
        let grid = SparseGrid::with_policy(settings.rows, settings.cols, policy);
        let history = History::with_limit(settings.history_max_entries);
        Self::new(Document::with_history(grid, history), csv_options(settings))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn csv_options(&self) -> &CsvOptions {
        &self.csv
    }

    /// Run one intent against the document.
    pub fn dispatch(&mut self, intent: &Intent) -> Outcome {
        log::debug!("intent: {}", intent.name());
        match self.apply(intent) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("{} failed: {e}", intent.name());
                let error = ErrorInfo { kind: e.kind().to_string(), message: e.to_string() };
                Outcome::failed(intent, self.extent(), error)
            }
        }
    }

    fn apply(&mut self, intent: &Intent) -> Result<Outcome, GridError> {
        let mut outcome = Outcome::ok(intent, self.extent());

        match intent {
            Intent::Select { top, left, bottom, right } => {
                self.doc.select_drag(*top, *left, *bottom, *right);
                outcome.message = Some(self.selection_message());
            }
            Intent::SelectCell { row, col } => {
                self.doc.select_cell(*row, *col);
                outcome.message = Some(self.selection_message());
            }
            Intent::ClearSelection => {
                self.doc.clear_selection();
            }
            Intent::Copy => match self.doc.copy() {
                Some(dims) => outcome.clipboard = Some(dims),
                None => outcome.message = Some("no selection".to_string()),
            },
            Intent::Cut => {
                if self.doc.selection().is_empty() {
                    outcome.message = Some("no selection".to_string());
                } else {
                    let changes = self.doc.cut();
                    outcome.cleared = changes.len();
                    outcome.updates = to_updates(changes);
                    outcome.clipboard = Some(self.doc.clipboard().dims());
                }
            }
            Intent::Paste { row, col } => {
                if self.doc.clipboard().is_empty() {
                    outcome.message = Some("clipboard is empty".to_string());
                } else {
                    let changes = match (row, col) {
                        (Some(row), Some(col)) => self.doc.paste_at(*row, *col)?,
                        _ => self.doc.paste()?,
                    };
                    outcome.updates = to_updates(changes);
                }
            }
            Intent::Delete => {
                if self.doc.selection().is_empty() {
                    outcome.message = Some("no selection".to_string());
                } else {
                    let changes = self.doc.delete();
                    outcome.cleared = changes.len();
                    outcome.updates = to_updates(changes);
                }
            }
            Intent::Undo => {
                let changes = self.doc.undo()?;
                outcome.restored = changes.len();
                if changes.is_empty() {
                    outcome.message = Some("nothing to restore".to_string());
                }
                outcome.updates = to_updates(changes);
            }
            Intent::Set { row, col, value } => {
                let change = self.doc.set_cell(*row, *col, value)?;
                outcome.updates = to_updates(vec![change]);
            }
            Intent::Import { path } => {
                let grid = cellgrid_io::import(path, &self.csv)?;
                let message = format!(
                    "imported {} row(s) x {} column(s)",
                    grid.rows(),
                    grid.cols()
                );
                self.doc.replace_grid(grid);
                outcome.updates = to_updates(self.doc.snapshot());
                outcome.message = Some(message);
            }
            Intent::Export { path } => {
                cellgrid_io::export(self.doc.grid(), path, &self.csv)?;
                outcome.message = Some(format!("exported to {}", path.display()));
            }
            Intent::Snapshot => {
                outcome.updates = to_updates(self.doc.snapshot());
            }
            Intent::Stats => {
                if self.doc.selection().is_empty() {
                    outcome.message = Some("no selection".to_string());
                } else {
                    match self.doc.selection_stats() {
                        Some(stats) => {
                            outcome.message = Some(format!(
                                "sum {:.2}, average {:.2}, std dev {:.2}, variance {:.2}",
                                stats.sum, stats.mean, stats.std_dev, stats.variance
                            ));
                            outcome.stats = Some(to_selection_stats(stats));
                        }
                        None => outcome.message = Some("no valid numbers selected".to_string()),
                    }
                }
            }
        }

        outcome.extent = self.extent();
        if outcome.clipboard.is_none() && !self.doc.clipboard().is_empty() {
            outcome.clipboard = Some(self.doc.clipboard().dims());
        }
        Ok(outcome)
    }

    fn selection_message(&self) -> String {
        match self.doc.selection().cell_count() {
            0 => "selection is outside the grid".to_string(),
            n => format!("{n} cell(s) selected"),
        }
    }

    fn extent(&self) -> (usize, usize) {
        (self.doc.grid().rows(), self.doc.grid().cols())
    }
}

fn to_selection_stats(stats: RangeStats) -> SelectionStats {
    SelectionStats {
        count: stats.count,
        sum: stats.sum,
        average: stats.mean,
        variance: stats.variance,
        std_dev: stats.std_dev,
        min: stats.min,
        max: stats.max,
    }
}

fn to_updates(changes: Vec<CellChange>) -> Vec<CellUpdate> {
    changes
        .into_iter()
        .map(|c| CellUpdate { row: c.row, col: c.col, value: c.value })
        .collect()
}

pub fn capacity_policy(setting: CapacitySetting) -> CapacityPolicy {
    match setting {
        CapacitySetting::Strict => CapacityPolicy::Strict,
        CapacitySetting::Grow => CapacityPolicy::Grow,
    }
}

pub fn delimiter(setting: DelimiterSetting) -> Delimiter {
    match setting {
        DelimiterSetting::Auto => Delimiter::Auto,
        DelimiterSetting::Comma => Delimiter::Comma,
        DelimiterSetting::Tab => Delimiter::Tab,
        DelimiterSetting::Semicolon => Delimiter::Semicolon,
        DelimiterSetting::Pipe => Delimiter::Pipe,
    }
}

pub fn csv_options(settings: &Settings) -> CsvOptions {
    CsvOptions {
        delimiter: delimiter(settings.delimiter),
        legacy_encoding: settings.legacy_encoding,
        policy: capacity_policy(settings.capacity_policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            rows: 5,
            cols: 7,
            capacity_policy: CapacitySetting::Grow,
            delimiter: DelimiterSetting::Semicolon,
            ..Settings::default()
        };
        let shell = Shell::from_settings(&settings);
        assert_eq!(shell.document().grid().rows(), 5);
        assert_eq!(shell.document().grid().cols(), 7);
        assert_eq!(shell.document().grid().policy(), CapacityPolicy::Grow);
        assert_eq!(shell.csv_options().delimiter, Delimiter::Semicolon);
        assert_eq!(shell.csv_options().policy, CapacityPolicy::Grow);
    }

    #[test]
    fn test_failed_intent_reports_kind() {
        let mut shell = Shell::from_settings(&Settings { rows: 2, cols: 2, ..Settings::default() });
        let outcome = shell.dispatch(&Intent::Set { row: 5, col: 0, value: "x".into() });
        assert!(!outcome.ok);
        assert_eq!(outcome.error.unwrap().kind, "out_of_bounds");
        assert_eq!(outcome.extent, (2, 2));
    }
}
