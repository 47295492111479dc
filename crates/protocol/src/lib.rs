//! Cellgrid Shell Protocol
//!
//! The closed set of intents a presentation shell sends to the grid core, and the
//! outcome the core returns for each. The wire format is JSONL: one intent per line
//! in, one outcome per line out.
//!
//! # Usage
//!
//! ```ignore
//! use cellgrid_protocol::{Intent, Outcome};
//!
//! let intent: Intent = serde_json::from_str(r#"{"intent":"select","top":0,"left":0,"bottom":1,"right":1}"#)?;
//! let line = serde_json::to_string(&outcome)?;
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// Shell → Core
// =============================================================================

/// A user intent forwarded by the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    /// Select the rectangle dragged from (top, left) to (bottom, right).
    /// (top, left) becomes the anchor cell even if the drag went up or left.
    Select {
        top: usize,
        left: usize,
        bottom: usize,
        right: usize,
    },
    SelectCell {
        row: usize,
        col: usize,
    },
    ClearSelection,
    Copy,
    Cut,
    /// Paste at (row, col), or at the anchor cell when omitted.
    Paste {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        col: Option<usize>,
    },
    Delete,
    Undo,
    Set {
        row: usize,
        col: usize,
        value: String,
    },
    Import {
        path: PathBuf,
    },
    Export {
        path: PathBuf,
    },
    /// Every populated cell, for an initial full render.
    Snapshot,
    /// Sum, average, variance and standard deviation of the numeric selected cells.
    Stats,
}

impl Intent {
    /// Wire name of the intent.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Select { .. } => "select",
            Intent::SelectCell { .. } => "select_cell",
            Intent::ClearSelection => "clear_selection",
            Intent::Copy => "copy",
            Intent::Cut => "cut",
            Intent::Paste { .. } => "paste",
            Intent::Delete => "delete",
            Intent::Undo => "undo",
            Intent::Set { .. } => "set",
            Intent::Import { .. } => "import",
            Intent::Export { .. } => "export",
            Intent::Snapshot => "snapshot",
            Intent::Stats => "stats",
        }
    }
}

// =============================================================================
// Core → Shell
// =============================================================================

/// A cell's text after the intent ran ("" = empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: String,
}

/// Summary of the numeric cells in the selection.
/// Variance and standard deviation are population figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub count: usize,
    pub sum: f64,
    pub average: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// What the shell needs to re-render after one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub intent: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<CellUpdate>,
    /// Cells cleared by delete/cut
    #[serde(default)]
    pub cleared: usize,
    /// Cells restored by undo (0 = nothing to restore)
    #[serde(default)]
    pub restored: usize,
    /// (rows, cols) held by the clipboard after the intent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<(usize, usize)>,
    /// Declared (rows, cols) of the grid after the intent
    pub extent: (usize, usize),
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SelectionStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl Outcome {
    pub fn ok(intent: &Intent, extent: (usize, usize)) -> Self {
        Self {
            intent: intent.name().to_string(),
            ok: true,
            updates: Vec::new(),
            cleared: 0,
            restored: 0,
            clipboard: None,
            extent,
            stats: None,
            message: None,
            error: None,
        }
    }

    pub fn failed(intent: &Intent, extent: (usize, usize), error: ErrorInfo) -> Self {
        Self {
            ok: false,
            message: Some(error.message.clone()),
            error: Some(error),
            ..Self::ok(intent, extent)
        }
    }
}

/// A failure surfaced to the user. The grid is unchanged when this is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// "out_of_bounds", "malformed_input" or "io_failure"
    pub kind: String,
    pub message: String,
}
