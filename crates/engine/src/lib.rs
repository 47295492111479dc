pub mod clipboard;
pub mod document;
pub mod error;
pub mod grid;
pub mod history;
pub mod stats;

pub use clipboard::Clipboard;
pub use document::{CellChange, Document};
pub use error::GridError;
pub use grid::{CapacityPolicy, SparseGrid};
pub use history::{CellRestore, EditKind, History, UndoBatch};
pub use stats::RangeStats;
