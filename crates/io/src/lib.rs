// File I/O operations

pub mod csv;

pub use crate::csv::{decode, encode, export, import, CsvOptions, Delimiter};
