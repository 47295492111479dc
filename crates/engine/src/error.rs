use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside the declared extent of a strict grid.
    OutOfBounds { row: usize, col: usize, rows: usize, cols: usize },
    /// Delimited text could not be parsed (unterminated quote, bad encoding, ...).
    MalformedInput(String),
    /// File open/read/write failure at the import/export boundary.
    Io(String),
}

impl GridError {
    /// Stable identifier used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::MalformedInput(_) => "malformed_input",
            Self::Io(_) => "io_failure",
        }
    }
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { row, col, rows, cols } => {
                write!(f, "cell ({row}, {col}) is outside the {rows}x{cols} grid")
            }
            Self::MalformedInput(msg) => write!(f, "malformed input: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for GridError {}

impl From<std::io::Error> for GridError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
