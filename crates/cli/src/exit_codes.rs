//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts branch on them.
//!
//! | Code | Description                                        |
//! |------|----------------------------------------------------|
//! | 0    | Success                                            |
//! | 1    | General error, or one or more intents failed       |
//! | 2    | CLI usage error (bad args, unparseable intent)     |
//! | 3    | IO failure (unreadable input, unwritable output)   |
//! | 4    | Malformed delimited text                           |

use cellgrid_engine::GridError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure, or an intent script with failed intents.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// File could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Input text could not be decoded.
pub const EXIT_PARSE: u8 = 4;

/// Map a core error to its exit code.
pub fn grid_exit_code(err: &GridError) -> u8 {
    match err {
        GridError::Io(_) => EXIT_IO,
        GridError::MalformedInput(_) => EXIT_PARSE,
        GridError::OutOfBounds { .. } => EXIT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_IO, EXIT_PARSE];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn test_grid_error_mapping() {
        assert_eq!(grid_exit_code(&GridError::Io("x".into())), EXIT_IO);
        assert_eq!(grid_exit_code(&GridError::MalformedInput("x".into())), EXIT_PARSE);
    }
}
