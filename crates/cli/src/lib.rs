// Headless shell over the grid core, shared by the `cgrid` binary and tests

pub mod shell;

pub use shell::Shell;
