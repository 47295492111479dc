// Core types shared by the engine and the shell

pub mod selection;

pub use selection::{Range, Selection};
