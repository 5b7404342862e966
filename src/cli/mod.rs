pub mod args;
pub mod commands;

pub use args::{Cli, Commands, Overrides};
pub use commands::{apply_overrides, run};
