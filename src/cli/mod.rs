//! CLI module
//!
//! Command-line interface for inspecting cursors.
//!
//! # Commands
//!
//! - `slices` - Print the slices the next sync would read
//! - `state` - Print the normalized checkpoint, migrating legacy state
//! - `validate` - Check the cursor config against the prior state

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
