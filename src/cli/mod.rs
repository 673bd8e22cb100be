//! Command-line interface for playlist-forge.
//!
//! The CLI only maps arguments onto [`Options`](crate::config::Options);
//! every behaviour lives in the pipeline.

mod commands;

pub use commands::{Cli, Commands, run_command};
