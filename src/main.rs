//! playlist-forge - converts, merges and checks media playlists.
//!
//! Reads M3U, PLS, XSPF, JSPF, CUE, WPL and ASX playlists, normalizes their
//! targets, detects duplicates and unfound files, and either prints a
//! report or writes one playlist in any of those formats.
//!
//! Exit status: 0 clean, 1 completed with notable findings, 2 fatal error.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod formats;
pub mod metadata;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod resolver;
#[cfg(test)]
pub mod test_utils;

use clap::{CommandFactory, FromArgMatches};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    let matches = cli::Cli::command().get_matches();
    let args = match cli::Cli::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    // Logs go to stderr so listings on stdout stay clean
    let level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    match cli::run_command(&args, &matches) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(2)
        }
    }
}
