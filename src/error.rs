//! Application-wide error types.
//!
//! Only fatal conditions live here. Per-file parse problems and validation
//! findings are not errors: they are recorded in
//! [`Diagnostics`](crate::diagnostics::Diagnostics) and the run carries on.
//!
//! # Design
//!
//! - [`Error`]: everything that aborts a run (exit code 2)
//! - `main` wraps these in `anyhow` only at the outermost edge
//!
//! # Example
//!
//! ```ignore
//! use playlist_forge::error::{Error, Result, ResultExt};
//!
//! fn read_playlist(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(format!("reading {}", path.display()))
//! }
//! ```

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Conflicting or missing options
    #[error("Configuration error: {0}")]
    Config(String),

    /// No adapter for the file extension
    #[error("Unsupported file format: {} (supported: {})", .0.display(), crate::formats::FormatKind::names())]
    UnsupportedFormat(PathBuf),

    /// Malformed insert/change/remove argument
    #[error("Parse error: {0}")]
    Edit(String),

    /// Output already exists and clobbering was not requested
    #[error("File exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Serializing the output playlist failed
    #[error("Write fail: {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The final list has no entries
    #[error("Nothing to do!")]
    NothingToDo,

    /// Metadata reading error
    #[error("Metadata error for {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an edit-argument error.
    pub fn edit(argument: impl Into<String>) -> Self {
        Self::Edit(argument.into())
    }

    /// Create a write error for `path`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
