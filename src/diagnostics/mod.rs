//! Run-wide diagnostics collector.
//!
//! Parse problems, skipped inputs and validation warnings are gathered here
//! in the order they happen and printed once when the run is over. Nothing
//! in this module aborts a run: fatal conditions are
//! [`Error`](crate::error::Error)s instead.
//!
//! The collector is passed down by `&mut` to whichever stage needs it, so
//! there is no hidden global buffer.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

/// What kind of finding a diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Structural problem in an input playlist
    Parse,
    /// An input file or entry was left out
    Skipped,
    /// Tag data could not be read for a local target
    Metadata,
    /// Validation finding about the output (unfound, ambiguous, ...)
    Warning,
}

impl DiagnosticKind {
    /// Convert to string representation for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Skipped => "skipped",
            DiagnosticKind::Metadata => "metadata",
            DiagnosticKind::Warning => "warning",
        }
    }
}

/// One recorded finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Warning => write!(f, "WARNING: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Ordered buffer of diagnostics for one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "diagnostics", kind = kind.as_str(), "{}", message);
        self.items.push(Diagnostic { kind, message });
    }

    /// Record a validation warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Warning, message);
    }

    /// Record a skipped input or entry.
    pub fn skip(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Skipped, message);
    }

    /// Record the problems found while parsing `playlist`, under one header line.
    pub fn parse_failure<I, S>(&mut self, playlist: &Path, problems: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(
            DiagnosticKind::Parse,
            format!("Playlist parse error(s): {}", playlist.display()),
        );
        for problem in problems {
            self.push(DiagnosticKind::Parse, problem);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Count the diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    /// Write every diagnostic, one per line.
    pub fn flush_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for item in &self.items {
            writeln!(out, "{item}")?;
        }
        Ok(())
    }
}
