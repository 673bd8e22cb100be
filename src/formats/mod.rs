//! Playlist format adapters.
//!
//! Every supported format is a [`FormatKind`]; a [`Playlist`] binds one kind
//! to one file and offers the three operations every format shares:
//!
//! - [`Playlist::parse`]: read entries, recording structural problems
//! - [`Playlist::write_pre_process`]: drop what the format cannot hold
//! - [`Playlist::write`]: serialize the list to the bound path
//!
//! The per-format modules only map fields. The partial-failure policy lives
//! here: a file with problems keeps its entries only in tolerant mode, and
//! a file that cannot be read never keeps any.

pub mod syntax;

mod asx;
mod cue;
mod jspf;
mod m3u;
mod pls;
mod wpl;
mod xspf;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::{Entry, List};

/// Generator string written into formats that carry one.
pub const GENERATOR: &str = concat!("playlist-forge -- ", env!("CARGO_PKG_VERSION"));

/// The supported playlist formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    M3u,
    Pls,
    Xspf,
    Jspf,
    Cue,
    Wpl,
    Asx,
}

impl FormatKind {
    /// All formats, in the order they are listed to users.
    pub const ALL: [FormatKind; 7] = [
        FormatKind::M3u,
        FormatKind::Pls,
        FormatKind::Xspf,
        FormatKind::Jspf,
        FormatKind::Cue,
        FormatKind::Wpl,
        FormatKind::Asx,
    ];

    /// Format for a file extension (without the dot), case-insensitive.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "m3u" | "m3u8" => Some(Self::M3u),
            "pls" => Some(Self::Pls),
            "xspf" => Some(Self::Xspf),
            "jspf" => Some(Self::Jspf),
            "cue" => Some(Self::Cue),
            "wpl" => Some(Self::Wpl),
            "asx" => Some(Self::Asx),
            _ => None,
        }
    }

    /// Format for a path: by extension, falling back to M3U for a FIFO.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .or_else(|| is_fifo(path).then_some(Self::M3u))
    }

    /// Comma-separated extensions of every format.
    pub fn names() -> String {
        Self::ALL.map(|k| k.as_str()).join(", ")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKind::M3u => "m3u",
            FormatKind::Pls => "pls",
            FormatKind::Xspf => "xspf",
            FormatKind::Jspf => "jspf",
            FormatKind::Cue => "cue",
            FormatKind::Wpl => "wpl",
            FormatKind::Asx => "asx",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True if `path` is a named pipe.
#[cfg(unix)]
pub fn is_fifo(path: &Path) -> bool {
    use std::os::unix::fs::FileTypeExt;
    std::fs::metadata(path)
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_fifo(_path: &Path) -> bool {
    false
}

/// Options that affect parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Keep partially parsed entries when a file has problems
    pub tolerant: bool,
}

/// Options that affect writing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Targets only, no metadata
    pub minimal: bool,
}

/// Input handed to a format parser.
pub(crate) struct Source<'a> {
    pub path: &'a Path,
    pub text: &'a str,
    pub tolerant: bool,
}

impl Source<'_> {
    /// Playlist path recorded on entries. A FIFO has no directory of its
    /// own, so its entries resolve from the working directory.
    pub fn entry_playlist(&self) -> PathBuf {
        if is_fifo(self.path) {
            std::env::current_dir()
                .map(|cwd| cwd.join("."))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            self.path.to_path_buf()
        }
    }
}

/// What a format parser found.
#[derive(Debug, Default)]
pub(crate) struct ParseOutcome {
    pub entries: Vec<Entry>,
    pub problems: Vec<String>,
}

impl ParseOutcome {
    /// Record a problem once.
    pub fn problem(&mut self, message: impl Into<String>) {
        let message = message.into();
        if !self.problems.contains(&message) {
            self.problems.push(message);
        }
    }
}

/// A format adapter bound to one playlist file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    kind: FormatKind,
    path: PathBuf,
}

impl Playlist {
    /// Bind the adapter for `path`'s format.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let kind = FormatKind::from_path(&path).ok_or_else(|| Error::UnsupportedFormat(path.clone()))?;
        Ok(Self::with_kind(kind, path))
    }

    pub fn with_kind(kind: FormatKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the bound file. Tracks come back numbered 1..N in file order.
    pub fn parse(&self, options: &ParseOptions, diags: &mut Diagnostics) -> Vec<Entry> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(target: "formats::parse", path = %self.path.display(), error = %e, "Read failed");
                diags.parse_failure(&self.path, [e.to_string()]);
                return Vec::new();
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let source = Source {
            path: &self.path,
            text,
            tolerant: options.tolerant,
        };

        let mut outcome = match self.kind {
            FormatKind::M3u => m3u::parse(&source),
            FormatKind::Pls => pls::parse(&source),
            FormatKind::Xspf => xspf::parse(&source),
            FormatKind::Jspf => jspf::parse(&source),
            FormatKind::Cue => cue::parse(&source),
            FormatKind::Wpl => wpl::parse(&source),
            FormatKind::Asx => asx::parse(&source),
        };

        if !outcome.problems.is_empty() {
            diags.parse_failure(&self.path, outcome.problems.iter().cloned());
            if !options.tolerant {
                outcome.entries.clear();
            }
        }

        crate::model::renumber(&mut outcome.entries);

        tracing::debug!(
            target: "formats::parse",
            path = %self.path.display(),
            format = %self.kind,
            entries = outcome.entries.len(),
            problems = outcome.problems.len(),
            "Parsed playlist"
        );

        outcome.entries
    }

    /// Drop entries this format cannot hold and renumber the rest.
    pub fn write_pre_process(&self, list: &mut List, diags: &mut Diagnostics) {
        let dropped = match self.kind {
            FormatKind::Cue => cue::pre_process(list, diags),
            FormatKind::Asx => asx::pre_process(list, diags),
            _ => 0,
        };
        if dropped > 0 {
            tracing::debug!(target: "formats::write", format = %self.kind, dropped, "Pre-processed list");
            list.renumber();
        }
    }

    /// Serialize `list` to the bound path.
    pub fn write(&self, list: &List, options: &WriteOptions, diags: &mut Diagnostics) -> Result<()> {
        let text = self.render(list, options, diags)?;
        std::fs::write(&self.path, text).map_err(|e| Error::write(&self.path, e))?;
        tracing::info!(
            target: "formats::write",
            path = %self.path.display(),
            format = %self.kind,
            entries = list.len(),
            "Wrote playlist"
        );
        Ok(())
    }

    /// Produce the file content without writing it.
    pub fn render(&self, list: &List, options: &WriteOptions, diags: &mut Diagnostics) -> Result<String> {
        let xml_error = |e: xmltree::Error| Error::write(&self.path, std::io::Error::other(e.to_string()));
        match self.kind {
            FormatKind::M3u => {
                let bare = options.minimal || is_fifo(&self.path);
                Ok(m3u::render(list, bare))
            }
            FormatKind::Pls => Ok(pls::render(list, options)),
            FormatKind::Xspf => xspf::render(list, options).map_err(xml_error),
            FormatKind::Jspf => jspf::render(list, options)
                .map_err(|e| Error::write(&self.path, std::io::Error::other(e.to_string()))),
            FormatKind::Cue => Ok(cue::render(list, options, diags)),
            FormatKind::Wpl => wpl::render(list, options).map_err(xml_error),
            FormatKind::Asx => asx::render(list, options).map_err(xml_error),
        }
    }
}

/// Serialize an XML element tree with two-space indentation, no declaration.
pub(crate) fn emit_xml(root: &xmltree::Element) -> std::result::Result<String, xmltree::Error> {
    let config = xmltree::EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ")
        .write_document_declaration(false);
    let mut buf = Vec::new();
    root.write_with_config(&mut buf, config)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Append `<name>text</name>` to `parent`.
pub(crate) fn push_text_child(parent: &mut xmltree::Element, name: &str, text: &str) {
    let mut child = xmltree::Element::new(name);
    child.children.push(xmltree::XMLNode::Text(text.to_string()));
    parent.children.push(xmltree::XMLNode::Element(child));
}

/// Trimmed text of the first child called `name`, or empty.
pub(crate) fn child_text(parent: &xmltree::Element, name: &str) -> String {
    parent
        .get_child(name)
        .and_then(|c| c.get_text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// Child elements called `name`, in document order.
pub(crate) fn children_named<'a>(
    parent: &'a xmltree::Element,
    name: &'a str,
) -> impl Iterator<Item = &'a xmltree::Element> + 'a {
    parent
        .children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(move |e| e.name == name)
}
