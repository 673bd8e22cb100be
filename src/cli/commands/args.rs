//! Argument groups shared between subcommands, and their mapping onto [`Options`].

use clap::{ArgMatches, Args};
use std::path::{Path, PathBuf};

use crate::config::{EntryEdit, FileConfig, Options, PathMode};
use crate::error::Result;
use crate::paths::lexically_normal;

/// Inputs and the switches every subcommand understands
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Input playlists, merged in order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory prepended to relative local targets
    #[arg(short = 'f', long)]
    pub prepend: Option<PathBuf>,

    /// Drop entries that duplicate an earlier one
    #[arg(short = 'd', long)]
    pub drop_duplicates: bool,

    /// Drop entries whose target cannot be found
    #[arg(short = 'u', long)]
    pub drop_unfound: bool,

    /// Probe network targets with a HEAD request
    #[arg(short = 's', long)]
    pub verify_network: bool,

    /// Read tags from local targets
    #[arg(short = 'i', long)]
    pub read_tags: bool,
}

/// Output rewriting, only meaningful when a playlist is written
#[derive(Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// Write local targets as absolute paths
    #[arg(short = 'O', long)]
    pub absolute: bool,

    /// Write local targets as file:// URIs
    #[arg(short = 'I', long)]
    pub file_uri: bool,

    /// Write local targets relative to the out playlist
    #[arg(short = 'R', long)]
    pub relative: bool,

    /// Write local targets relative to DIR
    #[arg(short = 'B', long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Playlist title
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// Playlist image
    #[arg(short = 'g', long)]
    pub image: Option<String>,

    /// Insert `N:target` before track N, or append `target`
    #[arg(short = 'a', long, value_name = "[N:]TARGET")]
    pub insert: Vec<String>,

    /// Change a field: `N:KEY=value` (ta ar ti al co id im in tr du)
    #[arg(short = 'e', long, value_name = "N:KEY=VALUE")]
    pub change: Vec<String>,

    /// Remove a track number or every entry with this target
    #[arg(short = 'r', long, value_name = "N|TARGET")]
    pub remove: Vec<String>,

    /// Shuffle the entries
    #[arg(short = 'n', long)]
    pub shuffle: bool,

    /// Write targets only, no metadata
    #[arg(short = 'm', long)]
    pub minimal: bool,
}

/// Resolve `path` against `cwd` without touching the filesystem.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        lexically_normal(&cwd.join(path))
    }
}

impl PipelineArgs {
    /// Options from the config file with these flags on top.
    pub fn to_options(&self, config: &FileConfig, cwd: &Path) -> Options {
        let mut options = Options::from_config(config);
        options.inputs = self.inputs.iter().map(|p| absolutize(cwd, p)).collect();
        options.prepend = self.prepend.as_deref().map(|p| absolutize(cwd, p));
        options.drop_duplicates |= self.drop_duplicates;
        options.drop_unfound |= self.drop_unfound;
        options.verify_network |= self.verify_network;
        options.read_tags |= self.read_tags;
        options
    }
}

impl EditArgs {
    /// Apply the rewrite switches to `options`.
    ///
    /// `matches` are the subcommand's own matches; they carry the command
    /// line positions that order changes and removals.
    pub fn apply(&self, options: &mut Options, matches: &ArgMatches, cwd: &Path) -> Result<()> {
        options.path_mode = PathMode::from_flags(
            self.absolute,
            self.file_uri,
            self.relative,
            self.base.as_deref().map(|p| absolutize(cwd, p)),
        )?;
        options.title = self.title.clone();
        options.image = self.image.clone();
        options.inserts = self.insert.clone();
        options.edits = edits_in_order(matches);
        options.shuffle = self.shuffle;
        options.minimal |= self.minimal;
        Ok(())
    }
}

/// Changes and removals interleaved in command-line order.
pub fn edits_in_order(matches: &ArgMatches) -> Vec<EntryEdit> {
    let mut edits: Vec<(usize, EntryEdit)> = Vec::new();

    if let (Some(values), Some(indices)) = (
        matches.get_many::<String>("change"),
        matches.indices_of("change"),
    ) {
        edits.extend(indices.zip(values).map(|(i, v)| (i, EntryEdit::Change(v.clone()))));
    }
    if let (Some(values), Some(indices)) = (
        matches.get_many::<String>("remove"),
        matches.indices_of("remove"),
    ) {
        edits.extend(indices.zip(values).map(|(i, v)| (i, EntryEdit::Remove(v.clone()))));
    }

    edits.sort_by_key(|(i, _)| *i);
    edits.into_iter().map(|(_, edit)| edit).collect()
}
