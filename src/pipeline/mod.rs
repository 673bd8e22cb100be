//! Playlist transformation pipeline - turns input playlists into one list
//!
//! One run goes through these stages, in order:
//! 1. Load: open every input, skip missing ones, parse and append
//! 2. Normalize: decode targets, validate, fold playlist-level metadata
//! 3. Mutate (only with an output): overrides, inserts, edits, shuffle
//! 4. Finalize: drop, rewrite paths, revalidate, re-mark duplicates
//! 5. Aggregate: counters plus warnings about the output
//!
//! Configuration conflicts are rejected before anything is read, parse
//! problems only become diagnostics, and a failed write aborts the run.

use std::io::Write;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

use crate::config::{EntryEdit, Options, PathMode};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, Result, ResultExt};
use crate::formats::{ParseOptions, Playlist, WriteOptions, is_fifo};
use crate::metadata::TagReader;
use crate::model::{Entry, List};
use crate::paths::{
    abs_path, file_uri, is_local, is_relative_target, is_uri, lexically_relative, percent_decode,
    weakly_canonical,
};
use crate::report;
use crate::resolver::{NetworkProbe, Validator, mark_duplicates, match_key, same_track};

/// How a completed run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing worth reporting
    Clean,
    /// Completed, but diagnostics or a notable listing were produced
    Notable,
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Clean => 0,
            Outcome::Notable => 1,
        }
    }
}

/// Rewrite one local target (or image) for the output.
///
/// `source_dir` is where the value is currently resolved from. A relative
/// form that cannot be expressed falls back to the absolute path.
pub fn transform_target(mode: &PathMode, source_dir: &Path, target: &str, output_dir: &Path) -> String {
    let relative_to = |base: &Path, absolute: String| {
        lexically_relative(Path::new(&absolute), base)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or(absolute)
    };

    match mode {
        PathMode::Unchanged => target.to_string(),
        PathMode::Absolute => abs_path(source_dir, target),
        PathMode::FileUri => file_uri(&abs_path(source_dir, target)),
        PathMode::RelativeToOutput => relative_to(output_dir, abs_path(source_dir, target)),
        PathMode::RelativeToBase(base) => relative_to(base, abs_path(source_dir, target)),
    }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// One configured run.
pub struct Pipeline<'a> {
    options: &'a Options,
    validator: Validator<'a>,
    tags: Option<&'a dyn TagReader>,
    /// Directory that inserted targets and overrides are resolved from
    cwd: PathBuf,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with local-only validation and no tag reading.
    pub fn new(options: &'a Options) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            options,
            validator: Validator::local_only(),
            tags: None,
            cwd,
        }
    }

    /// Probe network targets with `probe`.
    pub fn with_probe(mut self, probe: &'a dyn NetworkProbe) -> Self {
        self.validator = Validator::with_probe(probe);
        self
    }

    /// Fill entry fields from tags of valid local targets.
    pub fn with_tag_reader(mut self, reader: &'a dyn TagReader) -> Self {
        self.tags = Some(reader);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Execute the whole run, printing views to `out`.
    ///
    /// Diagnostics are left in `diags` for the caller to print.
    pub fn run<W: Write>(&self, out: &mut W, diags: &mut Diagnostics) -> Result<Outcome> {
        let writer = self.options.output.as_ref().map(Playlist::open).transpose()?;
        let writer = writer.filter(|_| self.writes_output());
        let list = self.assemble(writer.as_ref(), diags)?;

        let mut notable = false;
        if let Some(view) = &self.options.listing {
            let listed = report::write_listing(&list, view, &mut *out).with_context("Printing listing")?;
            notable = listed > 0 && view.kind.is_notable();
        } else {
            match writer {
                Some(writer) => {
                    let options = WriteOptions {
                        minimal: self.options.minimal,
                    };
                    writer.write(&list, &options, diags)?;
                }
                None => report::write_summary(&list, &mut *out).with_context("Printing summary")?,
            }
        }

        let outcome = if self.options.quiet || (!notable && diags.is_empty()) {
            Outcome::Clean
        } else {
            Outcome::Notable
        };
        tracing::debug!(target: "pipeline", ?outcome, entries = list.len(), "Run complete");
        Ok(outcome)
    }

    /// True when this run ends in writing the out playlist.
    fn writes_output(&self) -> bool {
        self.options.output.is_some() && !self.options.preview && self.options.listing.is_none()
    }

    /// Run every stage up to and including aggregation.
    pub fn build(&self, diags: &mut Diagnostics) -> Result<List> {
        let writer = match &self.options.output {
            Some(output) if self.writes_output() => Some(Playlist::open(output)?),
            _ => None,
        };
        self.assemble(writer.as_ref(), diags)
    }

    /// Stages for a run writing through `writer`, if any. The writer's
    /// format drops what it cannot hold before counting and warnings.
    fn assemble(&self, writer: Option<&Playlist>, diags: &mut Diagnostics) -> Result<List> {
        let mut list = self.load(diags)?;
        self.normalize(&mut list, diags);
        if list.output.is_some() {
            self.mutate(&mut list)?;
        }
        self.finalize(&mut list);

        if list.is_empty() {
            return Err(Error::NothingToDo);
        }
        if let Some(writer) = writer {
            writer.write_pre_process(&mut list, diags);
            mark_duplicates(&mut list.entries);
        }

        list.aggregate();
        if list.output.is_some() {
            self.warn_about_output(&list, diags);
        }
        Ok(list)
    }

    /// Step 1: parse every input and append its entries.
    pub fn load(&self, diags: &mut Diagnostics) -> Result<List> {
        // Every input must have an adapter before anything is read
        let playlists = self
            .options
            .inputs
            .iter()
            .map(Playlist::open)
            .collect::<Result<Vec<_>>>()?;

        let parse_options = ParseOptions {
            tolerant: self.options.tolerant,
        };
        let mut list = List::new(self.options.output.clone());

        for playlist in playlists {
            let path = playlist.path();
            if !path.exists() && !is_fifo(path) {
                tracing::warn!(target: "pipeline::load", path = %path.display(), "Input not found");
                diags.skip(format!("Skipping unfound file: {}", path.display()));
                continue;
            }
            list.entries.extend(playlist.parse(&parse_options, diags));
        }

        list.renumber();
        tracing::debug!(target: "pipeline::load", inputs = self.options.inputs.len(), entries = list.len(), "Loaded");
        Ok(list)
    }

    /// Step 2: decode and validate targets, fold playlist metadata, mark duplicates.
    pub fn normalize(&self, list: &mut List, diags: &mut Diagnostics) {
        for entry in list.entries.iter_mut() {
            list.title.offer(&entry.playlist_title);
            list.artist.offer(&entry.playlist_artist);
            list.comment.offer(&entry.playlist_comment);

            let image = percent_decode(&entry.playlist_image);
            if !image.is_empty() {
                let replaces = list.image.is_empty()
                    || (!list.valid_image && image != list.image.value());
                list.image.offer(&image);
                if replaces {
                    list.local_image = is_local(&image);
                    list.valid_image = self
                        .validator
                        .is_valid(&abs_path(entry.source_dir(), &image));
                    list.image.replace(image);
                    list.image_source = entry.source_dir().to_path_buf();
                }
            }

            entry.target = percent_decode(&entry.target);
            if let Some(prepend) = &self.options.prepend
                && is_local(&entry.target)
            {
                entry.target = abs_path(prepend, &entry.target);
            }
            entry.local_target = is_local(&entry.target);
            let resolved = abs_path(entry.source_dir(), &entry.target);
            entry.valid_target = self.validator.is_valid(&resolved);

            if entry.has_image() {
                entry.image = percent_decode(&entry.image);
                entry.local_image = is_local(&entry.image);
                entry.valid_image = self
                    .validator
                    .is_valid(&abs_path(entry.source_dir(), &entry.image));
            }

            if let Some(reader) = self.tags
                && entry.local_target
                && entry.valid_target
            {
                match reader.read(Path::new(&resolved)) {
                    Ok(tags) => tags.apply_to(entry),
                    Err(e) => {
                        tracing::debug!(target: "pipeline::tags", error = %e, "Tag read failed");
                        diags.push(
                            DiagnosticKind::Metadata,
                            format!("Could not read target tag: {}", entry.target),
                        );
                    }
                }
            }

            list.relative |= entry.local_target && is_relative_target(&entry.target);
        }

        mark_duplicates(&mut list.entries);
    }

    /// Step 3: overrides, inserts, edits and shuffle.
    pub fn mutate(&self, list: &mut List) -> Result<()> {
        list.renumber();

        if let Some(image) = &self.options.image {
            let image = percent_decode(image);
            list.local_image = is_local(&image);
            list.valid_image = self.validator.is_valid(&abs_path(&self.cwd, &image));
            list.image.set(image);
            list.image_source = self.cwd.clone();
        }
        if let Some(title) = &self.options.title {
            list.title.set(title.as_str());
        }

        for argument in &self.options.inserts {
            self.insert(list, argument);
        }

        for edit in &self.options.edits {
            match edit {
                EntryEdit::Change(argument) => self.change(list, argument)?,
                EntryEdit::Remove(argument) => remove(list, argument, &self.cwd),
            }
        }

        if self.options.shuffle {
            list.entries.shuffle(&mut rand::rng());
            list.renumber();
        }
        Ok(())
    }

    fn insert(&self, list: &mut List, argument: &str) {
        let (position, target) = match argument.split_once(':') {
            Some((n, rest)) if is_digits(n) => (n.parse::<usize>().ok(), rest),
            _ => (None, argument),
        };

        let mut entry = Entry::new(percent_decode(target), self.cwd.join("."));
        entry.local_target = is_local(&entry.target);
        entry.valid_target = self
            .validator
            .is_valid(&abs_path(&self.cwd, &entry.target));
        list.relative |= entry.local_target && is_relative_target(&entry.target);

        match position {
            Some(n) if (1..=list.len()).contains(&n) => list.entries.insert(n - 1, entry),
            _ => list.entries.push(entry),
        }
        list.renumber();
    }

    /// Apply `N:KEY=value` to every entry numbered N.
    fn change(&self, list: &mut List, argument: &str) -> Result<()> {
        let (track, assignment) = argument
            .split_once(':')
            .filter(|(n, _)| is_digits(n))
            .ok_or_else(|| Error::edit(argument))?;
        let track: usize = track.parse().map_err(|_| Error::edit(argument))?;
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| Error::edit(argument))?;

        // An empty number clears the field
        if matches!(key, "tr" | "du") && !value.is_empty() && !is_digits(value) {
            return Err(Error::edit(argument));
        }
        let album_track = match (key, value) {
            ("tr", "") => None,
            ("tr", _) => Some(
                value
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| Error::edit(argument))?,
            ),
            _ => None,
        };
        let duration = match (key, value) {
            ("du", "") => 0,
            ("du", _) => value
                .parse::<u64>()
                .ok()
                .and_then(|secs| secs.checked_mul(1000))
                .ok_or_else(|| Error::edit(argument))?,
            _ => 0,
        };
        if !matches!(key, "ta" | "ar" | "ti" | "al" | "co" | "id" | "im" | "in" | "tr" | "du") {
            return Err(Error::edit(argument));
        }

        for entry in list.entries.iter_mut().filter(|e| e.track == track) {
            match key {
                "ta" => {
                    let target = percent_decode(value);
                    entry.local_target = is_local(&target);
                    entry.target = if entry.local_target && !target.is_empty() {
                        abs_path(&self.cwd, &target)
                    } else {
                        target
                    };
                    entry.valid_target = self.validator.is_valid(&entry.target);
                }
                "im" => {
                    let image = percent_decode(value);
                    entry.local_image = is_local(&image);
                    entry.image = if entry.local_image && !image.is_empty() {
                        abs_path(&self.cwd, &image)
                    } else {
                        image
                    };
                    entry.valid_image = self.validator.is_valid(&entry.image);
                }
                "ar" => entry.artist = value.to_string(),
                "ti" => entry.title = value.to_string(),
                "al" => entry.album = value.to_string(),
                "co" => entry.comment = value.to_string(),
                "id" => entry.identifier = value.to_string(),
                "in" => entry.info = value.to_string(),
                "tr" => entry.album_track = album_track,
                "du" => entry.duration = duration,
                _ => {}
            }
        }
        Ok(())
    }

    /// Step 4: drop, rewrite, revalidate and re-mark.
    pub fn finalize(&self, list: &mut List) {
        let options = self.options;

        let mut kept: Vec<Entry> = Vec::with_capacity(list.len());
        let mut kept_keys: Vec<PathBuf> = Vec::with_capacity(list.len());
        for entry in std::mem::take(&mut list.entries) {
            if entry.target.is_empty() {
                continue;
            }
            if options.drop_unfound && !entry.valid_target {
                tracing::debug!(target: "pipeline::finalize", target = %entry.target, "Dropping unfound");
                continue;
            }
            let key = match_key(&entry);
            if options.drop_duplicates
                && kept
                    .iter()
                    .zip(&kept_keys)
                    .any(|(earlier, earlier_key)| same_track(&entry, &key, earlier, earlier_key))
            {
                tracing::debug!(target: "pipeline::finalize", target = %entry.target, "Dropping duplicate");
                continue;
            }
            kept.push(entry);
            kept_keys.push(key);
        }
        list.entries = kept;
        list.renumber();

        // Without an output nothing moves, so validity from normalize stands
        let output = list.output.clone();
        let output_dir = list.output_dir().to_path_buf();
        let mode = &options.path_mode;
        let revalidate = |value: &str| self.validator.is_valid(&abs_path(&output_dir, &percent_decode(value)));

        for entry in list.entries.iter_mut() {
            if entry.local_target {
                entry.target = transform_target(mode, entry.source_dir(), &entry.target, &output_dir);
                if output.is_some() {
                    entry.valid_target = revalidate(&entry.target);
                }
            }
            if entry.has_image() && entry.local_image {
                entry.image = transform_target(mode, entry.source_dir(), &entry.image, &output_dir);
                if output.is_some() {
                    entry.valid_image = revalidate(&entry.image);
                }
            }
            if options.drop_unfound && entry.has_image() && !entry.valid_image {
                entry.image.clear();
            }
            if let Some(output) = &output {
                entry.playlist = output.clone();
            }
        }

        if !list.image.is_empty() && list.local_image {
            let image = transform_target(mode, &list.image_source, list.image.value(), &output_dir);
            if output.is_some() {
                list.valid_image = revalidate(&image);
                list.image_source = output_dir.clone();
            }
            list.image.replace(image);
        }
        if options.drop_unfound && !list.image.is_empty() && !list.valid_image {
            list.image.clear();
        }

        if *mode != PathMode::Unchanged {
            list.relative = mode.is_relative();
        }

        mark_duplicates(&mut list.entries);
    }

    /// Step 5 warnings, only meaningful when an output is written.
    fn warn_about_output(&self, list: &List, diags: &mut Diagnostics) {
        let stats = &list.stats;
        if stats.unfound_targets > 0 {
            diags.warn(format!("out playlist has {} unfound entry target(s)", stats.unfound_targets));
        }
        if stats.unfound_images > 0 {
            diags.warn(format!("out playlist has {} unfound entry image target(s)", stats.unfound_images));
        }
        if !list.image.is_empty() && !list.valid_image {
            diags.warn("out playlist image not found");
        }

        let ambiguous = [
            (list.image.distinct(), "images"),
            (list.title.distinct(), "titles"),
            (list.artist.distinct(), "artists"),
        ];
        for (distinct, what) in ambiguous {
            if distinct > 1 {
                diags.warn(format!("1 of {distinct} playlist {what} auto-selected"));
            }
        }
    }
}

/// Clear the target of every entry matching `argument`, a track number or
/// a target. Finalize drops entries with an empty target.
///
/// A local target argument is taken from `cwd` and compared by match key,
/// so spellings of the same path all match.
fn remove(list: &mut List, argument: &str, cwd: &Path) {
    if is_digits(argument) {
        let track: Option<usize> = argument.parse().ok();
        for entry in list.entries.iter_mut().filter(|e| Some(e.track) == track) {
            entry.target.clear();
        }
        return;
    }

    let target = percent_decode(argument);
    let key = if is_uri(&target) {
        PathBuf::from(&target)
    } else {
        weakly_canonical(&abs_path(cwd, &target))
    };
    for entry in list.entries.iter_mut() {
        if !entry.target.is_empty() && match_key(entry) == key {
            entry.target.clear();
        }
    }
}
