//! Summary table and filtered target listings.
//!
//! Both views write to any `io::Write` so they can be tested against a
//! buffer; `main` hands them stdout.

use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;

use crate::model::{Entry, List};
use crate::paths::abs_path;
use crate::resolver::MatchIndex;

/// Which entries a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    All,
    Dupe,
    Image,
    Net,
    #[value(name = "netimg")]
    NetImg,
    Unfound,
    #[value(name = "unfoundimg")]
    UnfoundImg,
    /// Entries no other input playlist contains
    Unique,
}

impl ListKind {
    /// A non-empty listing of this kind deserves attention.
    pub fn is_notable(&self) -> bool {
        matches!(self, ListKind::Dupe | ListKind::Unfound | ListKind::UnfoundImg)
    }
}

/// Column printed before each target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListKey {
    #[default]
    Track,
    Playlist,
    PlaylistTitle,
    PlaylistImage,
    PlaylistArtist,
    Artist,
    Title,
    Album,
    Comment,
    Identifier,
    Image,
    Info,
}

impl ListKey {
    fn value(&self, entry: &Entry) -> String {
        match self {
            ListKey::Track => entry.track.to_string(),
            ListKey::Playlist => entry.playlist.display().to_string(),
            ListKey::PlaylistTitle => entry.playlist_title.clone(),
            ListKey::PlaylistImage => entry.playlist_image.clone(),
            ListKey::PlaylistArtist => entry.playlist_artist.clone(),
            ListKey::Artist => entry.artist.clone(),
            ListKey::Title => entry.title.clone(),
            ListKey::Album => entry.album.clone(),
            ListKey::Comment => entry.comment.clone(),
            ListKey::Identifier => entry.identifier.clone(),
            ListKey::Image => entry.image.clone(),
            ListKey::Info => entry.info.clone(),
        }
    }
}

/// A listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListView {
    pub kind: ListKind,
    pub key: ListKey,
    /// Print targets without the key column
    pub targets_only: bool,
}

impl ListView {
    /// Every target, nothing else.
    pub fn all_targets() -> Self {
        Self {
            kind: ListKind::All,
            key: ListKey::Track,
            targets_only: true,
        }
    }
}

/// Entries selected by `kind`, in list order.
pub fn select<'a>(list: &'a List, kind: ListKind) -> Vec<&'a Entry> {
    let entries = &list.entries;
    let index = (kind == ListKind::Unique).then(|| MatchIndex::new(entries));
    entries
        .iter()
        .filter(|e| match kind {
            ListKind::All => true,
            ListKind::Dupe => e.duplicate,
            ListKind::Image => e.has_image(),
            ListKind::Net => !e.local_target,
            ListKind::NetImg => e.has_image() && !e.local_image,
            ListKind::Unfound => !e.valid_target,
            ListKind::UnfoundImg => e.has_image() && !e.valid_image,
            ListKind::Unique => index
                .as_ref()
                .is_some_and(|index| index.find(entries, e, false).is_none()),
        })
        .collect()
}

/// Print a listing. Returns how many entries were listed.
pub fn write_listing<W: Write>(list: &List, view: &ListView, mut out: W) -> io::Result<usize> {
    let selected = select(list, view.kind);
    for entry in &selected {
        if view.targets_only {
            writeln!(out, "{}", entry.target)?;
        } else {
            writeln!(out, "{}\t{}", view.key.value(entry), entry.target)?;
        }
    }
    Ok(selected.len())
}

/// `(3 hours, 2 minutes and 5 seconds)` style breakdown.
pub fn duration_breakdown(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = total_secs % 86_400 / 3600;
    let minutes = total_secs % 3600 / 60;
    let seconds = total_secs % 60;

    let mut text = String::from("(");
    if days > 0 {
        text.push_str(&format!("{days} days, "));
    }
    if hours > 0 {
        text.push_str(&format!("{hours} hours, "));
    }
    if minutes > 0 {
        text.push_str(&format!("{minutes} minutes and "));
    }
    text.push_str(&format!("{seconds} seconds)"));
    text
}

fn file_size(base: &Path, target: &str) -> u64 {
    std::fs::metadata(abs_path(base, target))
        .map(|m| m.len())
        .unwrap_or(0)
}

fn ambiguity(distinct: usize) -> String {
    if distinct > 1 {
        format!(" (of {distinct}!)")
    } else {
        String::new()
    }
}

/// Print the summary table and footer.
pub fn write_summary<W: Write>(list: &List, mut out: W) -> io::Result<()> {
    let mut total_ms: u64 = 0;
    let mut bytes: u64 = 0;

    writeln!(out, "Track\tStatus\tDuration\tTitle\tTarget")?;

    for entry in &list.entries {
        let target = if entry.local_target {
            Path::new(&entry.target)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.target.clone())
        } else {
            entry.target.clone()
        };
        let seconds = entry.duration / 1000;
        if seconds > 0 {
            total_ms += entry.duration;
        }

        if entry.local_target && entry.valid_target {
            bytes += file_size(entry.source_dir(), &entry.target);
        }
        if entry.has_image() && entry.local_image && entry.valid_image {
            bytes += file_size(entry.source_dir(), &entry.image);
        }

        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            entry.track,
            entry.status().letters(),
            seconds,
            entry.display_title(),
            target
        )?;
    }

    if list.local_image && list.valid_image {
        bytes += file_size(&list.image_source, list.image.value());
    }

    let stats = &list.stats;
    let total_secs = total_ms / 1000;
    writeln!(
        out,
        "[n]etwork images: {}\t[u]nfound images: {}",
        stats.network_images, stats.unfound_images
    )?;
    writeln!(
        out,
        "[D]upe: {}\t[N]etwork: {}\t[U]nfound: {}",
        stats.duplicates, stats.network_targets, stats.unfound_targets
    )?;
    writeln!(out, "Entries: {}", list.entries.len())?;
    writeln!(out)?;
    writeln!(
        out,
        "Total known duration: {total_secs} seconds {}",
        duration_breakdown(total_secs)
    )?;
    writeln!(out, "Total known disk used: {} MB", bytes / 1024 / 1024)?;
    writeln!(out, "Known title: {}{}", list.title.value(), ambiguity(list.title.distinct()))?;
    writeln!(out, "Known artist: {}{}", list.artist.value(), ambiguity(list.artist.distinct()))?;
    writeln!(out, "Known image: {}{}", list.image.value(), ambiguity(list.image.distinct()))?;
    Ok(())
}
