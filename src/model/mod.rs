//! Core data model shared by every format and pipeline stage.
//!
//! - [`Entry`]: one track reference inside one playlist
//! - [`List`]: the playlist being built, with its aggregate metadata
//! - [`Selection`]: first-non-empty-wins value with a distinct-value count
//! - [`EntryStatus`]: the status letters shown in the summary table
//!
//! Optional text fields use the empty string for "absent", which is what
//! every playlist format writes anyway.

use bitflags::bitflags;
use std::path::{Path, PathBuf};

/// One track reference inside one playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Path or URI of the media file or stream
    pub target: String,
    /// 1-based position in its list
    pub track: usize,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub comment: String,
    pub identifier: String,
    pub info: String,
    /// Track number on the album (not the playlist position)
    pub album_track: Option<u32>,
    /// Duration in milliseconds, 0 when unknown
    pub duration: u64,
    /// Per-track image path or URI
    pub image: String,

    pub local_target: bool,
    pub valid_target: bool,
    pub duplicate: bool,
    pub local_image: bool,
    pub valid_image: bool,

    /// Playlist file this entry was read from
    pub playlist: PathBuf,
    pub playlist_title: String,
    pub playlist_artist: String,
    pub playlist_image: String,
    pub playlist_comment: String,
}

impl Entry {
    /// Create an entry for `target` read from `playlist`.
    pub fn new(target: impl Into<String>, playlist: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            playlist: playlist.into(),
            ..Default::default()
        }
    }

    /// Directory that relative targets of this entry are resolved against.
    pub fn source_dir(&self) -> &Path {
        self.playlist.parent().unwrap_or(Path::new(""))
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// "Artist - Title" when both are known, otherwise whichever is set.
    pub fn display_title(&self) -> String {
        match (self.artist.is_empty(), self.title.is_empty()) {
            (false, false) => format!("{} - {}", self.artist, self.title),
            (false, true) => self.artist.clone(),
            _ => self.title.clone(),
        }
    }

    /// True if there is nothing beyond the target worth writing.
    pub fn is_target_only(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty() && self.duration == 0
    }

    /// Status flags for reports.
    pub fn status(&self) -> EntryStatus {
        let mut status = EntryStatus::empty();
        if self.has_image() {
            status.set(EntryStatus::NETWORK_IMAGE, !self.local_image);
            status.set(EntryStatus::UNFOUND_IMAGE, !self.valid_image);
        }
        status.set(EntryStatus::DUPLICATE, self.duplicate);
        status.set(EntryStatus::NETWORK, !self.local_target);
        status.set(EntryStatus::UNFOUND, !self.valid_target);
        status
    }
}

bitflags! {
    /// Findings about one entry, as shown in the summary table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryStatus: u8 {
        /// Per-track image is a URI
        const NETWORK_IMAGE = 1 << 0;
        /// Per-track image does not resolve
        const UNFOUND_IMAGE = 1 << 1;
        /// Matches an earlier entry
        const DUPLICATE = 1 << 2;
        /// Target is a URI
        const NETWORK = 1 << 3;
        /// Target does not resolve
        const UNFOUND = 1 << 4;
    }
}

impl EntryStatus {
    /// Letters in table order (`nuDNU`), or `*` when nothing is flagged.
    pub fn letters(&self) -> String {
        if self.is_empty() {
            return "*".to_string();
        }
        [
            (Self::NETWORK_IMAGE, 'n'),
            (Self::UNFOUND_IMAGE, 'u'),
            (Self::DUPLICATE, 'D'),
            (Self::NETWORK, 'N'),
            (Self::UNFOUND, 'U'),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, letter)| *letter)
        .collect()
    }
}

/// A list-level value picked from several playlists.
///
/// The first non-empty value wins; every distinct non-empty value seen is
/// remembered so the caller can warn when the choice was ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    value: String,
    seen: Vec<String>,
}

impl Selection {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Number of distinct non-empty values offered so far.
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Offer a candidate. Returns true if it became the selected value.
    pub fn offer(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        if !self.seen.iter().any(|s| s == candidate) {
            self.seen.push(candidate.to_string());
        }
        if self.value.is_empty() {
            self.value = candidate.to_string();
            return true;
        }
        false
    }

    /// Replace the selected value without touching the distinct count.
    pub fn replace(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Force a value, as an explicit override does: it becomes the only one seen.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.seen = if self.value.is_empty() {
            Vec::new()
        } else {
            vec![self.value.clone()]
        };
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// Counters filled in by the aggregate stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
    pub duplicates: usize,
    pub network_targets: usize,
    pub unfound_targets: usize,
    pub network_images: usize,
    pub unfound_images: usize,
    /// Sum of known durations in milliseconds
    pub known_duration: u64,
}

/// An in-memory playlist under construction.
#[derive(Debug, Clone, Default)]
pub struct List {
    /// Output playlist path, if one was requested
    pub output: Option<PathBuf>,
    pub entries: Vec<Entry>,
    pub title: Selection,
    pub artist: Selection,
    pub comment: Selection,
    pub image: Selection,
    /// Directory a relative list image is resolved from
    pub image_source: PathBuf,
    pub local_image: bool,
    pub valid_image: bool,
    /// Some local target is written relative to something
    pub relative: bool,
    pub stats: ListStats,
}

impl List {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directory of the output playlist (empty when there is none).
    pub fn output_dir(&self) -> &Path {
        self.output
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new(""))
    }

    /// Make track numbers contiguous: `entries[i].track == i + 1`.
    pub fn renumber(&mut self) {
        renumber(&mut self.entries);
    }

    /// Recompute [`ListStats`] from the current entries.
    pub fn aggregate(&mut self) {
        let mut stats = ListStats::default();
        for entry in &self.entries {
            stats.duplicates += usize::from(entry.duplicate);
            stats.network_targets += usize::from(!entry.local_target);
            stats.unfound_targets += usize::from(!entry.valid_target);
            if entry.has_image() {
                stats.network_images += usize::from(!entry.local_image);
                stats.unfound_images += usize::from(!entry.valid_image);
            }
            stats.known_duration += entry.duration;
        }
        self.stats = stats;
    }
}

/// Renumber a slice of entries 1..=N in order.
pub fn renumber(entries: &mut [Entry]) {
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.track = i + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title() {
        let mut entry = Entry::new("/a.mp3", "/l.m3u");
        assert_eq!(entry.display_title(), "");
        entry.title = "Song".into();
        assert_eq!(entry.display_title(), "Song");
        entry.artist = "Band".into();
        assert_eq!(entry.display_title(), "Band - Song");
    }

    #[test]
    fn test_status_letters() {
        let mut entry = Entry::new("http://x/a.mp3", "/l.m3u");
        entry.valid_target = true;
        assert_eq!(entry.status().letters(), "N");

        entry.duplicate = true;
        entry.image = "cover.jpg".into();
        entry.local_image = true;
        assert_eq!(entry.status().letters(), "uDN");

        let clean = Entry {
            local_target: true,
            valid_target: true,
            ..Entry::new("/a.mp3", "/l.m3u")
        };
        assert_eq!(clean.status().letters(), "*");
    }

    #[test]
    fn test_selection_first_wins_and_counts_distinct() {
        let mut sel = Selection::default();
        assert!(!sel.offer(""));
        assert!(sel.offer("Mix"));
        assert!(!sel.offer("Mix"));
        assert!(!sel.offer("Other"));
        assert_eq!(sel.value(), "Mix");
        assert_eq!(sel.distinct(), 2);

        sel.set("Forced");
        assert_eq!(sel.value(), "Forced");
        assert_eq!(sel.distinct(), 1);
    }

    #[test]
    fn test_renumber_is_contiguous() {
        let mut list = List::new(None);
        for (i, t) in ["a", "b", "c"].iter().enumerate() {
            let mut e = Entry::new(*t, "/l.m3u");
            e.track = (i + 1) * 10;
            list.entries.push(e);
        }
        list.renumber();
        for (i, e) in list.entries.iter().enumerate() {
            assert_eq!(e.track, i + 1);
        }
    }

    #[test]
    fn test_aggregate_counts() {
        let mut list = List::new(None);
        let mut a = Entry::new("/a.mp3", "/l.m3u");
        a.local_target = true;
        a.valid_target = true;
        a.duration = 1500;
        let mut b = Entry::new("http://h/b.mp3", "/l.m3u");
        b.valid_target = true;
        b.duplicate = true;
        b.image = "http://h/c.jpg".into();
        b.valid_image = true;
        let mut c = Entry::new("/missing.mp3", "/l.m3u");
        c.local_target = true;
        c.duration = 500;
        list.entries = vec![a, b, c];

        list.aggregate();
        assert_eq!(
            list.stats,
            ListStats {
                duplicates: 1,
                network_targets: 1,
                unfound_targets: 1,
                network_images: 1,
                unfound_images: 0,
                known_duration: 2000,
            }
        );
    }

    #[test]
    fn test_output_dir() {
        let list = List::new(Some(PathBuf::from("/out/list.m3u")));
        assert_eq!(list.output_dir(), Path::new("/out"));
        assert_eq!(List::new(None).output_dir(), Path::new(""));
    }
}
