//! Tag reading for local targets.
//!
//! Uses the lofty crate for format-independent metadata access. Reading is
//! optional and sits behind [`TagReader`] so the pipeline can run with a
//! mock in tests.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::Entry;

/// Tag fields copied onto an entry. Empty strings mean "not tagged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub comment: String,
    pub track_number: Option<u32>,
    /// Milliseconds
    pub duration: u64,
}

impl TrackTags {
    /// Copy every known field onto `entry`, leaving unknown ones alone.
    pub fn apply_to(&self, entry: &mut Entry) {
        let fields = [
            (&self.title, &mut entry.title),
            (&self.artist, &mut entry.artist),
            (&self.album, &mut entry.album),
            (&self.comment, &mut entry.comment),
        ];
        for (value, slot) in fields {
            if !value.is_empty() {
                slot.clone_from(value);
            }
        }
        if self.track_number.is_some() {
            entry.album_track = self.track_number;
        }
        if self.duration > 0 {
            entry.duration = self.duration;
        }
    }
}

/// Reads embedded tags from a local media file.
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<TrackTags>;
}

/// [`TagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TrackTags> {
        let tagged_file = Probe::open(path)
            .map_err(|e| Error::metadata(path, e.to_string()))?
            .read()
            .map_err(|e| Error::metadata(path, e.to_string()))?;

        // Get the primary tag, or fall back to the first available tag
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let duration = tagged_file.properties().duration().as_millis();

        Ok(TrackTags {
            title: owned(tag.and_then(|t| t.title())),
            artist: owned(tag.and_then(|t| t.artist())),
            album: owned(tag.and_then(|t| t.album())),
            comment: owned(tag.and_then(|t| t.comment())),
            track_number: tag.and_then(|t| t.track()),
            duration: u64::try_from(duration).unwrap_or(u64::MAX),
        })
    }
}

fn owned(value: Option<Cow<'_, str>>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Tag reader answering from an in-memory table.
    #[derive(Default)]
    pub struct MockTagReader {
        pub tags: HashMap<PathBuf, TrackTags>,
    }

    impl MockTagReader {
        pub fn with(mut self, path: impl Into<PathBuf>, tags: TrackTags) -> Self {
            self.tags.insert(path.into(), tags);
            self
        }
    }

    impl TagReader for MockTagReader {
        fn read(&self, path: &Path) -> Result<TrackTags> {
            self.tags
                .get(path)
                .cloned()
                .ok_or_else(|| Error::metadata(path, "no tags"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write to temp file");

        let result = LoftyTagReader.read(file.path());
        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        let result = LoftyTagReader.read(Path::new("non_existent_file.mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_keeps_existing_when_tag_empty() {
        let mut entry = Entry::new("/a.mp3", "/l.m3u");
        entry.title = "From playlist".into();
        entry.duration = 1000;

        let tags = TrackTags {
            artist: "Band".into(),
            track_number: Some(3),
            ..Default::default()
        };
        tags.apply_to(&mut entry);

        assert_eq!(entry.title, "From playlist");
        assert_eq!(entry.artist, "Band");
        assert_eq!(entry.album_track, Some(3));
        assert_eq!(entry.duration, 1000);
    }
}
