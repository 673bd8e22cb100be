//! Test utilities and fixtures for playlist-forge tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{sample_list, write_file};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let input = write_file(dir.path(), "lists/in.m3u", "/music/a.mp3\n");
//! let list = sample_list(dir.path());
//! ```

use std::path::{Path, PathBuf};

use crate::model::{Entry, List};

/// Write `content` to `dir/name`, creating parent directories.
///
/// Returns the full path of the written file.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Creates a three-entry list with every optional field populated.
///
/// Durations are whole seconds so formats that store seconds keep them.
/// Entries are attributed to `dir/source.m3u`.
pub fn sample_list(dir: &Path) -> List {
    let playlist = dir.join("source.m3u");
    let mut list = List::new(None);
    list.title.set("Road Trip");
    list.artist.set("Various");

    let tracks = [
        ("/music/one.mp3", "First Song", "Band A", "Album A", 1, 215_000, "/covers/a.jpg"),
        ("/music/two.flac", "Second, Song", "Band B", "Album B", 7, 184_000, "/covers/b.png"),
        ("http://radio.example/stream", "Live", "Station", "On Air", 3, 60_000, "http://radio.example/logo.png"),
    ];

    for (target, title, artist, album, album_track, duration, image) in tracks {
        list.entries.push(Entry {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            album_track: Some(album_track),
            duration,
            image: image.to_string(),
            ..Entry::new(target, &playlist)
        });
    }
    list.renumber();
    list
}
