//! CUE sheets, one `FILE` per track.
//!
//! A sheet that puts several `TRACK`s under one `FILE` describes a single
//! ripped image rather than a playlist. Tolerant mode still reads it, one
//! entry per track, all pointing at the same file.

use std::path::Path;

use super::syntax::{quote, unquote};
use super::{ParseOutcome, Source, WriteOptions};
use crate::diagnostics::Diagnostics;
use crate::model::{Entry, List};
use crate::paths::is_uri;

const MAX_TRACKS: usize = 99;

/// Split `KEYWORD rest` on the first space.
fn keyword(line: &str) -> (&str, &str) {
    line.split_once(' ').unwrap_or((line, ""))
}

/// `REM COMMENT "x"` and the older bare `REM "x"` both carry a comment.
fn rem_comment(rest: &str) -> String {
    let rest = rest.trim_start();
    unquote(rest.strip_prefix("COMMENT").unwrap_or(rest))
}

struct FileBlock {
    target: String,
    tracks: Vec<Entry>,
}

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let playlist = source.entry_playlist();

    let mut title = String::new();
    let mut performer = String::new();
    let mut comment = String::new();
    let mut blocks: Vec<FileBlock> = Vec::new();

    for line in source.text.lines() {
        let line = line.trim();
        let (word, rest) = keyword(line);

        if word == "FILE" {
            blocks.push(FileBlock {
                target: unquote(rest),
                tracks: Vec::new(),
            });
            continue;
        }

        let Some(block) = blocks.last_mut() else {
            match word {
                "TITLE" => title = unquote(rest),
                "PERFORMER" => performer = unquote(rest),
                "REM" => comment = rem_comment(rest),
                _ => {}
            }
            continue;
        };

        match word {
            "TRACK" => {
                let number = rest.split_whitespace().next().and_then(|n| n.parse::<u32>().ok());
                block.tracks.push(Entry {
                    target: block.target.clone(),
                    album_track: number,
                    ..Default::default()
                });
            }
            "TITLE" | "PERFORMER" | "REM" => {
                let Some(track) = block.tracks.last_mut() else {
                    continue;
                };
                match word {
                    "TITLE" => track.title = unquote(rest),
                    "PERFORMER" => track.artist = unquote(rest),
                    _ => track.comment = rem_comment(rest),
                }
            }
            _ => {}
        }
    }

    for block in blocks {
        let valid = !block.tracks.is_empty()
            && block
                .tracks
                .iter()
                .all(|t| t.album_track.is_some_and(|n| (n as usize) <= MAX_TRACKS));
        if !valid {
            outcome.problem("Invalid or missing track element");
        }
        if block.tracks.len() > 1 {
            outcome.problem("Detected single file cue sheet");
        }
        if !valid && !source.tolerant {
            break;
        }

        for mut entry in block.tracks {
            // TRACK numbers are positions in the sheet, not album data
            entry.album_track = None;
            entry.playlist = playlist.clone();
            entry.playlist_title = title.clone();
            entry.playlist_artist = performer.clone();
            entry.playlist_comment = comment.clone();
            outcome.entries.push(entry);
        }
    }

    outcome
}

/// Drop URI targets, which a cue sheet cannot reference.
pub(crate) fn pre_process(list: &mut List, diags: &mut Diagnostics) -> usize {
    let before = list.entries.len();
    list.entries.retain(|entry| {
        if is_uri(&entry.target) {
            diags.skip(format!("Skipping URI: {}", entry.target));
            false
        } else {
            true
        }
    });
    before - list.entries.len()
}

fn file_type(target: &str) -> &'static str {
    let extension = Path::new(target)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("aiff") => "AIFF",
        Some("mp3") => "MP3",
        _ => "WAVE",
    }
}

pub(crate) fn render(list: &List, options: &WriteOptions, diags: &mut Diagnostics) -> String {
    let mut out = String::new();

    if !options.minimal {
        if !list.title.is_empty() {
            out.push_str(&format!("TITLE {}\n", quote(list.title.value())));
        }
        if !list.artist.is_empty() {
            out.push_str(&format!("PERFORMER {}\n", quote(list.artist.value())));
        }
        if !list.comment.is_empty() {
            out.push_str(&format!("REM COMMENT {}\n", quote(list.comment.value())));
        }
    }

    for (i, entry) in list.entries.iter().enumerate() {
        let n = i + 1;
        if n > MAX_TRACKS {
            diags.warn("Can only write 99 tracks to a cue file");
            break;
        }

        out.push_str(&format!("FILE {} {}\n", quote(&entry.target), file_type(&entry.target)));
        out.push_str(&format!("  TRACK {n:02} AUDIO\n"));
        if !options.minimal {
            if !entry.title.is_empty() {
                out.push_str(&format!("    TITLE {}\n", quote(&entry.title)));
            }
            if !entry.artist.is_empty() {
                out.push_str(&format!("    PERFORMER {}\n", quote(&entry.artist)));
            }
            if !entry.comment.is_empty() {
                out.push_str(&format!("    REM COMMENT {}\n", quote(&entry.comment)));
            }
        }
        out.push_str("    INDEX 01 00:00:00\n");
    }

    out
}
