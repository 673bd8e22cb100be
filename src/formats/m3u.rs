//! Extended M3U (`.m3u`, `.m3u8`, and FIFOs).

use super::syntax::{ceil_secs, find_unquoted, quote, split_words, unquote};
use super::{ParseOutcome, Source};
use crate::model::{Entry, List};

const EXTINF: &str = "#EXTINF:";
const INVALID_EXTINF: &str = "Invalid extended information";

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();
    let playlist = source.entry_playlist();

    let mut title = String::new();
    let mut artist = String::new();
    let mut image = String::new();
    let mut pending: Option<Entry> = None;

    for line in source.text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(info) = line.strip_prefix(EXTINF) {
            match parse_extinf(info) {
                Some(entry) => pending = Some(entry),
                None => {
                    outcome.problem(INVALID_EXTINF);
                    if !source.tolerant {
                        break;
                    }
                    pending = None;
                }
            }
        } else if let Some(value) = line.strip_prefix("#EXTART:") {
            artist = value.to_string();
        } else if let Some(value) = line.strip_prefix("#EXTIMG:") {
            image = value.to_string();
        } else if let Some(value) = line.strip_prefix("#PLAYLIST:") {
            title = value.to_string();
        } else if line.starts_with('#') {
            // Other directives and comments
        } else {
            let mut entry = pending.take().unwrap_or_default();
            entry.target = line.to_string();
            entry.playlist = playlist.clone();
            entry.playlist_title = title.clone();
            entry.playlist_artist = artist.clone();
            entry.playlist_image = image.clone();
            outcome.entries.push(entry);
        }
    }

    outcome
}

/// Parse what follows `#EXTINF:`. `None` when it is malformed.
fn parse_extinf(info: &str) -> Option<Entry> {
    let comma = find_unquoted(info, ',')?;
    let (head, display) = (&info[..comma], &info[comma + 1..]);

    let mut words = split_words(head).into_iter();
    // Fractional seconds are truncated; negative means unknown
    let seconds = words.next()?.parse::<f64>().ok().filter(|s| s.is_finite())?;

    let mut entry = Entry {
        duration: if seconds > 0.0 { (seconds.trunc() as u64).saturating_mul(1000) } else { 0 },
        ..Default::default()
    };
    let mut title_attr = false;

    for word in words {
        let Some((key, value)) = word.split_once('=') else {
            continue;
        };
        let value = unquote(value);
        match key {
            "album" => entry.album = value,
            "artist" => entry.artist = value,
            "comment" => entry.comment = value,
            "identifier" => entry.identifier = value,
            "image" => entry.image = value,
            "info" => entry.info = value,
            "title" => {
                entry.title = value;
                title_attr = true;
            }
            "track" => entry.album_track = value.trim().parse().ok(),
            _ => {}
        }
    }

    if !title_attr {
        entry.title = display_title(display, &entry.artist);
    }

    Some(entry)
}

/// Recover the title from the `Artist - Title` display text.
fn display_title(display: &str, artist: &str) -> String {
    if artist.is_empty() {
        return display.to_string();
    }
    if display == artist {
        return String::new();
    }
    display
        .strip_prefix(artist)
        .and_then(|rest| rest.strip_prefix(" - "))
        .unwrap_or(display)
        .to_string()
}

pub(crate) fn render(list: &List, bare: bool) -> String {
    let mut out = String::new();

    if !bare {
        out.push_str("#EXTM3U\n#EXTENC:UTF-8\n");
        if !list.title.is_empty() {
            out.push_str(&format!("#PLAYLIST:{}\n", list.title.value()));
        }
        if !list.artist.is_empty() {
            out.push_str(&format!("#EXTART:{}\n", list.artist.value()));
        }
        if !list.image.is_empty() {
            out.push_str(&format!("#EXTIMG:{}\n", list.image.value()));
        }
    }

    for entry in &list.entries {
        if !bare {
            out.push('\n');
            out.push_str(&extinf(entry));
            out.push('\n');
        }
        out.push_str(&entry.target);
        out.push('\n');
    }

    out
}

fn extinf(entry: &Entry) -> String {
    let mut line = String::from(EXTINF);
    if entry.duration > 0 {
        line.push_str(&ceil_secs(entry.duration).to_string());
    } else {
        line.push_str("-1");
    }

    let attributes = [
        ("album", &entry.album),
        ("artist", &entry.artist),
        ("comment", &entry.comment),
        ("identifier", &entry.identifier),
        ("image", &entry.image),
        ("info", &entry.info),
        ("title", &entry.title),
    ];
    for (key, value) in attributes {
        if !value.is_empty() {
            line.push_str(&format!(" {key}={}", quote(value)));
        }
    }
    if let Some(track) = entry.album_track {
        line.push_str(&format!(" track=\"{track}\""));
    }

    line.push(',');
    line.push_str(&entry.display_title());
    line
}
