//! JSPF (JSON rendition of XSPF).

use serde::{Deserialize, Serialize};

use super::{ParseOutcome, Source, WriteOptions};
use crate::model::{Entry, List};

#[derive(Debug, Deserialize, Serialize)]
struct Document {
    playlist: Option<PlaylistObject>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct PlaylistObject {
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    creator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    annotation: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    image: String,
    track: Vec<Track>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct Track {
    location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    album: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    annotation: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    creator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    identifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    info: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(rename = "trackNum", skip_serializing_if = "Option::is_none")]
    track_num: Option<u32>,
}

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let document: Document = match serde_json::from_str(source.text) {
        Ok(document) => document,
        Err(e) => {
            outcome.problem(e.to_string());
            return outcome;
        }
    };
    let Some(root) = document.playlist else {
        outcome.problem("Unrecognized root");
        return outcome;
    };

    let playlist = source.entry_playlist();
    outcome.entries = root
        .track
        .into_iter()
        .map(|track| Entry {
            target: track.location,
            title: track.title,
            artist: track.creator,
            album: track.album,
            comment: track.annotation,
            identifier: track.identifier,
            image: track.image,
            info: track.info,
            album_track: track.track_num,
            duration: track
                .duration
                .filter(|ms| ms.is_finite() && *ms > 0.0)
                .map(|ms| ms as u64)
                .unwrap_or(0),
            playlist: playlist.clone(),
            playlist_title: root.title.clone(),
            playlist_artist: root.creator.clone(),
            playlist_image: root.image.clone(),
            playlist_comment: root.annotation.clone(),
            ..Default::default()
        })
        .collect();

    outcome
}

pub(crate) fn render(list: &List, options: &WriteOptions) -> serde_json::Result<String> {
    let track = list
        .entries
        .iter()
        .map(|entry| {
            if options.minimal {
                return Track {
                    location: entry.target.clone(),
                    ..Default::default()
                };
            }
            Track {
                location: entry.target.clone(),
                album: entry.album.clone(),
                annotation: entry.comment.clone(),
                creator: entry.artist.clone(),
                duration: (entry.duration > 0).then_some(entry.duration as f64),
                identifier: entry.identifier.clone(),
                image: entry.image.clone(),
                info: entry.info.clone(),
                title: entry.title.clone(),
                track_num: entry.album_track,
            }
        })
        .collect();

    let mut root = PlaylistObject {
        track,
        ..Default::default()
    };
    if !options.minimal {
        root.title = list.title.value().to_string();
        root.creator = list.artist.value().to_string();
        root.annotation = list.comment.value().to_string();
        root.image = list.image.value().to_string();
    }

    let mut text = serde_json::to_string_pretty(&Document { playlist: Some(root) })?;
    text.push('\n');
    Ok(text)
}
