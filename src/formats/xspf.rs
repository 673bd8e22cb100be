//! XSPF (XML Shareable Playlist Format).

use std::path::MAIN_SEPARATOR;

use xmltree::{Element, XMLNode};

use super::{ParseOutcome, Source, WriteOptions, child_text, children_named, emit_xml, push_text_child};
use crate::model::{Entry, List};

const ROOT: &str = "playlist";
const NAMESPACE: &str = "http://xspf.org/ns/0/";

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let root = match Element::parse(source.text.as_bytes()) {
        Ok(root) => root,
        Err(e) => {
            outcome.problem(e.to_string());
            return outcome;
        }
    };
    if root.name != ROOT {
        outcome.problem("Unrecognized root node");
        return outcome;
    }

    let playlist = source.entry_playlist();
    let title = child_text(&root, "title");
    let creator = child_text(&root, "creator");
    let annotation = child_text(&root, "annotation");
    let image = child_text(&root, "image");

    let Some(track_list) = root.get_child("trackList") else {
        return outcome;
    };

    for track in children_named(track_list, "track") {
        outcome.entries.push(Entry {
            target: child_text(track, "location"),
            title: child_text(track, "title"),
            artist: child_text(track, "creator"),
            album: child_text(track, "album"),
            comment: child_text(track, "annotation"),
            identifier: child_text(track, "identifier"),
            image: child_text(track, "image"),
            info: child_text(track, "info"),
            album_track: child_text(track, "trackNum").parse().ok(),
            duration: parse_millis(&child_text(track, "duration")),
            playlist: playlist.clone(),
            playlist_title: title.clone(),
            playlist_artist: creator.clone(),
            playlist_image: image.clone(),
            playlist_comment: annotation.clone(),
            ..Default::default()
        });
    }

    outcome
}

/// Milliseconds from a decimal string; garbage and negatives read as 0.
pub(crate) fn parse_millis(text: &str) -> u64 {
    text.parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| ms as u64)
        .unwrap_or(0)
}

/// One `<track>` element.
fn track_element(entry: &Entry, minimal: bool) -> Element {
    let mut track = Element::new("track");
    push_text_child(&mut track, "location", &entry.target);
    if minimal {
        return track;
    }

    let fields = [
        ("album", &entry.album),
        ("annotation", &entry.comment),
        ("creator", &entry.artist),
    ];
    for (name, value) in fields {
        if !value.is_empty() {
            push_text_child(&mut track, name, value);
        }
    }
    if entry.duration > 0 {
        push_text_child(&mut track, "duration", &entry.duration.to_string());
    }
    let fields = [
        ("identifier", &entry.identifier),
        ("image", &entry.image),
        ("info", &entry.info),
        ("title", &entry.title),
    ];
    for (name, value) in fields {
        if !value.is_empty() {
            push_text_child(&mut track, name, value);
        }
    }
    if let Some(n) = entry.album_track {
        push_text_child(&mut track, "trackNum", &n.to_string());
    }
    track
}

pub(crate) fn render(list: &List, options: &WriteOptions) -> Result<String, xmltree::Error> {
    let mut root = Element::new(ROOT);
    root.attributes.insert("version".to_string(), "1".to_string());
    root.attributes.insert("xmlns".to_string(), NAMESPACE.to_string());

    if !options.minimal {
        if list.relative {
            let base = format!("{}{MAIN_SEPARATOR}", list.output_dir().display());
            root.attributes.insert("xml:base".to_string(), base);
        }
        let header = [
            ("title", list.title.value()),
            ("creator", list.artist.value()),
            ("annotation", list.comment.value()),
            ("image", list.image.value()),
        ];
        for (name, value) in header {
            if !value.is_empty() {
                push_text_child(&mut root, name, value);
            }
        }
    }

    let mut track_list = Element::new("trackList");
    for entry in &list.entries {
        track_list
            .children
            .push(XMLNode::Element(track_element(entry, options.minimal)));
    }
    root.children.push(XMLNode::Element(track_list));

    let mut text = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    text.push_str(&emit_xml(&root)?);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse_text(text: &str) -> ParseOutcome {
        parse(&Source {
            path: Path::new("/lists/x.xspf"),
            text,
            tolerant: false,
        })
    }

    #[test]
    fn test_parse_tracks() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<playlist version="1" xmlns="http://xspf.org/ns/0/">
  <title>Mix</title>
  <creator>DJ</creator>
  <trackList>
    <track><location>/a.mp3</location><duration>1234.6</duration><trackNum>7</trackNum></track>
    <track><location>http://radio/s</location><title>Live</title></track>
  </trackList>
</playlist>"#;
        let outcome = parse_text(text);
        assert!(outcome.problems.is_empty());
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].duration, 1234);
        assert_eq!(outcome.entries[0].album_track, Some(7));
        assert_eq!(outcome.entries[1].title, "Live");
        assert_eq!(outcome.entries[1].playlist_title, "Mix");
        assert_eq!(outcome.entries[1].playlist_artist, "DJ");
    }

    #[test]
    fn test_wrong_root() {
        let outcome = parse_text("<smil><body/></smil>");
        assert_eq!(outcome.problems, vec!["Unrecognized root node".to_string()]);
    }

    #[test]
    fn test_syntax_error_is_a_problem() {
        let outcome = parse_text("<playlist><trackList>");
        assert_eq!(outcome.problems.len(), 1);
        assert!(outcome.entries.is_empty());
    }

    #[test]
    fn test_render_sets_base_when_relative() {
        let mut list = List::new(Some("/out/list.xspf".into()));
        list.relative = true;
        list.entries.push(Entry::new("a.mp3", "/out/list.xspf"));

        let text = render(&list, &WriteOptions::default()).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<playlist"));
        assert!(text.contains(&format!("xml:base=\"/out{MAIN_SEPARATOR}\"")));
        assert!(text.contains("<location>a.mp3</location>"));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("5000"), 5000);
        assert_eq!(parse_millis("-3"), 0);
        assert_eq!(parse_millis("abc"), 0);
    }
}
