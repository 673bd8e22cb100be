//! Advanced Stream Redirector (`<ASX VERSION="3.0">`).

use std::path::Path;

use xmltree::{Element, XMLNode};

use super::{ParseOutcome, Source, WriteOptions, child_text, children_named, emit_xml, push_text_child};
use crate::diagnostics::Diagnostics;
use crate::model::{Entry, List};
use crate::paths::is_uri;

const ROOT: &str = "ASX";

fn attribute<'a>(element: &'a Element, name: &str) -> &'a str {
    element.attributes.get(name).map(String::as_str).unwrap_or("")
}

fn child_attribute(element: &Element, child: &str, name: &str) -> String {
    element
        .get_child(child)
        .map(|c| attribute(c, name).to_string())
        .unwrap_or_default()
}

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

    let title = child_text(&root, "TITLE");
    let author = child_text(&root, "AUTHOR");
    let image = children_named(&root, "PARAM")
        .find(|p| attribute(p, "NAME") == "image")
        .map(|p| attribute(p, "VALUE").to_string())
        .unwrap_or_default();

    let playlist = source.entry_playlist();
    for item in children_named(&root, "ENTRY") {
        let mut entry = Entry {
            target: child_attribute(item, "REF", "href"),
            title: child_text(item, "TITLE"),
            artist: child_text(item, "AUTHOR"),
            info: child_attribute(item, "MOREINFO", "href"),
            playlist: playlist.clone(),
            playlist_title: title.clone(),
            playlist_artist: author.clone(),
            playlist_image: image.clone(),
            ..Default::default()
        };

        for param in children_named(item, "PARAM") {
            let value = attribute(param, "VALUE");
            match attribute(param, "NAME") {
                "album" => entry.album = value.to_string(),
                "comment" => entry.comment = value.to_string(),
                "duration" => entry.duration = value.trim().parse().unwrap_or(0),
                "identifier" => entry.identifier = value.to_string(),
                "image" => entry.image = value.to_string(),
                "track" => entry.album_track = value.trim().parse().ok(),
                _ => {}
            }
        }

        outcome.entries.push(entry);
    }

    outcome
}

/// Drop absolute local paths; ASX references are URIs or relative paths.
pub(crate) fn pre_process(list: &mut List, diags: &mut Diagnostics) -> usize {
    let before = list.entries.len();
    list.entries.retain(|entry| {
        if !is_uri(&entry.target) && Path::new(&entry.target).is_absolute() {
            diags.skip(format!("Skipping absolute path: {}", entry.target));
            false
        } else {
            true
        }
    });
    before - list.entries.len()
}

fn param(name: &str, value: &str) -> XMLNode {
    let mut param = Element::new("PARAM");
    param.attributes.insert("NAME".to_string(), name.to_string());
    param.attributes.insert("VALUE".to_string(), value.to_string());
    XMLNode::Element(param)
}

fn entry_element(entry: &Entry, minimal: bool) -> Element {
    let mut item = Element::new("ENTRY");
    let mut reference = Element::new("REF");
    reference.attributes.insert("href".to_string(), entry.target.clone());
    item.children.push(XMLNode::Element(reference));
    if minimal {
        return item;
    }

    if !entry.title.is_empty() {
        push_text_child(&mut item, "TITLE", &entry.title);
    }
    if !entry.artist.is_empty() {
        push_text_child(&mut item, "AUTHOR", &entry.artist);
    }
    if !entry.info.is_empty() {
        let mut more = Element::new("MOREINFO");
        more.attributes.insert("href".to_string(), entry.info.clone());
        item.children.push(XMLNode::Element(more));
    }

    let duration = (entry.duration > 0).then(|| entry.duration.to_string());
    let track = entry.album_track.map(|n| n.to_string());
    let params = [
        ("album", Some(entry.album.as_str())),
        ("comment", Some(entry.comment.as_str())),
        ("duration", duration.as_deref()),
        ("identifier", Some(entry.identifier.as_str())),
        ("image", Some(entry.image.as_str())),
        ("track", track.as_deref()),
    ];
    for (name, value) in params {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            item.children.push(param(name, value));
        }
    }
    item
}

pub(crate) fn render(list: &List, options: &WriteOptions) -> Result<String, xmltree::Error> {
    let mut root = Element::new(ROOT);
    root.attributes.insert("VERSION".to_string(), "3.0".to_string());

    if !options.minimal {
        if !list.title.is_empty() {
            push_text_child(&mut root, "TITLE", list.title.value());
        }
        if !list.artist.is_empty() {
            push_text_child(&mut root, "AUTHOR", list.artist.value());
        }
        if !list.image.is_empty() {
            root.children.push(param("image", list.image.value()));
        }
    }

    for entry in &list.entries {
        root.children
            .push(XMLNode::Element(entry_element(entry, options.minimal)));
    }

    emit_xml(&root)
}
