//! Windows Media Player playlists (`<?wpl?>` + SMIL).

use xmltree::{Element, XMLNode};

use super::syntax::ceil_secs;
use super::{GENERATOR, ParseOutcome, Source, WriteOptions, child_text, children_named, emit_xml};
use crate::model::{Entry, List};

const PI: &str = "wpl";
const ROOT: &str = "smil";

fn attribute<'a>(element: &'a Element, name: &str) -> &'a str {
    element.attributes.get(name).map(String::as_str).unwrap_or("")
}

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let nodes = match Element::parse_all(source.text.as_bytes()) {
        Ok(nodes) => nodes,
        Err(e) => {
            outcome.problem(e.to_string());
            return outcome;
        }
    };

    let has_pi = nodes
        .iter()
        .any(|node| matches!(node, XMLNode::ProcessingInstruction(name, _) if name == PI));
    if !has_pi {
        outcome.problem("Unrecognized processing instruction");
        return outcome;
    }

    let Some(root) = nodes
        .iter()
        .filter_map(XMLNode::as_element)
        .find(|e| e.name == ROOT)
    else {
        return outcome;
    };

    let mut title = String::new();
    let mut author = String::new();
    let mut image = String::new();
    if let Some(head) = root.get_child("head") {
        title = child_text(head, "title");
        for meta in children_named(head, "meta") {
            match attribute(meta, "name") {
                "Author" => author = attribute(meta, "content").to_string(),
                "Image" => image = attribute(meta, "content").to_string(),
                _ => {}
            }
        }
    }

    let playlist = source.entry_playlist();
    if let Some(seq) = root.get_child("body").and_then(|b| b.get_child("seq")) {
        for media in children_named(seq, "media") {
            outcome.entries.push(Entry {
                target: attribute(media, "src").to_string(),
                playlist: playlist.clone(),
                playlist_title: title.clone(),
                playlist_artist: author.clone(),
                playlist_image: image.clone(),
                ..Default::default()
            });
        }
    }

    outcome
}

fn meta(name: &str, content: &str) -> XMLNode {
    let mut meta = Element::new("meta");
    meta.attributes.insert("name".to_string(), name.to_string());
    meta.attributes.insert("content".to_string(), content.to_string());
    XMLNode::Element(meta)
}

pub(crate) fn render(list: &List, options: &WriteOptions) -> Result<String, xmltree::Error> {
    let mut root = Element::new(ROOT);

    if !options.minimal {
        let mut head = Element::new("head");
        if !list.title.is_empty() {
            super::push_text_child(&mut head, "title", list.title.value());
        }
        head.children.push(meta("Generator", GENERATOR));
        if list.stats.known_duration > 0 {
            let total = ceil_secs(list.stats.known_duration).to_string();
            head.children.push(meta("TotalDuration", &total));
        }
        if !list.artist.is_empty() {
            head.children.push(meta("Author", list.artist.value()));
        }
        if !list.image.is_empty() {
            head.children.push(meta("Image", list.image.value()));
        }
        root.children.push(XMLNode::Element(head));
    }

    let mut seq = Element::new("seq");
    for entry in &list.entries {
        let mut media = Element::new("media");
        media.attributes.insert("src".to_string(), entry.target.clone());
        seq.children.push(XMLNode::Element(media));
    }
    let mut body = Element::new("body");
    body.children.push(XMLNode::Element(seq));
    root.children.push(XMLNode::Element(body));

    let mut text = format!("<?{PI} version=\"1.0\"?>\n");
    text.push_str(&emit_xml(&root)?);
    Ok(text)
}
