//! PLS (`[playlist]` INI-style).

use std::collections::BTreeMap;

use super::syntax::{ceil_secs, split_key_value};
use super::{ParseOutcome, Source, WriteOptions};
use crate::model::{Entry, List};

const SECTION: &str = "[playlist]";
const VERSION: u32 = 2;

/// Split `File12` into (`File`, 12) for the three indexed keys.
fn indexed_key(key: &str) -> Option<(&str, usize)> {
    ["File", "Title", "Length"].into_iter().find_map(|prefix| {
        let digits = key.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|n| (prefix, n))
    })
}

pub(crate) fn parse(source: &Source<'_>) -> ParseOutcome {
    let mut outcome = ParseOutcome::default();

    let mut lines = source
        .text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .skip_while(|l| l.trim().is_empty())
        .peekable();

    let has_section = lines.peek().is_some_and(|l| l.trim() == SECTION);
    if !has_section {
        outcome.problem("Section not found");
        if !source.tolerant {
            return outcome;
        }
    }

    let mut slots: BTreeMap<usize, Entry> = BTreeMap::new();
    let mut declared: Option<usize> = None;
    let mut version: Option<u32> = None;

    for line in lines {
        let Some((key, value)) = split_key_value(line, '=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match indexed_key(key) {
            Some(("File", n)) => slots.entry(n).or_default().target = value.to_string(),
            Some(("Title", n)) => slots.entry(n).or_default().title = value.to_string(),
            Some(("Length", n)) => {
                let seconds: i64 = value.parse().unwrap_or(0);
                slots.entry(n).or_default().duration = u64::try_from(seconds).unwrap_or(0) * 1000;
            }
            _ => match key {
                "NumberOfEntries" => declared = value.parse().ok(),
                "Version" => version = value.parse().ok(),
                _ => {}
            },
        }
    }

    let playlist = source.entry_playlist();
    outcome.entries = slots
        .into_values()
        .filter(|e| !e.target.is_empty())
        .map(|mut e| {
            e.playlist = playlist.clone();
            e
        })
        .collect();

    if declared.unwrap_or(0) != outcome.entries.len() {
        outcome.problem("Entry count mismatch");
    }
    if version != Some(VERSION) {
        outcome.problem("Invalid or missing version");
    }

    outcome
}

pub(crate) fn render(list: &List, options: &WriteOptions) -> String {
    let mut out = format!("{SECTION}\n\n");
    let count = list.entries.len();

    for (i, entry) in list.entries.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!("File{n}={}\n", entry.target));

        if options.minimal || entry.is_target_only() {
            continue;
        }

        let display = entry.display_title();
        if !display.is_empty() {
            out.push_str(&format!("Title{n}={display}\n"));
        }
        if entry.duration > 0 {
            out.push_str(&format!("Length{n}={}\n", ceil_secs(entry.duration)));
        } else if !entry.local_target {
            out.push_str(&format!("Length{n}=-1\n"));
        }
        if n != count {
            out.push('\n');
        }
    }

    out.push_str(&format!("\nNumberOfEntries={count}\nVersion={VERSION}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse_text(text: &str, tolerant: bool) -> ParseOutcome {
        parse(&Source {
            path: Path::new("/lists/x.pls"),
            text,
            tolerant,
        })
    }

    #[test]
    fn test_parse_complete_file() {
        let text = "\n[playlist]\nFile1=/a.mp3\nTitle1=Band - Song\nLength1=200\n\n\
                    File2=http://radio/s\nLength2=-1\nNumberOfEntries=2\nVersion=2\n";
        let outcome = parse_text(text, false);
        assert!(outcome.problems.is_empty());
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.entries[0].title, "Band - Song");
        assert_eq!(outcome.entries[0].duration, 200_000);
        assert_eq!(outcome.entries[1].duration, 0);
    }

    #[test]
    fn test_declared_count_mismatch() {
        let text = "[playlist]\nFile1=/a.mp3\nFile2=/b.mp3\nNumberOfEntries=3\nVersion=2\n";
        let outcome = parse_text(text, false);
        assert_eq!(outcome.problems, vec!["Entry count mismatch".to_string()]);
        assert_eq!(outcome.entries.len(), 2);
    }

    #[test]
    fn test_missing_section_and_version() {
        let text = "File1=/a.mp3\nNumberOfEntries=1\n";
        let strict = parse_text(text, false);
        assert_eq!(strict.problems, vec!["Section not found".to_string()]);
        assert!(strict.entries.is_empty());

        let tolerant = parse_text(text, true);
        assert_eq!(tolerant.entries.len(), 1);
        assert!(tolerant.problems.contains(&"Invalid or missing version".to_string()));
    }

    #[test]
    fn test_indexed_keys_are_exact() {
        assert_eq!(indexed_key("File10"), Some(("File", 10)));
        assert_eq!(indexed_key("Filename1"), None);
        assert_eq!(indexed_key("File"), None);
    }

    #[test]
    fn test_render() {
        let mut list = List::new(None);
        let mut a = Entry::new("/a.mp3", "/l.pls");
        a.local_target = true;
        a.title = "Song".into();
        a.duration = 61_500;
        let b = Entry::new("http://radio/s", "/l.pls");
        list.entries = vec![a, b];

        assert_eq!(
            render(&list, &WriteOptions::default()),
            "[playlist]\n\nFile1=/a.mp3\nTitle1=Song\nLength1=62\n\n\
             File2=http://radio/s\n\nNumberOfEntries=2\nVersion=2\n"
        );
    }
}
