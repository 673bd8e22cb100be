//! Duplicate detection and target validation.
//!
//! Two entries are the same track when their targets resolve to the same
//! place, or when both carry a non-empty artist and title and those match
//! exactly. Duplicates are position-dependent: only an *earlier* entry can
//! make a later one a duplicate.
//!
//! Validation is local-first. A local target is valid when the file exists;
//! a URI is valid unless a [`NetworkProbe`] is configured and says otherwise.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::Entry;
use crate::paths::{abs_path, is_uri, weakly_canonical};

/// Comparison key for an entry's target.
///
/// Local targets are resolved from the entry's playlist directory and
/// weakly canonicalized, so `./a.mp3` and `a.mp3` give the same key. URIs
/// are compared as written.
pub fn match_key(entry: &Entry) -> PathBuf {
    if is_uri(&entry.target) {
        PathBuf::from(&entry.target)
    } else {
        weakly_canonical(&abs_path(entry.source_dir(), &entry.target))
    }
}

/// True when two entries refer to the same track.
pub fn same_track(a: &Entry, a_key: &Path, b: &Entry, b_key: &Path) -> bool {
    if a_key == b_key {
        return true;
    }
    !a.artist.is_empty() && !a.title.is_empty() && a.artist == b.artist && a.title == b.title
}

/// Precomputed match keys for a slice of entries.
///
/// Canonicalizing touches the filesystem, so keys are built once per pass
/// instead of once per comparison.
#[derive(Debug, Clone)]
pub struct MatchIndex {
    keys: Vec<PathBuf>,
}

impl MatchIndex {
    pub fn new(entries: &[Entry]) -> Self {
        Self {
            keys: entries.iter().map(match_key).collect(),
        }
    }

    /// First position in `entries` matching `entry`.
    ///
    /// With `same_list_only` false, candidates read from the same playlist
    /// as `entry` are skipped.
    pub fn find(&self, entries: &[Entry], entry: &Entry, same_list_only: bool) -> Option<usize> {
        let key = match_key(entry);
        entries
            .iter()
            .zip(&self.keys)
            .position(|(candidate, candidate_key)| {
                if !same_list_only && candidate.playlist == entry.playlist {
                    return false;
                }
                same_track(entry, &key, candidate, candidate_key)
            })
    }

    /// True if some entry strictly before `position` matches it.
    pub fn is_duplicate(&self, entries: &[Entry], position: usize) -> bool {
        let (Some(entry), Some(key)) = (entries.get(position), self.keys.get(position)) else {
            return false;
        };
        entries[..position]
            .iter()
            .zip(&self.keys[..position])
            .any(|(earlier, earlier_key)| same_track(entry, key, earlier, earlier_key))
    }
}

/// First entry in `entries` matching `entry`. See [`MatchIndex::find`].
pub fn find_match(entry: &Entry, entries: &[Entry], same_list_only: bool) -> Option<usize> {
    MatchIndex::new(entries).find(entries, entry, same_list_only)
}

/// True if an entry before `position` matches the one at `position`.
pub fn is_duplicate(entries: &[Entry], position: usize) -> bool {
    MatchIndex::new(entries).is_duplicate(entries, position)
}

/// Set every entry's duplicate flag. Returns the number of duplicates.
pub fn mark_duplicates(entries: &mut [Entry]) -> usize {
    let index = MatchIndex::new(entries);
    let flags: Vec<bool> = (0..entries.len())
        .map(|i| index.is_duplicate(entries, i))
        .collect();

    for (entry, duplicate) in entries.iter_mut().zip(&flags) {
        entry.duplicate = *duplicate;
    }

    let count = flags.iter().filter(|d| **d).count();
    tracing::debug!(target: "resolver::dupes", entries = entries.len(), duplicates = count, "Marked duplicates");
    count
}

/// Reachability check for network targets.
pub trait NetworkProbe {
    /// True if `uri` answered without a transport failure or error status.
    fn is_reachable(&self, uri: &str) -> bool;
}

/// Default user agent for network probes.
pub const USER_AGENT: &str = concat!("playlist-forge/", env!("CARGO_PKG_VERSION"));

/// HEAD-request probe backed by a blocking `reqwest` client.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl NetworkProbe for HttpProbe {
    fn is_reachable(&self, uri: &str) -> bool {
        match self.client.head(uri).send() {
            Ok(response) => {
                let status = response.status();
                tracing::debug!(target: "resolver::probe", uri, %status, "HEAD");
                !status.is_client_error() && !status.is_server_error()
            }
            Err(e) => {
                tracing::debug!(target: "resolver::probe", uri, error = %e, "HEAD failed");
                false
            }
        }
    }
}

/// Decides whether a resolved target is valid.
#[derive(Default)]
pub struct Validator<'a> {
    probe: Option<&'a dyn NetworkProbe>,
}

impl<'a> Validator<'a> {
    /// Check local targets only; every URI counts as valid.
    pub fn local_only() -> Self {
        Self { probe: None }
    }

    /// Also probe URIs over the network.
    pub fn with_probe(probe: &'a dyn NetworkProbe) -> Self {
        Self { probe: Some(probe) }
    }

    /// `resolved` is an absolute path or a URI.
    pub fn is_valid(&self, resolved: &str) -> bool {
        if is_uri(resolved) {
            return self.probe.is_none_or(|p| p.is_reachable(resolved));
        }
        Path::new(resolved).exists()
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::cell::RefCell;

    /// Probe that answers from a fixed list of reachable URIs.
    #[derive(Default)]
    pub struct MockProbe {
        pub reachable: Vec<String>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MockProbe {
        pub fn reaching(uris: &[&str]) -> Self {
            Self {
                reachable: uris.iter().map(|u| u.to_string()).collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl NetworkProbe for MockProbe {
        fn is_reachable(&self, uri: &str) -> bool {
            self.calls.borrow_mut().push(uri.to_string());
            self.reachable.iter().any(|u| u == uri)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockProbe;
    use super::*;

    fn entry(target: &str, playlist: &str) -> Entry {
        Entry::new(target, playlist)
    }

    #[test]
    fn test_three_equal_targets_flag_all_but_first() {
        let mut entries = vec![
            entry("/music/a.mp3", "/lists/x.m3u"),
            entry("/music/./a.mp3", "/lists/x.m3u"),
            entry("/music/sub/../a.mp3", "/lists/y.m3u"),
        ];
        let count = mark_duplicates(&mut entries);

        let flags: Vec<bool> = entries.iter().map(|e| e.duplicate).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_relative_targets_resolve_from_playlist_dir() {
        let entries = vec![
            entry("a.mp3", "/music/list.m3u"),
            entry("./a.mp3", "/music/list.m3u"),
            entry("a.mp3", "/other/list.m3u"),
        ];
        assert!(is_duplicate(&entries, 1));
        assert!(!is_duplicate(&entries, 2));
    }

    #[test]
    fn test_artist_title_match() {
        let mut a = entry("/music/a.mp3", "/l.m3u");
        a.artist = "Band".into();
        a.title = "Song".into();
        let mut b = entry("http://radio/b.mp3", "/l.m3u");
        b.artist = "Band".into();
        b.title = "Song".into();
        let mut c = entry("/music/c.mp3", "/l.m3u");
        c.title = "Song".into();

        let entries = vec![a, b, c];
        assert!(is_duplicate(&entries, 1));
        assert!(!is_duplicate(&entries, 2));
    }

    #[test]
    fn test_empty_artist_title_never_matches() {
        let entries = vec![entry("/music/a.mp3", "/l.m3u"), entry("/music/b.mp3", "/l.m3u")];
        assert!(!is_duplicate(&entries, 1));
    }

    #[test]
    fn test_earlier_entry_is_never_duplicate_of_later() {
        let entries = vec![entry("/music/a.mp3", "/l.m3u"), entry("/music/a.mp3", "/l.m3u")];
        assert!(!is_duplicate(&entries, 0));
        assert!(is_duplicate(&entries, 1));
    }

    #[test]
    fn test_find_match_skips_same_playlist_when_asked() {
        let entries = vec![
            entry("/music/a.mp3", "/lists/x.m3u"),
            entry("/music/a.mp3", "/lists/y.m3u"),
        ];
        let probe = entry("/music/a.mp3", "/lists/x.m3u");

        assert_eq!(find_match(&probe, &entries, true), Some(0));
        assert_eq!(find_match(&probe, &entries, false), Some(1));

        let lonely = entry("/music/z.mp3", "/lists/x.m3u");
        assert_eq!(find_match(&lonely, &entries, false), None);
    }

    #[test]
    fn test_uri_keys_compare_verbatim() {
        let entries = vec![
            entry("http://host/a.mp3", "/l.m3u"),
            entry("http://host/a.mp3", "/m.m3u"),
            entry("http://host/b.mp3", "/l.m3u"),
        ];
        assert!(is_duplicate(&entries, 1));
        assert!(!is_duplicate(&entries, 2));
    }

    #[test]
    fn test_validator_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        std::fs::write(&file, b"x").unwrap();

        let validator = Validator::local_only();
        assert!(validator.is_valid(file.to_str().unwrap()));
        assert!(!validator.is_valid(dir.path().join("b.mp3").to_str().unwrap()));
        assert!(validator.is_valid("http://unreachable.invalid/a.mp3"));
    }

    #[test]
    fn test_validator_uses_probe_for_uris() {
        let probe = MockProbe::reaching(&["http://up/a.mp3"]);
        let validator = Validator::with_probe(&probe);

        assert!(validator.is_valid("http://up/a.mp3"));
        assert!(!validator.is_valid("http://down/a.mp3"));
        assert!(!validator.is_valid("/definitely/not/here.mp3"));
        assert_eq!(probe.calls.borrow().len(), 2);
    }

    #[test]
    fn test_http_probe_builds() {
        assert!(HttpProbe::new(Duration::from_secs(10), USER_AGENT).is_ok());
    }
}
