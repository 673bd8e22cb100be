//! Target path and URI helpers.
//!
//! Everything here is lexical unless the name says otherwise: only
//! [`weakly_canonical`] touches the filesystem. Targets are kept as strings
//! because a target may be a URI, which `Path` would mangle.
//!
//! # Decoding quirk
//!
//! [`percent_decode`] re-examines the position it just decoded, so a
//! double-encoded `%2541` collapses all the way to `A`. Playlists written by
//! several tools in the wild depend on that, so it is kept on purpose.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Characters written verbatim by [`percent_encode`].
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'!' | b':' | b'/' | b'-' | b'.' | b'_' | b'~')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// True if `target` carries a `scheme://` prefix.
pub fn is_uri(target: &str) -> bool {
    target.contains("://")
}

/// True if `target` is a filesystem path rather than a URI.
pub fn is_local(target: &str) -> bool {
    !is_uri(target)
}

/// Decode `%XX` escapes and turn `~/` and `file:` forms into plain paths.
///
/// Never fails: malformed escapes stay as they are, and bytes that do not
/// decode to UTF-8 are replaced.
pub fn percent_decode(input: &str) -> String {
    let mut bytes = input.as_bytes().to_vec();
    let mut i = 0;

    while i + 2 < bytes.len() {
        if bytes[i] == b'%'
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            bytes.splice(i..i + 3, [hi << 4 | lo]);
            // Same index again: the decoded byte may start a new escape.
            continue;
        }
        i += 1;
    }

    let mut decoded = String::from_utf8_lossy(&bytes).into_owned();

    if let Some(rest) = decoded.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        decoded = format!("{}/{}", home.display(), rest);
    }

    if decoded.starts_with("file:///") {
        decoded.replace_range(..7, "");
    } else if decoded.starts_with("file:/") {
        decoded.replace_range(..5, "");
    }

    let rooted_parent = format!("{MAIN_SEPARATOR}..");
    if decoded.starts_with(&rooted_parent) {
        decoded.remove(0);
    }

    decoded
}

/// Escape everything outside `[!:/-._~0-9A-Za-z]` as uppercase `%XX`.
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if is_unreserved(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Build a `file://` URI for an absolute local path.
pub fn file_uri(path: &str) -> String {
    format!("file://{}", percent_encode(path))
}

/// Resolve `candidate` against `base`.
///
/// URIs come back untouched. Rooted paths ignore `base`. The result is
/// lexically normalized.
pub fn abs_path(base: &Path, candidate: &str) -> String {
    if is_uri(candidate) {
        return candidate.to_string();
    }

    let candidate_path = Path::new(candidate);
    let joined = if candidate_path.has_root() {
        candidate_path.to_path_buf()
    } else {
        base.join(candidate_path)
    };

    lexically_normal(&joined).to_string_lossy().into_owned()
}

/// Resolve `.` and `..` without looking at the filesystem.
pub fn lexically_normal(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.iter().collect()
}

/// Relative path leading from `base` to `path`.
///
/// Returns `None` when one side is rooted and the other is not, or when
/// `base` climbs above its own starting point.
pub fn lexically_relative(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = lexically_normal(path);
    let base = lexically_normal(base);

    if path.has_root() != base.has_root() {
        return None;
    }

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    if path_parts.first().filter(|c| matches!(c, Component::Prefix(_)))
        != base_parts.first().filter(|c| matches!(c, Component::Prefix(_)))
    {
        return None;
    }

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut climb: isize = 0;
    for component in &base_parts[common..] {
        match component {
            Component::Normal(_) => climb += 1,
            Component::ParentDir => climb -= 1,
            _ => {}
        }
    }
    if climb < 0 {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in 0..climb {
        relative.push("..");
    }
    for component in &path_parts[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }

    Some(relative)
}

/// Absolute form of `target` used as a comparison key.
///
/// The longest existing prefix goes through the filesystem (symlinks
/// resolved), the remainder is normalized lexically. Relative targets are
/// taken from the working directory.
pub fn weakly_canonical(target: &str) -> PathBuf {
    let path = Path::new(target);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    let absolute = lexically_normal(&absolute);

    for ancestor in absolute.ancestors() {
        if let Ok(resolved) = ancestor.canonicalize() {
            let rest = absolute.strip_prefix(ancestor).unwrap_or(Path::new(""));
            return lexically_normal(&resolved.join(rest));
        }
    }

    absolute
}

/// True if the target is written relative to something (no root, or a bare
/// file name).
pub fn is_relative_target(target: &str) -> bool {
    let path = Path::new(target);
    path.is_relative() || path.parent().is_none_or(|p| p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_uri() {
        assert!(is_uri("http://example.com/stream"));
        assert!(is_uri("file:///music/a.mp3"));
        assert!(!is_uri("/music/a.mp3"));
        assert!(!is_uri("C:music"));
    }

    #[test]
    fn test_percent_decode_basic() {
        assert_eq!(percent_decode("/music/My%20Song.mp3"), "/music/My Song.mp3");
        assert_eq!(percent_decode("a%2fb%2Fc"), "a/b/c");
    }

    #[test]
    fn test_percent_decode_leaves_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("50%zz off"), "50%zz off");
        assert_eq!(percent_decode("%4"), "%4");
    }

    #[test]
    fn test_percent_decode_cascades_double_encoding() {
        // Non-standard: %25 decodes to '%', which then joins "41" into 'A'.
        assert_eq!(percent_decode("%2541"), "A");
        assert_eq!(percent_decode("/x/%252520y"), "/x/ y");
    }

    #[test]
    fn test_percent_decode_strips_file_scheme() {
        assert_eq!(percent_decode("file:///music/a%20b.flac"), "/music/a b.flac");
        assert_eq!(percent_decode("file:/music/a.flac"), "/music/a.flac");
    }

    #[test]
    fn test_percent_decode_drops_root_before_parent() {
        let input = format!("{MAIN_SEPARATOR}../a.mp3");
        assert_eq!(percent_decode(&input), "../a.mp3");
    }

    #[test]
    fn test_percent_decode_expands_home() {
        if let Some(home) = dirs::home_dir() {
            let decoded = percent_decode("~/music/a.mp3");
            assert_eq!(decoded, format!("{}/music/a.mp3", home.display()));
        }
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("/music/a b.mp3"), "/music/a%20b.mp3");
        assert_eq!(percent_encode("/x/é"), "/x/%C3%A9");
        assert_eq!(percent_encode("/x/\n"), "/x/%0A");
        assert_eq!(file_uri("/m/a&b.ogg"), "file:///m/a%26b.ogg");
    }

    #[test]
    fn test_abs_path() {
        let base = Path::new("/lists");
        assert_eq!(abs_path(base, "a.mp3"), "/lists/a.mp3");
        assert_eq!(abs_path(base, "./sub/../a.mp3"), "/lists/a.mp3");
        assert_eq!(abs_path(base, "/music/a.mp3"), "/music/a.mp3");
        assert_eq!(abs_path(base, "../music/a.mp3"), "/music/a.mp3");
        assert_eq!(abs_path(base, "http://host/a.mp3"), "http://host/a.mp3");
    }

    #[test]
    fn test_lexically_normal() {
        assert_eq!(lexically_normal(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(lexically_normal(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(lexically_normal(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(lexically_normal(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_lexically_relative() {
        assert_eq!(
            lexically_relative(Path::new("/music/a/b.mp3"), Path::new("/music/lists")),
            Some(PathBuf::from("../a/b.mp3"))
        );
        assert_eq!(
            lexically_relative(Path::new("/music/a.mp3"), Path::new("/music")),
            Some(PathBuf::from("a.mp3"))
        );
        assert_eq!(
            lexically_relative(Path::new("/music"), Path::new("/music")),
            Some(PathBuf::from("."))
        );
        assert_eq!(lexically_relative(Path::new("a.mp3"), Path::new("/music")), None);
    }

    #[test]
    fn test_weakly_canonical_equates_dot_prefix() {
        assert_eq!(weakly_canonical("./a.mp3"), weakly_canonical("a.mp3"));
        assert_eq!(
            weakly_canonical("/no/such/dir/../x.mp3"),
            weakly_canonical("/no/such/x.mp3")
        );
    }

    #[test]
    fn test_weakly_canonical_resolves_existing_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();

        let expected = file.canonicalize().unwrap();
        assert_eq!(weakly_canonical(file.to_str().unwrap()), expected);
    }

    #[test]
    fn test_is_relative_target() {
        assert!(is_relative_target("a.mp3"));
        assert!(is_relative_target("../a.mp3"));
        assert!(!is_relative_target("/music/a.mp3"));
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Pass-through characters survive encode then decode
        #[test]
        fn encode_decode_roundtrip(input in "/[!:/._0-9A-Za-z-]{0,40}") {
            prop_assume!(!input.starts_with("/.."));
            prop_assume!(!input.starts_with("file:/"));
            let encoded = percent_encode(&input);
            prop_assert_eq!(&encoded, &input);
            prop_assert_eq!(percent_decode(&encoded), input);
        }

        /// Arbitrary text decodes back after encoding when it holds no escapes
        #[test]
        fn encode_then_decode_restores_plain_text(input in "/[a-z ]{0,20}[a-z]") {
            prop_assert_eq!(percent_decode(&percent_encode(&input)), input);
        }

        /// Normalizing twice changes nothing
        #[test]
        fn normal_is_idempotent(parts in prop::collection::vec("[a-c]|\\.|\\.\\.", 0..8)) {
            let path = format!("/{}", parts.join("/"));
            let once = lexically_normal(Path::new(&path));
            let twice = lexically_normal(&once);
            prop_assert_eq!(once, twice);
        }

        /// abs_path is a fixed point on its own output
        #[test]
        fn abs_path_is_idempotent(rel in "[a-z]{1,5}(/[a-z]{1,5}){0,3}") {
            let base = Path::new("/base/dir");
            let once = abs_path(base, &rel);
            prop_assert_eq!(abs_path(base, &once), once);
        }
    }
}
