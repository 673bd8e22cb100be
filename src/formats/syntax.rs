//! Small text helpers shared by the line-based formats (M3U, PLS, CUE).

/// Wrap `value` in double quotes, escaping `"` and `\` with a backslash.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Read one value written by [`quote`], or a bare word.
///
/// Leading whitespace is skipped. A quoted value runs to the closing quote
/// (or the end of input if there is none) with backslash escapes removed;
/// an unquoted value stops at the first whitespace.
pub fn unquote(input: &str) -> String {
    let input = input.trim_start();
    let Some(rest) = input.strip_prefix('"') else {
        return input.split_whitespace().next().unwrap_or("").to_string();
    };

    let mut out = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Split at the first `delim`. `None` if it is missing or starts the line.
pub fn split_key_value(line: &str, delim: char) -> Option<(&str, &str)> {
    match line.find(delim) {
        Some(0) | None => None,
        Some(pos) => Some((&line[..pos], &line[pos + delim.len_utf8()..])),
    }
}

/// Byte offset of the first `needle` outside double quotes.
pub fn find_unquoted(line: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == needle && !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on whitespace that is not inside double quotes.
pub fn split_words(line: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => {
                in_quotes = !in_quotes;
                start.get_or_insert(i);
            }
            c if c.is_whitespace() && !in_quotes => {
                if let Some(s) = start.take() {
                    words.push(&line[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        words.push(&line[s..]);
    }
    words
}

/// Whole seconds for a millisecond duration, rounded up.
pub fn ceil_secs(millis: u64) -> u64 {
    millis.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_unquote() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(unquote(r#""say \"hi\"""#), r#"say "hi""#);
        assert_eq!(unquote(r#"  "a b" WAVE"#), "a b");
        assert_eq!(unquote("word rest"), "word");
        assert_eq!(unquote(r#""unterminated"#), "unterminated");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("File1=/a.mp3", '='), Some(("File1", "/a.mp3")));
        assert_eq!(split_key_value("k=a=b", '='), Some(("k", "a=b")));
        assert_eq!(split_key_value("=x", '='), None);
        assert_eq!(split_key_value("nothing", '='), None);
    }

    #[test]
    fn test_find_unquoted() {
        assert_eq!(find_unquoted(r#"10 title="a, b",A - B"#, ','), Some(15));
        assert_eq!(find_unquoted("10", ','), None);
    }

    #[test]
    fn test_split_words_keeps_quoted_spaces() {
        let words = split_words(r#"album="Dark Side" artist=Pink   track="3""#);
        assert_eq!(words, vec![r#"album="Dark Side""#, "artist=Pink", r#"track="3""#]);
    }

    #[test]
    fn test_ceil_secs() {
        assert_eq!(ceil_secs(0), 0);
        assert_eq!(ceil_secs(1), 1);
        assert_eq!(ceil_secs(1000), 1);
        assert_eq!(ceil_secs(1001), 2);
    }
}
