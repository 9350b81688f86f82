use std::collections::BTreeMap;

const FENCE: &str = "---";

/// Split a document into its front matter entries and the remaining body.
///
/// Front matter is an optional block of `key: value` lines between two `---`
/// lines at the very top. Surrounding quotes are stripped from values; lines
/// without a colon and `#` comments are ignored. An unterminated block is
/// treated as body text.
pub fn split_front_matter(text: &str) -> (BTreeMap<String, String>, &str) {
    let mut entries = BTreeMap::new();
    let text = text.trim_start_matches('\u{feff}');

    let Some(rest) = text
        .strip_prefix(FENCE)
        .and_then(|rest| rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')))
    else {
        return (entries, text);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim();
        if line == FENCE {
            return (entries, &rest[offset..]);
        }
        if line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            entries.insert(key.trim().to_owned(), unquote(value.trim()).to_owned());
        }
    }

    (BTreeMap::new(), text)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_front_matter() {
        let text = "---\ntitle: \"Hello: world\"\ntags: a, b\n# note\naudio.url: 'x.mp3'\n---\n# Body\n";
        let (entries, body) = split_front_matter(text);

        assert_eq!(entries["title"], "Hello: world");
        assert_eq!(entries["tags"], "a, b");
        assert_eq!(entries["audio.url"], "x.mp3");
        assert_eq!(entries.len(), 3);
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn test_no_front_matter() {
        let (entries, body) = split_front_matter("# Just text\n---\n");
        assert!(entries.is_empty());
        assert_eq!(body, "# Just text\n---\n");
    }

    #[test]
    fn test_unterminated_front_matter_is_body() {
        let text = "---\ntitle: x\nno end";
        let (entries, body) = split_front_matter(text);
        assert!(entries.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn test_crlf_line_endings() {
        let (entries, body) = split_front_matter("---\r\ntitle: x\r\n---\r\nbody");
        assert_eq!(entries["title"], "x");
        assert_eq!(body, "body");
    }
}
