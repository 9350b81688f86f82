//! Slugs and file-name sanitization.

/// Characters forbidden in generated file names
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '/', '(', ')', '[', ']', '\t', '\r', '\n',
];

/// Convert text to a lowercase ASCII slug.
///
/// Non-ASCII text is transliterated (`"Café Crème"` → `"cafe-creme"`), runs of
/// anything that is not alphanumeric collapse into a single `-`.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_ascii_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Remove forbidden characters and replace whitespace with underscores.
///
/// Used to turn step names into cache folder names.
pub fn sanitize_file_name(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Rust Lang"), "rust-lang");
        assert_eq!(slugify("  swift  "), "swift");
        assert_eq!(slugify("C++ / Systems"), "c-systems");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café Crème"), "cafe-creme");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_sanitize_file_name_replaces_whitespace() {
        assert_eq!(sanitize_file_name("Generate RSS feed"), "Generate_RSS_feed");
        assert_eq!(sanitize_file_name("  trimmed  "), "trimmed");
    }

    #[test]
    fn test_sanitize_file_name_removes_forbidden_chars() {
        assert_eq!(sanitize_file_name("a<b>c:d|e?f*g#h\\i/j"), "abcdefghij");
        assert_eq!(sanitize_file_name("Copy (theme) [files]"), "Copy_theme_files");
    }

    #[test]
    fn test_sanitize_file_name_preserves_unicode() {
        assert_eq!(sanitize_file_name("生成"), "生成");
    }
}
