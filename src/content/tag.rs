//! Item tags.

use crate::utils::slug::slugify;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// A tag as written by the author.
///
/// Identity is the URL form ([`Tag::normalized`]): `"Rust"` and `"rust"` are
/// the same tag, and share one tag page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Tag {
    written: String,
    normalized: String,
}

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        let written = tag.into().trim().to_owned();
        let normalized = normalize(&written);
        Self { written, normalized }
    }

    pub fn as_str(&self) -> &str {
        &self.written
    }

    /// URL-safe form, e.g. `"Rust Lang"` → `"rust-lang"`.
    ///
    /// Tags without a single letter or digit (`"++"`) get `tag-` followed by
    /// the hex bytes of their text, so they never map to an empty path.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

fn normalize(written: &str) -> String {
    let slug = slugify(written);
    if !slug.is_empty() {
        return slug;
    }
    let hex: String = written.bytes().map(|b| format!("{b:02x}")).collect();
    format!("tag-{hex}")
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl From<&str> for Tag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for Tag {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.written
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_case_variants_are_one_tag() {
        let tags: BTreeSet<Tag> = ["Rust", "rust", " RUST "].into_iter().map(Tag::new).collect();

        assert_eq!(tags.len(), 1);
        assert_eq!(Tag::new("Rust"), Tag::new("rust"));
        assert_eq!(Tag::new("Rust Lang").normalized(), "rust-lang");
    }

    #[test]
    fn test_written_form_is_kept() {
        let tag = Tag::new("  Static Sites ");
        assert_eq!(tag.as_str(), "Static Sites");
        assert_eq!(tag.to_string(), "Static Sites");
    }

    #[test]
    fn test_symbol_only_tag_gets_fallback_slug() {
        let symbols = Tag::new("++");
        assert_eq!(symbols.normalized(), "tag-2b2b");
        assert_ne!(symbols, Tag::new("C++"));
        assert_ne!(symbols, Tag::new("--"));
    }

    #[test]
    fn test_serializes_written_form() {
        let json = serde_json::to_string(&Tag::new("Rust Lang")).unwrap();
        assert_eq!(json, "\"Rust Lang\"");

        let tag: Tag = serde_json::from_str("\"Swift\"").unwrap();
        assert_eq!(tag.as_str(), "Swift");
        assert_eq!(tag.normalized(), "swift");
    }
}
