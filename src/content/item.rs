use super::{Content, SitePath, Tag};
use crate::site::Website;
use std::fmt;

/// Per-item overrides used when the item is rendered into a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRssProperties {
    /// Replaces the item URL as GUID.
    pub guid: Option<String>,
    pub title_prefix: Option<String>,
    pub title_suffix: Option<String>,
    pub body_prefix: Option<String>,
    pub body_suffix: Option<String>,
    /// Replaces the item URL as link.
    pub link: Option<String>,
}

/// One piece of indexed content belonging to a section.
///
/// The relative path and section id are fixed at construction, which keeps
/// the item's entry in its section's path index valid for its whole lifetime.
pub struct Item<S: Website> {
    path: SitePath,
    section_id: S::SectionId,
    pub metadata: S::ItemMetadata,
    pub tags: Vec<Tag>,
    pub content: Content,
    pub rss_properties: ItemRssProperties,
}

impl<S: Website> Item<S> {
    pub fn new(
        path: impl Into<SitePath>,
        section_id: S::SectionId,
        metadata: S::ItemMetadata,
        tags: Vec<Tag>,
        content: Content,
    ) -> Self {
        Self {
            path: path.into(),
            section_id,
            metadata,
            tags,
            content,
            rss_properties: ItemRssProperties::default(),
        }
    }

    /// Path relative to the section.
    pub fn path(&self) -> &SitePath {
        &self.path
    }

    pub fn section_id(&self) -> &S::SectionId {
        &self.section_id
    }

    /// `section id + relative path`.
    pub fn absolute_path(&self) -> SitePath {
        SitePath::new(self.section_id.to_string()).join(self.path.as_str())
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    pub fn rss_title(&self) -> String {
        let rss = &self.rss_properties;
        format!(
            "{}{}{}",
            rss.title_prefix.as_deref().unwrap_or_default(),
            self.content.title,
            rss.title_suffix.as_deref().unwrap_or_default()
        )
    }
}

impl<S: Website> Clone for Item<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            section_id: self.section_id.clone(),
            metadata: self.metadata.clone(),
            tags: self.tags.clone(),
            content: self.content.clone(),
            rss_properties: self.rss_properties.clone(),
        }
    }
}

impl<S: Website> fmt::Debug for Item<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("path", &self.path)
            .field("section_id", &self.section_id)
            .field("metadata", &self.metadata)
            .field("tags", &self.tags)
            .field("title", &self.content.title)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::{TestSite, item};

    #[test]
    fn test_absolute_path() {
        let item = item("posts", "hello-world", &[]);
        assert_eq!(item.absolute_path().as_str(), "posts/hello-world");
    }

    #[test]
    fn test_rss_title_affixes() {
        let mut item: crate::Item<TestSite> = item("posts", "a", &[]);
        item.content.title = "Title".into();
        item.rss_properties.title_prefix = Some("[Podcast] ".into());
        item.rss_properties.title_suffix = Some(" (rerun)".into());

        assert_eq!(item.rss_title(), "[Podcast] Title (rerun)");
    }
}
