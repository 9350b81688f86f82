//! The content model of a single run.
//!
//! A [`Context`] is created by the pipeline, mutated by sequential steps, read
//! concurrently by the HTML generator and finally frozen into a
//! [`PublishedSite`].

use crate::{
    content::{Index, Item, Page, Section, SitePath, Tag},
    error::{ContentError, StorageError},
    log,
    markdown::MarkdownParser,
    site::Website,
    step::Plugin,
    storage::Storage,
};
use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

/// Mutable state shared by the steps of one pipeline run.
pub struct Context<'a, S: Website> {
    site: &'a S,
    storage: Storage,
    markdown: MarkdownParser,
    index: Index,
    sections: BTreeMap<S::SectionId, Section<S>>,
    pages: BTreeMap<SitePath, Page>,
    /// Union of every section's tags, reset on any section access that may change it.
    all_tags: OnceLock<BTreeSet<Tag>>,
    last_generation_date: Option<DateTime<Utc>>,
    step_name: String,
}

impl<'a, S: Website> Context<'a, S> {
    /// Every declared section starts out empty.
    pub(crate) fn new(site: &'a S, storage: Storage, step_name: impl Into<String>) -> Self {
        let sections = site
            .section_ids()
            .into_iter()
            .map(|id| (id.clone(), Section::new(id)))
            .collect();

        Self {
            site,
            markdown: MarkdownParser::new(site.date_format()),
            last_generation_date: storage.last_generation_date(),
            storage,
            index: Index::default(),
            sections,
            pages: BTreeMap::new(),
            all_tags: OnceLock::new(),
            step_name: step_name.into(),
        }
    }

    pub fn site(&self) -> &'a S {
        self.site
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Timestamp recorded at the end of the previous run, if there was one.
    pub fn last_generation_date(&self) -> Option<DateTime<Utc>> {
        self.last_generation_date
    }

    /// Name of the step currently running.
    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub(crate) fn set_step_name(&mut self, name: &str) {
        name.clone_into(&mut self.step_name);
    }

    // ------------------------------------------------------------------------
    // Index and sections
    // ------------------------------------------------------------------------

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut Index {
        &mut self.index
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section<S>> {
        self.sections.values()
    }

    pub fn section(&self, id: &S::SectionId) -> Option<&Section<S>> {
        self.sections.get(id)
    }

    pub fn section_mut(&mut self, id: &S::SectionId) -> Option<&mut Section<S>> {
        self.all_tags.take();
        self.sections.get_mut(id)
    }

    pub fn mutate_all_sections(&mut self, mut mutation: impl FnMut(&mut Section<S>)) {
        self.all_tags.take();
        self.sections.values_mut().for_each(|section| mutation(section));
    }

    /// Add an item to the section named by its section id.
    pub fn add_item(&mut self, item: Item<S>) -> Result<(), ContentError> {
        let section = self.section_mut(item.section_id()).ok_or_else(|| {
            ContentError::UnknownSection {
                id: item.section_id().to_string(),
            }
        })?;
        section.add_item(item);
        Ok(())
    }

    /// Every tag used by at least one item, computed on first use.
    pub fn all_tags(&self) -> &BTreeSet<Tag> {
        self.all_tags.get_or_init(|| {
            self.sections
                .values()
                .flat_map(|section| section.tags().cloned())
                .collect()
        })
    }

    /// Items carrying `tag` across all sections, newest first.
    pub fn items_tagged(&self, tag: &Tag) -> Vec<&Item<S>> {
        let mut items: Vec<_> = self
            .sections
            .values()
            .flat_map(|section| section.items_tagged(tag))
            .collect();
        items.sort_by(|a, b| b.content.date.cmp(&a.content.date));
        items
    }

    /// Items of every section, sorted with `compare`.
    pub fn all_items(&self, compare: impl FnMut(&&Item<S>, &&Item<S>) -> Ordering) -> Vec<&Item<S>> {
        let mut items: Vec<_> = self
            .sections
            .values()
            .flat_map(|section| section.items())
            .collect();
        items.sort_by(compare);
        items
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    /// Add a page, replacing any page already at its path.
    pub fn add_page(&mut self, page: Page) {
        self.pages.insert(page.path.clone(), page);
    }

    pub fn page(&self, path: &SitePath) -> Option<&Page> {
        self.pages.get(path)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Apply `mutation` to the page at `path`.
    ///
    /// The page is re-keyed when the mutation changes its path. A failed
    /// mutation leaves the page untouched.
    pub fn mutate_page<F>(&mut self, path: &SitePath, mutation: F) -> Result<(), ContentError>
    where
        F: FnOnce(&mut Page) -> anyhow::Result<()>,
    {
        let original = self
            .pages
            .get(path)
            .ok_or_else(|| ContentError::PageNotFound { path: path.clone() })?;

        let mut page = original.clone();
        mutation(&mut page).map_err(|source| ContentError::PageMutationFailed {
            path: path.clone(),
            source: source.into(),
        })?;

        if page.path != *path {
            self.pages.remove(path);
        }
        self.pages.insert(page.path.clone(), page);
        Ok(())
    }

    pub fn mutate_all_pages<F>(&mut self, mutation: F) -> Result<(), ContentError>
    where
        F: Fn(&mut Page) -> anyhow::Result<()>,
    {
        let paths: Vec<SitePath> = self.pages.keys().cloned().collect();
        for path in &paths {
            self.mutate_page(path, &mutation)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Files and caches
    // ------------------------------------------------------------------------

    /// Read a text file relative to the site root.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<String, StorageError> {
        self.storage.read_file(path)
    }

    /// Write a file relative to the output folder.
    pub fn write_output_file(
        &self,
        path: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), StorageError> {
        self.storage.write_output(path, contents)
    }

    pub fn copy_file_to_output(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<(), StorageError> {
        self.storage.copy_file_to_output(source, destination)
    }

    /// Copy a folder into the output, returning the written output paths.
    pub fn copy_folder_to_output(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>, StorageError> {
        self.storage.copy_folder_to_output(source, destination)
    }

    /// Cached value stored by the current step under `name`.
    ///
    /// A missing or unreadable cache reads as `None`.
    pub fn read_cache<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let bytes = self.storage.read_cache(&self.step_name, name)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                log!("cache"; "ignoring unreadable cache `{name}`: {e}");
                None
            }
        }
    }

    pub fn write_cache<T: Serialize>(&self, name: &str, value: &T) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec(value)
            .with_context(|| format!("failed to serialize cache `{name}`"))?;
        self.storage.write_cache(&self.step_name, name, &bytes)?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Markdown and plugins
    // ------------------------------------------------------------------------

    pub fn markdown(&self) -> &MarkdownParser {
        &self.markdown
    }

    pub fn markdown_mut(&mut self) -> &mut MarkdownParser {
        &mut self.markdown
    }

    pub fn install_plugin(&mut self, plugin: &Plugin<S>) -> anyhow::Result<()> {
        log!("plugin"; "installing {}", plugin.name());
        plugin.install(self)
    }

    pub(crate) fn into_published(self) -> PublishedSite<S> {
        PublishedSite {
            index: self.index,
            sections: self.sections,
            pages: self.pages,
        }
    }
}

/// The final content of a successful run.
pub struct PublishedSite<S: Website> {
    pub index: Index,
    pub sections: BTreeMap<S::SectionId, Section<S>>,
    pub pages: BTreeMap<SitePath, Page>,
}

impl<S: Website> PublishedSite<S> {
    pub fn section(&self, id: &S::SectionId) -> Option<&Section<S>> {
        self.sections.get(id)
    }

    pub fn page(&self, path: &SitePath) -> Option<&Page> {
        self.pages.get(path)
    }
}

impl<S: Website> fmt::Debug for PublishedSite<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedSite")
            .field("index", &self.index)
            .field("sections", &self.sections)
            .field("pages", &self.pages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TestSite, context, date, item, item_dated, page};
    use anyhow::bail;
    use tempfile::TempDir;

    #[test]
    fn test_declared_sections_exist_when_empty() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let ctx = context(&site, &dir);

        let ids: Vec<&str> = ctx.sections().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, ["posts", "projects"]);
        assert!(ctx.sections().all(Section::is_empty));
    }

    #[test]
    fn test_add_item_to_undeclared_section() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);

        let result = ctx.add_item(item("drafts", "a", &[]));
        assert!(matches!(result, Err(ContentError::UnknownSection { id }) if id == "drafts"));
    }

    #[test]
    fn test_all_tags_follow_mutations() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);
        ctx.add_item(item("posts", "a", &["A"])).unwrap();
        ctx.add_item(item("projects", "b", &["C"])).unwrap();

        let tags: Vec<&str> = ctx.all_tags().iter().map(Tag::as_str).collect();
        assert_eq!(tags, ["A", "C"]);

        ctx.section_mut(&"posts".into())
            .unwrap()
            .mutate_item(&"a".into(), |item| {
                item.tags = vec![Tag::new("B")];
                Ok(())
            })
            .unwrap();

        let tags: Vec<&str> = ctx.all_tags().iter().map(Tag::as_str).collect();
        assert_eq!(tags, ["B", "C"]);
        assert!(ctx.items_tagged(&Tag::new("A")).is_empty());
        assert_eq!(ctx.items_tagged(&Tag::new("B")).len(), 1);
    }

    #[test]
    fn test_items_tagged_newest_first_across_sections() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);
        ctx.add_item(item_dated("posts", "old", &["rust"], date(2023, 1, 1))).unwrap();
        ctx.add_item(item_dated("projects", "new", &["rust"], date(2024, 1, 1))).unwrap();

        let paths: Vec<String> = ctx
            .items_tagged(&Tag::new("rust"))
            .iter()
            .map(|item| item.absolute_path().to_string())
            .collect();
        assert_eq!(paths, ["projects/new", "posts/old"]);
    }

    #[test]
    fn test_mutate_page_rekeys_on_path_change() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);
        ctx.add_page(page("about", "About"));

        ctx.mutate_page(&"about".into(), |page| {
            page.path = "about-us".into();
            Ok(())
        })
        .unwrap();

        assert!(ctx.page(&"about".into()).is_none());
        assert_eq!(ctx.page(&"about-us".into()).unwrap().content.title, "About");
        assert_eq!(ctx.pages().count(), 1);
    }

    #[test]
    fn test_mutate_page_failure_keeps_page() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);
        ctx.add_page(page("about", "About"));

        let result = ctx.mutate_page(&"about".into(), |page| {
            page.path = "elsewhere".into();
            bail!("invalid page")
        });

        assert!(matches!(result, Err(ContentError::PageMutationFailed { .. })));
        assert!(ctx.page(&"about".into()).is_some());
        assert!(matches!(
            ctx.mutate_page(&"missing".into(), |_| Ok(())),
            Err(ContentError::PageNotFound { .. })
        ));
    }

    #[test]
    fn test_cache_is_scoped_to_current_step() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let mut ctx = context(&site, &dir);

        ctx.set_step_name("First");
        ctx.write_cache("data", &vec![1, 2, 3]).unwrap();
        assert_eq!(ctx.read_cache::<Vec<i32>>("data"), Some(vec![1, 2, 3]));

        ctx.set_step_name("Second");
        assert_eq!(ctx.read_cache::<Vec<i32>>("data"), None);
    }

    #[test]
    fn test_unreadable_cache_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let site = TestSite::default();
        let ctx = context(&site, &dir);
        ctx.storage().write_cache(ctx.step_name(), "data", b"not json").unwrap();

        assert_eq!(ctx.read_cache::<Vec<i32>>("data"), None);
    }
}
