//! Shared test fixtures.

use crate::{
    content::{Content, Item, Page, Tag},
    context::Context,
    generator::podcast::{PodcastCompatible, PodcastEpisodeMetadata},
    site::Website,
    storage::{DEFAULT_OUTPUT_FOLDER, Storage},
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestMetadata {
    pub podcast: Option<PodcastEpisodeMetadata>,
}

impl PodcastCompatible for TestMetadata {
    fn podcast(&self) -> Option<&PodcastEpisodeMetadata> {
        self.podcast.as_ref()
    }
}

/// Two sections, `posts` and `projects`.
#[derive(Debug, Default)]
pub struct TestSite;

impl Website for TestSite {
    type SectionId = String;
    type ItemMetadata = TestMetadata;

    fn name(&self) -> &str {
        "Test Site"
    }

    fn description(&self) -> &str {
        "A site used in tests"
    }

    fn url(&self) -> &str {
        "https://example.com"
    }

    fn section_ids(&self) -> Vec<String> {
        vec!["posts".into(), "projects".into()]
    }
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Item dated 2024-01-01, titled after its path.
pub fn item(section: &str, path: &str, tags: &[&str]) -> Item<TestSite> {
    item_dated(section, path, tags, date(2024, 1, 1))
}

/// Item whose date and modification date are both `date`.
pub fn item_dated(section: &str, path: &str, tags: &[&str], date: DateTime<Utc>) -> Item<TestSite> {
    let content = Content {
        title: path.to_owned(),
        description: format!("About {path}"),
        body: format!("<p>{path}</p>"),
        date,
        last_modified: date,
        ..Content::default()
    };
    Item::new(
        path,
        section.to_owned(),
        TestMetadata::default(),
        tags.iter().copied().map(Tag::new).collect(),
        content,
    )
}

pub fn page(path: &str, title: &str) -> Page {
    let mut content = Content::new(title, format!("<p>{title}</p>"));
    content.date = date(2024, 1, 1);
    content.last_modified = date(2024, 1, 1);
    Page::new(path, content)
}

pub fn context<'a>(site: &'a TestSite, dir: &TempDir) -> Context<'a, TestSite> {
    let storage = Storage::new(dir.path(), DEFAULT_OUTPUT_FOLDER);
    Context::new(site, storage, "Test step")
}
