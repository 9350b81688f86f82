//! `[build]` section configuration.

use super::defaults;
use crate::{
    content::SitePath,
    generator::rss::RssFeedConfig,
    site::{HtmlFileMode, TagHtmlConfig},
};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in plume.toml - inputs, outputs and generated extras.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// output = "public"
/// sections = ["posts", "notes"]
/// file_mode = "standalone"
///
/// [build.rss]
/// maximum_item_count = 20
///
/// [build.sitemap]
/// excluded = ["drafts"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Markdown sources.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Copied verbatim into the output when present.
    #[serde(default = "defaults::build::resources")]
    #[educe(Default = defaults::build::resources())]
    pub resources: PathBuf,

    /// Folders of `content` holding items rather than pages.
    #[serde(default = "defaults::build::sections")]
    #[educe(Default = defaults::build::sections())]
    pub sections: Vec<String>,

    pub file_mode: HtmlFileMode,

    /// `chrono` format of front matter dates.
    #[serde(default = "defaults::build::date_format")]
    #[educe(Default = defaults::build::date_format())]
    pub date_format: String,

    pub rss: RssConfig,

    pub sitemap: SitemapConfig,

    pub tags: TagsConfig,
}

/// `[build.rss]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RssConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    #[educe(Default = RssFeedConfig::default().target_path)]
    pub path: PathBuf,

    #[educe(Default = RssFeedConfig::default().ttl_interval)]
    pub ttl_interval: u32,

    #[educe(Default = RssFeedConfig::default().maximum_item_count)]
    pub maximum_item_count: usize,
}

impl RssConfig {
    /// Feed settings, or `None` when the feed is disabled.
    pub fn feed_config(&self) -> Option<RssFeedConfig> {
        self.enable.then(|| RssFeedConfig {
            target_path: self.path.clone(),
            ttl_interval: self.ttl_interval,
            maximum_item_count: self.maximum_item_count,
        })
    }
}

/// `[build.sitemap]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// Path prefixes left out of the sitemap.
    pub excluded: Vec<String>,
}

impl SitemapConfig {
    pub fn excluded_paths(&self) -> Vec<SitePath> {
        self.excluded.iter().map(SitePath::new).collect()
    }
}

/// `[build.tags]`
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct TagsConfig {
    /// Render the tag list and one page per tag.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    #[serde(default = "defaults::build::tags::path")]
    #[educe(Default = defaults::build::tags::path())]
    pub path: String,
}

impl TagsConfig {
    pub fn html_config(&self) -> Option<TagHtmlConfig> {
        self.enable.then(|| TagHtmlConfig {
            base_path: SitePath::new(&self.path),
        })
    }
}
