//! The site collaborator.
//!
//! A [`Website`] is caller-supplied configuration: base URL, the enumeration
//! of section ids, and the shape of per-item metadata. The engine consumes it
//! but never owns or mutates it.

use crate::{
    content::{SitePath, Tag},
    context::PublishedSite,
    deploy::DeploymentMethod,
    error::PublishingError,
    generator::rss::RssFeedConfig,
    markdown::DEFAULT_DATE_FORMAT,
    pipeline::Pipeline,
    step::{Plugin, Step},
    theme::Theme,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fmt,
    hash::Hash,
    path::{Path, PathBuf},
};

/// Identifier of a section. Its `Display` form is the section's path.
pub trait SectionId: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> SectionId for T where T: Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Typed per-item metadata, decoded from front matter.
pub trait ItemMetadata: DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> ItemMetadata for T where T: DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static {}

/// Which category of steps is runnable for an invocation.
///
/// Decided once by the caller (the CLI maps `deploy` to [`RunMode::Deployment`])
/// and threaded into [`Pipeline::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Generation,
    Deployment,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generation => "generation",
            Self::Deployment => "deployment",
        })
    }
}

/// How a rendered location maps to an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlFileMode {
    /// `path/index.html`
    #[default]
    Folders,
    /// `path.html`
    Standalone,
}

impl HtmlFileMode {
    /// Output file (relative to the output folder) for a location.
    ///
    /// The root location is always `index.html`.
    pub fn output_path(self, path: &SitePath) -> PathBuf {
        if path.is_root() {
            return PathBuf::from("index.html");
        }
        match self {
            Self::Folders => Path::new(path.as_str()).join("index.html"),
            Self::Standalone => PathBuf::from(format!("{path}.html")),
        }
    }
}

/// Where tag pages live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHtmlConfig {
    pub base_path: SitePath,
}

impl Default for TagHtmlConfig {
    fn default() -> Self {
        Self {
            base_path: SitePath::from("tags"),
        }
    }
}

impl TagHtmlConfig {
    pub fn list_path(&self) -> &SitePath {
        &self.base_path
    }

    pub fn details_path(&self, tag: &Tag) -> SitePath {
        self.base_path.join(tag.normalized())
    }
}

/// Options for [`Website::publish_with_theme`].
pub struct PublishOptions<S: Website> {
    /// Theme-independent resources copied verbatim into the output.
    pub resources_folder: Option<PathBuf>,
    /// Markdown content folder, relative to the root.
    pub content_folder: PathBuf,
    pub file_mode: HtmlFileMode,
    pub rss: Option<RssFeedConfig>,
    pub sitemap_excluded_paths: Vec<SitePath>,
    pub plugins: Vec<Plugin<S>>,
    /// Run after content is loaded and sorted, before any output is generated.
    pub additional_steps: Vec<Step<S>>,
    pub deployment: Option<DeploymentMethod<S>>,
}

impl<S: Website> Default for PublishOptions<S> {
    fn default() -> Self {
        Self {
            resources_folder: Some(PathBuf::from("resources")),
            content_folder: PathBuf::from("content"),
            file_mode: HtmlFileMode::default(),
            rss: Some(RssFeedConfig::default()),
            sitemap_excluded_paths: Vec::new(),
            plugins: Vec::new(),
            additional_steps: Vec::new(),
            deployment: None,
        }
    }
}

/// A statically generated website.
pub trait Website: Sized + Send + Sync + 'static {
    type SectionId: SectionId;
    type ItemMetadata: ItemMetadata;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Absolute base URL, e.g. `https://example.com`.
    fn url(&self) -> &str;

    fn language(&self) -> &str {
        "en"
    }

    fn image_path(&self) -> Option<SitePath> {
        None
    }

    /// `chrono` format of front matter dates.
    fn date_format(&self) -> &str {
        DEFAULT_DATE_FORMAT
    }

    /// Every declared section. Each gets an (initially empty) section in the context.
    fn section_ids(&self) -> Vec<Self::SectionId>;

    /// `None` disables tag list and tag detail pages.
    fn tag_html_config(&self) -> Option<TagHtmlConfig> {
        Some(TagHtmlConfig::default())
    }

    fn url_for(&self, path: &SitePath) -> String {
        path.url(self.url())
    }

    /// Run a custom list of steps.
    fn publish(
        &self,
        steps: Vec<Step<Self>>,
        root: Option<&Path>,
        mode: RunMode,
    ) -> Result<PublishedSite<Self>, PublishingError> {
        Pipeline::new(steps).execute(self, root, mode)
    }

    /// Run the default pipeline with a theme.
    fn publish_with_theme(
        &self,
        theme: Theme<Self>,
        options: PublishOptions<Self>,
        root: Option<&Path>,
        mode: RunMode,
    ) -> Result<PublishedSite<Self>, PublishingError> {
        self.publish(default_steps(theme, options), root, mode)
    }
}

/// The default pipeline used by [`Website::publish_with_theme`].
pub fn default_steps<S: Website>(theme: Theme<S>, options: PublishOptions<S>) -> Vec<Step<S>> {
    let PublishOptions {
        resources_folder,
        content_folder,
        file_mode,
        rss,
        sitemap_excluded_paths,
        plugins,
        additional_steps,
        deployment,
    } = options;

    let mut steps = vec![
        Step::unwrap(resources_folder, |folder| {
            Step::optional(Step::copy_resources(folder))
        }),
        Step::add_markdown_files(content_folder),
    ];
    steps.extend(plugins.into_iter().map(Step::install_plugin));
    steps.push(Step::sort_items(None, |a, b| b.content.date.cmp(&a.content.date)));
    steps.extend(additional_steps);
    steps.push(Step::generate_html(theme, file_mode));
    steps.push(Step::unwrap(rss, |config| {
        Step::generate_rss_feed(None, None, config, None)
    }));
    steps.push(Step::generate_site_map(sitemap_excluded_paths));
    steps.push(Step::unwrap(deployment, Step::deploy));
    steps
}
