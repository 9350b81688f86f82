//! A [`Website`] described entirely by `plume.toml`.
//!
//! Sections are plain strings and item metadata is the raw front matter, so
//! any folder layout works without writing Rust.

use crate::{
    config::{Provider, SiteConfig},
    content::SitePath,
    context::PublishedSite,
    deploy::DeploymentMethod,
    error::PublishingError,
    pipeline::Pipeline,
    site::{PublishOptions, RunMode, TagHtmlConfig, Website, default_steps},
    theme::Theme,
};
use std::collections::BTreeMap;

pub struct ConfiguredSite {
    config: SiteConfig,
}

impl ConfiguredSite {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Default pipeline options derived from `[build]` and `[deploy]`.
    pub fn publish_options(&self) -> PublishOptions<Self> {
        let build = &self.config.build;
        PublishOptions {
            resources_folder: Some(build.resources.clone()),
            content_folder: build.content.clone(),
            file_mode: build.file_mode,
            rss: build.rss.feed_config(),
            sitemap_excluded_paths: build.sitemap.excluded_paths(),
            deployment: self.deployment(),
            ..PublishOptions::default()
        }
    }

    pub fn deployment(&self) -> Option<DeploymentMethod<Self>> {
        let deploy = &self.config.deploy;
        match deploy.provider {
            Provider::None => None,
            Provider::Git => Some(DeploymentMethod::git(&deploy.remote, &deploy.branch)),
            Provider::Github => Some(DeploymentMethod::github(&deploy.remote, deploy.use_ssh)),
        }
    }

    /// Run the default pipeline with the built-in theme.
    pub fn publish_configured(&self, mode: RunMode) -> Result<PublishedSite<Self>, PublishingError> {
        Pipeline::new(default_steps(Theme::foundation(), self.publish_options()))
            .with_output_folder(&self.config.build.output)
            .execute(self, Some(&self.config.root), mode)
    }
}

impl Website for ConfiguredSite {
    type SectionId = String;
    type ItemMetadata = BTreeMap<String, String>;

    fn name(&self) -> &str {
        &self.config.site.name
    }

    fn description(&self) -> &str {
        &self.config.site.description
    }

    fn url(&self) -> &str {
        &self.config.site.url
    }

    fn language(&self) -> &str {
        &self.config.site.language
    }

    fn image_path(&self) -> Option<SitePath> {
        self.config.site.image.as_deref().map(SitePath::new)
    }

    fn date_format(&self) -> &str {
        &self.config.build.date_format
    }

    fn section_ids(&self) -> Vec<String> {
        self.config
            .build
            .sections
            .iter()
            .map(|id| id.trim_matches('/').to_owned())
            .collect()
    }

    fn tag_html_config(&self) -> Option<TagHtmlConfig> {
        self.config.build.tags.html_config()
    }
}
