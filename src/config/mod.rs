//! Site configuration management for `plume.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[site]`    | Site metadata (name, description, url)           |
//! | `[build]`   | Folders, sections, RSS, sitemap and tag pages    |
//! | `[deploy]`  | Deployment target (git remote or GitHub)         |
//!
//! # Example
//!
//! ```toml
//! [site]
//! name = "My Blog"
//! url = "https://example.com"
//!
//! [build]
//! sections = ["posts"]
//!
//! [build.rss]
//! maximum_item_count = 20
//!
//! [deploy]
//! provider = "github"
//! remote = "alice/blog"
//! ```

mod build;
pub mod defaults;
mod deploy;
mod error;
mod site;

pub use build::{BuildConfig, RssConfig, SitemapConfig, TagsConfig};
pub use deploy::{DeployConfig, Provider};
pub use error::ConfigError;
pub use site::SiteSection;

use crate::{
    cli::{Cli, Commands},
    storage::{INTERNAL_FOLDER, output_overlaps},
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, looked up in the site root.
pub const CONFIG_FILE: &str = "plume.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing plume.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute site root (set by [`SiteConfig::update_with_cli`])
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set by [`SiteConfig::update_with_cli`])
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub site: SiteSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Deployment settings
    #[serde(default)]
    pub deploy: DeployConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Resolve the root and apply CLI overrides.
    ///
    /// `new NAME` roots the site at `<root>/NAME`. Folders from the config
    /// stay relative to the root.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = match &cli.command {
            Commands::New { name: Some(name) } => base.join(name),
            _ => base,
        };

        self.root = Self::normalize_path(&root);
        self.config_path = Self::normalize_path(&self.root.join(&cli.config));

        if let Some(output) = &cli.output {
            self.build.output = output.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Check values the pipeline cannot recover from.
    pub fn validate(&self) -> Result<()> {
        let url = &self.site.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!(ConfigError::Validation(
                "[site.url] must start with http:// or https://".into()
            ));
        }

        if self.build.sections.iter().any(|s| s.trim_matches('/').is_empty()) {
            bail!(ConfigError::Validation(
                "[build.sections] must not contain empty names".into()
            ));
        }

        let output = self.root.join(&self.build.output);
        let content = self.root.join(&self.build.content);
        let internal = self.root.join(INTERNAL_FOLDER);
        if output_overlaps(&self.root, &output, &[&content, &internal]) {
            bail!(ConfigError::Validation(
                "[build.output] must not be the site root or contain the content folder".into()
            ));
        }

        if self.deploy.provider != Provider::None && self.deploy.remote.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[deploy.remote] is required when [deploy.provider] is set".into()
            ));
        }

        if self.deploy.provider == Provider::Github && self.deploy.remote.split('/').count() != 2
        {
            bail!(ConfigError::Validation(
                "[deploy.remote] must be `owner/name` for the github provider".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
