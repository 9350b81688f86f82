//! Plume - a static site build engine.
//!
//! A site is built by running an ordered list of [`Step`]s against a shared
//! [`Context`]: content steps fill typed sections and pages, generation steps
//! write HTML, feeds and a sitemap, and deployment steps publish the output.
//!
//! ```ignore
//! let site = MySite::default();
//! site.publish_with_theme(Theme::foundation(), PublishOptions::default(), None, RunMode::Generation)?;
//! ```

#[macro_use]
pub mod logger;

pub mod cli;
pub mod config;
pub mod configured;
pub mod content;
pub mod context;
pub mod deploy;
pub mod error;
pub mod generator;
pub mod init;
pub mod markdown;
pub mod pipeline;
pub mod site;
pub mod step;
pub mod storage;
pub mod theme;
pub mod utils;

#[cfg(test)]
mod test_helpers;

pub use content::{Audio, Content, Index, Item, ItemRssProperties, Page, Section, SitePath, Tag, Video};
pub use context::{Context, PublishedSite};
pub use deploy::DeploymentMethod;
pub use error::{ContentError, GenerationError, PodcastError, PublishingError, StorageError};
pub use generator::{
    podcast::{PodcastCompatible, PodcastEpisodeMetadata, PodcastFeedConfig},
    rss::RssFeedConfig,
};
pub use pipeline::Pipeline;
pub use site::{HtmlFileMode, PublishOptions, RunMode, TagHtmlConfig, Website};
pub use step::{Plugin, Step, StepKind};
pub use theme::{HtmlFactory, Theme};
