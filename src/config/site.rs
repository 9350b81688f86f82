//! `[site]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in plume.toml - what the site is called and where it lives.
///
/// # Example
/// ```toml
/// [site]
/// name = "My Blog"
/// description = "Notes on Rust"
/// url = "https://myblog.com"
/// language = "en-GB"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    #[serde(default = "defaults::site::name")]
    #[educe(Default = defaults::site::name())]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Base URL for canonical links, feeds and the sitemap.
    #[serde(default = "defaults::site::url")]
    #[educe(Default = defaults::site::url())]
    pub url: String,

    /// BCP 47 language code.
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,

    /// Site-wide image, relative to the site root.
    #[serde(default)]
    pub image: Option<String>,
}
