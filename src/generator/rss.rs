//! RSS feed generation.
//!
//! Collects items across sections, newest first, and renders an RSS 2.0
//! channel. Rendering is skipped when the cached feed is still current (see
//! [`super::feed`]).

use super::feed::{self, FeedOutcome, ItemPredicate, absolute_urls};
use crate::{
    content::{Item, SitePath},
    context::Context,
    site::Website,
};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use educe::Educe;
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::PathBuf};

// ============================================================================
// Configuration
// ============================================================================

/// RSS feed settings. Part of the cache key: any change re-renders the feed.
#[derive(Debug, Clone, PartialEq, Eq, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct RssFeedConfig {
    /// Output path relative to the output folder.
    #[educe(Default = PathBuf::from("feed.rss"))]
    pub target_path: PathBuf,

    /// Minutes readers may cache the feed.
    #[educe(Default = 250)]
    pub ttl_interval: u32,

    #[educe(Default = 100)]
    pub maximum_item_count: usize,
}

// ============================================================================
// Public API
// ============================================================================

/// Write the RSS feed for `sections` (every section when `None`).
///
/// `date` becomes the channel's build date. Without one, the newest item's
/// date is used so unchanged content renders to identical text.
pub fn generate<S: Website>(
    ctx: &Context<'_, S>,
    sections: Option<&BTreeSet<S::SectionId>>,
    predicate: Option<&ItemPredicate<S>>,
    config: &RssFeedConfig,
    date: Option<DateTime<Utc>>,
) -> Result<FeedOutcome> {
    let items = feed::gather_items(
        ctx,
        |item| sections.is_none_or(|sections| sections.contains(item.section_id())),
        predicate,
        config.maximum_item_count,
    );
    feed::write_cached(ctx, config, &config.target_path, &items, || {
        render(ctx, config, &items, date)
    })
}

// ============================================================================
// Rendering
// ============================================================================

fn render<S: Website>(
    ctx: &Context<'_, S>,
    config: &RssFeedConfig,
    items: &[&Item<S>],
    date: Option<DateTime<Utc>>,
) -> Result<String> {
    let site = ctx.site();
    let build_date = date
        .or_else(|| items.first().map(|item| item.content.date))
        .map(|date| date.to_rfc2822());

    let channel = ChannelBuilder::default()
        .title(site.name().to_owned())
        .link(site.url_for(&SitePath::root()))
        .description(site.description().to_owned())
        .language(site.language().to_owned())
        .generator("plume".to_owned())
        .ttl(config.ttl_interval.to_string())
        .last_build_date(build_date.clone())
        .pub_date(build_date)
        .items(items.iter().map(|item| to_rss_item(site, item)).collect::<Vec<_>>())
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

/// Convert an item, applying its RSS overrides.
///
/// The item URL doubles as link and permalink GUID unless overridden.
pub(crate) fn to_rss_item<S: Website>(site: &S, item: &Item<S>) -> rss::Item {
    let url = site.url_for(&item.absolute_path());
    let properties = &item.rss_properties;

    let guid = GuidBuilder::default()
        .permalink(properties.guid.is_none())
        .value(properties.guid.clone().unwrap_or_else(|| url.clone()))
        .build();
    let body = format!(
        "{}{}{}",
        properties.body_prefix.as_deref().unwrap_or_default(),
        absolute_urls(&item.content.body, site.url()),
        properties.body_suffix.as_deref().unwrap_or_default()
    );
    let categories: Vec<_> = item
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.as_str()).build())
        .collect();

    ItemBuilder::default()
        .title(item.rss_title())
        .link(properties.link.clone().unwrap_or(url))
        .guid(guid)
        .description(item.content.description.clone())
        .content(body)
        .pub_date(item.content.date.to_rfc2822())
        .categories(categories)
        .build()
}
