//! Podcast feed generation.
//!
//! An RSS channel with iTunes extensions over the items of one section. Every
//! episode must carry audio with a known duration and byte size; an item
//! missing any of them fails the step before anything is rendered.

use super::{
    feed::{self, FeedOutcome, ItemPredicate},
    rss::to_rss_item,
};
use crate::{
    content::{Item, SitePath},
    context::Context,
    error::PodcastError,
    site::Website,
};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use educe::Educe;
use rss::{
    ChannelBuilder, EnclosureBuilder,
    extension::itunes::{
        ITunesCategoryBuilder, ITunesChannelExtensionBuilder, ITunesItemExtensionBuilder,
        ITunesOwnerBuilder,
    },
    validation::Validate,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Metadata
// ============================================================================

/// Item metadata types usable in a podcast feed.
pub trait PodcastCompatible {
    /// Episode details, or `None` when the item has no `podcast.*` metadata.
    fn podcast(&self) -> Option<&PodcastEpisodeMetadata>;
}

/// Per-episode details, decoded from `podcast.*` front matter keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PodcastEpisodeMetadata {
    pub episode: Option<u32>,
    pub season: Option<u32>,
    pub explicit: Option<bool>,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PodcastAuthor {
    pub name: String,
    pub email: String,
}

/// Podcast feed settings. Part of the cache key: any change re-renders the feed.
#[derive(Debug, Clone, PartialEq, Eq, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct PodcastFeedConfig {
    #[educe(Default = PathBuf::from("podcast.rss"))]
    pub target_path: PathBuf,

    #[educe(Default = 250)]
    pub ttl_interval: u32,

    #[educe(Default = 100)]
    pub maximum_item_count: usize,

    /// Cover art, absolute or relative to the site root.
    pub image_url: String,
    pub copyright: String,
    pub author: PodcastAuthor,
    pub subtitle: String,
    /// Falls back to the site description.
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub explicit: bool,
    pub new_feed_url: Option<String>,
}

// ============================================================================
// Public API
// ============================================================================

/// Write the podcast feed for `section`.
pub fn generate<S>(
    ctx: &Context<'_, S>,
    section: &S::SectionId,
    predicate: Option<&ItemPredicate<S>>,
    config: &PodcastFeedConfig,
    date: Option<DateTime<Utc>>,
) -> Result<FeedOutcome>
where
    S: Website,
    S::ItemMetadata: PodcastCompatible,
{
    let items = feed::gather_items(
        ctx,
        |item| item.section_id() == section,
        predicate,
        config.maximum_item_count,
    );
    for item in &items {
        check_episode(item)?;
    }
    feed::write_cached(ctx, config, &config.target_path, &items, || {
        render(ctx, config, &items, date)
    })
}

/// Fail on the first missing piece an episode cannot go without.
fn check_episode<S>(item: &Item<S>) -> Result<(), PodcastError>
where
    S: Website,
    S::ItemMetadata: PodcastCompatible,
{
    let path = item.absolute_path();
    let audio = item
        .content
        .audio
        .as_ref()
        .ok_or_else(|| PodcastError::MissingAudio { path: path.clone() })?;
    if audio.duration.is_none() {
        return Err(PodcastError::MissingAudioDuration { path });
    }
    if audio.byte_size.is_none() {
        return Err(PodcastError::MissingAudioSize { path });
    }
    if item.metadata.podcast().is_none() {
        return Err(PodcastError::MissingMetadata { path });
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

fn absolute(site: &impl Website, url: &str) -> String {
    if url.starts_with('/') {
        site.url_for(&SitePath::new(url))
    } else {
        url.to_owned()
    }
}

fn render<S>(
    ctx: &Context<'_, S>,
    config: &PodcastFeedConfig,
    items: &[&Item<S>],
    date: Option<DateTime<Utc>>,
) -> Result<String>
where
    S: Website,
    S::ItemMetadata: PodcastCompatible,
{
    let site = ctx.site();
    let build_date = date
        .or_else(|| items.first().map(|item| item.content.date))
        .map(|date| date.to_rfc2822());
    let description = config
        .description
        .clone()
        .unwrap_or_else(|| site.description().to_owned());

    let subcategory = config
        .subcategory
        .as_ref()
        .map(|name| Box::new(ITunesCategoryBuilder::default().text(name.as_str()).build()));
    let category = ITunesCategoryBuilder::default()
        .text(config.category.as_str())
        .subcategory(subcategory)
        .build();
    let owner = ITunesOwnerBuilder::default()
        .name(config.author.name.clone())
        .email(config.author.email.clone())
        .build();
    let itunes = ITunesChannelExtensionBuilder::default()
        .author(config.author.name.clone())
        .owner(owner)
        .image(absolute(site, &config.image_url))
        .categories(vec![category])
        .explicit(config.explicit.to_string())
        .subtitle(config.subtitle.clone())
        .summary(description.clone())
        .new_feed_url(config.new_feed_url.clone())
        .build();

    let episodes = items
        .iter()
        .map(|item| to_episode(site, config, item))
        .collect::<Result<Vec<_>, _>>()?;

    let channel = ChannelBuilder::default()
        .title(site.name().to_owned())
        .link(site.url_for(&SitePath::root()))
        .description(description)
        .language(site.language().to_owned())
        .copyright(config.copyright.clone())
        .generator("plume".to_owned())
        .ttl(config.ttl_interval.to_string())
        .last_build_date(build_date.clone())
        .pub_date(build_date)
        .itunes_ext(itunes)
        .items(episodes)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("podcast feed validation failed: {e}"))?;
    Ok(channel.to_string())
}

fn to_episode<S>(
    site: &S,
    config: &PodcastFeedConfig,
    item: &Item<S>,
) -> Result<rss::Item, PodcastError>
where
    S: Website,
    S::ItemMetadata: PodcastCompatible,
{
    let path = item.absolute_path();
    let audio = item
        .content
        .audio
        .as_ref()
        .ok_or_else(|| PodcastError::MissingAudio { path: path.clone() })?;
    let duration = audio
        .duration_string()
        .ok_or_else(|| PodcastError::MissingAudioDuration { path: path.clone() })?;
    let size = audio
        .byte_size
        .ok_or_else(|| PodcastError::MissingAudioSize { path: path.clone() })?;
    let episode = item
        .metadata
        .podcast()
        .ok_or(PodcastError::MissingMetadata { path })?;

    let enclosure = EnclosureBuilder::default()
        .url(absolute(site, &audio.url))
        .length(size.to_string())
        .mime_type(audio.format.clone())
        .build();
    let image = item
        .content
        .image_path
        .as_ref()
        .map(|image| site.url_for(image));
    let itunes = ITunesItemExtensionBuilder::default()
        .author(config.author.name.clone())
        .summary(item.content.description.clone())
        .duration(duration)
        .image(image)
        .explicit(episode.explicit.unwrap_or(config.explicit).to_string())
        .episode(episode.episode.map(|number| number.to_string()))
        .season(episode.season.map(|number| number.to_string()))
        .build();

    let mut rss_item = to_rss_item(site, item);
    rss_item.set_enclosure(enclosure);
    rss_item.set_itunes_ext(itunes);
    Ok(rss_item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content::Audio,
        test_helpers::{TestSite, context, date, item},
    };
    use std::time::Duration;
    use tempfile::TempDir;

    fn episode(path: &str) -> Item<TestSite> {
        let mut item = item("posts", path, &[]);
        item.content.audio = Some(Audio {
            url: format!("/audio/{path}.mp3"),
            format: "audio/mpeg".into(),
            duration: Some(Duration::from_secs(3725)),
            byte_size: Some(1024),
        });
        item.metadata.podcast = Some(PodcastEpisodeMetadata {
            episode: Some(7),
            ..PodcastEpisodeMetadata::default()
        });
        item
    }

    fn config() -> PodcastFeedConfig {
        PodcastFeedConfig {
            image_url: "/cover.png".into(),
            copyright: "Copyright Test".into(),
            author: PodcastAuthor {
                name: "Tester".into(),
                email: "tester@example.com".into(),
            },
            category: "Technology".into(),
            ..PodcastFeedConfig::default()
        }
    }

    #[test]
    fn test_feed_contents() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let mut ctx = context(&site, &dir);
        ctx.add_item(episode("one")).unwrap();

        let outcome = generate(&ctx, &"posts".into(), None, &config(), None).unwrap();
        assert_eq!(outcome, FeedOutcome::Rendered);

        let xml = std::fs::read_to_string(dir.path().join("public/podcast.rss")).unwrap();
        assert!(xml.contains("xmlns:itunes"));
        assert!(xml.contains(r#"url="https://example.com/audio/one.mp3""#));
        assert!(xml.contains(r#"length="1024""#));
        assert!(xml.contains("<itunes:duration>01:02:05</itunes:duration>"));
        assert!(xml.contains("<itunes:episode>7</itunes:episode>"));
        assert!(xml.contains("https://example.com/cover.png"));
    }

    #[test]
    fn test_missing_audio_fails_fast() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let mut ctx = context(&site, &dir);
        ctx.add_item(item("posts", "silent", &[])).unwrap();

        let error = generate(&ctx, &"posts".into(), None, &config(), None).unwrap_err();

        match error.downcast_ref::<PodcastError>() {
            Some(PodcastError::MissingAudio { path }) => assert_eq!(path.as_str(), "posts/silent"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.path().join("public/podcast.rss").exists());
    }

    #[test]
    fn test_missing_duration_and_size() {
        let mut no_duration = episode("a");
        if let Some(audio) = &mut no_duration.content.audio {
            audio.duration = None;
        }
        assert!(matches!(
            check_episode(&no_duration),
            Err(PodcastError::MissingAudioDuration { .. })
        ));

        let mut no_size = episode("b");
        if let Some(audio) = &mut no_size.content.audio {
            audio.byte_size = None;
        }
        assert!(matches!(
            check_episode(&no_size),
            Err(PodcastError::MissingAudioSize { .. })
        ));
    }

    #[test]
    fn test_missing_episode_metadata() {
        let mut bare = episode("a");
        bare.metadata.podcast = None;
        assert!(matches!(
            check_episode(&bare),
            Err(PodcastError::MissingMetadata { .. })
        ));
    }

    #[test]
    fn test_other_sections_are_ignored() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let mut ctx = context(&site, &dir);
        ctx.add_item(episode("one")).unwrap();
        ctx.add_item(item("projects", "no-audio", &[])).unwrap();

        generate(&ctx, &"posts".into(), None, &config(), None).unwrap();
    }

    #[test]
    fn test_unchanged_feed_is_reused() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let run = || {
            let mut ctx = context(&site, &dir);
            ctx.add_item(episode("one")).unwrap();
            let outcome = generate(&ctx, &"posts".into(), None, &config(), None).unwrap();
            ctx.storage().record_generation_date(date(2024, 6, 1)).unwrap();
            outcome
        };

        assert_eq!(run(), FeedOutcome::Rendered);
        assert_eq!(run(), FeedOutcome::Reused);
    }
}
