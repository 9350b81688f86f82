//! Pieces shared by the RSS and podcast feeds.
//!
//! # Incremental rendering
//!
//! Each feed step keeps a cache record `{config, feed, item_count}` in its own
//! cache folder. The previous feed text is written back verbatim when:
//!
//! 1. the feed configuration is unchanged,
//! 2. the number of eligible items is unchanged, and
//! 3. no eligible item was modified after the previous run.
//!
//! Otherwise the feed is rendered again, which includes rewriting every root
//! relative URL in item bodies.

use crate::{content::Item, context::Context, log, site::Website};
use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{path::Path, sync::LazyLock};

/// Extra filter applied to feed items.
pub type ItemPredicate<S> = Box<dyn Fn(&Item<S>) -> bool + Send + Sync>;

/// How a feed was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Written from the cache record.
    Reused,
    Rendered,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord<C> {
    config: C,
    feed: String,
    item_count: usize,
}

/// Eligible items, newest first, capped to `maximum`.
pub(crate) fn gather_items<'c, S: Website>(
    ctx: &'c Context<'_, S>,
    include: impl Fn(&Item<S>) -> bool,
    predicate: Option<&ItemPredicate<S>>,
    maximum: usize,
) -> Vec<&'c Item<S>> {
    let mut items: Vec<_> = ctx
        .sections()
        .flat_map(|section| section.items())
        .filter(|item| include(item) && predicate.is_none_or(|predicate| predicate(item)))
        .collect();
    items.sort_by(|a, b| b.content.date.cmp(&a.content.date));
    items.truncate(maximum);
    items
}

/// Write the feed at `target`, reusing the cached text when nothing changed.
pub(crate) fn write_cached<S, C>(
    ctx: &Context<'_, S>,
    config: &C,
    target: &Path,
    items: &[&Item<S>],
    render: impl FnOnce() -> Result<String>,
) -> Result<FeedOutcome>
where
    S: Website,
    C: Serialize + DeserializeOwned + PartialEq + Clone,
{
    let cache_name = format!("{}.json", target.display());
    let cached: Option<CacheRecord<C>> = ctx.read_cache(&cache_name);
    let reusable =
        cached.filter(|record| is_reusable(record, config, items, ctx.last_generation_date()));

    if let Some(record) = reusable {
        ctx.write_output_file(target, &record.feed)?;
        log!("cache"; "reusing {}", target.display());
        return Ok(FeedOutcome::Reused);
    }

    let record = CacheRecord {
        config: config.clone(),
        feed: render()?,
        item_count: items.len(),
    };
    ctx.write_cache(&cache_name, &record)?;
    ctx.write_output_file(target, &record.feed)?;
    log!("feed"; "{}", target.display());
    Ok(FeedOutcome::Rendered)
}

fn is_reusable<S: Website, C: PartialEq>(
    record: &CacheRecord<C>,
    config: &C,
    items: &[&Item<S>],
    last_generation: Option<DateTime<Utc>>,
) -> bool {
    let Some(last_generation) = last_generation else {
        return false;
    };
    record.config == *config
        && record.item_count == items.len()
        && items
            .iter()
            .all(|item| item.content.last_modified <= last_generation)
}

/// Rewrite root-relative `href` and `src` values to absolute URLs under `base`.
///
/// Protocol-relative values (`//host/...`) are left alone.
pub fn absolute_urls(html: &str, base: &str) -> String {
    static RE_ROOT_RELATIVE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(href|src)="/([^/"][^"]*)?""#).unwrap());

    let base = base.trim_end_matches('/');
    RE_ROOT_RELATIVE
        .replace_all(html, |caps: &Captures| {
            let rest = caps.get(2).map_or("", |m| m.as_str());
            format!(r#"{}="{base}/{rest}""#, &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TestSite, context, date, item, item_dated};
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_urls() {
        let html = r#"<a href="/posts/a">a</a><img src="/img.png"><a href="/">home</a>"#;
        assert_eq!(
            absolute_urls(html, "https://example.com/"),
            r#"<a href="https://example.com/posts/a">a</a><img src="https://example.com/img.png"><a href="https://example.com/">home</a>"#
        );
    }

    #[test]
    fn test_absolute_urls_leaves_other_links() {
        let html = r##"<a href="https://other.com/x">x</a><img src="//cdn.com/y.png"><a href="#top">t</a>"##;
        assert_eq!(absolute_urls(html, "https://example.com"), html);
    }

    #[test]
    fn test_gather_items_sorts_filters_and_caps() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let mut ctx = context(&site, &dir);
        ctx.add_item(item_dated("posts", "old", &[], date(2023, 1, 1))).unwrap();
        ctx.add_item(item_dated("posts", "new", &[], date(2024, 6, 1))).unwrap();
        ctx.add_item(item_dated("projects", "mid", &["skip"], date(2024, 1, 1))).unwrap();
        ctx.add_item(item_dated("projects", "newest", &[], date(2024, 9, 1))).unwrap();

        let predicate: ItemPredicate<TestSite> = Box::new(|item| !item.has_tag(&"skip".into()));
        let items = gather_items(&ctx, |_| true, Some(&predicate), 2);

        let paths: Vec<&str> = items.iter().map(|item| item.path().as_str()).collect();
        assert_eq!(paths, ["newest", "new"]);
    }

    fn render_twice(
        dir: &TempDir,
        first_config: u32,
        second_config: u32,
        touch: bool,
    ) -> (FeedOutcome, usize) {
        let site = TestSite;
        let renders = Cell::new(0);
        let render = || {
            renders.set(renders.get() + 1);
            Ok(format!("feed #{}", renders.get()))
        };

        let ctx = context(&site, dir);
        let post = item("posts", "a", &[]);
        let items = [&post];
        write_cached(&ctx, &first_config, Path::new("feed.rss"), &items, render).unwrap();
        ctx.storage().record_generation_date(date(2024, 6, 1)).unwrap();

        let ctx = context(&site, dir);
        let mut post = item("posts", "a", &[]);
        if touch {
            post.content.last_modified = date(2024, 7, 1);
        }
        let items = [&post];
        let outcome =
            write_cached(&ctx, &second_config, Path::new("feed.rss"), &items, render).unwrap();
        (outcome, renders.get())
    }

    #[test]
    fn test_unchanged_feed_is_reused_without_rendering() {
        let dir = TempDir::new().unwrap();
        let (outcome, renders) = render_twice(&dir, 1, 1, false);

        assert_eq!(outcome, FeedOutcome::Reused);
        assert_eq!(renders, 1);
        let written = std::fs::read_to_string(dir.path().join("public/feed.rss")).unwrap();
        assert_eq!(written, "feed #1");
    }

    #[test]
    fn test_config_change_forces_render() {
        let dir = TempDir::new().unwrap();
        let (outcome, renders) = render_twice(&dir, 1, 2, false);

        assert_eq!(outcome, FeedOutcome::Rendered);
        assert_eq!(renders, 2);
    }

    #[test]
    fn test_modified_item_forces_render() {
        let dir = TempDir::new().unwrap();
        let (outcome, renders) = render_twice(&dir, 1, 1, true);

        assert_eq!(outcome, FeedOutcome::Rendered);
        assert_eq!(renders, 2);
    }

    #[test]
    fn test_first_run_always_renders() {
        let dir = TempDir::new().unwrap();
        let site = TestSite;
        let ctx = context(&site, &dir);
        let post = item("posts", "a", &[]);

        let outcome =
            write_cached(&ctx, &1u32, Path::new("feed.rss"), &[&post], || Ok("x".into())).unwrap();
        assert_eq!(outcome, FeedOutcome::Rendered);
    }
}
