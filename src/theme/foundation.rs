//! The built-in `foundation` theme.

use super::HtmlFactory;
use crate::{
    content::{Content, Index, Item, Page, Section, SitePath, Tag, Video},
    context::Context,
    site::Website,
};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::BTreeSet;

pub(super) const STYLESHEET_PATH: &str = "styles.css";
pub(super) const STYLESHEET: &str = include_str!("foundation.css");

/// Number of recent items listed on the index page.
const RECENT_ITEM_COUNT: usize = 10;

/// HTML factory of the foundation theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoundationHtmlFactory;

impl<S: Website> HtmlFactory<S> for FoundationHtmlFactory {
    fn make_index_html(&self, index: &Index, ctx: &Context<'_, S>) -> anyhow::Result<String> {
        let recent = ctx.all_items(|a, b| b.content.date.cmp(&a.content.date));
        let content = html! {
            h1 { (title_or(&index.content, ctx.site().name())) }
            (PreEscaped(&index.content.body))
            @if !recent.is_empty() {
                h2 { "Latest content" }
                (item_list(recent.into_iter().take(RECENT_ITEM_COUNT)))
            }
        };
        Ok(document(ctx, &index.content, &SitePath::root(), content))
    }

    fn make_section_html(
        &self,
        section: &Section<S>,
        ctx: &Context<'_, S>,
    ) -> anyhow::Result<String> {
        let content = html! {
            h1 { (section.title()) }
            (PreEscaped(&section.content.body))
            (item_list(section.items().iter()))
        };
        Ok(document(ctx, &section.content, &section.path(), content))
    }

    fn make_item_html(&self, item: &Item<S>, ctx: &Context<'_, S>) -> anyhow::Result<String> {
        let tags = ctx.site().tag_html_config();
        let content = html! {
            article {
                h1 { (item.content.title) }
                time datetime=(item.content.date.to_rfc3339()) {
                    (item.content.date.format("%B %-d, %Y").to_string())
                }
                @if let Some(tags) = &tags {
                    @if !item.tags.is_empty() {
                        ul.tag-list {
                            @for tag in &item.tags {
                                li { a href=(tags.details_path(tag).absolute_string()) { (tag.as_str()) } }
                            }
                        }
                    }
                }
                (media(&item.content))
                (PreEscaped(&item.content.body))
            }
        };
        Ok(document(ctx, &item.content, &item.absolute_path(), content))
    }

    fn make_page_html(&self, page: &Page, ctx: &Context<'_, S>) -> anyhow::Result<String> {
        let content = html! {
            h1 { (page.content.title) }
            (media(&page.content))
            (PreEscaped(&page.content.body))
        };
        Ok(document(ctx, &page.content, &page.path, content))
    }

    fn make_tag_list_html(
        &self,
        tags: &BTreeSet<Tag>,
        ctx: &Context<'_, S>,
    ) -> Option<anyhow::Result<String>> {
        let config = ctx.site().tag_html_config()?;
        let page = Content::new("Browse all tags", "");
        let content = html! {
            h1 { (page.title) }
            ul.tag-list {
                @for tag in tags {
                    li { a href=(config.details_path(tag).absolute_string()) { (tag.as_str()) } }
                }
            }
        };
        Some(Ok(document(ctx, &page, config.list_path(), content)))
    }

    fn make_tag_details_html(&self, tag: &Tag, ctx: &Context<'_, S>) -> Option<anyhow::Result<String>> {
        let config = ctx.site().tag_html_config()?;
        let page = Content::new(format!("Tagged with {tag}"), "");
        let content = html! {
            h1 { "Tagged with " span.tag { (tag.as_str()) } }
            a href=(config.list_path().absolute_string()) { "Browse all tags" }
            (item_list(ctx.items_tagged(tag).into_iter()))
        };
        Some(Ok(document(ctx, &page, &config.details_path(tag), content)))
    }
}

fn title_or<'a>(content: &'a Content, fallback: &'a str) -> &'a str {
    if content.title.is_empty() {
        fallback
    } else {
        &content.title
    }
}

fn document<S: Website>(
    ctx: &Context<'_, S>,
    content: &Content,
    path: &SitePath,
    body: Markup,
) -> String {
    let site = ctx.site();
    let title = if content.title.is_empty() || path.is_root() {
        site.name().to_owned()
    } else {
        format!("{} | {}", content.title, site.name())
    };
    let description = if content.description.is_empty() {
        site.description()
    } else {
        &content.description
    };

    html! {
        (DOCTYPE)
        html lang=(site.language()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                meta name="description" content=(description);
                link rel="canonical" href=(site.url_for(path));
                link rel="stylesheet" href={ "/" (STYLESHEET_PATH) };
            }
            body {
                header {
                    a.site-name href="/" { (site.name()) }
                    nav {
                        ul {
                            @for section in ctx.sections() {
                                li { a href=(section.path().absolute_string()) { (section.title()) } }
                            }
                        }
                    }
                }
                main { (body) }
                footer { p { "Generated using plume" } }
            }
        }
    }
    .into_string()
}

fn item_list<'i, S: Website>(items: impl Iterator<Item = &'i Item<S>>) -> Markup {
    html! {
        ul.item-list {
            @for item in items {
                li {
                    h2 { a href=(item.absolute_path().absolute_string()) { (item.content.title) } }
                    @if !item.content.description.is_empty() {
                        p { (item.content.description) }
                    }
                }
            }
        }
    }
}

fn media(content: &Content) -> Markup {
    html! {
        @if let Some(audio) = &content.audio {
            audio controls src=(audio.url) {}
        }
        @match &content.video {
            Some(Video::Hosted(url)) => {
                video controls src=(url) {}
            }
            Some(video) => {
                div.video { iframe src=(video.embed_url()) allowfullscreen {} }
            }
            None => {}
        }
    }
}
