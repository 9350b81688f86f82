//! Built-in steps.

use super::{Plugin, Step, StepKind};
use crate::{
    content::{Item, Page, SitePath},
    context::Context,
    deploy::DeploymentMethod,
    error::ContentError,
    generator::{
        self,
        feed::ItemPredicate,
        podcast::{PodcastCompatible, PodcastFeedConfig},
        rss::RssFeedConfig,
    },
    markdown,
    site::{HtmlFileMode, Website},
    theme::Theme,
};
use chrono::{DateTime, Utc};
use std::{
    cmp::Ordering,
    collections::BTreeSet,
    path::{Path, PathBuf},
};

fn section_mut<'c, 'a, S: Website>(
    ctx: &'c mut Context<'a, S>,
    id: &S::SectionId,
) -> Result<&'c mut crate::content::Section<S>, ContentError> {
    ctx.section_mut(id)
        .ok_or_else(|| ContentError::UnknownSection { id: id.to_string() })
}

/// Ids of `section`, or of every section when `None`.
fn target_sections<S: Website>(ctx: &Context<'_, S>, section: Option<&S::SectionId>) -> Vec<S::SectionId> {
    match section {
        Some(id) => vec![id.clone()],
        None => ctx.sections().map(|s| s.id().clone()).collect(),
    }
}

// ============================================================================
// Content
// ============================================================================

impl<S: Website> Step<S> {
    pub fn add_item(item: Item<S>) -> Self {
        let name = format!("Add item '{}'", item.absolute_path());
        Self::system(name, move |ctx| Ok(ctx.add_item(item.clone())?))
    }

    pub fn add_items(items: Vec<Item<S>>) -> Self {
        Self::system("Add items", move |ctx| {
            for item in &items {
                ctx.add_item(item.clone())?;
            }
            Ok(())
        })
    }

    pub fn add_page(page: Page) -> Self {
        let name = format!("Add page '{}'", page.path);
        Self::system(name, move |ctx| {
            ctx.add_page(page.clone());
            Ok(())
        })
    }

    /// Load the index, sections, items and pages from a Markdown folder.
    pub fn add_markdown_files(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        Self::system("Add Markdown files", move |ctx| {
            markdown::add_markdown_files(ctx, &folder)
        })
    }

    pub fn mutate_item<F>(section: S::SectionId, path: impl Into<SitePath>, mutation: F) -> Self
    where
        F: Fn(&mut Item<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let path = path.into();
        let name = format!("Mutate item at '{section}/{path}'");
        Self::system(name, move |ctx| {
            section_mut(ctx, &section)?.mutate_item(&path, &mutation)?;
            Ok(())
        })
    }

    /// Mutate the items of `section` (or of every section) matching `predicate`.
    pub fn mutate_items<P, F>(section: Option<S::SectionId>, predicate: P, mutation: F) -> Self
    where
        P: Fn(&Item<S>) -> bool + Send + Sync + 'static,
        F: Fn(&mut Item<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::system("Mutate items", move |ctx| {
            for id in target_sections(ctx, section.as_ref()) {
                section_mut(ctx, &id)?.mutate_items(&predicate, &mutation)?;
            }
            Ok(())
        })
    }

    pub fn mutate_all_items<F>(section: Option<S::SectionId>, mutation: F) -> Self
    where
        F: Fn(&mut Item<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::mutate_items(section, |_| true, mutation)
    }

    pub fn mutate_page<F>(path: impl Into<SitePath>, mutation: F) -> Self
    where
        F: Fn(&mut Page) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let path = path.into();
        let name = format!("Mutate page at '{path}'");
        Self::system(name, move |ctx| Ok(ctx.mutate_page(&path, &mutation)?))
    }

    pub fn mutate_all_pages<F>(mutation: F) -> Self
    where
        F: Fn(&mut Page) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::system("Mutate all pages", move |ctx| Ok(ctx.mutate_all_pages(&mutation)?))
    }

    pub fn remove_all_items<P>(section: Option<S::SectionId>, predicate: P) -> Self
    where
        P: Fn(&Item<S>) -> bool + Send + Sync + 'static,
    {
        Self::system("Remove items", move |ctx| {
            for id in target_sections(ctx, section.as_ref()) {
                section_mut(ctx, &id)?.remove_items(&predicate);
            }
            Ok(())
        })
    }

    pub fn sort_items<F>(section: Option<S::SectionId>, compare: F) -> Self
    where
        F: Fn(&Item<S>, &Item<S>) -> Ordering + Send + Sync + 'static,
    {
        Self::system("Sort items", move |ctx| {
            for id in target_sections(ctx, section.as_ref()) {
                section_mut(ctx, &id)?.sort_items(&compare);
            }
            Ok(())
        })
    }

    pub fn install_plugin(plugin: Plugin<S>) -> Self {
        let name = format!("Install plugin '{}'", plugin.name());
        Self::system(name, move |ctx| ctx.install_plugin(&plugin))
    }
}

// ============================================================================
// Output
// ============================================================================

impl<S: Website> Step<S> {
    /// Copy a resources folder, relative to the root, into the output root.
    pub fn copy_resources(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        let name = format!("Copy '{}' files", folder.display());
        Self::generation(name, move |ctx| {
            let copied = ctx.copy_folder_to_output(&folder, "")?;
            crate::log!("copy"; "{} files from {}", copied.len(), folder.display());
            Ok(())
        })
    }

    /// Copy one file into `target_folder` (the output root when `None`).
    pub fn copy_file(path: impl Into<PathBuf>, target_folder: Option<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("Copy file '{}'", path.display());
        Self::generation(name, move |ctx| {
            let file_name = path.file_name().map_or(path.as_path(), Path::new);
            let destination = target_folder
                .as_deref()
                .map_or_else(|| file_name.to_path_buf(), |folder| folder.join(file_name));
            Ok(ctx.copy_file_to_output(&path, destination)?)
        })
    }

    pub fn generate_html(theme: Theme<S>, file_mode: HtmlFileMode) -> Self {
        Self::generation("Generate HTML", move |ctx| {
            generator::html::generate(ctx, &theme, file_mode)
        })
    }

    /// RSS feed of the items in `sections` (every section when `None`).
    ///
    /// `date` becomes the channel's build date; it defaults to the newest item's date.
    pub fn generate_rss_feed(
        sections: Option<BTreeSet<S::SectionId>>,
        predicate: Option<ItemPredicate<S>>,
        config: RssFeedConfig,
        date: Option<DateTime<Utc>>,
    ) -> Self {
        Self::generation("Generate RSS feed", move |ctx| {
            generator::rss::generate(ctx, sections.as_ref(), predicate.as_ref(), &config, date)
                .map(drop)
        })
    }

    pub fn generate_site_map(excluded_paths: Vec<SitePath>) -> Self {
        Self::generation("Generate site map", move |ctx| {
            generator::sitemap::generate(ctx, &excluded_paths)
        })
    }

    pub fn deploy(method: DeploymentMethod<S>) -> Self {
        let name = format!("Deploy using {}", method.name());
        Self::new(StepKind::Deployment, name, move |ctx| method.deploy(ctx))
    }
}

impl<S: Website> Step<S>
where
    S::ItemMetadata: PodcastCompatible,
{
    /// Podcast feed of the items in `section`.
    pub fn generate_podcast_feed(
        section: S::SectionId,
        predicate: Option<ItemPredicate<S>>,
        config: PodcastFeedConfig,
        date: Option<DateTime<Utc>>,
    ) -> Self {
        Self::generation("Generate podcast feed", move |ctx| {
            generator::podcast::generate(ctx, &section, predicate.as_ref(), &config, date)
                .map(drop)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::Pipeline,
        site::RunMode,
        test_helpers::{TestSite, date, item, item_dated, page},
    };
    use anyhow::bail;
    use tempfile::TempDir;

    fn run(steps: Vec<Step<TestSite>>, dir: &TempDir) -> crate::PublishedSite<TestSite> {
        Pipeline::new(steps)
            .execute(&TestSite, Some(dir.path()), RunMode::Generation)
            .unwrap()
    }

    #[test]
    fn test_sort_then_remove_through_steps() {
        let dir = TempDir::new().unwrap();
        let published = run(
            vec![
                Step::add_items(vec![
                    item_dated("posts", "b", &["later"], date(2024, 2, 1)),
                    item_dated("posts", "a", &["early"], date(2024, 1, 1)),
                ]),
                Step::sort_items(None, |a, b| a.content.date.cmp(&b.content.date)),
                Step::remove_all_items(Some("posts".into()), |item| {
                    item.content.date < date(2024, 2, 1)
                }),
            ],
            &dir,
        );

        let posts = published.section(&"posts".into()).unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts.item(&"b".into()).is_some());
        assert!(posts.items_tagged(&"early".into()).is_empty());
    }

    #[test]
    fn test_mutate_steps() {
        let dir = TempDir::new().unwrap();
        let published = run(
            vec![
                Step::add_item(item("posts", "a", &[])),
                Step::add_item(item("projects", "b", &[])),
                Step::add_page(page("about", "About")),
                Step::mutate_item("posts".into(), "a", |item| {
                    item.content.title = "Changed".into();
                    Ok(())
                }),
                Step::mutate_all_items(None, |item| {
                    item.content.description = "all".into();
                    Ok(())
                }),
                Step::mutate_all_pages(|page| {
                    page.content.title.push('!');
                    Ok(())
                }),
            ],
            &dir,
        );

        let a = published.section(&"posts".into()).unwrap().item(&"a".into()).unwrap();
        assert_eq!(a.content.title, "Changed");
        assert_eq!(a.content.description, "all");
        let b = published.section(&"projects".into()).unwrap().item(&"b".into()).unwrap();
        assert_eq!(b.content.description, "all");
        assert_eq!(published.page(&"about".into()).unwrap().content.title, "About!");
    }

    #[test]
    fn test_mutate_item_failure_names_step_and_path() {
        let dir = TempDir::new().unwrap();
        let error = Pipeline::new(vec![
            Step::add_item(item("posts", "a", &[])),
            Step::mutate_item("posts".into(), "a", |_| bail!("title missing")),
        ])
        .execute(&TestSite, Some(dir.path()), RunMode::Generation)
        .unwrap_err();

        assert_eq!(error.step.as_deref(), Some("Mutate item at 'posts/a'"));
        assert_eq!(error.path.as_deref(), Some("posts/a"));
        assert_eq!(error.underlying.as_deref(), Some("title missing"));
    }

    #[test]
    fn test_plugin_installs_markdown_modifier() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();
        std::fs::write(dir.path().join("content/posts/hello.md"), "# Hello\n\nshout").unwrap();

        let plugin = Plugin::new("Uppercase", |ctx: &mut Context<'_, TestSite>| {
            ctx.markdown_mut().add_modifier(|html| html.replace("shout", "SHOUT"));
            Ok(())
        });
        let published = run(
            vec![Step::install_plugin(plugin), Step::add_markdown_files("content")],
            &dir,
        );

        let hello = published.section(&"posts".into()).unwrap().item(&"hello".into()).unwrap();
        assert!(hello.content.body.contains("SHOUT"));
    }

    #[test]
    fn test_copy_file_into_folder() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("CNAME"), "example.com").unwrap();

        run(
            vec![
                Step::copy_file("CNAME", None),
                Step::copy_file("CNAME", Some(PathBuf::from("extra"))),
            ],
            &dir,
        );

        assert!(dir.path().join("public/CNAME").is_file());
        assert!(dir.path().join("public/extra/CNAME").is_file());
    }
}
