//! Concurrent HTML generation.
//!
//! Five output categories run at once against a read-only context:
//!
//! | Category | Writes |
//! |----------|--------|
//! | `resources` | theme resources |
//! | `index` | `index.html` |
//! | `sections` | one file per section and per item |
//! | `pages` | one file per page |
//! | `tags` | tag list and one file per tag |
//!
//! Categories are expected to write disjoint paths. This is checked once all
//! of them have finished: a path claimed by two categories fails the step.

use crate::{
    content::SitePath,
    context::Context,
    error::GenerationError,
    log,
    site::{HtmlFileMode, Website},
    theme::{Theme, ThemeResource},
};
use anyhow::Result;
use rayon::prelude::*;
use std::{collections::BTreeMap, path::PathBuf};

/// One output category: a name and the work producing its output paths.
pub type Category<'c> = (&'static str, Box<dyn Fn() -> Result<Vec<PathBuf>> + Send + Sync + 'c>);

/// Render the whole site with `theme`.
pub fn generate<S: Website>(ctx: &Context<'_, S>, theme: &Theme<S>, mode: HtmlFileMode) -> Result<()> {
    let renderer = Renderer { ctx, theme, mode };
    let renderer = &renderer;

    let categories: Vec<Category<'_>> = vec![
        ("resources", Box::new(move || renderer.copy_resources())),
        ("index", Box::new(move || renderer.render_index())),
        ("sections", Box::new(move || renderer.render_sections())),
        ("pages", Box::new(move || renderer.render_pages())),
        ("tags", Box::new(move || renderer.render_tags())),
    ];

    let count = run_categories(categories)?;
    log!("html"; "{count} files");
    Ok(())
}

/// Run `categories` concurrently and check that no output path has two writers.
///
/// A path is a conflict when two different categories return it; a category
/// returning the same path twice is not. Every conflicting path is reported.
/// Returns the number of distinct paths written. Failures surface after every
/// category has finished; the first failing category (in list order) wins.
pub fn run_categories(categories: Vec<Category<'_>>) -> Result<usize> {
    let results: Vec<(&'static str, Result<Vec<PathBuf>>)> = categories
        .par_iter()
        .map(|(name, run)| (*name, run()))
        .collect();

    let mut writers: BTreeMap<PathBuf, Vec<&'static str>> = BTreeMap::new();
    for (name, result) in results {
        for path in result? {
            let names = writers.entry(path).or_default();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let mut conflicts = writers.iter().filter(|(_, names)| names.len() > 1);
    if let Some((path, names)) = conflicts.next() {
        return Err(GenerationError::PathConflict {
            path: path.clone(),
            categories: names.iter().map(|name| (*name).to_owned()).collect(),
            others: conflicts.map(|(path, _)| path.clone()).collect(),
        }
        .into());
    }
    Ok(writers.len())
}

struct Renderer<'r, 'a, S: Website> {
    ctx: &'r Context<'a, S>,
    theme: &'r Theme<S>,
    mode: HtmlFileMode,
}

impl<S: Website> Renderer<'_, '_, S> {
    fn write(&self, path: &SitePath, html: String) -> Result<PathBuf> {
        let output = self.mode.output_path(path);
        self.ctx.write_output_file(&output, html)?;
        Ok(output)
    }

    fn copy_resources(&self) -> Result<Vec<PathBuf>> {
        self.theme
            .resources()
            .par_iter()
            .map(|resource| -> Result<PathBuf> {
                match resource {
                    ThemeResource::File { source, target } => {
                        self.ctx.copy_file_to_output(source, target)?;
                    }
                    ThemeResource::Embedded { target, contents } => {
                        self.ctx.write_output_file(target, contents)?;
                    }
                }
                Ok(resource.target().clone())
            })
            .collect()
    }

    fn render_index(&self) -> Result<Vec<PathBuf>> {
        let index = self.ctx.index();
        let html = self.theme.factory().make_index_html(index, self.ctx)?;
        Ok(vec![self.write(&index.path(), html)?])
    }

    fn render_sections(&self) -> Result<Vec<PathBuf>> {
        let factory = self.theme.factory();
        let sections: Vec<_> = self.ctx.sections().collect();

        let written: Vec<Vec<PathBuf>> = sections
            .par_iter()
            .map(|section| -> Result<Vec<PathBuf>> {
                let html = factory.make_section_html(section, self.ctx)?;
                let mut written = vec![self.write(&section.path(), html)?];

                let items: Vec<PathBuf> = section
                    .items()
                    .par_iter()
                    .map(|item| {
                        let html = factory.make_item_html(item, self.ctx)?;
                        self.write(&item.absolute_path(), html)
                    })
                    .collect::<Result<_>>()?;
                written.extend(items);
                Ok(written)
            })
            .collect::<Result<_>>()?;

        Ok(written.into_iter().flatten().collect())
    }

    fn render_pages(&self) -> Result<Vec<PathBuf>> {
        let factory = self.theme.factory();
        let pages: Vec<_> = self.ctx.pages().collect();
        pages
            .par_iter()
            .map(|page| {
                let html = factory.make_page_html(page, self.ctx)?;
                self.write(&page.path, html)
            })
            .collect()
    }

    fn render_tags(&self) -> Result<Vec<PathBuf>> {
        let Some(config) = self.ctx.site().tag_html_config() else {
            return Ok(Vec::new());
        };
        let factory = self.theme.factory();
        let tags = self.ctx.all_tags();

        let mut written = Vec::new();
        if let Some(html) = factory.make_tag_list_html(tags, self.ctx) {
            written.push(self.write(config.list_path(), html?)?);
        }

        let details: Vec<Option<PathBuf>> = tags
            .par_iter()
            .map(|tag| {
                factory
                    .make_tag_details_html(tag, self.ctx)
                    .map(|html| self.write(&config.details_path(tag), html?))
                    .transpose()
            })
            .collect::<Result<_>>()?;
        written.extend(details.into_iter().flatten());
        Ok(written)
    }
}
