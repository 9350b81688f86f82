//! Themes: HTML factories plus the static resources they rely on.

mod foundation;

pub use foundation::FoundationHtmlFactory;

use crate::{
    content::{Index, Item, Page, Section, Tag},
    context::Context,
    site::Website,
};
use std::{collections::BTreeSet, path::PathBuf};

/// Renders every kind of location to HTML.
///
/// Rendering is read-only against the context and may run on several threads
/// at once. Tag pages are optional: returning `None` skips them.
pub trait HtmlFactory<S: Website>: Send + Sync {
    fn make_index_html(&self, index: &Index, ctx: &Context<'_, S>) -> anyhow::Result<String>;

    fn make_section_html(&self, section: &Section<S>, ctx: &Context<'_, S>)
    -> anyhow::Result<String>;

    fn make_item_html(&self, item: &Item<S>, ctx: &Context<'_, S>) -> anyhow::Result<String>;

    fn make_page_html(&self, page: &Page, ctx: &Context<'_, S>) -> anyhow::Result<String>;

    fn make_tag_list_html(
        &self,
        _tags: &BTreeSet<Tag>,
        _ctx: &Context<'_, S>,
    ) -> Option<anyhow::Result<String>> {
        None
    }

    fn make_tag_details_html(
        &self,
        _tag: &Tag,
        _ctx: &Context<'_, S>,
    ) -> Option<anyhow::Result<String>> {
        None
    }
}

/// A file the theme needs in the output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeResource {
    /// Copied from `source` (relative to the root) to `target` (relative to the output).
    File { source: PathBuf, target: PathBuf },
    /// Written to `target` from memory.
    Embedded {
        target: PathBuf,
        contents: &'static str,
    },
}

impl ThemeResource {
    pub fn target(&self) -> &PathBuf {
        match self {
            Self::File { target, .. } | Self::Embedded { target, .. } => target,
        }
    }
}

pub struct Theme<S: Website> {
    factory: Box<dyn HtmlFactory<S>>,
    resources: Vec<ThemeResource>,
}

impl<S: Website> Theme<S> {
    pub fn new(factory: impl HtmlFactory<S> + 'static, resources: Vec<ThemeResource>) -> Self {
        Self {
            factory: Box::new(factory),
            resources,
        }
    }

    /// Minimal built-in theme with an embedded stylesheet.
    pub fn foundation() -> Self {
        Self::new(
            FoundationHtmlFactory,
            vec![ThemeResource::Embedded {
                target: PathBuf::from(foundation::STYLESHEET_PATH),
                contents: foundation::STYLESHEET,
            }],
        )
    }

    pub fn factory(&self) -> &dyn HtmlFactory<S> {
        self.factory.as_ref()
    }

    pub fn resources(&self) -> &[ThemeResource] {
        &self.resources
    }
}
