use super::{Content, SitePath};
use std::collections::BTreeMap;

/// Free-form content addressed by an explicit path.
///
/// The path is also the page's key in the context, so changing it goes through
/// [`Context::mutate_page`](crate::Context::mutate_page), which re-keys the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub path: SitePath,
    pub content: Content,
    /// Front matter entries not consumed by `content`.
    pub metadata: BTreeMap<String, String>,
}

impl Page {
    pub fn new(path: impl Into<SitePath>, content: Content) -> Self {
        Self {
            path: path.into(),
            content,
            metadata: BTreeMap::new(),
        }
    }
}
