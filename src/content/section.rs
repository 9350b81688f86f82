//! A section and its secondary indexes.
//!
//! # Index consistency
//!
//! `path_index` maps every item's relative path to its position in `items`,
//! `tag_index` maps every tag carried by at least one item to the positions of
//! the items carrying it. After every mutating call both maps describe exactly
//! the current `items` vector:
//!
//! | Call | Index maintenance |
//! |------|-------------------|
//! | `add_item` | append + register path and tags, O(tags) |
//! | `mutate_item(s)` | diff old/new tags, touch only changed ones |
//! | `remove_items` / `sort_items` | full rebuild, O(n) |

use super::{Content, Item, SitePath, Tag};
use crate::{error::ContentError, site::Website};
use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use std::{cmp::Ordering, collections::BTreeSet, fmt};

/// A named bucket of items.
pub struct Section<S: Website> {
    id: S::SectionId,
    pub content: Content,
    items: Vec<Item<S>>,
    path_index: FxHashMap<SitePath, usize>,
    /// Positions are kept ordered, so tagged lookups follow section order.
    tag_index: FxHashMap<Tag, BTreeSet<usize>>,
    /// Highest `last_modified` ever added; removal never lowers it.
    last_item_modification_date: Option<DateTime<Utc>>,
}

impl<S: Website> Section<S> {
    pub fn new(id: S::SectionId) -> Self {
        Self {
            id,
            content: Content::default(),
            items: Vec::new(),
            path_index: FxHashMap::default(),
            tag_index: FxHashMap::default(),
            last_item_modification_date: None,
        }
    }

    pub fn id(&self) -> &S::SectionId {
        &self.id
    }

    pub fn path(&self) -> SitePath {
        SitePath::new(self.id.to_string())
    }

    /// The content title, or the capitalized id when no title was given.
    pub fn title(&self) -> String {
        if !self.content.title.is_empty() {
            return self.content.title.clone();
        }
        let id = self.id.to_string();
        let mut chars = id.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => id,
        }
    }

    pub fn items(&self) -> &[Item<S>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn last_item_modification_date(&self) -> Option<DateTime<Utc>> {
        self.last_item_modification_date
    }

    /// Latest of the section's own modification date and its items'.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_item_modification_date
            .map_or(self.content.last_modified, |date| {
                date.max(self.content.last_modified)
            })
    }

    /// Item at a path relative to this section.
    pub fn item(&self, path: &SitePath) -> Option<&Item<S>> {
        self.path_index.get(path).map(|&index| &self.items[index])
    }

    /// Items carrying `tag`, in section order.
    pub fn items_tagged(&self, tag: &Tag) -> Vec<&Item<S>> {
        self.tag_index
            .get(tag)
            .map(|indices| indices.iter().map(|&index| &self.items[index]).collect())
            .unwrap_or_default()
    }

    /// Every tag carried by at least one item.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tag_index.keys()
    }

    pub fn add_item(&mut self, item: Item<S>) {
        let index = self.items.len();
        self.path_index.insert(item.path().clone(), index);
        for tag in &item.tags {
            self.tag_index.entry(tag.clone()).or_default().insert(index);
        }
        self.raise_watermark(item.content.last_modified);
        self.items.push(item);
    }

    /// Apply `mutation` to the item at `path`.
    ///
    /// The mutation works on a copy that replaces the item only on success.
    pub fn mutate_item<F>(&mut self, path: &SitePath, mutation: F) -> Result<(), ContentError>
    where
        F: FnOnce(&mut Item<S>) -> anyhow::Result<()>,
    {
        let index = *self
            .path_index
            .get(path)
            .ok_or_else(|| ContentError::ItemNotFound { path: path.clone() })?;
        self.mutate_at(index, mutation)
    }

    /// Apply `mutation` to every item matching `predicate`.
    ///
    /// Stops at the first failing mutation; items mutated before it keep their
    /// new value.
    pub fn mutate_items<P, F>(&mut self, predicate: P, mutation: F) -> Result<(), ContentError>
    where
        P: Fn(&Item<S>) -> bool,
        F: Fn(&mut Item<S>) -> anyhow::Result<()>,
    {
        for index in 0..self.items.len() {
            if predicate(&self.items[index]) {
                self.mutate_at(index, &mutation)?;
            }
        }
        Ok(())
    }

    pub fn remove_items<P>(&mut self, predicate: P)
    where
        P: Fn(&Item<S>) -> bool,
    {
        self.items.retain(|item| !predicate(item));
        self.rebuild_indexes();
    }

    pub fn sort_items<F>(&mut self, compare: F)
    where
        F: FnMut(&Item<S>, &Item<S>) -> Ordering,
    {
        self.items.sort_by(compare);
        self.rebuild_indexes();
    }

    fn mutate_at<F>(&mut self, index: usize, mutation: F) -> Result<(), ContentError>
    where
        F: FnOnce(&mut Item<S>) -> anyhow::Result<()>,
    {
        let mut item = self.items[index].clone();
        mutation(&mut item).map_err(|source| ContentError::ItemMutationFailed {
            path: item.absolute_path(),
            source: source.into(),
        })?;

        let old_tags: FxHashSet<&Tag> = self.items[index].tags.iter().collect();
        let new_tags: FxHashSet<&Tag> = item.tags.iter().collect();

        for removed in old_tags.difference(&new_tags) {
            if let Some(indices) = self.tag_index.get_mut(*removed) {
                indices.remove(&index);
                if indices.is_empty() {
                    self.tag_index.remove(*removed);
                }
            }
        }
        for added in new_tags.difference(&old_tags) {
            self.tag_index
                .entry((*added).clone())
                .or_default()
                .insert(index);
        }

        self.raise_watermark(item.content.last_modified);
        self.items[index] = item;
        Ok(())
    }

    fn rebuild_indexes(&mut self) {
        self.path_index.clear();
        self.tag_index.clear();
        for (index, item) in self.items.iter().enumerate() {
            self.path_index.insert(item.path().clone(), index);
            for tag in &item.tags {
                self.tag_index.entry(tag.clone()).or_default().insert(index);
            }
        }
    }

    fn raise_watermark(&mut self, date: DateTime<Utc>) {
        if self.last_item_modification_date.is_none_or(|current| date > current) {
            self.last_item_modification_date = Some(date);
        }
    }
}

impl<S: Website> fmt::Debug for Section<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("items", &self.items)
            .field("last_item_modification_date", &self.last_item_modification_date)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{TestSite, date, item, item_dated};
    use anyhow::bail;

    /// Both indexes must describe exactly the current items.
    fn assert_consistent(section: &Section<TestSite>) {
        assert_eq!(section.path_index.len(), section.items.len());
        for (index, item) in section.items.iter().enumerate() {
            assert_eq!(section.path_index.get(item.path()), Some(&index));
            for tag in &item.tags {
                assert!(section.tag_index[tag].contains(&index));
            }
        }
        for (tag, indices) in &section.tag_index {
            assert!(!indices.is_empty(), "empty entry for {tag}");
            for &index in indices {
                assert!(section.items[index].has_tag(tag));
            }
        }
    }

    fn tagged_paths(section: &Section<TestSite>, tag: &str) -> Vec<String> {
        section
            .items_tagged(&Tag::new(tag))
            .iter()
            .map(|item| item.path().to_string())
            .collect()
    }

    #[test]
    fn test_add_item_registers_path_and_tags() {
        let mut section = Section::<TestSite>::new("posts".into());
        section.add_item(item("posts", "a", &["rust"]));
        section.add_item(item("posts", "b", &["rust", "web"]));

        assert_consistent(&section);
        assert_eq!(section.item(&"b".into()).map(|i| i.path().as_str()), Some("b"));
        assert_eq!(tagged_paths(&section, "rust"), ["a", "b"]);
        assert_eq!(tagged_paths(&section, "web"), ["b"]);
        assert!(tagged_paths(&section, "swift").is_empty());
    }

    #[test]
    fn test_mutate_item_moves_tag_membership() {
        let mut section = Section::<TestSite>::new("posts".into());
        section.add_item(item("posts", "a", &["A"]));

        section
            .mutate_item(&"a".into(), |item| {
                item.tags = vec![Tag::new("B")];
                Ok(())
            })
            .unwrap();

        assert_consistent(&section);
        assert!(tagged_paths(&section, "A").is_empty());
        assert_eq!(tagged_paths(&section, "B"), ["a"]);
        assert!(section.tags().all(|tag| tag.as_str() != "A"));
    }

    #[test]
    fn test_mutate_item_unknown_path() {
        let mut section = Section::<TestSite>::new("posts".into());
        let result = section.mutate_item(&"missing".into(), |_| Ok(()));

        assert!(matches!(result, Err(ContentError::ItemNotFound { path }) if path.as_str() == "missing"));
    }

    #[test]
    fn test_failed_mutation_leaves_item_untouched() {
        let mut section = Section::<TestSite>::new("posts".into());
        section.add_item(item("posts", "a", &["A"]));

        let result = section.mutate_item(&"a".into(), |item| {
            item.tags.clear();
            item.content.title = "changed".into();
            bail!("nope")
        });

        match result {
            Err(ContentError::ItemMutationFailed { path, source }) => {
                assert_eq!(path.as_str(), "posts/a");
                assert_eq!(source.to_string(), "nope");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_consistent(&section);
        assert_eq!(tagged_paths(&section, "A"), ["a"]);
        assert_ne!(section.items()[0].content.title, "changed");
    }

    #[test]
    fn test_mutate_items_only_touches_matches() {
        let mut section = Section::<TestSite>::new("posts".into());
        section.add_item(item("posts", "a", &["draft"]));
        section.add_item(item("posts", "b", &[]));
        section.add_item(item("posts", "c", &["draft"]));

        section
            .mutate_items(
                |item| item.has_tag(&Tag::new("draft")),
                |item| {
                    item.tags = vec![Tag::new("published")];
                    Ok(())
                },
            )
            .unwrap();

        assert_consistent(&section);
        assert_eq!(tagged_paths(&section, "published"), ["a", "c"]);
        assert!(tagged_paths(&section, "draft").is_empty());
        assert!(section.items()[1].tags.is_empty());
    }

    #[test]
    fn test_sort_then_remove() {
        let mut section = Section::<TestSite>::new("posts".into());
        section.add_item(item_dated("posts", "second", &["shared"], date(2024, 2, 1)));
        section.add_item(item_dated("posts", "first", &["only-first", "shared"], date(2024, 1, 1)));

        section.sort_items(|a, b| a.content.date.cmp(&b.content.date));
        assert_consistent(&section);
        assert_eq!(section.items()[0].path().as_str(), "first");

        section.remove_items(|item| item.content.date < date(2024, 2, 1));
        assert_consistent(&section);

        assert_eq!(section.len(), 1);
        assert!(section.item(&"second".into()).is_some());
        assert!(section.item(&"first".into()).is_none());
        assert!(tagged_paths(&section, "only-first").is_empty());
        assert!(section.tags().all(|tag| tag.as_str() != "only-first"));
        assert_eq!(tagged_paths(&section, "shared"), ["second"]);
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mut section = Section::<TestSite>::new("posts".into());
        let mut newest = item("posts", "new", &[]);
        newest.content.last_modified = date(2024, 3, 1);
        let mut older = item("posts", "old", &[]);
        older.content.last_modified = date(2024, 1, 1);

        section.add_item(newest);
        section.add_item(older);
        assert_eq!(section.last_item_modification_date(), Some(date(2024, 3, 1)));

        section.remove_items(|item| item.path().as_str() == "new");
        assert_eq!(section.last_item_modification_date(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_mutation_raises_watermark() {
        let mut section = Section::<TestSite>::new("posts".into());
        let mut first = item("posts", "a", &[]);
        first.content.last_modified = date(2024, 1, 1);
        section.add_item(first);

        section
            .mutate_item(&"a".into(), |item| {
                item.content.last_modified = date(2024, 6, 1);
                Ok(())
            })
            .unwrap();

        assert_eq!(section.last_item_modification_date(), Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_mixed_operation_sequence_stays_consistent() {
        let mut section = Section::<TestSite>::new("posts".into());
        for (i, tags) in [&["a"][..], &["b"], &["a", "b"], &[], &["c"]].iter().enumerate() {
            section.add_item(item("posts", &format!("item-{i}"), tags));
            assert_consistent(&section);
        }

        section.sort_items(|a, b| b.path().cmp(a.path()));
        assert_consistent(&section);

        section
            .mutate_items(|item| item.has_tag(&Tag::new("b")), |item| {
                item.tags.push(Tag::new("c"));
                Ok(())
            })
            .unwrap();
        assert_consistent(&section);

        section.remove_items(|item| item.has_tag(&Tag::new("a")));
        assert_consistent(&section);

        assert_eq!(tagged_paths(&section, "c"), ["item-4", "item-1"]);
        assert!(tagged_paths(&section, "a").is_empty());
        assert_eq!(section.item(&"item-1".into()).map(|i| i.tags.len()), Some(2));
    }

    #[test]
    fn test_title_falls_back_to_id() {
        let mut section = Section::<TestSite>::new("posts".into());
        assert_eq!(section.title(), "Posts");

        section.content.title = "Articles".into();
        assert_eq!(section.title(), "Articles");
    }
}
