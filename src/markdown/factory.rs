//! Loading a folder of Markdown files into the context.
//!
//! ```text
//! content/
//!  ├── index.md                 index
//!  ├── posts/index.md           content of section `posts`
//!  ├── posts/hello.md           item `hello` of `posts`
//!  ├── posts/guide/index.md     item `guide` of `posts`
//!  └── about.md                 page `about`
//! ```
//!
//! Folders that are not declared sections only hold pages.

use super::{DecodeError, MetadataDate, decode_metadata, parse_duration, split_front_matter};
use crate::{
    content::{Audio, Content, Item, ItemRssProperties, Page, SitePath, Tag, Video},
    context::Context,
    error::{ContentError, StorageError},
    log,
    site::Website,
};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use walkdir::{DirEntry, WalkDir};

/// Front matter keys consumed by [`Content`] and [`ItemRssProperties`].
const RESERVED_KEYS: &[&str] = &["title", "description", "date", "tags", "image", "video"];
const RESERVED_PREFIXES: &[&str] = &["audio.", "rss."];

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key) || RESERVED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

// ============================================================================
// Reserved metadata
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReservedMetadata {
    title: Option<String>,
    description: Option<String>,
    date: Option<MetadataDate>,
    tags: Vec<String>,
    image: Option<String>,
    audio: Option<AudioMetadata>,
    video: Option<String>,
    rss: Option<RssMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AudioMetadata {
    url: String,
    format: Option<String>,
    duration: Option<String>,
    size: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssMetadata {
    guid: Option<String>,
    title_prefix: Option<String>,
    title_suffix: Option<String>,
    body_prefix: Option<String>,
    body_suffix: Option<String>,
    link: Option<String>,
}

impl AudioMetadata {
    fn into_audio(self) -> Result<Audio, DecodeError> {
        let duration = match &self.duration {
            Some(value) => Some(parse_duration(value).ok_or_else(|| {
                DecodeError::at("audio.duration", format!("cannot parse `{value}` as a duration"))
            })?),
            None => None,
        };
        let mut audio = Audio::new(self.url);
        if let Some(format) = self.format {
            audio.format = format;
        }
        audio.duration = duration;
        audio.byte_size = self.size;
        Ok(audio)
    }
}

impl From<RssMetadata> for ItemRssProperties {
    fn from(rss: RssMetadata) -> Self {
        Self {
            guid: rss.guid,
            title_prefix: rss.title_prefix,
            title_suffix: rss.title_suffix,
            body_prefix: rss.body_prefix,
            body_suffix: rss.body_suffix,
            link: rss.link,
        }
    }
}

// ============================================================================
// Markdown files
// ============================================================================

/// A parsed file: front matter plus rendered body.
struct MarkdownFile {
    /// Relative to the site root, for error reporting.
    path: PathBuf,
    entries: BTreeMap<String, String>,
    reserved: ReservedMetadata,
    content: Content,
}

impl MarkdownFile {
    fn read<S: Website>(ctx: &Context<'_, S>, entry: &DirEntry, path: PathBuf) -> Result<Self> {
        let text = ctx.read_file(&path)?;
        let modified = entry
            .metadata()
            .ok()
            .and_then(|metadata| metadata.modified().ok())
            .map_or_else(Utc::now, DateTime::<Utc>::from);

        let (entries, body) = split_front_matter(&text);
        let decode_failed = |source: DecodeError| ContentError::MetadataDecodingFailed {
            path: path.clone(),
            source,
        };
        let mut reserved: ReservedMetadata =
            decode_metadata(&entries, ctx.markdown().date_format()).map_err(decode_failed)?;

        let rendered = ctx.markdown().render(body);
        let audio = reserved
            .audio
            .take()
            .map(AudioMetadata::into_audio)
            .transpose()
            .map_err(decode_failed)?;

        let content = Content {
            title: reserved
                .title
                .take()
                .or(rendered.title)
                .unwrap_or_default(),
            description: reserved.description.take().unwrap_or_default(),
            body: rendered.html,
            date: reserved.date.take().map_or(modified, |date| date.0),
            last_modified: modified,
            image_path: reserved.image.take().map(SitePath::new),
            audio,
            video: reserved.video.as_deref().map(Video::parse),
        };

        Ok(Self {
            path,
            entries,
            reserved,
            content,
        })
    }

    fn tags(&self) -> Vec<Tag> {
        self.reserved.tags.iter().map(Tag::new).collect()
    }

    fn into_item<S: Website>(
        mut self,
        ctx: &Context<'_, S>,
        section: S::SectionId,
        path: SitePath,
    ) -> Result<Item<S>, ContentError> {
        let metadata = decode_metadata(&self.entries, ctx.markdown().date_format()).map_err(
            |source| ContentError::MetadataDecodingFailed {
                path: self.path.clone(),
                source,
            },
        )?;
        let tags = self.tags();
        let mut item = Item::new(path, section, metadata, tags, self.content);
        if let Some(rss) = self.reserved.rss.take() {
            item.rss_properties = rss.into();
        }
        Ok(item)
    }

    fn into_page(self, path: SitePath) -> Page {
        let mut page = Page::new(path, self.content);
        page.metadata = self
            .entries
            .into_iter()
            .filter(|(key, _)| !is_reserved(key))
            .collect();
        page
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Where a file lands in the content model.
#[derive(Debug, PartialEq, Eq)]
enum Location<I> {
    Index,
    Section(I),
    Item(I, SitePath),
    Page(SitePath),
}

/// Map a path relative to the content folder (without `.md`) to its location.
fn locate<I: Clone>(relative: &[&str], sections: &FxHashMap<String, I>) -> Location<I> {
    let trimmed = match relative {
        [rest @ .., "index"] => rest,
        all => all,
    };
    match trimmed {
        [] => Location::Index,
        [first, rest @ ..] => match sections.get(*first) {
            Some(id) if rest.is_empty() => Location::Section(id.clone()),
            Some(id) => Location::Item(id.clone(), SitePath::new(rest.join("/"))),
            None => Location::Page(SitePath::new(trimmed.join("/"))),
        },
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Add every Markdown file under `folder` (relative to the root).
pub(crate) fn add_markdown_files<S: Website>(
    ctx: &mut Context<'_, S>,
    folder: &Path,
) -> Result<()> {
    let absolute = ctx.storage().root().join(folder);
    if !absolute.is_dir() {
        return Err(StorageError::NotFound(folder.to_path_buf()).into());
    }
    let sections: FxHashMap<String, S::SectionId> = ctx
        .site()
        .section_ids()
        .into_iter()
        .map(|id| (id.to_string(), id))
        .collect();

    let mut count = 0;
    let walker = WalkDir::new(&absolute)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", folder.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }

        let relative = path.strip_prefix(&absolute)?.with_extension("");
        let components: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        let components: Vec<&str> = components.iter().map(String::as_str).collect();

        let file = MarkdownFile::read(ctx, &entry, folder.join(path.strip_prefix(&absolute)?))?;
        match locate(&components, &sections) {
            Location::Index => ctx.index_mut().content = file.content,
            Location::Section(id) => {
                if let Some(section) = ctx.section_mut(&id) {
                    section.content = file.content;
                }
            }
            Location::Item(id, item_path) => {
                let item = file.into_item(ctx, id, item_path)?;
                ctx.add_item(item)?;
            }
            Location::Page(page_path) => ctx.add_page(file.into_page(page_path)),
        }
        count += 1;
    }

    log!("markdown"; "{count} files from {}", folder.display());
    Ok(())
}
