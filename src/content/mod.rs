//! The content model: locations, tags, items, pages and sections.
//!
//! ```text
//! Context
//!  ├── Index                       (site root)
//!  ├── Section  ×  section ids     (items + path/tag indexes)
//!  │     └── Item                  (section id + relative path)
//!  └── Page     ×  explicit paths  (free-form content)
//! ```

mod item;
mod page;
mod path;
mod section;
mod tag;

pub use item::{Item, ItemRssProperties};
pub use page::Page;
pub use path::SitePath;
pub use section::Section;
pub use tag::Tag;

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Rendered content shared by every location.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub title: String,
    pub description: String,
    /// Rendered HTML body.
    pub body: String,
    pub date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub image_path: Option<SitePath>,
    pub audio: Option<Audio>,
    pub video: Option<Video>,
}

impl Default for Content {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: String::new(),
            description: String::new(),
            body: String::new(),
            date: now,
            last_modified: now,
            image_path: None,
            audio: None,
            video: None,
        }
    }
}

impl Content {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }
}

/// An audio attachment, used by podcast feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    pub url: String,
    /// MIME type, e.g. `audio/mpeg`.
    pub format: String,
    pub duration: Option<Duration>,
    pub byte_size: Option<u64>,
}

impl Audio {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: "audio/mpeg".into(),
            duration: None,
            byte_size: None,
        }
    }

    /// `HH:MM:SS`, the form podcast directories expect.
    pub fn duration_string(&self) -> Option<String> {
        let secs = self.duration?.as_secs();
        Some(format!(
            "{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        ))
    }
}

/// A video attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Video {
    Hosted(String),
    YouTube(String),
    Vimeo(String),
}

impl Video {
    /// Parse `youtube:ID`, `vimeo:ID` or a plain URL.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some(id) = value.strip_prefix("youtube:") {
            Self::YouTube(id.trim().to_owned())
        } else if let Some(id) = value.strip_prefix("vimeo:") {
            Self::Vimeo(id.trim().to_owned())
        } else {
            Self::Hosted(value.to_owned())
        }
    }

    pub fn embed_url(&self) -> String {
        match self {
            Self::Hosted(url) => url.clone(),
            Self::YouTube(id) => format!("https://www.youtube-nocookie.com/embed/{id}"),
            Self::Vimeo(id) => format!("https://player.vimeo.com/video/{id}"),
        }
    }
}

/// The site's root location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub content: Content,
}

impl Index {
    pub fn path(&self) -> SitePath {
        SitePath::root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_string() {
        let mut audio = Audio::new("https://cdn.example.com/1.mp3");
        assert_eq!(audio.duration_string(), None);

        audio.duration = Some(Duration::from_secs(3 * 3600 + 25 * 60 + 7));
        assert_eq!(audio.duration_string().as_deref(), Some("03:25:07"));
    }

    #[test]
    fn test_video_parse() {
        assert_eq!(Video::parse("youtube:abc"), Video::YouTube("abc".into()));
        assert_eq!(Video::parse("vimeo: 42"), Video::Vimeo("42".into()));
        assert_eq!(
            Video::parse("https://example.com/v.mp4"),
            Video::Hosted("https://example.com/v.mp4".into())
        );
        assert_eq!(
            Video::YouTube("abc".into()).embed_url(),
            "https://www.youtube-nocookie.com/embed/abc"
        );
    }
}
