//! Markdown content: front matter, typed metadata and HTML rendering.

mod decoder;
mod factory;
mod front_matter;

pub use decoder::{DecodeError, MetadataDate, decode_metadata};
pub(crate) use factory::add_markdown_files;
pub use front_matter::split_front_matter;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag as MdTag, TagEnd, html};
use std::{fmt, time::Duration};

/// Date format used when the site does not set one.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Post-processing hook applied to every rendered body.
pub type Modifier = Box<dyn Fn(String) -> String + Send + Sync>;

/// Markdown to HTML renderer with installable modifiers.
pub struct MarkdownParser {
    date_format: String,
    modifiers: Vec<Modifier>,
}

/// A rendered Markdown document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// Text of the first level-1 heading.
    pub title: Option<String>,
}

impl MarkdownParser {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Run `modifier` on every body rendered after this call.
    pub fn add_modifier(&mut self, modifier: impl Fn(String) -> String + Send + Sync + 'static) {
        self.modifiers.push(Box::new(modifier));
    }

    pub fn render(&self, markdown: &str) -> Rendered {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        let mut title = None;
        let mut heading: Option<String> = None;
        let events = Parser::new_ext(markdown, options).inspect(|event| match event {
            Event::Start(MdTag::Heading {
                level: HeadingLevel::H1,
                ..
            }) if title.is_none() => heading = Some(String::new()),
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = heading.as_mut() {
                    heading.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                if let Some(text) = heading.take() {
                    title = Some(text);
                }
            }
            _ => {}
        });

        let mut body = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut body, events);

        let html = self
            .modifiers
            .iter()
            .fold(body, |html, modifier| modifier(html));
        Rendered { html, title }
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl fmt::Debug for MarkdownParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownParser")
            .field("date_format", &self.date_format)
            .field("modifiers", &self.modifiers.len())
            .finish()
    }
}

/// Parse a front matter date.
///
/// Tries `format` as a date-time, then as a plain date (midnight UTC), then
/// RFC 3339.
pub fn parse_date(value: &str, format: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
        return Some(date.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return date.and_hms_opt(0, 0, 0).map(|date| date.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Parse `HH:MM:SS`, `MM:SS` or plain seconds.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let parts = value
        .trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let secs = match parts.as_slice() {
        [s] => *s,
        [m, s] => m * 60 + s,
        [h, m, s] => h * 3600 + m * 60 + s,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
