//! Sitemap generation.
//!
//! Lists the index, every section with its items, and every page. Always
//! regenerated: the output is a pure function of the content model.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/posts</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </url>
//! </urlset>
//! ```

use crate::{content::SitePath, context::Context, log, site::Website};
use anyhow::Result;
use chrono::{DateTime, Utc};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const SITEMAP_PATH: &str = "sitemap.xml";

// ============================================================================
// Public API
// ============================================================================

/// Write `sitemap.xml`, skipping every location under an excluded prefix.
pub fn generate<S: Website>(ctx: &Context<'_, S>, excluded_paths: &[SitePath]) -> Result<()> {
    let sitemap = Sitemap::from_context(ctx, excluded_paths);
    let count = sitemap.urls.len();
    ctx.write_output_file(SITEMAP_PATH, sitemap.into_xml())?;
    log!("sitemap"; "{count} urls");
    Ok(())
}

// ============================================================================
// Sitemap Implementation
// ============================================================================

struct Sitemap {
    urls: Vec<UrlEntry>,
}

struct UrlEntry {
    loc: String,
    /// `YYYY-MM-DD`
    lastmod: String,
}

impl Sitemap {
    fn from_context<S: Website>(ctx: &Context<'_, S>, excluded_paths: &[SitePath]) -> Self {
        let site = ctx.site();
        let mut urls = Vec::new();
        let mut push = |path: &SitePath, lastmod: DateTime<Utc>| {
            if !excluded_paths.iter().any(|excluded| path.has_prefix(excluded)) {
                urls.push(UrlEntry {
                    loc: site.url_for(path),
                    lastmod: lastmod.format("%Y-%m-%d").to_string(),
                });
            }
        };

        let index = ctx.index();
        push(&index.path(), index.content.last_modified);

        for section in ctx.sections() {
            push(&section.path(), section.last_modified());
            for item in section.items() {
                push(&item.absolute_path(), item.content.last_modified);
            }
        }

        for page in ctx.pages() {
            push(&page.path, page.content.last_modified);
        }

        Self { urls }
    }

    fn into_xml(self) -> String {
        let mut xml = String::with_capacity(4096);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Tests
// ============================================================================
