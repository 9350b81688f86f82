//! Generation steps: HTML, feeds and the sitemap.

pub mod feed;
pub mod html;
pub mod podcast;
pub mod rss;
pub mod sitemap;
