//! News source search and scraping.
//!
//! Every source is described by data ([`crate::models::SiteConfig`]) rather
//! than code, and processed in the same two phases:
//!
//! 1. **Search**: fetch the site's search page for the query and collect
//!    article links ([`search`])
//! 2. **Scrape**: fetch each article and extract its body text ([`content`])
//!
//! # Supported Sources
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | Kompas | [`sites`] | Title from `.articleTitle` |
//! | Detik | [`sites`] | Title falls back to the `dtr-ttl` attribute |
//! | AntaraNews | [`sites`] | Title falls back to the `title` attribute |
//!
//! Failures are logged and skipped: one site or article going wrong never
//! fails the batch.

pub mod content;
pub mod search;
pub mod sites;

pub use content::{extract_content, extract_from_html, scrape_all};
pub use search::{search_all_sites, search_site};
pub use sites::SiteRegistry;
