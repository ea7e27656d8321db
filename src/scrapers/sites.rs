//! Built-in Indonesian news sources.
//!
//! | Source | Search page | Title fallback |
//! |--------|-------------|----------------|
//! | Kompas | `search.kompas.com` | none |
//! | Detik | `detik.com/search/searchall` | `dtr-ttl` attribute |
//! | AntaraNews | `antaranews.com/search` | `title` attribute |

use crate::models::SiteConfig;

/// Read-only, ordered set of sources. Search results follow this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRegistry {
    sites: Vec<SiteConfig>,
}

impl SiteRegistry {
    pub fn new(sites: Vec<SiteConfig>) -> Self {
        Self { sites }
    }

    pub fn builtin() -> Self {
        Self::new(vec![kompas(), detik(), antaranews()])
    }

    pub fn get(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn kompas() -> SiteConfig {
    SiteConfig {
        name: "Kompas".to_string(),
        base_url: "https://www.kompas.com".to_string(),
        search_url_template: "https://search.kompas.com/search?q=".to_string(),
        article_selector: ".article-link".to_string(),
        title_selector: ".article-link .articleTitle".to_string(),
        content_selector: ".articleLead p".to_string(),
        title_fallback_attribute: None,
    }
}

fn detik() -> SiteConfig {
    SiteConfig {
        name: "Detik".to_string(),
        base_url: "https://www.detik.com".to_string(),
        search_url_template: "https://www.detik.com/search/searchall?query=".to_string(),
        article_selector: ".media__title a".to_string(),
        title_selector: ".media__title".to_string(),
        content_selector: ".media__desc".to_string(),
        title_fallback_attribute: Some("dtr-ttl".to_string()),
    }
}

fn antaranews() -> SiteConfig {
    SiteConfig {
        name: "AntaraNews".to_string(),
        base_url: "https://www.antaranews.com".to_string(),
        search_url_template: "https://www.antaranews.com/search?q=".to_string(),
        article_selector: ".card__post__content .card__post__title h2 a".to_string(),
        title_selector: ".card__post__content .card__post__title h2 a".to_string(),
        content_selector: ".card__post__content p".to_string(),
        title_fallback_attribute: Some("title".to_string()),
    }
}
