//! Site search: turn a query into candidate [`Article`]s.
//!
//! A single site failing (network, bad markup, invalid selector) never aborts
//! the multi-site search; only when every site fails does
//! [`search_all_sites`] return [`Error::AllSitesFailed`].

use crate::error::{Error, Result};
use crate::fetch::DocumentSource;
use crate::models::{Article, SiteConfig};
use crate::scrapers::sites::SiteRegistry;
use crate::utils::collapse_whitespace;
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const UNTITLED: &str = "No title";

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Parse(format!("invalid selector {selector:?}: {e}")))
}

/// Resolve an `href` found on a page of the site rooted at `base_url`.
///
/// Root-relative hrefs are appended to `base_url`, protocol-relative ones get
/// `https:`, absolute ones are kept, and anything else is joined against
/// `base_url`. Returns `None` for empty or unusable hrefs.
pub fn resolve_url(base_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    if href.starts_with('/') {
        return Some(format!("{}{}", base_url.trim_end_matches('/'), href));
    }
    if let Ok(absolute) = Url::parse(href) {
        return matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string());
    }
    Url::parse(base_url)
        .and_then(|base| base.join(href))
        .ok()
        .map(|u| u.to_string())
}

fn extract_title(link: ElementRef<'_>, title_selector: &Selector, site: &SiteConfig) -> String {
    let from_selector = link
        .select(title_selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    from_selector
        .or_else(|| {
            site.title_fallback_attribute
                .as_deref()
                .and_then(|attr| link.value().attr(attr))
                .map(collapse_whitespace)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Pull up to `max_results` articles out of a search results page.
///
/// Links without a resolvable `href` are skipped and do not count towards
/// the limit.
pub fn parse_search_results(site: &SiteConfig, html: &str, max_results: usize) -> Result<Vec<Article>> {
    let article_selector = parse_selector(&site.article_selector)?;
    let title_selector = parse_selector(&site.title_selector)?;
    let document = Html::parse_document(html);

    let articles = document
        .select(&article_selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let url = resolve_url(&site.base_url, href)?;
            Some(Article::new(extract_title(link, &title_selector, site), url, &site.name))
        })
        .take(max_results)
        .collect();

    Ok(articles)
}

/// Search one site for `query`.
#[instrument(level = "info", skip(source, site), fields(site = %site.name))]
pub async fn search_site<S: DocumentSource>(
    source: &S,
    site: &SiteConfig,
    query: &str,
    max_results: usize,
) -> Result<Vec<Article>> {
    let search_url = site.search_url(query);
    info!(%search_url, "Searching site");
    let t0 = Instant::now();

    let html = source.fetch(&search_url).await?;
    let articles = parse_search_results(site, &html, max_results)?;

    info!(
        count = articles.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Site search finished"
    );
    debug!(urls = ?articles.iter().map(|a| a.url.as_str()).collect::<Vec<_>>(), "Search hits");
    Ok(articles)
}

/// Search every registered site and merge the hits in registration order.
///
/// Up to `concurrency` sites are searched at once; results are still merged
/// in registration order. Fails only if every site failed.
#[instrument(level = "info", skip(source, registry), fields(sites = registry.len()))]
pub async fn search_all_sites<S: DocumentSource>(
    source: &S,
    registry: &SiteRegistry,
    query: &str,
    per_site_limit: usize,
    concurrency: usize,
) -> Result<Vec<Article>> {
    let outcomes: Vec<(&str, Result<Vec<Article>>)> = stream::iter(registry.iter())
        .map(|site| async move {
            (
                site.name.as_str(),
                search_site(source, site, query, per_site_limit).await,
            )
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut articles = Vec::new();
    let mut errors = Vec::new();
    let mut succeeded = 0usize;

    for (name, outcome) in outcomes {
        match outcome {
            Ok(found) => {
                info!(site = name, count = found.len(), "Site search succeeded");
                succeeded += 1;
                articles.extend(found);
            }
            Err(e) => {
                warn!(site = name, error = %e, "Site search failed");
                errors.push(format!("{name}: {e}"));
            }
        }
    }

    if succeeded == 0 && !errors.is_empty() {
        return Err(Error::AllSitesFailed(errors));
    }

    info!(
        total = articles.len(),
        succeeded,
        failed = errors.len(),
        "Multi-site search finished"
    );
    Ok(articles)
}
