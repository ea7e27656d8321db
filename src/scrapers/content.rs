//! Article body extraction and the batch scraper.
//!
//! Extraction walks a cascade until some stage yields enough text:
//!
//! 1. the site's own content selector
//! 2. generic containers ([`FALLBACK_SELECTORS`])
//! 3. all text of the document
//!
//! Inside a container, paragraphs are collected while anything under
//! navigation, headers, footers, scripts or ad blocks is ignored.

use crate::error::{Error, Result};
use crate::fetch::DocumentSource;
use crate::models::Article;
use crate::scrapers::search::parse_selector;
use crate::scrapers::sites::SiteRegistry;
use crate::utils::{truncate_chars, truncate_for_log};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Content is accepted only when longer than this many characters.
pub const MIN_CONTENT_CHARS: usize = 50;
/// Accepted content is cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

pub const FALLBACK_SELECTORS: [&str; 5] = [
    "article",
    ".article-content",
    ".post-content",
    ".content",
    "[class*=\"content\"]",
];

static UNWANTED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, header, footer, .ads, .advertisement").expect("valid selector")
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static NON_TEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script, style, noscript").expect("valid selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("valid selector"));
static GENERIC: Lazy<Vec<Selector>> = Lazy::new(|| {
    FALLBACK_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid selector"))
        .collect()
});

/// Text of `el`, skipping text that sits under an element matching `skip`
/// between the text node and `container` (exclusive).
fn text_outside(el: ElementRef<'_>, container: ElementRef<'_>, skip: &Selector) -> String {
    el.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let blocked = node
                .ancestors()
                .take_while(|a| a.id() != container.id())
                .filter_map(ElementRef::wrap)
                .any(|a| skip.matches(&a));
            (!blocked).then_some(&**text)
        })
        .collect()
}

/// Newline-joined paragraph text of a container, ignoring non-content subtrees.
fn paragraph_text(container: ElementRef<'_>) -> String {
    let own = (container.value().name() == "p").then_some(container);
    own.into_iter()
        .chain(container.select(&PARAGRAPH))
        .map(|p| text_outside(p, container, &UNWANTED).trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whole-document fallback: every visible line, trimmed, joined by spaces.
fn document_text(document: &Html) -> String {
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    text_outside(root, root, &NON_TEXT)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn accept(content: String) -> Option<String> {
    let content = content.trim();
    (content.chars().count() > MIN_CONTENT_CHARS).then(|| truncate_chars(content, MAX_CONTENT_CHARS).to_string())
}

/// Extract article text from an already fetched page.
///
/// Returns `None` when no stage of the cascade produced enough text. An empty
/// or unparsable `content_selector` skips straight to the generic stages.
pub fn extract_from_html(html: &str, content_selector: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let primary = if content_selector.trim().is_empty() {
        None
    } else {
        parse_selector(content_selector)
            .inspect_err(|e| warn!(error = %e, "Ignoring content selector"))
            .ok()
    };

    let from_containers = primary
        .iter()
        .chain(GENERIC.iter())
        .filter_map(|selector| document.select(selector).next())
        .find_map(|container| accept(paragraph_text(container)));

    from_containers.or_else(|| accept(document_text(&document)))
}

/// Fetch `url` and extract its article text.
#[instrument(level = "info", skip(source))]
pub async fn extract_content<S: DocumentSource>(source: &S, url: &str, content_selector: &str) -> Result<String> {
    let html = source.fetch(url).await?;
    let content = extract_from_html(&html, content_selector).ok_or_else(|| Error::NoContent { url: url.to_string() })?;
    debug!(chars = content.chars().count(), preview = %truncate_for_log(&content, 120), "Extracted content");
    Ok(content)
}

/// Scrape every article, dropping the ones that fail.
///
/// The content selector comes from the article's source in `registry`;
/// unknown sources go straight to the generic cascade. Surviving articles
/// keep their relative order.
#[instrument(level = "info", skip_all, fields(articles = articles.len()))]
pub async fn scrape_all<S: DocumentSource>(
    source: &S,
    registry: &SiteRegistry,
    articles: Vec<Article>,
    concurrency: usize,
) -> Vec<Article> {
    let total = articles.len();

    let scraped: Vec<Article> = stream::iter(articles.into_iter().enumerate())
        .map(|(i, mut article)| async move {
            let selector = registry
                .get(&article.source)
                .map(|site| site.content_selector.as_str())
                .unwrap_or("");
            debug!(index = i + 1, total, source = %article.source, title = %truncate_for_log(&article.title, 50), "Scraping article");

            match extract_content(source, &article.url, selector).await {
                Ok(content) => {
                    info!(url = %article.url, chars = content.chars().count(), "Scraped article");
                    article.content = Some(content);
                    article.scraped_at = Some(Utc::now());
                    Some(article)
                }
                Err(e) => {
                    warn!(url = %article.url, error = %e, "Failed to scrape article; dropping it");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(total, scraped = scraped.len(), "Finished scraping articles");
    scraped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SiteConfig;
    use std::collections::HashMap;

    const ARTICLE_PAGE: &str = r#"
        <html><head><title>Berita</title><script>var x = 1;</script></head>
        <body>
          <header><p>Menu utama situs berita yang panjang sekali dan tidak relevan</p></header>
          <div class="read__content">
            <p>Kementerian Kesehatan menyatakan vaksin COVID-19 telah melalui uji klinis.</p>
            <nav><p>Baca juga: artikel lain yang tidak berhubungan dengan topik ini</p></nav>
            <p>   </p>
            <p>Efek samping yang dilaporkan umumnya ringan dan bersifat sementara.</p>
            <div class="ads"><p>Iklan: beli sekarang juga diskon besar-besaran hari ini</p></div>
          </div>
          <footer><p>Hak cipta dilindungi undang-undang, seluruh isi situs ini</p></footer>
        </body></html>
    "#;

    #[test]
    fn test_primary_selector_strips_noise() {
        let content = extract_from_html(ARTICLE_PAGE, ".read__content").unwrap();
        assert_eq!(
            content,
            "Kementerian Kesehatan menyatakan vaksin COVID-19 telah melalui uji klinis.\n\
             Efek samping yang dilaporkan umumnya ringan dan bersifat sementara."
        );
    }

    #[test]
    fn test_falls_back_to_generic_container() {
        let html = r#"<body><article>
            <p>Presiden meresmikan bendungan baru di Jawa Tengah pada hari Senin pagi.</p>
        </article></body>"#;
        let content = extract_from_html(html, ".does-not-exist").unwrap();
        assert!(content.starts_with("Presiden meresmikan"));
    }

    #[test]
    fn test_short_primary_content_moves_to_next_stage() {
        let html = r#"<body>
            <div class="lead"><p>Terlalu pendek.</p></div>
            <div class="post-content"><p>Polisi menetapkan tiga tersangka dalam kasus penipuan daring tersebut.</p></div>
        </body>"#;
        let content = extract_from_html(html, ".lead").unwrap();
        assert!(content.starts_with("Polisi menetapkan"));
    }

    #[test]
    fn test_paragraph_container_counts_itself() {
        let html = r#"<body><div class="articleLead">
            <p>Badan Meteorologi memperkirakan hujan lebat di sebagian besar wilayah Jakarta.</p>
        </div></body>"#;
        let content = extract_from_html(html, ".articleLead p").unwrap();
        assert!(content.starts_with("Badan Meteorologi"));
    }

    #[test]
    fn test_whole_document_fallback() {
        let html = r#"<html><body><script>ignored()</script>
            <div>Harga beras naik</div>
            <span>di beberapa pasar tradisional menjelang akhir bulan ini</span>
        </body></html>"#;
        let content = extract_from_html(html, "").unwrap();
        assert_eq!(
            content,
            "Harga beras naik di beberapa pasar tradisional menjelang akhir bulan ini"
        );
    }

    #[test]
    fn test_insufficient_content_everywhere() {
        assert_eq!(extract_from_html("<html><body><p>Kosong.</p></body></html>", "p"), None);
    }

    #[test]
    fn test_truncates_to_max_chars() {
        let long = "kata ".repeat(1000);
        let html = format!("<body><article><p>{long}</p></article></body>");
        let content = extract_from_html(&html, "article").unwrap();
        assert_eq!(content.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = extract_from_html(ARTICLE_PAGE, ".read__content");
        let second = extract_from_html(ARTICLE_PAGE, ".read__content");
        assert_eq!(first, second);
    }

    struct Pages(HashMap<&'static str, &'static str>);

    impl DocumentSource for Pages {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .map(|s| s.to_string())
                .ok_or_else(|| Error::Network {
                    url: url.to_string(),
                    attempts: vec![],
                })
        }
    }

    fn registry() -> SiteRegistry {
        SiteRegistry::new(vec![SiteConfig {
            name: "Kompas".into(),
            base_url: "https://www.kompas.com".into(),
            search_url_template: "https://search.kompas.com/search?q=".into(),
            article_selector: ".article-link".into(),
            title_selector: ".articleTitle".into(),
            content_selector: ".read__content".into(),
            title_fallback_attribute: None,
        }])
    }

    #[tokio::test]
    async fn test_extract_content_reports_no_content() {
        let pages = Pages(HashMap::from([("https://k/empty", "<p>x</p>")]));
        let err = extract_content(&pages, "https://k/empty", "p").await.unwrap_err();
        assert!(matches!(err, Error::NoContent { url } if url == "https://k/empty"));
    }

    #[tokio::test]
    async fn test_scrape_all_filters_without_reordering() {
        let pages = Pages(HashMap::from([
            ("https://k/1", ARTICLE_PAGE),
            ("https://k/3", ARTICLE_PAGE),
            ("https://k/4", "<p>pendek</p>"),
        ]));
        let input = vec![
            Article::new("satu", "https://k/1", "Kompas"),
            Article::new("dua", "https://k/2", "Kompas"),
            Article::new("tiga", "https://k/3", "Unknown"),
            Article::new("empat", "https://k/4", "Kompas"),
        ];

        for concurrency in [1, 4] {
            let out = scrape_all(&pages, &registry(), input.clone(), concurrency).await;
            let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
            assert_eq!(titles, vec!["satu", "tiga"]);
            assert!(out.iter().all(|a| a.content.is_some() && a.scraped_at.is_some()));
        }
    }
}
