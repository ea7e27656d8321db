use nofake::fetch::{ProxyEndpoint, ProxyKind};
use nofake::{
    AnalysisStatus, ConversationTurn, DocumentSource, Error, FactChecker, LanguageModel, PipelineOptions,
    ProxyGateway, Result, SiteConfig, SiteRegistry,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned pages; any other URL fails like an exhausted proxy chain.
struct CannedWeb {
    pages: HashMap<String, String>,
}

impl CannedWeb {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }
}

impl DocumentSource for CannedWeb {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages.get(url).cloned().ok_or_else(|| Error::Network {
            url: url.to_string(),
            attempts: vec!["proxy 1 failed: HTTP 403 Forbidden".to_string()],
        })
    }
}

/// Answers by prompt kind and records every prompt it was given.
struct ScriptedModel {
    intent: &'static str,
    fail_analysis: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(intent: &'static str) -> Self {
        Self {
            intent,
            fail_analysis: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Jawab HANYA dengan") {
            return Ok(self.intent.to_string());
        }
        if self.fail_analysis {
            return Err(Error::Model("Gemini API error: quota exceeded".to_string()));
        }
        Ok("**Kesimpulan**: klaim tidak didukung bukti. Tingkat kepercayaan: Tinggi.".to_string())
    }
}

fn site(name: &str) -> SiteConfig {
    let host = name.to_lowercase();
    SiteConfig {
        name: name.to_string(),
        base_url: format!("https://www.{host}.test"),
        search_url_template: format!("https://www.{host}.test/search?q={{query}}"),
        article_selector: ".result a".to_string(),
        title_selector: ".title".to_string(),
        content_selector: ".body p".to_string(),
        title_fallback_attribute: None,
    }
}

fn registry() -> SiteRegistry {
    SiteRegistry::new(vec![site("Kompas"), site("Detik"), site("Antara")])
}

fn results_page(href: &str, title: &str) -> String {
    format!(r#"<div class="result"><a href="{href}"><span class="title">{title}</span></a></div>"#)
}

fn article_page(text: &str) -> String {
    format!(r#"<html><body><nav><p>menu</p></nav><div class="body"><p>{text}</p></div></body></html>"#)
}

const LONG_TEXT: &str = "Kementerian Kesehatan menegaskan tidak ada bukti ilmiah yang menghubungkan vaksin dengan autisme.";

#[tokio::test]
async fn new_claim_is_verified_against_multiple_sources() {
    let kompas_results = results_page("/read/1", "Vaksin tidak sebabkan autisme");
    let detik_results = results_page("https://www.detik.test/berita/2", "Hoaks vaksin");
    let kompas_article = article_page(LONG_TEXT);
    let detik_article = article_page(LONG_TEXT);
    let web = CannedWeb::new(&[
        ("https://www.kompas.test/search?q=vaksin%20covid", &kompas_results),
        ("https://www.detik.test/search?q=vaksin%20covid", &detik_results),
        ("https://www.kompas.test/read/1", &kompas_article),
        ("https://www.detik.test/berita/2", &detik_article),
    ]);
    let checker = FactChecker::new(web, ScriptedModel::new("FOLLOWUP_QUESTION"), registry());

    let result = checker.analyze("vaksin covid", &[]).await;

    assert_eq!(result.status, AnalysisStatus::Success);
    assert_eq!(result.source_count, Some(2));
    assert_eq!(result.sources, Some(vec!["Kompas".to_string(), "Detik".to_string()]));
    assert!(result.timestamp.is_some());

    let context = result.search_results.unwrap();
    assert_eq!(context.len(), 2);
    assert!(context.iter().all(|a| a.content.as_deref() == Some(LONG_TEXT)));

    // empty history: no classification call, only the analysis
    let prompts = checker.model().prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("--- Artikel 2 ---"));
    assert!(prompts[0].contains("(Kompas, Detik, Antara)"));
}

#[tokio::test]
async fn followup_is_answered_from_history_without_searching() {
    let history = vec![
        ConversationTurn::user("apakah X benar?"),
        ConversationTurn::assistant("X tidak benar karena..."),
    ];
    let checker = FactChecker::new(CannedWeb::new(&[]), ScriptedModel::new("FOLLOWUP_QUESTION"), registry());

    let result = checker.analyze("jelaskan lebih lanjut", &history).await;

    assert_eq!(result.status, AnalysisStatus::Success);
    assert_eq!(result.source_count, Some(0));
    assert_eq!(result.sources, Some(Vec::new()));
    assert!(result.search_results.is_none());

    let prompts = checker.model().prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("User: apakah X benar?\n\nAssistant: X tidak benar karena..."));
}

#[tokio::test]
async fn every_site_failing_is_a_search_error() {
    let checker = FactChecker::new(CannedWeb::new(&[]), ScriptedModel::new("VERIFY_INFORMATION"), registry());

    let result = checker.analyze("banjir jakarta", &[]).await;

    assert_eq!(result.status, AnalysisStatus::SearchError);
    assert_eq!(result.analysis, nofake::models::SEARCH_ERROR_MESSAGE);
    assert!(result.source_count.is_none());
    assert!(checker.model().prompts().is_empty());
}

#[tokio::test]
async fn unscrapable_article_still_reaches_analysis() {
    let results = results_page("/read/9", "Banjir rendam Jakarta");
    let empty_article = article_page("pendek");
    let web = CannedWeb::new(&[
        ("https://www.kompas.test/search?q=banjir", &results),
        ("https://www.kompas.test/read/9", &empty_article),
    ]);
    let checker = FactChecker::new(web, ScriptedModel::new("VERIFY_INFORMATION"), registry());

    let result = checker.analyze("banjir", &[]).await;

    assert_eq!(result.status, AnalysisStatus::Success);
    assert_eq!(result.source_count, Some(1));
    let context = result.search_results.unwrap();
    assert_eq!(context[0].url, "https://www.kompas.test/read/9");
    assert!(context[0].content.is_none());

    let prompts = checker.model().prompts();
    assert!(prompts[0].contains("Judul: Banjir rendam Jakarta"));
    assert!(!prompts[0].contains("Konten:"));
}

#[tokio::test]
async fn sites_without_hits_mean_no_articles() {
    let web = CannedWeb::new(&[
        ("https://www.kompas.test/search?q=zzz", "<p>Tidak ada hasil</p>"),
        ("https://www.detik.test/search?q=zzz", "<p>Tidak ada hasil</p>"),
    ]);
    let checker = FactChecker::new(web, ScriptedModel::new("VERIFY_INFORMATION"), registry());

    let result = checker.analyze("zzz", &[]).await;

    assert_eq!(result.status, AnalysisStatus::NoArticlesFound);
    assert_eq!(result.analysis, nofake::models::NO_ARTICLES_MESSAGE);
}

#[tokio::test]
async fn model_failure_becomes_error_result() {
    let results = results_page("/read/1", "Judul");
    let article = article_page(LONG_TEXT);
    let web = CannedWeb::new(&[
        ("https://www.kompas.test/search?q=hoaks", &results),
        ("https://www.kompas.test/read/1", &article),
    ]);
    let mut model = ScriptedModel::new("VERIFY_INFORMATION");
    model.fail_analysis = true;
    let checker = FactChecker::new(web, model, registry());

    let result = checker.analyze("hoaks", &[]).await;

    assert_eq!(result.status, AnalysisStatus::Error);
    assert!(result.analysis.starts_with("Terjadi kesalahan sistem: "));
    assert!(result.analysis.contains("quota exceeded"));
}

#[tokio::test]
async fn concurrent_search_keeps_registry_order() {
    let kompas_results = results_page("/a", "A");
    let detik_results = results_page("/b", "B");
    let antara_results = results_page("/c", "C");
    let web = CannedWeb::new(&[
        ("https://www.kompas.test/search?q=x", &kompas_results),
        ("https://www.detik.test/search?q=x", &detik_results),
        ("https://www.antara.test/search?q=x", &antara_results),
    ]);
    let checker = FactChecker::new(web, ScriptedModel::new("VERIFY_INFORMATION"), registry()).with_options(
        PipelineOptions {
            results_per_site: 5,
            search_concurrency: 3,
            scrape_concurrency: 3,
        },
    );

    let result = checker.analyze("x", &[]).await;

    assert_eq!(
        result.sources,
        Some(vec!["Kompas".to_string(), "Detik".to_string(), "Antara".to_string()])
    );
}

#[tokio::test]
async fn relay_without_contents_is_a_search_error() {
    let relay = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "contents": null,
            "status": {"http_code": 403}
        })))
        .mount(&relay)
        .await;

    let gateway = ProxyGateway::new(vec![ProxyEndpoint::with_kind(
        format!("{}/get?url=", relay.uri()),
        ProxyKind::JsonWrapped,
    )])
    .with_retry_delay(Duration::from_millis(1))
    .with_max_retries(1);
    let checker = FactChecker::new(
        gateway,
        ScriptedModel::new("VERIFY_INFORMATION"),
        SiteRegistry::new(vec![site("Kompas")]),
    );

    let result = checker.analyze("vaksin", &[]).await;

    assert_eq!(result.status, AnalysisStatus::SearchError);
    assert_eq!(relay.received_requests().await.unwrap().len(), 2);
    assert!(checker.model().prompts().is_empty());
}
