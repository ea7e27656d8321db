//! The per-turn fact-checking pipeline.
//!
//! ```text
//! classify ──► follow-up ──────────────────────────► answer from history
//!     │
//!     └──────► search ──► scrape ──► fact-check prompt ──► answer with sources
//! ```
//!
//! [`FactChecker::analyze`] never fails: every outcome, including errors, is
//! an [`AnalysisResult`] with a status the caller can present.

use crate::analysis::intent::classify_intent;
use crate::analysis::prompts::{fact_check_prompt, followup_prompt};
use crate::api::{GeminiClient, LanguageModel, RetryModel, model_from_config};
use crate::config::AppConfig;
use crate::error::Result;
use crate::fetch::{DocumentSource, ProxyGateway};
use crate::models::{AnalysisResult, Article, ConversationTurn, Intent};
use crate::scrapers::{SiteRegistry, scrape_all, search_all_sites};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Knobs for the search phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub results_per_site: usize,
    pub search_concurrency: usize,
    pub scrape_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            results_per_site: 1,
            search_concurrency: 1,
            scrape_concurrency: 1,
        }
    }
}

impl From<&AppConfig> for PipelineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            results_per_site: config.search.results_per_site,
            search_concurrency: config.search.concurrency,
            scrape_concurrency: config.scrape.concurrency,
        }
    }
}

/// What the search phase produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Context articles: scraped when any scrape succeeded, otherwise the
    /// bare search hits.
    Found(Vec<Article>),
    NotFound,
    /// Every site failed.
    Failed(String),
}

/// Stateless claim verifier over a document source and a language model.
pub struct FactChecker<F, M> {
    fetcher: F,
    model: M,
    registry: SiteRegistry,
    options: PipelineOptions,
}

impl FactChecker<ProxyGateway, RetryModel<GeminiClient>> {
    /// Wire the production gateway and Gemini client from `config`.
    pub fn from_config(config: &AppConfig, api_key: Option<String>) -> Result<Self> {
        config.validate()?;
        let model = model_from_config(&config.model, api_key)?;
        Ok(Self::new(ProxyGateway::from_config(&config.fetch), model, config.registry())
            .with_options(PipelineOptions::from(config)))
    }
}

impl<F, M> FactChecker<F, M>
where
    F: DocumentSource,
    M: LanguageModel,
{
    pub fn new(fetcher: F, model: M, registry: SiteRegistry) -> Self {
        Self {
            fetcher,
            model,
            registry,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Answer one user turn.
    #[instrument(level = "info", skip(self, history), fields(history = history.len()))]
    pub async fn analyze(&self, query: &str, history: &[ConversationTurn]) -> AnalysisResult {
        let t0 = Instant::now();
        let intent = classify_intent(&self.model, query, history).await;

        let result = if intent == Intent::FollowupQuestion && !history.is_empty() {
            self.answer_followup(query, history).await
        } else {
            self.verify(query).await
        };

        info!(
            status = ?result.status,
            ?intent,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Analysis finished"
        );
        result
    }

    async fn answer_followup(&self, query: &str, history: &[ConversationTurn]) -> AnalysisResult {
        match self.model.generate(&followup_prompt(query, history)).await {
            Ok(answer) => AnalysisResult::followup(query, answer),
            Err(e) => {
                error!(error = %e, "Follow-up answer failed");
                AnalysisResult::error(query, &e)
            }
        }
    }

    async fn verify(&self, query: &str) -> AnalysisResult {
        let articles = match self.gather_evidence(query).await {
            SearchOutcome::Found(articles) => articles,
            SearchOutcome::NotFound => return AnalysisResult::no_articles(query),
            SearchOutcome::Failed(reason) => {
                error!(%reason, "Search failed on every site");
                return AnalysisResult::search_error(query);
            }
        };

        let names = self.registry.names();
        match self.model.generate(&fact_check_prompt(query, &articles, &names)).await {
            Ok(analysis) => AnalysisResult::verified(query, analysis, articles),
            Err(e) => {
                error!(error = %e, "Fact-check analysis failed");
                AnalysisResult::error(query, &e)
            }
        }
    }

    /// Search every site, then scrape what was found.
    #[instrument(level = "info", skip(self))]
    pub async fn gather_evidence(&self, query: &str) -> SearchOutcome {
        let found = match search_all_sites(
            &self.fetcher,
            &self.registry,
            query,
            self.options.results_per_site,
            self.options.search_concurrency,
        )
        .await
        {
            Ok(found) => found,
            Err(e) => return SearchOutcome::Failed(e.to_string()),
        };

        if found.is_empty() {
            info!("No articles found on any site");
            return SearchOutcome::NotFound;
        }

        let scraped = scrape_all(
            &self.fetcher,
            &self.registry,
            found.clone(),
            self.options.scrape_concurrency,
        )
        .await;

        if scraped.is_empty() {
            warn!(found = found.len(), "No article could be scraped; using search results only");
            SearchOutcome::Found(found)
        } else {
            SearchOutcome::Found(scraped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{AnalysisStatus, SiteConfig};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct Pages(HashMap<String, String>);

    impl DocumentSource for Pages {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0.get(url).cloned().ok_or_else(|| Error::Network {
                url: url.to_string(),
                attempts: vec!["proxy 1 failed: HTTP 404 Not Found".to_string()],
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
    }

    impl LanguageModel for Recorder {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("Ringkasan: informasi tidak akurat.".to_string())
        }
    }

    fn registry() -> SiteRegistry {
        SiteRegistry::new(vec![SiteConfig {
            name: "Kompas".to_string(),
            base_url: "https://www.kompas.test".to_string(),
            search_url_template: "https://search.kompas.test/search?q=".to_string(),
            article_selector: ".article-link".to_string(),
            title_selector: ".articleTitle".to_string(),
            content_selector: ".articleLead p".to_string(),
            title_fallback_attribute: None,
        }])
    }

    fn search_page() -> String {
        r#"<a class="article-link" href="/read/1"><h3 class="articleTitle">Vaksin aman</h3></a>"#.to_string()
    }

    #[tokio::test]
    async fn test_gather_evidence_degrades_to_search_hits() {
        let pages = Pages(HashMap::from([(
            "https://search.kompas.test/search?q=vaksin".to_string(),
            search_page(),
        )]));
        let checker = FactChecker::new(pages, Recorder::default(), registry());

        match checker.gather_evidence("vaksin").await {
            SearchOutcome::Found(articles) => {
                assert_eq!(articles.len(), 1);
                assert_eq!(articles[0].url, "https://www.kompas.test/read/1");
                assert!(articles[0].content.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gather_evidence_reports_total_failure() {
        let checker = FactChecker::new(Pages(HashMap::new()), Recorder::default(), registry());
        assert!(matches!(
            checker.gather_evidence("vaksin").await,
            SearchOutcome::Failed(reason) if reason.contains("Kompas")
        ));
    }

    #[tokio::test]
    async fn test_unscraped_context_still_analyzed() {
        let pages = Pages(HashMap::from([(
            "https://search.kompas.test/search?q=vaksin".to_string(),
            search_page(),
        )]));
        let checker = FactChecker::new(pages, Recorder::default(), registry());

        let result = checker.analyze("vaksin", &[]).await;
        assert_eq!(result.status, AnalysisStatus::Success);
        assert_eq!(result.sources, Some(vec!["Kompas".to_string()]));

        let prompts = checker.model().prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Judul: Vaksin aman"));
        assert!(!prompts[0].contains("Konten:"));
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = AppConfig::default();
        config.search.results_per_site = 3;
        config.scrape.concurrency = 4;
        let options = PipelineOptions::from(&config);
        assert_eq!(options.results_per_site, 3);
        assert_eq!(options.search_concurrency, 1);
        assert_eq!(options.scrape_concurrency, 4);
    }
}
