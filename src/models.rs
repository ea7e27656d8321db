//! Data models shared across the pipeline.
//!
//! - [`SiteConfig`]: static description of one news source
//! - [`Article`]: a search hit, optionally enriched with scraped content
//! - [`ConversationTurn`]: one message of the caller-owned chat history
//! - [`AnalysisResult`]: the uniform record produced for every user turn
//!
//! Everything here serializes with camelCase field names so results can be
//! handed to a JSON front-end unchanged.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Search and extraction rules for one news source.
///
/// Loaded once at startup (built-in registry or config file) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Display name; also the `source` of every article found on this site.
    pub name: String,
    /// Origin that relative hrefs are resolved against, e.g. `https://www.detik.com`.
    pub base_url: String,
    /// Search URL. `{query}` is replaced by the encoded query; without the
    /// placeholder the encoded query is appended.
    pub search_url_template: String,
    /// Matches the result links (elements carrying `href`).
    pub article_selector: String,
    /// Looked up inside each matched link to find its title.
    pub title_selector: String,
    /// Primary selector for the article body on the article page.
    pub content_selector: String,
    /// Attribute on the link element consulted when `title_selector` finds nothing.
    #[serde(default)]
    pub title_fallback_attribute: Option<String>,
}

impl SiteConfig {
    /// Build the search URL for `query`.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = urlencoding::encode(query);
        if self.search_url_template.contains("{query}") {
            self.search_url_template.replace("{query}", &encoded)
        } else {
            format!("{}{}", self.search_url_template, encoded)
        }
    }
}

/// A news article found by a site search.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Always absolute.
    pub url: String,
    /// Name of the [`SiteConfig`] it came from.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            content: None,
            scraped_at: None,
        }
    }
}

/// Distinct article sources in first-seen order.
pub fn distinct_sources(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .map(|a| a.source.clone())
        .unique()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One message of a conversation, as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub message: String,
}

impl ConversationTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            message: message.into(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            message: message.into(),
        }
    }
}

/// What the user wants from the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// A new claim: search and analyze.
    VerifyInformation,
    /// A question about an earlier answer: respond from history only.
    FollowupQuestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Success,
    NoArticlesFound,
    SearchError,
    Error,
}

pub const NO_ARTICLES_MESSAGE: &str = "Tidak ditemukan artikel berita yang relevan untuk memverifikasi informasi ini. Silakan coba dengan kata kunci yang berbeda atau periksa sumber lain.";
pub const SEARCH_ERROR_MESSAGE: &str =
    "Terjadi kesalahan saat mencari informasi. Silakan coba lagi nanti.";

/// Outcome of one user turn. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub query: String,
    pub status: AnalysisStatus,
    /// Model answer, or a user-facing Indonesian message for failures.
    pub analysis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// RFC 3339, set on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Articles that made up the analysis context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<Article>>,
}

impl AnalysisResult {
    /// Answer produced by the verification branch from `articles`.
    pub fn verified(query: &str, analysis: String, articles: Vec<Article>) -> Self {
        let sources = distinct_sources(&articles);
        Self {
            query: query.to_string(),
            status: AnalysisStatus::Success,
            analysis,
            source_count: Some(sources.len()),
            sources: Some(sources),
            timestamp: Some(Utc::now().to_rfc3339()),
            search_results: Some(articles),
        }
    }

    /// Answer to a follow-up question; no sources were consulted.
    pub fn followup(query: &str, analysis: String) -> Self {
        Self {
            query: query.to_string(),
            status: AnalysisStatus::Success,
            analysis,
            source_count: Some(0),
            sources: Some(Vec::new()),
            timestamp: Some(Utc::now().to_rfc3339()),
            search_results: None,
        }
    }

    pub fn no_articles(query: &str) -> Self {
        Self::failure(query, AnalysisStatus::NoArticlesFound, NO_ARTICLES_MESSAGE.to_string())
    }

    pub fn search_error(query: &str) -> Self {
        Self::failure(query, AnalysisStatus::SearchError, SEARCH_ERROR_MESSAGE.to_string())
    }

    pub fn error(query: &str, err: &crate::Error) -> Self {
        Self::failure(
            query,
            AnalysisStatus::Error,
            format!("Terjadi kesalahan sistem: {err}"),
        )
    }

    fn failure(query: &str, status: AnalysisStatus, analysis: String) -> Self {
        Self {
            query: query.to_string(),
            status,
            analysis,
            source_count: None,
            sources: None,
            timestamp: None,
            search_results: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}
