//! Generative model access with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`LanguageModel`]: single-shot, stateless text completion
//! - [`GeminiClient`]: the Gemini `generateContent` REST endpoint
//! - [`RetryModel`]: decorator that adds retry logic to any [`LanguageModel`]
//!
//! The pipeline keeps no server-side session: every call carries its full
//! context in the prompt.
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Text-in, text-out model boundary.
pub trait LanguageModel {
    /// Complete `prompt` and return the model's text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

impl<T: LanguageModel> LanguageModel for &T {
    async fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt).await
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`LanguageModel`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryModel<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryModel<T>
where
    T: LanguageModel,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1u32 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryModel")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> LanguageModel for RetryModel<T>
where
    T: LanguageModel,
{
    #[instrument(level = "info", skip_all)]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.generate(prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "generate() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "generate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: StdDuration,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout: StdDuration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let res = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        let resp: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Model(format!(
                "HTTP {}: unreadable response ({e}): {}",
                status.as_u16(),
                truncate_for_log(&body, 200)
            ))
        })?;

        if let Some(error) = resp.error {
            return Err(Error::Model(format!("Gemini API error: {}", error.message)));
        }

        let text = resp
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .filter(|t| !t.trim().is_empty());

        text.ok_or_else(|| Error::Model("no content returned from Gemini".into()))
    }
}

impl LanguageModel for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = match timeout(self.timeout, self.call(prompt)).await {
            Ok(res) => res,
            Err(_) => Err(Error::Model(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        };
        let dt = t0.elapsed();

        match &res {
            Ok(text) => {
                info!(
                    elapsed_ms = dt.as_millis() as u64,
                    prompt_chars = prompt.chars().count(),
                    response_chars = text.chars().count(),
                    "Model call succeeded"
                );
                debug!(response_preview = %truncate_for_log(text, 300), "Model response");
            }
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Model call failed"),
        }
        res
    }
}

/// Build the retrying Gemini client described by `config`.
///
/// `api_key` takes precedence over the key stored in the config file.
pub fn model_from_config(config: &ModelConfig, api_key: Option<String>) -> Result<RetryModel<GeminiClient>> {
    let key = api_key
        .or_else(|| config.api_key.clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Config("a Gemini API key is required (GEMINI_API_KEY)".into()))?;

    let client = GeminiClient::new(&config.endpoint, &config.name, key)
        .with_timeout(StdDuration::from_secs(config.timeout_secs));
    Ok(RetryModel::new(
        client,
        config.max_retries,
        StdDuration::from_millis(config.base_delay_ms),
    ))
}
