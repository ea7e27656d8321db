//! Proxy-chain document fetching.
//!
//! News sites frequently refuse or throttle direct requests, so every page is
//! requested through an ordered list of relay endpoints. Each proxy gets a
//! fixed number of attempts, each attempt is bounded by its own timeout, and
//! the first successful body wins. When everything fails the caller receives
//! [`Error::Network`] listing every attempt; no placeholder content is ever
//! substituted.
//!
//! # Proxy kinds
//!
//! | Kind | Detected by | Request | Body |
//! |------|-------------|---------|------|
//! | [`ProxyKind::JsonWrapped`] | `allorigins.win` | proxy + encoded url | JSON, `contents` field |
//! | [`ProxyKind::Encoded`] | `thingproxy.freeboard.io` | proxy + encoded url | raw text |
//! | [`ProxyKind::Prefix`] | anything else | proxy + url | raw text |
//!
//! An empty proxy URL with the `Prefix` kind is a direct fetch.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use rand::{Rng, rng};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

pub const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

/// Pick a user agent from [`USER_AGENTS`].
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[rng().random_range(0..USER_AGENTS.len())]
}

/// Anything that can turn a URL into a document body.
///
/// Search and extraction only depend on this trait, so tests can swap the
/// network for canned pages.
pub trait DocumentSource {
    async fn fetch(&self, url: &str) -> Result<String>;
}

impl<T: DocumentSource> DocumentSource for &T {
    async fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyKind {
    JsonWrapped,
    Encoded,
    Prefix,
}

impl ProxyKind {
    /// Infer the kind from the proxy URL.
    pub fn detect(proxy_url: &str) -> Self {
        if proxy_url.contains("allorigins.win") {
            ProxyKind::JsonWrapped
        } else if proxy_url.contains("thingproxy.freeboard.io") {
            ProxyKind::Encoded
        } else {
            ProxyKind::Prefix
        }
    }
}

/// One relay in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProxyEndpoint {
    pub url: String,
    /// Overrides detection from `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProxyKind>,
}

impl ProxyEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: None,
        }
    }

    pub fn with_kind(url: impl Into<String>, kind: ProxyKind) -> Self {
        Self {
            url: url.into(),
            kind: Some(kind),
        }
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind.unwrap_or_else(|| ProxyKind::detect(&self.url))
    }

    /// The URL actually requested to retrieve `target` through this proxy.
    pub fn request_url(&self, target: &str) -> String {
        match self.kind() {
            ProxyKind::JsonWrapped | ProxyKind::Encoded => {
                format!("{}{}", self.url, urlencoding::encode(target))
            }
            ProxyKind::Prefix => format!("{}{}", self.url, target),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JsonWrappedBody {
    #[serde(default)]
    contents: Option<String>,
}

/// Fetches documents through an ordered proxy chain.
#[derive(Debug, Clone)]
pub struct ProxyGateway {
    client: reqwest::Client,
    proxies: Vec<ProxyEndpoint>,
    timeout: Duration,
    retry_delay: Duration,
    max_retries: usize,
}

impl ProxyGateway {
    pub fn new(proxies: Vec<ProxyEndpoint>) -> Self {
        let defaults = FetchConfig::default();
        Self {
            client: reqwest::Client::new(),
            proxies,
            timeout: defaults.timeout(),
            retry_delay: defaults.retry_delay(),
            max_retries: defaults.max_retries,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.proxies.clone())
            .with_timeout(config.timeout())
            .with_retry_delay(config.retry_delay())
            .with_max_retries(config.max_retries)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch `url` through the proxy chain.
    ///
    /// Each proxy is tried `max_retries + 1` times with `retry_delay` between
    /// attempts. `headers` are sent with every attempt; a random browser user
    /// agent is added per attempt unless `headers` already carries one.
    #[instrument(level = "info", skip(self, headers), fields(proxies = self.proxies.len()))]
    pub async fn fetch_document(
        &self,
        url: &str,
        headers: &HeaderMap,
        max_retries: usize,
    ) -> Result<String> {
        let mut attempts = Vec::new();

        for (index, proxy) in self.proxies.iter().enumerate() {
            for retry in 0..=max_retries {
                let label = attempt_label(index, retry);
                debug!(%label, proxy = %proxy.url, "Trying proxy");
                let t0 = Instant::now();

                match timeout(self.timeout, self.attempt(proxy, url, headers)).await {
                    Ok(Ok(body)) => {
                        info!(
                            %label,
                            kind = ?proxy.kind(),
                            bytes = body.len(),
                            elapsed_ms = t0.elapsed().as_millis() as u64,
                            "Proxy fetch succeeded"
                        );
                        return Ok(body);
                    }
                    Ok(Err(e)) => {
                        warn!(%label, error = %e, "Proxy fetch failed");
                        attempts.push(format!("{label} failed: {e}"));
                    }
                    Err(_) => {
                        warn!(%label, timeout_ms = self.timeout.as_millis() as u64, "Proxy fetch timed out");
                        attempts.push(format!(
                            "{label} failed: timed out after {}ms",
                            self.timeout.as_millis()
                        ));
                    }
                }

                if retry < max_retries {
                    sleep(self.retry_delay).await;
                }
            }
        }

        error!(%url, attempts = attempts.len(), "All proxies failed");
        Err(Error::Network {
            url: url.to_string(),
            attempts,
        })
    }

    async fn attempt(&self, proxy: &ProxyEndpoint, url: &str, headers: &HeaderMap) -> Result<String> {
        let request_url = proxy.request_url(url);
        let response = self
            .client
            .get(&request_url)
            .headers(request_headers(headers))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        match proxy.kind() {
            ProxyKind::JsonWrapped => {
                let wrapped: JsonWrappedBody = response.json().await?;
                wrapped
                    .contents
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| Error::Parse("relay returned no contents".into()))
            }
            ProxyKind::Encoded | ProxyKind::Prefix => Ok(response.text().await?),
        }
    }
}

impl DocumentSource for ProxyGateway {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.fetch_document(url, &HeaderMap::new(), self.max_retries)
            .await
    }
}

fn attempt_label(index: usize, retry: usize) -> String {
    if retry > 0 {
        format!("proxy {} (retry {retry})", index + 1)
    } else {
        format!("proxy {}", index + 1)
    }
}

fn request_headers(extra: &HeaderMap) -> HeaderMap {
    let mut headers = extra.clone();
    if !headers.contains_key(USER_AGENT) {
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("id,en-US;q=0.7,en;q=0.3"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}
