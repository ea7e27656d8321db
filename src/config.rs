//! Runtime configuration.
//!
//! Everything has a default, so an empty (or absent) YAML file yields a
//! working setup that searches the built-in sites through a direct fetch with
//! a public proxy as fallback:
//!
//! ```yaml
//! fetch:
//!   proxies:
//!     - url: ""
//!     - url: "https://api.allorigins.win/get?url="
//!   timeout_secs: 10
//!   retry_delay_ms: 1000
//!   max_retries: 2
//! search:
//!   results_per_site: 1
//!   concurrency: 1
//! model:
//!   name: gemini-2.5-flash
//! ```

use crate::error::{Error, Result};
use crate::fetch::ProxyEndpoint;
use crate::models::SiteConfig;
use crate::scrapers::sites::SiteRegistry;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
    pub model: ModelConfig,
    /// Replaces the built-in site registry when present.
    pub sites: Option<Vec<SiteConfig>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub proxies: Vec<ProxyEndpoint>,
    pub timeout_secs: u64,
    pub retry_delay_ms: u64,
    /// Retries per proxy; each proxy gets `max_retries + 1` attempts.
    pub max_retries: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            proxies: vec![
                ProxyEndpoint::new(""),
                ProxyEndpoint::new("https://api.allorigins.win/get?url="),
            ],
            timeout_secs: 10,
            retry_delay_ms: 1000,
            max_retries: 2,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub results_per_site: usize,
    /// Sites searched at once. 1 searches them one after another.
    pub concurrency: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            results_per_site: 1,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub concurrency: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub endpoint: String,
    /// Usually supplied through `GEMINI_API_KEY` instead.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub base_delay_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: 60,
            max_retries: 2,
            base_delay_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = if yaml.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_yaml(&raw)?;
        info!(
            proxies = config.fetch.proxies.len(),
            sites = config.registry().len(),
            model = %config.model.name,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The configured sites, or the built-in registry.
    pub fn registry(&self) -> SiteRegistry {
        match &self.sites {
            Some(sites) => SiteRegistry::new(sites.clone()),
            None => SiteRegistry::builtin(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.proxies.is_empty() {
            return Err(Error::Config("at least one proxy endpoint is required".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(Error::Config("fetch.timeout_secs must be at least 1".into()));
        }
        if self.search.results_per_site == 0 {
            return Err(Error::Config("search.results_per_site must be at least 1".into()));
        }
        if self.search.concurrency == 0 || self.scrape.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".into()));
        }
        if let Some(sites) = &self.sites {
            if sites.is_empty() {
                return Err(Error::Config("site list must not be empty".into()));
            }
            for site in sites {
                for selector in [
                    &site.article_selector,
                    &site.title_selector,
                    &site.content_selector,
                ] {
                    Selector::parse(selector).map_err(|e| {
                        Error::Config(format!("{}: invalid selector {selector:?}: {e}", site.name))
                    })?;
                }
                url::Url::parse(&site.base_url)
                    .map_err(|e| Error::Config(format!("{}: invalid base_url: {e}", site.name)))?;
            }
        }
        Ok(())
    }
}
