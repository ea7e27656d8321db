//! Error taxonomy for the verification pipeline.
//!
//! Per-site and per-article failures are caught where they happen and never
//! reach the caller of [`crate::FactChecker::analyze`]; the variants here are
//! what those boundaries log, and what library users see from the lower-level
//! building blocks.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Every proxy and every retry failed.
    #[error("failed to fetch {url} after trying all proxies: {}", attempts.join("; "))]
    Network { url: String, attempts: Vec<String> },

    /// A relay answered with a non-success status.
    #[error("HTTP {code} {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no content found in article {url}")]
    NoContent { url: String },

    #[error("intent classification failed: {0}")]
    Classification(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("all news sites failed: {}", .0.join("; "))]
    AllSitesFailed(Vec<String>),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
