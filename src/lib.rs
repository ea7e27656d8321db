//! # NoFake
//!
//! Claim verification against Indonesian news outlets. A user message is
//! either a new claim, which is searched for on Kompas, Detik and
//! AntaraNews, scraped and handed to a generative model for a fact-check, or
//! a follow-up question answered from the conversation history alone.
//!
//! ## Architecture
//!
//! 1. **Classification**: decide verify vs. follow-up ([`analysis::intent`])
//! 2. **Search**: query every configured site through the proxy chain
//!    ([`scrapers::search`], [`fetch`])
//! 3. **Scraping**: extract article bodies ([`scrapers::content`])
//! 4. **Analysis**: one model call over the gathered context
//!    ([`analysis::orchestrator`], [`api`])
//!
//! ```no_run
//! # async fn run() -> nofake::Result<()> {
//! let config = nofake::AppConfig::default();
//! let checker = nofake::FactChecker::from_config(&config, Some("API_KEY".into()))?;
//! let result = checker.analyze("vaksin covid menyebabkan autisme", &[]).await;
//! println!("{}", result.analysis);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fetch;
pub mod models;
pub mod scrapers;
pub mod utils;

pub use analysis::{FactChecker, PipelineOptions, SearchOutcome, generate_chat_title};
pub use api::{GeminiClient, LanguageModel, RetryModel};
pub use config::AppConfig;
pub use conversation::{ChatSession, ConversationStore, InMemoryStore};
pub use error::{Error, Result};
pub use fetch::{DocumentSource, ProxyGateway};
pub use models::{AnalysisResult, AnalysisStatus, Article, ConversationTurn, Intent, Role, SiteConfig};
pub use scrapers::SiteRegistry;
