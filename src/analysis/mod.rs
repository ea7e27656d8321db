//! Intent classification, prompt construction and the fact-checking pipeline.

pub mod intent;
pub mod orchestrator;
pub mod prompts;
pub mod title;

pub use intent::classify_intent;
pub use orchestrator::{FactChecker, PipelineOptions, SearchOutcome};
pub use title::generate_chat_title;
