//! Conversation titles.

use crate::analysis::prompts::title_prompt;
use crate::api::LanguageModel;
use crate::utils::ellipsize;
use tracing::{info, instrument, warn};

pub const MAX_TITLE_CHARS: usize = 50;
pub const DEFAULT_TITLE: &str = "Obrolan Baru";

/// Strip one layer of surrounding quotes and cap the length.
pub fn clean_title(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix(['"', '\''])
        .unwrap_or(trimmed);
    ellipsize(trimmed.trim(), MAX_TITLE_CHARS)
}

/// Ask the model for a short title for a conversation starting with `query`.
///
/// Falls back to the (shortened) query itself when the model is unavailable.
#[instrument(level = "info", skip_all)]
pub async fn generate_chat_title<M: LanguageModel>(model: &M, query: &str) -> String {
    match model.generate(&title_prompt(query)).await {
        Ok(raw) => {
            let title = clean_title(&raw);
            let title = if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            };
            info!(%title, "Generated chat title");
            title
        }
        Err(e) => {
            warn!(error = %e, "Title generation failed; using query");
            ellipsize(query.trim(), MAX_TITLE_CHARS)
        }
    }
}
