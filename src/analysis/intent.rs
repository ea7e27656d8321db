//! Verify-vs-follow-up intent classification.

use crate::analysis::prompts::classifier_prompt;
use crate::api::LanguageModel;
use crate::error::Error;
use crate::models::{ConversationTurn, Intent};
use tracing::{info, instrument, warn};

/// Read the classifier's answer. Anything but an explicit follow-up is a
/// verification request.
pub fn parse_intent(response: &str) -> Intent {
    if response.to_uppercase().contains("FOLLOWUP_QUESTION") {
        Intent::FollowupQuestion
    } else {
        Intent::VerifyInformation
    }
}

/// Decide whether `query` is a new claim or a question about the history.
///
/// Without history this is always [`Intent::VerifyInformation`] and the model
/// is not consulted. Model failures also fall back to verification so a
/// claim is never silently left unchecked.
#[instrument(level = "info", skip_all, fields(history = history.len()))]
pub async fn classify_intent<M: LanguageModel>(model: &M, query: &str, history: &[ConversationTurn]) -> Intent {
    if history.is_empty() {
        return Intent::VerifyInformation;
    }

    match model.generate(&classifier_prompt(query, history)).await {
        Ok(response) => {
            let intent = parse_intent(response.trim());
            info!(?intent, raw = %response.trim(), "Intent classified");
            intent
        }
        Err(e) => {
            let e = Error::Classification(e.to_string());
            warn!(error = %e, "Defaulting to VERIFY_INFORMATION");
            Intent::VerifyInformation
        }
    }
}
