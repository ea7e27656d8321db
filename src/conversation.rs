//! Conversation state: ordered message history per conversation.
//!
//! Persistence is behind [`ConversationStore`]; [`InMemoryStore`] is enough
//! for the CLI and tests. [`ChatSession`] ties a store to a [`FactChecker`]:
//! every user message is analyzed against the messages that came before it.

use crate::analysis::{FactChecker, generate_chat_title};
use crate::api::LanguageModel;
use crate::error::{Error, Result};
use crate::fetch::DocumentSource;
use crate::models::{AnalysisResult, ConversationTurn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: u64,
    pub is_user: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&StoredMessage> for ConversationTurn {
    fn from(stored: &StoredMessage) -> Self {
        if stored.is_user {
            ConversationTurn::user(&stored.message)
        } else {
            ConversationTurn::assistant(&stored.message)
        }
    }
}

/// Ordered, append-only message log keyed by conversation id.
pub trait ConversationStore {
    /// Append a message and return its id.
    async fn append_message(&self, conversation_id: &str, is_user: bool, message: &str) -> Result<u64>;

    /// All messages of a conversation, oldest first. Unknown ids are empty.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<StoredMessage>>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    conversations: HashMap<String, Vec<StoredMessage>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryStore {
    async fn append_message(&self, conversation_id: &str, is_user: bool, message: &str) -> Result<u64> {
        if conversation_id.trim().is_empty() {
            return Err(Error::Storage("conversation id must not be empty".into()));
        }
        let mut state = self.inner.lock().await;
        state.next_id += 1;
        let id = state.next_id;
        state
            .conversations
            .entry(conversation_id.to_string())
            .or_default()
            .push(StoredMessage {
                id,
                is_user,
                message: message.to_string(),
                timestamp: Utc::now(),
            });
        Ok(id)
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<StoredMessage>> {
        let state = self.inner.lock().await;
        Ok(state
            .conversations
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn history_from_messages(messages: &[StoredMessage]) -> Vec<ConversationTurn> {
    messages.iter().map(ConversationTurn::from).collect()
}

/// A fact checker bound to a conversation store.
pub struct ChatSession<F, M, S> {
    checker: FactChecker<F, M>,
    store: S,
}

impl<F, M, S> ChatSession<F, M, S>
where
    F: DocumentSource,
    M: LanguageModel,
    S: ConversationStore,
{
    pub fn new(checker: FactChecker<F, M>, store: S) -> Self {
        Self { checker, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record `text` as a user message, analyze it and record the answer.
    ///
    /// Blank input is ignored and returns `Ok(None)`.
    #[instrument(level = "info", skip(self, text), fields(chars = text.chars().count()))]
    pub async fn send(&self, conversation_id: &str, text: &str) -> Result<Option<AnalysisResult>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let history = history_from_messages(&self.store.list_messages(conversation_id).await?);
        self.store.append_message(conversation_id, true, text).await?;

        let result = self.checker.analyze(text, &history).await;
        self.store
            .append_message(conversation_id, false, &result.analysis)
            .await?;

        info!(status = ?result.status, history = history.len(), "Turn recorded");
        Ok(Some(result))
    }

    /// Title for a conversation opened with `first_message`.
    pub async fn start_conversation(&self, first_message: &str) -> String {
        generate_chat_title(self.checker.model(), first_message).await
    }
}
