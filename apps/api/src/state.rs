use std::sync::Arc;

use crate::assistant::memory::ConversationStore;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::rag::{OpenAiEmbedder, RagStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Assistant conversation history, keyed by session id. In-memory only.
    pub conversations: Arc<ConversationStore>,
    /// CV / job-description vector indexes, keyed by session id. In-memory only.
    pub rag: Arc<RagStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            llm: LlmClient::new(&config)?,
            config,
            conversations: Arc::new(ConversationStore::new()),
            rag: Arc::new(RagStore::new()),
        })
    }

    /// Embedder bound to the caller's key for the duration of one request.
    pub fn embedder(&self, api_key: &str) -> OpenAiEmbedder {
        OpenAiEmbedder::new(self.llm.clone(), api_key)
    }
}
