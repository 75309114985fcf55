//! Model factory: the chat model and embedding clients, built once.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::llm::{create_chat_model, ChatModel};

/// Holds the two model handles for the lifetime of the process.
#[derive(Clone)]
pub struct ModelFactory {
    chat: Arc<dyn ChatModel>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl ModelFactory {
    /// Builds both clients from configuration and environment credentials.
    ///
    /// Missing or unusable credentials are a startup failure.
    pub fn new(config: &Config) -> Result<Self> {
        let chat = create_chat_model(&config.llm).context("Failed to create chat model client")?;
        let embeddings =
            create_provider(&config.embedding).context("Failed to create embedding client")?;

        tracing::info!(
            chat_provider = %config.llm.provider,
            chat_model = %chat.model_name(),
            embedding_provider = %config.embedding.provider,
            embedding_model = %embeddings.model_name(),
            "models configured"
        );

        Ok(Self { chat, embeddings })
    }

    /// Wraps already-built clients.
    pub fn from_parts(chat: Arc<dyn ChatModel>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chat, embeddings }
    }

    pub fn chat_model(&self) -> Arc<dyn ChatModel> {
        Arc::clone(&self.chat)
    }

    pub fn embeddings(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embeddings)
    }
}
