//! Conversation pipeline: retrieve → format context → prompt → model → text.

use anyhow::Result;
use std::sync::Arc;

use crate::index::Retriever;
use crate::llm::{ChatModel, PromptMessage};
use crate::models::{ChatMessage, Chunk};

/// System instruction; `{context}` is replaced with the retrieved text.
pub const SYSTEM_TEMPLATE: &str = "You are a virtual assistant in a chatbot. Always answer in the language of the user's question.
The user has uploaded PDF files, and passages retrieved from them are given to you as context.
Use this context to answer the questions.
If you do not know the answer, say politely that this information is not in the uploaded documents.
You have access to the conversation history to better understand the context of the user's questions.

Document context:
{context}";

/// The question-answering function built once documents exist.
#[derive(Clone)]
pub struct ConversationPipeline {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    system_template: String,
}

impl ConversationPipeline {
    pub fn new(retriever: Retriever, model: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            model,
            system_template: SYSTEM_TEMPLATE.to_string(),
        }
    }

    pub fn with_system_template(mut self, template: impl Into<String>) -> Self {
        self.system_template = template.into();
        self
    }

    /// Answers `query` with `history` (the turns before `query`) as context.
    ///
    /// The model's reply is returned as-is.
    pub async fn invoke(&self, query: &str, history: &[ChatMessage]) -> Result<String> {
        let chunks = self.retriever.retrieve(query).await?;
        tracing::debug!(retrieved = chunks.len(), "retrieved context");

        let context = format_context(&chunks);
        let messages = self.build_prompt(&context, query, history);
        self.model.complete(&messages).await
    }

    /// System message with context, then prior turns, then the query.
    pub fn build_prompt(
        &self,
        context: &str,
        query: &str,
        history: &[ChatMessage],
    ) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(PromptMessage::system(
            self.system_template.replace("{context}", context),
        ));
        messages.extend(history.iter().map(PromptMessage::from));
        messages.push(PromptMessage::user(query));
        messages
    }
}

/// Joins chunk texts with blank lines.
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
