//! Chat-completion clients.
//!
//! Groq, OpenAI and Ollama all speak the OpenAI `chat/completions` JSON
//! dialect, so a single [`OpenAiCompatibleChat`] client covers every
//! provider; only the base URL and the credential differ.
//!
//! | Provider | Base URL | Credential |
//! |----------|----------|------------|
//! | `groq`   | `https://api.groq.com/openai/v1` | `GROQ_API_KEY` |
//! | `openai` | `https://api.openai.com/v1` | `OPENAI_API_KEY` |
//! | `ollama` | `http://localhost:11434/v1` | none |

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::http::JsonEndpoint;
use crate::models::{ChatMessage, Role};

pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-oss-20b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

/// One message of a prompt sent to a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::User => PromptRole::User,
            Role::Assistant => PromptRole::Assistant,
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

/// A hosted or local chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Sends the prompt and returns the plain text of the reply.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String>;
}

/// Client for any OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAiCompatibleChat {
    model: String,
    temperature: f32,
    endpoint: JsonEndpoint,
}

impl OpenAiCompatibleChat {
    /// Builds the client for `config.provider`.
    ///
    /// # Errors
    ///
    /// Fails when the provider is unknown or its API key is not set in the
    /// environment.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (label, default_url, key_var) = match config.provider.as_str() {
            "groq" => ("Groq", "https://api.groq.com/openai/v1", Some("GROQ_API_KEY")),
            "openai" => ("OpenAI", "https://api.openai.com/v1", Some("OPENAI_API_KEY")),
            "ollama" => ("Ollama", "http://localhost:11434/v1", None),
            other => bail!("Unknown llm provider: {}", other),
        };

        let api_key = match key_var {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => bail!("{} environment variable not set", var),
            },
            None => None,
        };

        let base = config.url.as_deref().unwrap_or(default_url);
        let url = format!("{}/chat/completions", base.trim_end_matches('/'));
        let endpoint = JsonEndpoint::new(
            label,
            url,
            api_key,
            config.timeout_secs,
            config.max_retries,
        )?;

        Ok(Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            temperature: config.temperature,
            endpoint,
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": messages,
        });

        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");
        let json = self.endpoint.post(&body).await?;
        parse_chat_response(&json)
    }
}

/// Extracts `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}

pub fn create_chat_model(config: &LlmConfig) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(OpenAiCompatibleChat::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  Olá!\n" } },
                { "message": { "role": "assistant", "content": "second" } }
            ]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "  Olá!\n");
    }

    #[test]
    fn missing_content_is_an_error() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_chat_response(&json).is_err());
    }

    #[test]
    fn prompt_roles_serialize_lowercase() {
        let value = serde_json::to_value(PromptMessage::system("x")).unwrap();
        assert_eq!(value["role"], "system");
        let value = serde_json::to_value(PromptMessage::from(&ChatMessage::assistant("y"))).unwrap();
        assert_eq!(value["role"], "assistant");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            model: Some("llama3.2".to_string()),
            ..LlmConfig::default()
        };
        let chat = OpenAiCompatibleChat::new(&config).unwrap();
        assert_eq!(chat.model_name(), "llama3.2");
        assert!((chat.temperature() - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "mystery".to_string(),
            ..LlmConfig::default()
        };
        assert!(OpenAiCompatibleChat::new(&config).is_err());
    }
}
