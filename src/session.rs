//! Per-session chat log and the rules tying it to controller actions.
//!
//! Both front-ends (HTTP and terminal) go through [`SessionState`], so the
//! history behaves identically everywhere:
//! - a reset clears the history,
//! - a successful ingestion clears the history,
//! - a failed ingestion leaves it untouched.

use anyhow::Result;

use crate::controller::RagController;
use crate::models::{ChatMessage, IngestResult, UploadedFile};

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    messages: Vec<ChatMessage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Ingests `files`; the history is cleared only on success.
    pub async fn upload(
        &mut self,
        controller: &mut RagController,
        files: &[UploadedFile],
    ) -> IngestResult {
        let result = controller.ingest(files).await;
        if result.success {
            self.messages.clear();
        }
        result
    }

    /// Resets the controller and clears the history.
    pub fn reset(&mut self, controller: &mut RagController) {
        controller.reset();
        self.messages.clear();
    }

    /// Runs one chat turn and records both sides of it.
    ///
    /// The controller sees the history as it was before `prompt`. If the
    /// answer fails, the pending user message is withdrawn so the log never
    /// holds a question without its reply.
    pub async fn send(&mut self, controller: &RagController, prompt: &str) -> Result<String> {
        self.messages.push(ChatMessage::user(prompt));
        let history_len = self.messages.len() - 1;

        let result = controller
            .answer(prompt, &self.messages[..history_len])
            .await;
        match result {
            Ok(answer) => {
                self.messages.push(ChatMessage::assistant(answer.clone()));
                Ok(answer)
            }
            Err(e) => {
                self.messages.truncate(history_len);
                Err(e)
            }
        }
    }
}
