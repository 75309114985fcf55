//! Session controller: ingestion, lazy pipeline construction, answers, reset.
//!
//! The controller owns the only piece of conversational state the system
//! has: whether a [`ConversationPipeline`] exists. It is absent until the
//! first ingestion that indexes at least one chunk, and dropped again by
//! [`RagController::reset`].

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::document::DocumentProcessor;
use crate::extract::DocumentError;
use crate::factory::ModelFactory;
use crate::index::VectorIndex;
use crate::llm::ChatModel;
use crate::models::{ChatMessage, IgnoredFile, IndexStats, IngestResult, UploadedFile};
use crate::pipeline::ConversationPipeline;

/// Reply given to a question asked before any document was indexed.
pub const UPLOAD_FIRST_MESSAGE: &str = "Please, upload the documents first.";

/// Status text when no uploaded file produced any text.
pub const NO_VALID_PDF_MESSAGE: &str =
    "No valid PDF was uploaded. Your files may be not readable or corrupted.";

const REASON_NOT_READABLE: &str = "Not readable PDF file.";
const REASON_PROCESSING: &str = "Error processing PDF file.";
const REASON_NO_TEXT: &str = "No extractable text.";

pub struct RagController {
    processor: DocumentProcessor,
    index: VectorIndex,
    chat_model: Arc<dyn ChatModel>,
    pipeline: Option<ConversationPipeline>,
}

impl RagController {
    pub fn new(factory: &ModelFactory, config: &Config) -> Result<Self> {
        let processor = DocumentProcessor::new(&config.chunking)?;
        let index = VectorIndex::new(
            factory.embeddings(),
            config.embedding.batch_size,
            config.retrieval.top_k,
        );

        Ok(Self {
            processor,
            index,
            chat_model: factory.chat_model(),
            pipeline: None,
        })
    }

    /// Replaces the document processor built from configuration.
    pub fn with_processor(mut self, processor: DocumentProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Processes every upload and indexes whatever text was found.
    ///
    /// Per-file failures are reported in the result and never abort the
    /// remaining files. When no file produced a chunk, nothing is indexed
    /// and the pipeline state is left as it was.
    pub async fn ingest(&mut self, files: &[UploadedFile]) -> IngestResult {
        let mut all_chunks = Vec::new();
        let mut files_indexed = 0usize;
        let mut ignored = Vec::new();

        for file in files {
            match self.processor.process(Some(file)) {
                Ok(chunks) if chunks.is_empty() => {
                    tracing::warn!(file = %file.name, "no extractable text");
                    ignored.push(ignore(file, REASON_NO_TEXT));
                }
                Ok(chunks) => {
                    tracing::info!(file = %file.name, chunks = chunks.len(), "document processed");
                    all_chunks.extend(chunks);
                    files_indexed += 1;
                }
                Err(DocumentError::NotReadable(e)) => {
                    tracing::warn!(file = %file.name, error = %e, "not a readable PDF");
                    ignored.push(ignore(file, REASON_NOT_READABLE));
                }
                Err(DocumentError::Processing(e)) => {
                    tracing::warn!(file = %file.name, error = %e, "failed to process document");
                    ignored.push(ignore(file, REASON_PROCESSING));
                }
            }
        }

        if all_chunks.is_empty() {
            return IngestResult {
                success: false,
                message: NO_VALID_PDF_MESSAGE.to_string(),
                files_indexed: 0,
                chunks_indexed: 0,
                ignored,
            };
        }

        if let Err(e) = self.index.add(&all_chunks).await {
            tracing::error!(error = %e, "indexing failed");
            return IngestResult {
                success: false,
                message: format!("Failed to index documents: {}", e),
                files_indexed: 0,
                chunks_indexed: 0,
                ignored,
            };
        }

        if self.pipeline.is_none() {
            self.pipeline = Some(ConversationPipeline::new(
                self.index.retriever(),
                Arc::clone(&self.chat_model),
            ));
            tracing::info!("conversation pipeline ready");
        }

        IngestResult {
            success: true,
            message: success_message(files_indexed, &ignored),
            files_indexed,
            chunks_indexed: all_chunks.len(),
            ignored,
        }
    }

    /// Answers `query`; `history` holds the turns before it.
    ///
    /// Before the first successful ingestion this returns
    /// [`UPLOAD_FIRST_MESSAGE`] without touching the index or the model.
    pub async fn answer(&self, query: &str, history: &[ChatMessage]) -> Result<String> {
        match &self.pipeline {
            None => Ok(UPLOAD_FIRST_MESSAGE.to_string()),
            Some(pipeline) => pipeline.invoke(query, history).await,
        }
    }

    /// Empties the index and drops the pipeline. Idempotent.
    pub fn reset(&mut self) {
        self.index.clear();
        self.pipeline = None;
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

fn ignore(file: &UploadedFile, reason: &str) -> IgnoredFile {
    IgnoredFile {
        name: file.name.clone(),
        reason: reason.to_string(),
    }
}

/// Status text for a successful ingestion.
pub fn success_message(files_indexed: usize, ignored: &[IgnoredFile]) -> String {
    let mut status = format!("Success! {} indexed PDFs.", files_indexed);
    if !ignored.is_empty() {
        status.push_str("\n\nIgnored files:");
        for file in ignored {
            status.push_str(&format!("\n- {}", file));
        }
    }
    status
}
