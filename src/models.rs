//! Core data models used throughout ChatRAG.
//!
//! These records are the crate's own contracts: uploads, chunks, chat turns,
//! and ingestion outcomes flow between the processor, the index, the
//! controller, and the front-ends without exposing any collaborator type.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A file handed to the system by a front-end (HTTP upload or CLI path).
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, naming the upload after its file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// A bounded span of document text with its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Name of the uploaded file the text came from.
    pub source: String,
    /// 1-based page number.
    pub page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A file skipped during ingestion, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredFile {
    pub name: String,
    pub reason: String,
}

impl std::fmt::Display for IgnoredFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.reason)
    }
}

/// Outcome of one ingestion request.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub success: bool,
    /// Human-readable status text.
    pub message: String,
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    pub ignored: Vec<IgnoredFile>,
}

/// Descriptive counts about the vector index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub entries: usize,
    /// Number of distinct source files with at least one entry.
    pub sources: usize,
    /// Vector dimensionality, `None` while the index is empty.
    pub dims: Option<usize>,
}
