//! Document processor: upload → per-page text → overlapping chunks.

use std::io::Write;
use std::path::PathBuf;

use crate::chunk::RecursiveCharacterSplitter;
use crate::config::ChunkingConfig;
use crate::extract::{extract_pdf_pages, DocumentError};
use crate::models::{Chunk, UploadedFile};

#[derive(Debug, Clone)]
pub struct DocumentProcessor {
    splitter: RecursiveCharacterSplitter,
    /// Where transient copies of uploads are written; system temp dir if unset.
    temp_dir: Option<PathBuf>,
}

impl DocumentProcessor {
    pub fn new(config: &ChunkingConfig) -> anyhow::Result<Self> {
        let splitter = RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            splitter,
            temp_dir: None,
        })
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Turns an upload into chunks tagged with the file name and page.
    ///
    /// The bytes are written to a temporary `.pdf` file for the parser; the
    /// file is removed when this function returns, whatever the outcome.
    /// A missing upload yields no chunks.
    pub fn process(&self, file: Option<&UploadedFile>) -> Result<Vec<Chunk>, DocumentError> {
        let Some(file) = file else {
            return Ok(Vec::new());
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("chatrag-").suffix(".pdf");
        let mut temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        temp.write_all(&file.bytes)?;
        temp.flush()?;

        let pages = extract_pdf_pages(temp.path())?;
        let chunks = self.split_pages(&file.name, &pages);

        tracing::debug!(
            file = %file.name,
            pages = pages.len(),
            chunks = chunks.len(),
            "processed document"
        );

        Ok(chunks)
    }

    /// Splits each page on its own so every chunk keeps its page number.
    pub fn split_pages(&self, source: &str, pages: &[String]) -> Vec<Chunk> {
        pages
            .iter()
            .enumerate()
            .flat_map(|(i, page)| {
                self.splitter
                    .split_text(page)
                    .into_iter()
                    .map(move |text| Chunk {
                        text,
                        source: source.to_string(),
                        page: i + 1,
                    })
            })
            .collect()
    }
}
