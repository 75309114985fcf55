//! PDF text extraction.
//!
//! Wraps `pdf-extract` so the rest of the crate sees per-page UTF-8 strings
//! and a [`DocumentError`] that separates "this is not a PDF we can read"
//! from every other failure.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use thiserror::Error;

/// MIME type accepted by the upload front-ends.
pub const MIME_PDF: &str = "application/pdf";

/// Per-file failure while turning an upload into chunks.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The PDF library rejected the file.
    #[error("not a readable PDF: {0}")]
    NotReadable(String),
    /// Any other failure (temporary file I/O, splitter setup).
    #[error("error processing document: {0}")]
    Processing(String),
}

impl From<std::io::Error> for DocumentError {
    fn from(e: std::io::Error) -> Self {
        DocumentError::Processing(e.to_string())
    }
}

/// Extracts the text of every page of the PDF at `path`, in page order.
///
/// The parser can panic on some malformed inputs; a panic is reported as
/// [`DocumentError::NotReadable`] like any other parse failure.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(DocumentError::NotReadable(e.to_string())),
        Err(_) => Err(DocumentError::NotReadable(
            "PDF parser aborted on malformed input".to_string(),
        )),
    }
}

/// Returns true when the file name or content type marks the upload as a PDF.
pub fn is_pdf_upload(file_name: &str, content_type: Option<&str>) -> bool {
    content_type == Some(MIME_PDF) || file_name.to_ascii_lowercase().ends_with(".pdf")
}
