//! Text extraction from uploaded PDF and plain-text files.

use std::path::Path;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("File type not allowed. Only PDF and TXT files are supported.")]
    UnsupportedType(String),

    #[error("Could not read file: {0}")]
    Unreadable(String),

    #[error("Could not extract text from file")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detects the kind from the file extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Self, DocumentError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("txt") => Ok(DocumentKind::Text),
            _ => Err(DocumentError::UnsupportedType(filename.to_string())),
        }
    }
}

/// Extracts trimmed text from the uploaded bytes.
///
/// PDF pages are joined with newlines. Text files are decoded as UTF-8, replacing
/// invalid sequences.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match DocumentKind::from_filename(filename)? {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            warn!(filename, error = %e, "PDF extraction failed");
            DocumentError::Unreadable(e.to_string())
        })?,
        DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(text.to_string())
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
