//! Text extraction from uploaded files

use std::path::Path;

use tracing::debug;

use crate::errors::ExplorerError;
use crate::errors::Result;

/// File formats accepted for ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::Text),
            Some(other) => Err(ExplorerError::UnsupportedFileType(format!(".{other}"))),
            None => Err(ExplorerError::UnsupportedFileType(filename.to_string())),
        }
    }
}

/// Reduce a client-supplied filename to its final path component
pub fn sanitize_filename(raw: &str) -> Result<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(ExplorerError::InvalidRequest(format!(
            "Invalid filename: {raw:?}"
        )));
    }
    Ok(name.to_string())
}

/// Extract plain text from the raw bytes of a document
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    let text = match kind {
        DocumentKind::Text => String::from_utf8(bytes.to_vec())
            .map_err(|e| ExplorerError::ParseError(format!("Text file is not valid UTF-8: {e}")))?,
        DocumentKind::Pdf => extract_pdf(bytes)?,
    };
    debug!("Extracted {} chars ({:?})", text.chars().count(), kind);
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed files instead of returning an error
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExplorerError::ParseError("PDF could not be read".to_string()))?
        .map_err(|e| ExplorerError::ParseError(format!("PDF text extraction failed: {e}")))
}
