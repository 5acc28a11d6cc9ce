//! Email text intake: uploaded files and form text.

use std::path::Path;

use tracing::debug;

use crate::error::IngestError;

/// Accepted upload kinds, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Text,
    Pdf,
}

impl UploadKind {
    /// Case-insensitive extension match.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Decode an uploaded file into email text.
///
/// `.txt` is read as UTF-8 with invalid sequences replaced; `.pdf` pages are
/// extracted and joined with blank lines. PDF parsing is CPU-bound, so async
/// callers should run this on a blocking thread.
pub fn email_text_from_upload(filename: &str, bytes: &[u8]) -> Result<String, IngestError> {
    let kind = UploadKind::from_filename(filename).ok_or_else(|| IngestError::UnsupportedFormat {
        filename: filename.to_string(),
    })?;

    let text = match kind {
        UploadKind::Text => String::from_utf8_lossy(bytes).into_owned(),
        UploadKind::Pdf => pdf_text(bytes)?,
    };

    debug!(filename, kind = ?kind, bytes = bytes.len(), chars = text.chars().count(), "Upload decoded");
    Ok(text)
}

fn pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    // Malformed documents can panic inside the parser
    let raw = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| IngestError::Pdf("documento corrompido".to_string()))?
        .map_err(|e| IngestError::Pdf(e.to_string()))?;

    // Page breaks come out as form feeds
    Ok(raw
        .split('\u{c}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Pick the email text for a request: an uploaded file wins over the text field.
///
/// Returns the trimmed text; fails when nothing is left.
pub fn resolve_email_text(
    field_text: Option<String>,
    file_text: Option<String>,
) -> Result<String, IngestError> {
    let text = file_text.or(field_text).unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    Ok(trimmed.to_string())
}
