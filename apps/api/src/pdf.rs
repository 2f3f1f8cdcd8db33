//! PDF-to-text conversion boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("No extractable text found in document")]
    NoTextFound,

    #[error("Failed to parse PDF: {0}")]
    Parse(#[from] pdf_extract::OutputError),
}

/// Extracts plain text from PDF bytes.
/// Fails with `NoTextFound` when the document yields nothing but whitespace
/// (scanned images, empty pages) — fatal to the task, no retry.
pub fn extract_text(file_bytes: &[u8]) -> Result<String, PdfError> {
    let text = pdf_extract::extract_text_from_mem(file_bytes)?;
    if text.trim().is_empty() {
        return Err(PdfError::NoTextFound);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        let result = extract_text(b"definitely not a pdf");
        assert!(matches!(result, Err(PdfError::Parse(_))));
    }
}
