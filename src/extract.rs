//! PDF text extraction.
//!
//! Takes raw document bytes and returns the text of each page in order.
//! Parsing is delegated to `pdf-extract`; a corrupt or non-PDF payload is
//! reported as [`RagError::Extraction`] and never panics out of this module.

use std::panic::{self, AssertUnwindSafe};

use crate::error::{RagError, Result};

/// Text of a document, one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
}

impl ExtractedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Sum of page lengths in characters.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.chars().count()).sum()
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extract per-page text from PDF bytes.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument> {
    if !looks_like_pdf(bytes) {
        return Err(RagError::Extraction(
            "payload is not a PDF (missing %PDF- header)".to_string(),
        ));
    }

    // pdf-extract panics on some malformed inputs
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match outcome {
        Ok(Ok(pages)) => {
            tracing::debug!(pages = pages.len(), "extracted PDF text");
            Ok(ExtractedDocument { pages })
        }
        Ok(Err(e)) => Err(RagError::Extraction(e.to_string())),
        Err(_) => Err(RagError::Extraction(
            "PDF parser aborted on malformed input".to_string(),
        )),
    }
}

/// The header may be preceded by a little junk; readers accept it within
/// the first kilobyte.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_is_extraction_error() {
        let err = extract_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }

    #[test]
    fn empty_payload_is_extraction_error() {
        assert!(matches!(extract_pdf(b""), Err(RagError::Extraction(_))));
    }

    #[test]
    fn truncated_pdf_is_extraction_error() {
        let err = extract_pdf(b"%PDF-1.4\n1 0 obj << /Type /Catalog").unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }

    #[test]
    fn totals_count_characters() {
        let doc = ExtractedDocument {
            pages: vec!["abc".to_string(), "ภาษา".to_string(), String::new()],
        };
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.total_chars(), 7);
    }
}
