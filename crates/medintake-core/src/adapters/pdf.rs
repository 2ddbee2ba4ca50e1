//! PDF adapter: extracted page text scanned with the plain-text rules.
//!
//! Extraction failures never propagate: an unreadable document yields no
//! batches, and a page whose text cannot be decoded is skipped and counted.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Extraction, FormatAdapter, TextAdapter};

/// PDF text extraction errors.
#[derive(Error, Debug)]
pub enum PdfTextError {
    #[error("PDF parsing failed: {0}")]
    Parse(String),

    #[error("PDF is encrypted")]
    Encrypted,
}

/// Text of one page, or the reason it could not be read.
pub type PageText = Result<String, PdfTextError>;

/// Source of per-page PDF text.
pub trait PdfTextSource {
    /// Extract the text of each page in order.
    fn page_texts(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, PdfTextError>;
}

/// Page text extraction with `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfTextSource;

impl PdfTextSource for LopdfTextSource {
    fn page_texts(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, PdfTextError> {
        let document =
            lopdf::Document::load_mem(pdf_bytes).map_err(|e| PdfTextError::Parse(e.to_string()))?;
        if document.is_encrypted() {
            return Err(PdfTextError::Encrypted);
        }

        let pages = document
            .get_pages()
            .keys()
            .map(|page_number| {
                document
                    .extract_text(&[*page_number])
                    .map_err(|e| PdfTextError::Parse(e.to_string()))
            })
            .collect();

        Ok(pages)
    }
}

/// How extracted page text is split into batches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PdfBatching {
    /// Each page with text is one record
    #[default]
    PerPage,
    /// All page text together is one record
    WholeDocument,
}

pub struct PdfAdapter {
    source: Box<dyn PdfTextSource + Send + Sync>,
    batching: PdfBatching,
    text: TextAdapter,
}

impl Default for PdfAdapter {
    fn default() -> Self {
        Self::new(Box::new(LopdfTextSource), PdfBatching::default(), TextAdapter::default())
    }
}

impl PdfAdapter {
    pub fn new(
        source: Box<dyn PdfTextSource + Send + Sync>,
        batching: PdfBatching,
        text: TextAdapter,
    ) -> Self {
        Self {
            source,
            batching,
            text,
        }
    }
}

impl FormatAdapter for PdfAdapter {
    fn extract(&self, bytes: &[u8]) -> Extraction {
        let pages = match self.source.page_texts(bytes) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("No text recoverable from PDF: {}", e);
                return Extraction::default();
            }
        };

        let mut skipped = 0;
        let mut texts = Vec::new();
        for (i, page) in pages.into_iter().enumerate() {
            match page {
                Ok(text) if !text.trim().is_empty() => texts.push(text),
                Ok(_) => debug!(page = i + 1, "PDF page has no text"),
                Err(e) => {
                    debug!(page = i + 1, "Skipping PDF page: {}", e);
                    skipped += 1;
                }
            }
        }

        let texts = match self.batching {
            PdfBatching::PerPage => texts,
            PdfBatching::WholeDocument if texts.is_empty() => texts,
            PdfBatching::WholeDocument => vec![texts.join("\n")],
        };

        let mut extraction = Extraction {
            batches: Vec::new(),
            skipped,
        };
        for text in texts {
            let batch = self.text.scan(&text, extraction.batches.len());
            if !batch.is_empty() {
                extraction.batches.push(batch);
            }
        }

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;

    /// Serves fixed page texts.
    struct FixedPages(Vec<Option<&'static str>>);

    impl PdfTextSource for FixedPages {
        fn page_texts(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageText>, PdfTextError> {
            Ok(self
                .0
                .iter()
                .map(|page| page.map(str::to_string).ok_or_else(|| PdfTextError::Parse("bad page".into())))
                .collect())
        }
    }

    fn adapter(pages: Vec<Option<&'static str>>, batching: PdfBatching) -> PdfAdapter {
        PdfAdapter::new(Box::new(FixedPages(pages)), batching, TextAdapter::default())
    }

    #[test]
    fn test_pages_become_batches() {
        let pages = vec![Some("Age: 45\nHR: 88"), Some("   "), None, Some("Allergies: latex")];
        let extraction = adapter(pages, PdfBatching::PerPage).extract(b"%PDF");

        assert_eq!(extraction.batches.len(), 2);
        assert_eq!(extraction.skipped, 1);
        assert_eq!(extraction.batches[1].index, 1);
        assert_eq!(extraction.batches[1].fields[0].value, FieldValue::Text("latex".into()));
    }

    #[test]
    fn test_whole_document_batching() {
        let pages = vec![Some("Age: 45"), Some("HR: 88")];
        let extraction = adapter(pages, PdfBatching::WholeDocument).extract(b"%PDF");

        assert_eq!(extraction.batches.len(), 1);
        assert_eq!(extraction.batches[0].fields.len(), 2);
    }

    #[test]
    fn test_unreadable_pdf_degrades_to_nothing() {
        let extraction = PdfAdapter::default().extract(b"definitely not a pdf");
        assert!(extraction.is_empty());
        assert_eq!(extraction.skipped, 0);

        let extraction = PdfAdapter::default().extract(b"");
        assert!(extraction.is_empty());
    }
}
