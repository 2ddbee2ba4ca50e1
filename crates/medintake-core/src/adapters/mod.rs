//! Format adapters: turn uploaded bytes into raw field batches.
//!
//! Adapters never fail. Units that cannot be parsed (rows, lines, array
//! elements, pages) are skipped and counted in [`Extraction::skipped`].

mod csv;
mod json;
mod pdf;
mod text;

pub use self::csv::CsvAdapter;
pub use self::json::JsonAdapter;
pub use self::pdf::{
    LopdfTextSource, PageText, PdfAdapter, PdfBatching, PdfTextError, PdfTextSource,
};
pub use self::text::TextAdapter;

use crate::models::RawBatch;

/// Output of a format adapter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub batches: Vec<RawBatch>,
    /// Units that could not be parsed
    pub skipped: usize,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Turns one file format into raw field batches.
pub trait FormatAdapter {
    fn extract(&self, bytes: &[u8]) -> Extraction;
}
