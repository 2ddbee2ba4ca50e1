//! CSV adapter: one batch per data row, headers are the raw field names.

use tracing::{debug, warn};

use crate::models::{FieldValue, RawBatch};

use super::{Extraction, FormatAdapter};

#[derive(Debug, Clone, Default)]
pub struct CsvAdapter;

impl FormatAdapter for CsvAdapter {
    fn extract(&self, bytes: &[u8]) -> Extraction {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(::csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = match reader.headers() {
            Ok(headers) => headers.iter().map(|h| h.trim_start_matches('\u{feff}').to_string()).collect(),
            Err(e) => {
                warn!("CSV header row unreadable: {}", e);
                return Extraction {
                    batches: Vec::new(),
                    skipped: 1,
                };
            }
        };

        // Without names no cell can be filed, so every data row is lost
        if headers.iter().all(|h| h.is_empty()) {
            let skipped = reader.records().count();
            if skipped > 0 {
                warn!(skipped, "CSV header row has no names");
            }
            return Extraction {
                batches: Vec::new(),
                skipped,
            };
        }

        let mut extraction = Extraction::default();
        for (row, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!(row, "Skipping CSV row: {}", e);
                    extraction.skipped += 1;
                    continue;
                }
            };

            let mut batch = RawBatch::new(extraction.batches.len());
            for (name, cell) in headers.iter().zip(record.iter()) {
                batch.push(name.as_str(), FieldValue::text(cell));
            }
            extraction.batches.push(batch);
        }

        extraction
    }
}
