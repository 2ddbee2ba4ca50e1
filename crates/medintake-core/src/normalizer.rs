//! Record normalizer: the full intake pipeline for one upload.
//!
//! Pipeline: Format Adapter → Field Matcher → Record Assembler

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::{
    CsvAdapter, Extraction, FormatAdapter, JsonAdapter, LopdfTextSource, PdfAdapter,
    PdfTextSource, TextAdapter,
};
use crate::assembler::RecordAssembler;
use crate::config::{ConfigResult, IntakeConfig};
use crate::matcher::{suggest_field, FieldMatcher, UnmappedHint};
use crate::models::{RecordSource, SourceFormat, UnifiedPatientRecord, UploadedFile};

/// Upload rejections.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// Non-fatal conditions reported with an outcome.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntakeWarning {
    #[error("No patient records could be extracted from this {format} file")]
    NoExtractableContent { format: SourceFormat },

    #[error("{skipped} unreadable {unit} skipped")]
    PartialParseLoss { skipped: usize, unit: String },
}

/// Result of normalizing one upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeOutcome {
    pub file_name: String,
    pub format: SourceFormat,
    pub records: Vec<UnifiedPatientRecord>,
    /// Units (rows, lines, elements, pages) that could not be parsed
    pub skipped: usize,
    pub warnings: Vec<IntakeWarning>,
    pub hints: Vec<UnmappedHint>,
}

impl IntakeOutcome {
    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Name of the unit an adapter skips, for warnings.
fn skipped_unit(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::Csv => "rows",
        SourceFormat::Json => "records",
        SourceFormat::Txt => "lines",
        SourceFormat::Pdf => "pages",
    }
}

/// Normalizes uploads into unified patient records.
///
/// Holds only immutable state, so one instance can serve concurrent uploads.
pub struct RecordNormalizer {
    matcher: FieldMatcher,
    csv: CsvAdapter,
    json: JsonAdapter,
    text: TextAdapter,
    pdf: PdfAdapter,
    suggest_unmapped: bool,
    suggestion_threshold: f64,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordNormalizer {
    /// Create a normalizer with the default configuration.
    pub fn new() -> Self {
        let config = IntakeConfig::default();
        Self::build(&config, FieldMatcher::new(), Box::new(LopdfTextSource))
    }

    /// Create a normalizer from a configuration.
    pub fn with_config(config: &IntakeConfig) -> ConfigResult<Self> {
        Self::with_pdf_source(config, Box::new(LopdfTextSource))
    }

    /// Create a normalizer with a custom PDF text source.
    pub fn with_pdf_source(
        config: &IntakeConfig,
        pdf_source: Box<dyn PdfTextSource + Send + Sync>,
    ) -> ConfigResult<Self> {
        let matcher = FieldMatcher::with_table(config.synonym_table()?);
        Ok(Self::build(config, matcher, pdf_source))
    }

    fn build(
        config: &IntakeConfig,
        matcher: FieldMatcher,
        pdf_source: Box<dyn PdfTextSource + Send + Sync>,
    ) -> Self {
        let text = TextAdapter::new(config.max_label_len, config.list_separator.clone());
        Self {
            matcher,
            csv: CsvAdapter,
            json: JsonAdapter::new(config.json_collection_keys.clone()),
            pdf: PdfAdapter::new(pdf_source, config.pdf_batching, text.clone()),
            text,
            suggest_unmapped: config.suggest_unmapped,
            suggestion_threshold: config.suggestion_threshold,
        }
    }

    pub fn matcher(&self) -> &FieldMatcher {
        &self.matcher
    }

    /// Normalize an uploaded file.
    pub fn normalize(&self, upload: &UploadedFile) -> IntakeResult<IntakeOutcome> {
        let format = upload.detect_format().ok_or_else(|| {
            let declared = upload
                .file_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
                .or_else(|| upload.mime_type.clone())
                .unwrap_or_else(|| upload.file_name.clone());
            IntakeError::UnsupportedFormat(declared)
        })?;

        info!(
            file = %upload.file_name,
            format = %format,
            bytes = upload.bytes.len(),
            "Normalizing upload"
        );

        let extraction = self.adapter(format).extract(&upload.bytes);
        Ok(self.finish(upload, format, extraction))
    }

    /// Normalize raw bytes, detecting the format from the file name.
    pub fn normalize_bytes(&self, file_name: &str, bytes: &[u8]) -> IntakeResult<IntakeOutcome> {
        self.normalize(&UploadedFile::new(file_name, bytes.to_vec()))
    }

    /// Read and normalize a file from disk.
    pub fn normalize_path<P: AsRef<Path>>(&self, path: P) -> IntakeResult<IntakeOutcome> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // Reject before reading when the extension is already unsupported
        if SourceFormat::from_file_name(&file_name).is_none() {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or(file_name);
            return Err(IntakeError::UnsupportedFormat(ext));
        }

        let bytes = std::fs::read(path)?;
        self.normalize(&UploadedFile::new(file_name, bytes))
    }

    fn adapter(&self, format: SourceFormat) -> &dyn FormatAdapter {
        match format {
            SourceFormat::Csv => &self.csv,
            SourceFormat::Json => &self.json,
            SourceFormat::Txt => &self.text,
            SourceFormat::Pdf => &self.pdf,
        }
    }

    fn finish(&self, upload: &UploadedFile, format: SourceFormat, extraction: Extraction) -> IntakeOutcome {
        let digest = upload.digest();
        let assembler = RecordAssembler::new(&self.matcher);

        let records: Vec<UnifiedPatientRecord> = extraction
            .batches
            .iter()
            .map(|batch| {
                let source = RecordSource {
                    file_name: upload.file_name.clone(),
                    format,
                    batch_index: batch.index,
                    digest: digest.clone(),
                };
                let record = assembler.assemble(batch, source);
                debug!(
                    batch = batch.index,
                    fields = record.field_count(),
                    unmapped = record.unmapped.len(),
                    flags = record.flags.len(),
                    "Assembled record"
                );
                record
            })
            .collect();

        let mut warnings = Vec::new();
        if extraction.skipped > 0 {
            warn!(
                file = %upload.file_name,
                skipped = extraction.skipped,
                "Some units could not be parsed"
            );
            warnings.push(IntakeWarning::PartialParseLoss {
                skipped: extraction.skipped,
                unit: skipped_unit(format).to_string(),
            });
        }
        if records.is_empty() {
            warn!(file = %upload.file_name, "No records extracted");
            warnings.push(IntakeWarning::NoExtractableContent { format });
        }

        let hints = if self.suggest_unmapped {
            self.hints(&records)
        } else {
            Vec::new()
        };

        info!(
            file = %upload.file_name,
            records = records.len(),
            skipped = extraction.skipped,
            "Upload normalized"
        );

        IntakeOutcome {
            file_name: upload.file_name.clone(),
            format,
            records,
            skipped: extraction.skipped,
            warnings,
            hints,
        }
    }

    /// One hint per distinct unmapped name, in first-seen order.
    fn hints(&self, records: &[UnifiedPatientRecord]) -> Vec<UnmappedHint> {
        let mut seen = std::collections::HashSet::new();
        records
            .iter()
            .flat_map(|record| record.unmapped.keys())
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| suggest_field(self.matcher.table(), name, self.suggestion_threshold))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{PageText, PdfTextError};
    use crate::models::{CanonicalField, FieldFlag, FieldValue};

    struct OnePage(&'static str);

    impl PdfTextSource for OnePage {
        fn page_texts(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageText>, PdfTextError> {
            Ok(vec![Ok(self.0.to_string())])
        }
    }

    #[test]
    fn test_unsupported_format() {
        let normalizer = RecordNormalizer::new();
        let result = normalizer.normalize_bytes("scan.docx", b"...");
        assert!(matches!(result, Err(IntakeError::UnsupportedFormat(ext)) if ext == "docx"));

        let upload = UploadedFile::new("upload", vec![]).with_mime("image/png");
        let result = normalizer.normalize(&upload);
        assert!(matches!(result, Err(IntakeError::UnsupportedFormat(mime)) if mime == "image/png"));
    }

    #[test]
    fn test_csv_upload() {
        let normalizer = RecordNormalizer::new();
        let outcome = normalizer
            .normalize_bytes("intake.csv", b"Age,HR,Chief Complaint\n45,88,chest pain\n")
            .unwrap();

        assert_eq!(outcome.format, SourceFormat::Csv);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.warnings.is_empty());

        let record = &outcome.records[0];
        assert_eq!(record.source.file_name, "intake.csv");
        assert_eq!(record.get(CanonicalField::HeartRate), Some(&FieldValue::Number(88.0)));
    }

    #[test]
    fn test_later_json_synonym_wins() {
        let normalizer = RecordNormalizer::new();
        let outcome = normalizer
            .normalize_bytes("visit.json", br#"{"pulse": 90, "hr": 80}"#)
            .unwrap();

        let record = &outcome.records[0];
        assert_eq!(record.get(CanonicalField::HeartRate), Some(&FieldValue::Number(80.0)));
        assert_eq!(
            record.flags,
            vec![FieldFlag::Overwritten {
                field: "heart_rate".into(),
                raw_name: "hr".into(),
                previous: FieldValue::Number(90.0),
            }]
        );
    }

    #[test]
    fn test_partial_parse_loss() {
        let normalizer = RecordNormalizer::new();
        let outcome = normalizer
            .normalize_bytes("intake.csv", b"Age,HR\n45,88\n46\n47,90\n")
            .unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(
            outcome.warnings,
            vec![IntakeWarning::PartialParseLoss {
                skipped: 1,
                unit: "rows".into()
            }]
        );
        assert_eq!(outcome.warnings[0].to_string(), "1 unreadable rows skipped");
    }

    #[test]
    fn test_no_extractable_content() {
        let normalizer = RecordNormalizer::new();
        let outcome = normalizer.normalize_bytes("empty.txt", b"\n\n").unwrap();

        assert!(!outcome.has_records());
        assert_eq!(
            outcome.warnings,
            vec![IntakeWarning::NoExtractableContent {
                format: SourceFormat::Txt
            }]
        );
    }

    #[test]
    fn test_hints_for_unmapped_fields() {
        let normalizer = RecordNormalizer::new();
        let outcome = normalizer
            .normalize_bytes("visit.json", br#"[{"heart rte": 80}, {"heart rte": 82}]"#)
            .unwrap();

        assert_eq!(outcome.hints.len(), 1);
        assert_eq!(outcome.hints[0].suggested_field, CanonicalField::HeartRate);
        // Hints never change routing
        assert!(outcome.records[0].unmapped.contains_key("heart rte"));

        let config = IntakeConfig {
            suggest_unmapped: false,
            ..IntakeConfig::default()
        };
        let quiet = RecordNormalizer::with_config(&config).unwrap();
        let outcome = quiet
            .normalize_bytes("visit.json", br#"{"heart rte": 80}"#)
            .unwrap();
        assert!(outcome.hints.is_empty());
    }

    #[test]
    fn test_custom_pdf_source() {
        let normalizer =
            RecordNormalizer::with_pdf_source(&IntakeConfig::default(), Box::new(OnePage("Pulse: 64")))
                .unwrap();
        let outcome = normalizer.normalize_bytes("scan.pdf", b"%PDF-1.4").unwrap();

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(
            outcome.records[0].get(CanonicalField::HeartRate),
            Some(&FieldValue::Number(64.0))
        );
    }

    #[test]
    fn test_normalize_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.TXT");
        std::fs::write(&path, "Allergies: penicillin\n").unwrap();

        let normalizer = RecordNormalizer::new();
        let outcome = normalizer.normalize_path(&path).unwrap();
        assert_eq!(outcome.file_name, "note.TXT");
        assert_eq!(outcome.records.len(), 1);

        let missing = normalizer.normalize_path(dir.path().join("gone.csv"));
        assert!(matches!(missing, Err(IntakeError::Io(_))));

        let unsupported = normalizer.normalize_path(dir.path().join("image.png"));
        assert!(matches!(unsupported, Err(IntakeError::UnsupportedFormat(ext)) if ext == "png"));
    }

    #[test]
    fn test_normalizer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordNormalizer>();
    }
}
