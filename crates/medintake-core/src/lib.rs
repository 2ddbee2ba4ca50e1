//! Medintake Core Library
//!
//! Normalizes heterogeneous medical record uploads into unified patient records.
//!
//! # Architecture
//!
//! ```text
//!   Upload (csv | json | txt | pdf)
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │  Format Adapter  │  rows / objects / pages → raw field batches
//!   └────────┬─────────┘
//!            │   (skipped units counted, never raised)
//!            ▼
//!   ┌──────────────────┐
//!   │  Field Matcher   │  normalized name → canonical field | unmapped
//!   └────────┬─────────┘
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │ Record Assembler │  category buckets, vital coercion, flags
//!   └────────┬─────────┘
//!            │
//!            ├──────────────────┬───────────────────┐
//!            ▼                  ▼                   ▼
//!       Validation         Data Summary      Diagnostic Input
//!        Report                                (request builder)
//! ```
//!
//! # Core Principle
//!
//! **Never mis-file a field.** Names match exactly after normalization or are
//! kept under `unmapped`; nothing from an upload is silently dropped.
//!
//! # Modules
//!
//! - [`models`]: Domain types (CanonicalField, FieldValue, UnifiedPatientRecord, etc.)
//! - [`adapters`]: Per-format extraction into raw field batches
//! - [`matcher`]: Synonym table, field matching and unmapped-name hints
//! - [`assembler`]: Record assembly
//! - [`normalizer`]: The full pipeline for one upload
//! - [`validation`], [`summary`], [`contract`]: Consumers of normalized records
//! - [`config`]: TOML configuration

pub mod adapters;
pub mod assembler;
pub mod config;
pub mod contract;
pub mod matcher;
pub mod models;
pub mod normalizer;
pub mod summary;
pub mod validation;

// Re-export commonly used types
pub use config::{ConfigError, IntakeConfig};
pub use contract::DiagnosticInput;
pub use matcher::{FieldMatch, FieldMatcher, FieldSynonymTable, UnmappedHint};
pub use models::{
    CanonicalField, Category, FieldFlag, FieldValue, RawBatch, RawField, SourceFormat,
    UnifiedPatientRecord, UploadedFile,
};
pub use normalizer::{IntakeError, IntakeOutcome, IntakeWarning, RecordNormalizer};
pub use summary::{summarize_records, DataSummary};
pub use validation::{validate_records, ValidationReport};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Log filter used when neither the caller nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_FILTER: &str = "medintake_core=info";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedIntakeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<IntakeError> for MedIntakeError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::UnsupportedFormat(format) => MedIntakeError::UnsupportedFormat(format),
            IntakeError::Io(e) => MedIntakeError::IoError(e.to_string()),
        }
    }
}

impl From<ConfigError> for MedIntakeError {
    fn from(e: ConfigError) -> Self {
        MedIntakeError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for MedIntakeError {
    fn from(e: serde_json::Error) -> Self {
        MedIntakeError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a log subscriber. Later calls are ignored.
///
/// The filter falls back to `RUST_LOG`, then to [`DEFAULT_LOG_FILTER`].
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Create an intake pipeline with the default configuration.
#[uniffi::export]
pub fn open_intake() -> Arc<MedIntake> {
    Arc::new(MedIntake {
        normalizer: RecordNormalizer::new(),
    })
}

/// Create an intake pipeline from a TOML configuration.
#[uniffi::export]
pub fn open_intake_with_config(config_toml: String) -> Result<Arc<MedIntake>, MedIntakeError> {
    let config = IntakeConfig::from_toml_str(&config_toml)?;
    Ok(Arc::new(MedIntake {
        normalizer: RecordNormalizer::with_config(&config)?,
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Upload normalization for FFI. Stateless between calls.
#[derive(uniffi::Object)]
pub struct MedIntake {
    normalizer: RecordNormalizer,
}

impl MedIntake {
    fn run(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<IntakeOutcome, MedIntakeError> {
        let mut upload = UploadedFile::new(file_name, bytes);
        upload.mime_type = mime_type;
        Ok(self.normalizer.normalize(&upload)?)
    }
}

#[uniffi::export]
impl MedIntake {
    /// Normalize an upload into patient records.
    pub fn normalize_upload(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<FfiIntakeOutcome, MedIntakeError> {
        Ok(self.run(file_name, mime_type, bytes)?.into())
    }

    /// Normalize an upload and return the full outcome as JSON.
    pub fn normalize_upload_json(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<String, MedIntakeError> {
        Ok(self.run(file_name, mime_type, bytes)?.to_json()?)
    }

    /// Normalize an upload and report on its data quality.
    pub fn validate_upload(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<FfiValidationReport, MedIntakeError> {
        let outcome = self.run(file_name, mime_type, bytes)?;
        Ok(validate_records(&outcome.records).into())
    }

    /// Normalize an upload and summarize its records.
    ///
    /// Returns `None` when the upload held no records.
    pub fn summarize_upload(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<Option<FfiDataSummary>, MedIntakeError> {
        let outcome = self.run(file_name, mime_type, bytes)?;
        Ok(summarize_records(&outcome.records).map(Into::into))
    }

    /// Normalize an upload and build the diagnostic request input as JSON.
    pub fn diagnostic_input_json(
        &self,
        file_name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<String, MedIntakeError> {
        let outcome = self.run(file_name, mime_type, bytes)?;
        Ok(DiagnosticInput::from_records(&outcome.records).to_prompt_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe field entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldEntry {
    /// Category key, or "unmapped"
    pub category: String,
    pub name: String,
    pub text: Option<String>,
    pub number: Option<f64>,
}

impl FfiFieldEntry {
    fn new(category: &str, name: &str, value: &FieldValue) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            text: value.as_text().map(str::to_string),
            number: value.as_number(),
        }
    }
}

/// FFI-safe unified patient record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientRecord {
    pub record_id: String,
    pub file_name: String,
    pub format: String,
    pub batch_index: u32,
    pub fields: Vec<FfiFieldEntry>,
    pub flags: Vec<String>,
}

impl From<UnifiedPatientRecord> for FfiPatientRecord {
    fn from(record: UnifiedPatientRecord) -> Self {
        let mut fields: Vec<FfiFieldEntry> = record
            .categories
            .iter()
            .flat_map(|(category, bucket)| {
                bucket
                    .iter()
                    .map(move |(field, value)| FfiFieldEntry::new(category.as_str(), field.as_str(), value))
            })
            .collect();
        fields.extend(
            record
                .unmapped
                .iter()
                .map(|(name, value)| FfiFieldEntry::new("unmapped", name, value)),
        );

        Self {
            record_id: record.record_id,
            file_name: record.source.file_name,
            format: record.source.format.to_string(),
            batch_index: record.source.batch_index as u32,
            fields,
            flags: record.flags.iter().map(ToString::to_string).collect(),
        }
    }
}

/// FFI-safe unmapped-name hint.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUnmappedHint {
    pub raw_name: String,
    pub suggested_field: String,
    pub similarity: f64,
}

impl From<UnmappedHint> for FfiUnmappedHint {
    fn from(hint: UnmappedHint) -> Self {
        Self {
            raw_name: hint.raw_name,
            suggested_field: hint.suggested_field.to_string(),
            similarity: hint.similarity,
        }
    }
}

/// FFI-safe intake outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiIntakeOutcome {
    pub file_name: String,
    pub format: String,
    pub records: Vec<FfiPatientRecord>,
    pub skipped: u32,
    pub warnings: Vec<String>,
    pub hints: Vec<FfiUnmappedHint>,
}

impl From<IntakeOutcome> for FfiIntakeOutcome {
    fn from(outcome: IntakeOutcome) -> Self {
        Self {
            file_name: outcome.file_name,
            format: outcome.format.to_string(),
            records: outcome.records.into_iter().map(Into::into).collect(),
            skipped: outcome.skipped as u32,
            warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
            hints: outcome.hints.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe per-record issues.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordIssues {
    pub record_index: u32,
    pub record_id: String,
    pub completeness: f64,
    pub issues: Vec<String>,
}

/// FFI-safe validation report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiValidationReport {
    pub total_records: u32,
    pub valid_records: u32,
    pub completeness_score: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub data_quality_issues: Vec<FfiRecordIssues>,
}

impl From<ValidationReport> for FfiValidationReport {
    fn from(report: ValidationReport) -> Self {
        Self {
            total_records: report.total_records as u32,
            valid_records: report.valid_records as u32,
            completeness_score: report.completeness_score,
            warnings: report.warnings,
            errors: report.errors,
            data_quality_issues: report
                .data_quality_issues
                .into_iter()
                .map(|r| FfiRecordIssues {
                    record_index: r.record_index as u32,
                    record_id: r.record_id,
                    completeness: r.completeness,
                    issues: r.issues.iter().map(|i| i.describe()).collect(),
                })
                .collect(),
        }
    }
}

/// FFI-safe data summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDataSummary {
    pub total_records: u32,
    pub fields_present: Vec<String>,
    pub age_min: Option<f64>,
    pub age_max: Option<f64>,
    pub age_mean: Option<f64>,
    pub gender_distribution: HashMap<String, u32>,
}

impl From<DataSummary> for FfiDataSummary {
    fn from(summary: DataSummary) -> Self {
        Self {
            total_records: summary.total_records as u32,
            fields_present: summary.fields_present,
            age_min: summary.age_range.map(|r| r.min),
            age_max: summary.age_range.map(|r| r.max),
            age_mean: summary.age_range.map(|r| r.mean),
            gender_distribution: summary
                .gender_distribution
                .into_iter()
                .map(|(gender, count)| (gender, count as u32))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffi_normalize_upload() {
        let intake = open_intake();
        let outcome = intake
            .normalize_upload(
                "intake.csv".into(),
                None,
                b"Age,HR,Chief Complaint,pt_name\n45,88,chest pain,Jane\n".to_vec(),
            )
            .unwrap();

        assert_eq!(outcome.format, "csv");
        assert_eq!(outcome.records.len(), 1);

        let fields = &outcome.records[0].fields;
        let hr = fields.iter().find(|f| f.name == "heart_rate").unwrap();
        assert_eq!(hr.category, "vitals");
        assert_eq!(hr.number, Some(88.0));
        let name = fields.iter().find(|f| f.name == "pt_name").unwrap();
        assert_eq!(name.category, "unmapped");
        assert_eq!(name.text.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_ffi_unsupported_format() {
        let intake = open_intake();
        let result = intake.normalize_upload("scan.docx".into(), None, vec![]);
        assert!(matches!(result, Err(MedIntakeError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_ffi_config() {
        let intake =
            open_intake_with_config("[extra_synonyms]\n\"pt name\" = \"patient_name\"\n".into()).unwrap();
        let outcome = intake
            .normalize_upload("visit.json".into(), None, br#"{"pt_name": "Jane"}"#.to_vec())
            .unwrap();
        assert!(outcome.records[0]
            .fields
            .iter()
            .any(|f| f.name == "patient_name" && f.category == "demographics"));

        let result = open_intake_with_config("max_label_len = \"long\"".into());
        assert!(matches!(result, Err(MedIntakeError::ConfigError(_))));
    }

    #[test]
    fn test_ffi_validate_and_summarize() {
        let intake = open_intake();
        let report = intake
            .validate_upload("empty.txt".into(), Some("text/plain".into()), vec![])
            .unwrap();
        assert_eq!(report.total_records, 0);
        assert_eq!(report.errors, vec!["No patient records found".to_string()]);

        let summary = intake
            .summarize_upload(
                "intake.csv".into(),
                None,
                b"Age,Sex\n40,F\n60,f\n".to_vec(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.age_mean, Some(50.0));
        assert_eq!(summary.gender_distribution.get("f"), Some(&2));
    }

    #[test]
    fn test_ffi_json_outputs() {
        let intake = open_intake();
        let json = intake
            .normalize_upload_json("note.txt".into(), None, b"Allergies: penicillin\n".to_vec())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value["records"][0]["categories"]["allergies"]["known_allergies"],
            "penicillin"
        );

        let json = intake
            .diagnostic_input_json("note.txt".into(), None, b"Allergies: penicillin\n".to_vec())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["patient_count"], 1);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Some("medintake_core=debug".into()));
        init_logging(None);
    }
}
