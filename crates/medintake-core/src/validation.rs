//! Data quality validation for normalized records.
//!
//! Each record is scored for completeness: essential fields count twice,
//! important fields once. A record is valid when every essential field
//! holds a value.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CanonicalField, FieldValue, UnifiedPatientRecord};

/// Fields a record needs to be usable.
pub const ESSENTIAL_FIELDS: [CanonicalField; 4] = [
    CanonicalField::PatientAge,
    CanonicalField::Gender,
    CanonicalField::ChiefComplaint,
    CanonicalField::Symptoms,
];

/// Fields that improve a record but are not required.
pub const IMPORTANT_FIELDS: [CanonicalField; 3] = [
    CanonicalField::PatientName,
    CanonicalField::MedicalHistory,
    CanonicalField::CurrentMedications,
];

const ESSENTIAL_WEIGHT: u32 = 2;
const IMPORTANT_WEIGHT: u32 = 1;

/// Important fields plus the "any vital sign" slot.
const MAX_SCORE: u32 = ESSENTIAL_FIELDS.len() as u32 * ESSENTIAL_WEIGHT
    + (IMPORTANT_FIELDS.len() as u32 + 1) * IMPORTANT_WEIGHT;

/// Completeness below this percentage produces a warning.
pub const COMPLETENESS_WARNING_THRESHOLD: f64 = 70.0;

/// Oldest plausible age in years.
pub const MAX_PLAUSIBLE_AGE: f64 = 150.0;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// A data quality issue found in one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordIssue {
    MissingEssential { fields: Vec<CanonicalField> },
    MissingImportant { fields: Vec<String> },
    AgeNotNumeric { value: String },
    AgeImplausible { age: f64 },
    DateOfBirthUnparseable { value: String },
    DateOfBirthInFuture { date: NaiveDate },
}

impl RecordIssue {
    pub fn describe(&self) -> String {
        match self {
            RecordIssue::MissingEssential { fields } => format!(
                "Missing essential fields: {}",
                fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
            ),
            RecordIssue::MissingImportant { fields } => {
                format!("Missing important fields: {}", fields.join(", "))
            }
            RecordIssue::AgeNotNumeric { value } => format!("Age is not a valid number: {}", value),
            RecordIssue::AgeImplausible { age } => format!("Age value seems unrealistic: {}", age),
            RecordIssue::DateOfBirthUnparseable { value } => {
                format!("Date of birth is not a recognized date: {}", value)
            }
            RecordIssue::DateOfBirthInFuture { date } => {
                format!("Date of birth is in the future: {}", date)
            }
        }
    }
}

/// Issues and completeness of one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordValidation {
    pub record_index: usize,
    pub record_id: String,
    /// Percentage in 0..=100
    pub completeness: f64,
    pub issues: Vec<RecordIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub total_records: usize,
    pub valid_records: usize,
    /// Mean completeness percentage over all records
    pub completeness_score: f64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Records with at least one issue
    pub data_quality_issues: Vec<RecordValidation>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.data_quality_issues.is_empty()
    }
}

/// Validate a set of normalized records.
pub fn validate_records(records: &[UnifiedPatientRecord]) -> ValidationReport {
    validate_records_on(records, Utc::now().date_naive())
}

/// Validate against a fixed "today", for reproducible date checks.
pub fn validate_records_on(records: &[UnifiedPatientRecord], today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport {
        total_records: records.len(),
        valid_records: 0,
        completeness_score: 0.0,
        warnings: Vec::new(),
        errors: Vec::new(),
        data_quality_issues: Vec::new(),
    };

    if records.is_empty() {
        report.errors.push("No patient records found".to_string());
        return report;
    }

    let mut total_completeness = 0.0;
    for (index, record) in records.iter().enumerate() {
        let validation = validate_record(index, record, today);
        total_completeness += validation.completeness;

        let essentials_missing = validation
            .issues
            .iter()
            .any(|issue| matches!(issue, RecordIssue::MissingEssential { .. }));
        if !essentials_missing {
            report.valid_records += 1;
        }
        if !validation.issues.is_empty() {
            report.data_quality_issues.push(validation);
        }
    }

    report.completeness_score = total_completeness / records.len() as f64;

    let invalid = records.len() - report.valid_records;
    if invalid > 0 {
        report
            .warnings
            .push(format!("{} records have missing essential fields", invalid));
    }
    if report.completeness_score < COMPLETENESS_WARNING_THRESHOLD {
        report.warnings.push(format!(
            "Data completeness is below {:.0}% - consider adding more patient information",
            COMPLETENESS_WARNING_THRESHOLD
        ));
    }

    report
}

fn validate_record(index: usize, record: &UnifiedPatientRecord, today: NaiveDate) -> RecordValidation {
    let mut issues = Vec::new();
    let mut score = 0;

    let missing_essential: Vec<CanonicalField> = ESSENTIAL_FIELDS
        .iter()
        .copied()
        .filter(|field| !record.has_value(*field))
        .collect();
    score += (ESSENTIAL_FIELDS.len() - missing_essential.len()) as u32 * ESSENTIAL_WEIGHT;

    let mut missing_important: Vec<String> = IMPORTANT_FIELDS
        .iter()
        .filter(|field| !record.has_value(**field))
        .map(|field| field.as_str().to_string())
        .collect();
    score += (IMPORTANT_FIELDS.len() - missing_important.len()) as u32 * IMPORTANT_WEIGHT;

    let has_vital = CanonicalField::ALL
        .iter()
        .filter(|field| field.is_vital())
        .any(|field| record.has_value(*field));
    if has_vital {
        score += IMPORTANT_WEIGHT;
    } else {
        missing_important.push("vital_signs".to_string());
    }

    if !missing_essential.is_empty() {
        issues.push(RecordIssue::MissingEssential {
            fields: missing_essential,
        });
    }
    if !missing_important.is_empty() {
        issues.push(RecordIssue::MissingImportant {
            fields: missing_important,
        });
    }

    if let Some(age) = record.get(CanonicalField::PatientAge).filter(|v| !v.is_missing()) {
        issues.extend(check_age(age));
    }
    if let Some(dob) = record.get(CanonicalField::DateOfBirth).and_then(FieldValue::as_text) {
        issues.extend(check_date_of_birth(dob, today));
    }

    RecordValidation {
        record_index: index,
        record_id: record.record_id.clone(),
        completeness: f64::from(score) / f64::from(MAX_SCORE) * 100.0,
        issues,
    }
}

fn check_age(value: &FieldValue) -> Option<RecordIssue> {
    let age = match value {
        FieldValue::Number(n) => *n,
        other => match other.to_string().trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                return Some(RecordIssue::AgeNotNumeric {
                    value: other.to_string(),
                })
            }
        },
    };

    if !(0.0..=MAX_PLAUSIBLE_AGE).contains(&age) {
        return Some(RecordIssue::AgeImplausible { age });
    }
    None
}

/// Parse a date of birth in one of the accepted formats.
pub fn parse_date_of_birth(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn check_date_of_birth(value: &str, today: NaiveDate) -> Option<RecordIssue> {
    match parse_date_of_birth(value) {
        None => Some(RecordIssue::DateOfBirthUnparseable {
            value: value.to_string(),
        }),
        Some(date) if date > today => Some(RecordIssue::DateOfBirthInFuture { date }),
        Some(_) => None,
    }
}
