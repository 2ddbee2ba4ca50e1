//! Structured input for the diagnostic request builder.
//!
//! The request builder embeds this JSON block in its prompt. Only the shape
//! lives here; prompt wording and the model call belong to the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Category, FieldFlag, FieldValue, UnifiedPatientRecord};

/// One patient's data, grouped the way the request builder consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientInput {
    pub record_id: String,
    pub source_file: String,
    pub demographics: BTreeMap<String, FieldValue>,
    pub vital_signs: BTreeMap<String, FieldValue>,
    /// `field: value` lines
    pub symptoms: Vec<String>,
    pub medical_history: Vec<String>,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
    pub clinical_notes: Vec<String>,
    /// Fields with no canonical match
    pub additional_fields: BTreeMap<String, FieldValue>,
    pub data_quality_flags: Vec<FieldFlag>,
}

impl PatientInput {
    pub fn from_record(record: &UnifiedPatientRecord) -> Self {
        Self {
            record_id: record.record_id.clone(),
            source_file: record.source.file_name.clone(),
            demographics: keyed(record, Category::Demographics),
            vital_signs: keyed(record, Category::Vitals),
            symptoms: lines(record, Category::Symptoms),
            medical_history: lines(record, Category::History),
            medications: lines(record, Category::Medications),
            allergies: lines(record, Category::Allergies),
            clinical_notes: lines(record, Category::Notes),
            additional_fields: record
                .unmapped
                .iter()
                .filter(|(_, v)| !v.is_missing())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            data_quality_flags: record.flags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticInput {
    pub patient_count: usize,
    pub patients: Vec<PatientInput>,
}

impl DiagnosticInput {
    pub fn from_records(records: &[UnifiedPatientRecord]) -> Self {
        Self {
            patient_count: records.len(),
            patients: records.iter().map(PatientInput::from_record).collect(),
        }
    }

    /// Pretty JSON, ready to embed in a prompt.
    pub fn to_prompt_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn keyed(record: &UnifiedPatientRecord, category: Category) -> BTreeMap<String, FieldValue> {
    record
        .bucket(category)
        .into_iter()
        .flatten()
        .filter(|(_, v)| !v.is_missing())
        .map(|(field, value)| (field.as_str().to_string(), value.clone()))
        .collect()
}

fn lines(record: &UnifiedPatientRecord, category: Category) -> Vec<String> {
    record
        .bucket(category)
        .into_iter()
        .flatten()
        .filter(|(_, v)| !v.is_missing())
        .map(|(field, value)| format!("{}: {}", field, value))
        .collect()
}
