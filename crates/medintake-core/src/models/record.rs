//! Raw extracted fields and the unified patient record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CanonicalField, Category, FieldValue, SourceFormat};

/// A `(name, value)` pair exactly as the source wrote it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawField {
    pub name: String,
    pub value: FieldValue,
}

impl RawField {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Raw fields of one logical record (a CSV row, a JSON object, a document or page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawBatch {
    /// Position of the batch within its upload
    pub index: usize,
    pub fields: Vec<RawField>,
}

impl RawBatch {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(RawField::new(name, value));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordSource {
    pub file_name: String,
    pub format: SourceFormat,
    pub batch_index: usize,
    /// SHA-256 hex digest of the upload
    pub digest: String,
}

/// Data-quality flag surfaced to the consumer alongside a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldFlag {
    /// A vital sign value that is not an unambiguous number, kept as text.
    NonNumericVital { field: CanonicalField, value: String },
    /// A later occurrence replaced an earlier value in the same batch.
    Overwritten {
        /// Canonical key, or the raw name for unmapped fields
        field: String,
        raw_name: String,
        previous: FieldValue,
    },
}

impl fmt::Display for FieldFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFlag::NonNumericVital { field, value } => {
                write!(f, "{} is not numeric: {}", field, value)
            }
            FieldFlag::Overwritten {
                field,
                raw_name,
                previous,
            } => write!(f, "{} overwritten by '{}' (was '{}')", field, raw_name, previous),
        }
    }
}

/// The unified representation of one patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedPatientRecord {
    /// Deterministic id derived from the upload digest and batch index
    pub record_id: String,
    pub source: RecordSource,
    /// All seven categories, always present
    pub categories: BTreeMap<Category, BTreeMap<CanonicalField, FieldValue>>,
    /// Raw fields with no canonical match, keyed by their source name
    pub unmapped: BTreeMap<String, FieldValue>,
    pub flags: Vec<FieldFlag>,
}

impl UnifiedPatientRecord {
    /// Create an empty record with every category present.
    pub fn new(source: RecordSource) -> Self {
        let record_id = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}:{}", source.digest, source.batch_index).as_bytes(),
        )
        .to_string();

        Self {
            record_id,
            source,
            categories: Category::ALL
                .iter()
                .map(|category| (*category, BTreeMap::new()))
                .collect(),
            unmapped: BTreeMap::new(),
            flags: Vec::new(),
        }
    }

    /// Fields filed under a category.
    pub fn bucket(&self, category: Category) -> Option<&BTreeMap<CanonicalField, FieldValue>> {
        self.categories.get(&category)
    }

    /// Look up a canonical field in its category.
    pub fn get(&self, field: CanonicalField) -> Option<&FieldValue> {
        self.categories.get(&field.category())?.get(&field)
    }

    /// Whether a canonical field holds a non-missing value.
    pub fn has_value(&self, field: CanonicalField) -> bool {
        self.get(field).is_some_and(|v| !v.is_missing())
    }

    /// Total number of stored fields, mapped and unmapped.
    pub fn field_count(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum::<usize>() + self.unmapped.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
