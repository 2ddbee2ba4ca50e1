//! JSON adapter.
//!
//! A top-level array yields one batch per object element. A top-level object
//! is one batch, unless it wraps its records in a collection key such as
//! `patients` or `data`; the wrapper's other keys are then copied into every
//! record. Nested objects flatten into dotted names, in document order.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{FieldValue, RawBatch};

use super::{Extraction, FormatAdapter};

/// Separator for arrays of scalars collapsed into one value.
const SCALAR_ARRAY_SEPARATOR: &str = ", ";

#[derive(Debug, Clone)]
pub struct JsonAdapter {
    collection_keys: Vec<String>,
}

impl Default for JsonAdapter {
    fn default() -> Self {
        Self::new(vec!["patients".into(), "data".into()])
    }
}

impl JsonAdapter {
    pub fn new(collection_keys: Vec<String>) -> Self {
        Self { collection_keys }
    }

    /// Elements to treat as records, plus the wrapper fields shared by all of them.
    fn records<'v>(&self, document: &'v Value) -> (Vec<&'v Value>, Vec<(&'v str, &'v Value)>) {
        match document {
            Value::Array(items) => (items.iter().collect(), Vec::new()),
            Value::Object(map) => {
                let wrapped = self
                    .collection_keys
                    .iter()
                    .find_map(|key| Some((key.as_str(), map.get(key)?.as_array()?)));
                match wrapped {
                    Some((collection, items)) => {
                        let shared = map
                            .iter()
                            .filter(|(key, _)| key.as_str() != collection)
                            .map(|(key, value)| (key.as_str(), value))
                            .collect();
                        (items.iter().collect(), shared)
                    }
                    None => (vec![document], Vec::new()),
                }
            }
            scalar => (vec![scalar], Vec::new()),
        }
    }
}

impl FormatAdapter for JsonAdapter {
    fn extract(&self, bytes: &[u8]) -> Extraction {
        let document: Value = match serde_json::from_slice(bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!("JSON upload could not be parsed: {}", e);
                return Extraction {
                    batches: Vec::new(),
                    skipped: 1,
                };
            }
        };

        let (records, shared) = self.records(&document);
        let mut extraction = Extraction::default();
        for (position, record) in records.into_iter().enumerate() {
            let Value::Object(map) = record else {
                debug!(position, "Skipping non-object JSON record");
                extraction.skipped += 1;
                continue;
            };

            // Shared fields first so the record's own fields win
            let mut batch = RawBatch::new(extraction.batches.len());
            for (key, value) in &shared {
                flatten_value(value, key.to_string(), &mut batch);
            }
            flatten_object(map, None, &mut batch);
            extraction.batches.push(batch);
        }

        extraction
    }
}

fn join_name(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    }
}

fn flatten_object(map: &Map<String, Value>, prefix: Option<&str>, batch: &mut RawBatch) {
    for (key, value) in map {
        flatten_value(value, join_name(prefix, key), batch);
    }
}

fn flatten_value(value: &Value, name: String, batch: &mut RawBatch) {
    match value {
        Value::Object(map) => flatten_object(map, Some(&name), batch),
        Value::Array(items) if items.is_empty() => batch.push(name, FieldValue::Missing),
        Value::Array(items) if items.iter().all(is_scalar) => {
            let joined: Vec<String> = items
                .iter()
                .map(FieldValue::from_json)
                .filter(|v| !v.is_missing())
                .map(|v| v.to_string())
                .collect();
            batch.push(name, FieldValue::text(&joined.join(SCALAR_ARRAY_SEPARATOR)));
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(item, format!("{}.{}", name, i), batch);
            }
        }
        scalar => batch.push(name, FieldValue::from_json(scalar)),
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(batch: &'a RawBatch, name: &str) -> Option<&'a FieldValue> {
        batch.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    #[test]
    fn test_single_object_is_one_batch() {
        let extraction = JsonAdapter::default().extract(br#"{"pt_name":"Jane","bp_systolic":120}"#);

        assert_eq!(extraction.batches.len(), 1);
        let batch = &extraction.batches[0];
        assert_eq!(field(batch, "pt_name"), Some(&FieldValue::Text("Jane".into())));
        assert_eq!(field(batch, "bp_systolic"), Some(&FieldValue::Number(120.0)));
    }

    #[test]
    fn test_array_elements_are_batches() {
        let json = br#"[{"age": 45}, "not a record", {"age": 60}, 7]"#;
        let extraction = JsonAdapter::default().extract(json);

        assert_eq!(extraction.batches.len(), 2);
        assert_eq!(extraction.skipped, 2);
        assert_eq!(extraction.batches[1].index, 1);
        assert_eq!(field(&extraction.batches[1], "age"), Some(&FieldValue::Number(60.0)));
    }

    #[test]
    fn test_collection_keys() {
        let json = br#"{"source": "ehr-export", "patients": [{"age": 45}, {"age": 50}], "site": {"ward": "3B"}}"#;
        let extraction = JsonAdapter::default().extract(json);
        assert_eq!(extraction.batches.len(), 2);
        assert_eq!(extraction.skipped, 0);
        for batch in &extraction.batches {
            assert_eq!(field(batch, "source"), Some(&FieldValue::Text("ehr-export".into())));
            assert_eq!(field(batch, "site.ward"), Some(&FieldValue::Text("3B".into())));
            assert_eq!(field(batch, "patients"), None);
        }
        assert_eq!(field(&extraction.batches[1], "age"), Some(&FieldValue::Number(50.0)));

        // A record's own field comes after the shared one
        let json = br#"{"source": "ehr-export", "data": [{"source": "triage"}]}"#;
        let fields = &JsonAdapter::default().extract(json).batches[0].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].value, FieldValue::Text("triage".into()));

        let json = br#"{"records": [{"age": 45}]}"#;
        let extraction = JsonAdapter::new(vec!["records".into()]).extract(json);
        assert_eq!(extraction.batches.len(), 1);

        // A collection key holding a non-array is an ordinary field
        let json = br#"{"data": "n/a", "age": 45}"#;
        let extraction = JsonAdapter::default().extract(json);
        assert_eq!(extraction.batches.len(), 1);
        assert_eq!(field(&extraction.batches[0], "data"), Some(&FieldValue::Text("n/a".into())));
    }

    #[test]
    fn test_fields_keep_document_order() {
        let extraction = JsonAdapter::default().extract(br#"{"pulse": 90, "hr": 80, "age": 45}"#);
        let names: Vec<&str> = extraction.batches[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["pulse", "hr", "age"]);
    }

    #[test]
    fn test_flattening() {
        let json = br#"{
            "patient": {"name": "Jane", "contact": {"phone": "555"}},
            "allergies": ["penicillin", "latex"],
            "medications": [{"name": "lisinopril", "dose": "10mg"}],
            "labs": [],
            "notes": null
        }"#;
        let extraction = JsonAdapter::default().extract(json);
        let batch = &extraction.batches[0];

        assert_eq!(field(batch, "patient.name"), Some(&FieldValue::Text("Jane".into())));
        assert_eq!(field(batch, "patient.contact.phone"), Some(&FieldValue::Text("555".into())));
        assert_eq!(
            field(batch, "allergies"),
            Some(&FieldValue::Text("penicillin, latex".into()))
        );
        assert_eq!(
            field(batch, "medications.0.name"),
            Some(&FieldValue::Text("lisinopril".into()))
        );
        assert_eq!(field(batch, "labs"), Some(&FieldValue::Missing));
        assert_eq!(field(batch, "notes"), Some(&FieldValue::Missing));
    }

    #[test]
    fn test_malformed_document() {
        let extraction = JsonAdapter::default().extract(b"{\"age\": 45,");
        assert!(extraction.is_empty());
        assert_eq!(extraction.skipped, 1);
    }
}
