//! Summary statistics over normalized records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{CanonicalField, FieldValue, UnifiedPatientRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgeRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Counts of each value kind seen for one field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindCounts {
    pub number: usize,
    pub text: usize,
    pub missing: usize,
}

impl KindCounts {
    fn record(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Number(_) => self.number += 1,
            FieldValue::Text(_) => self.text += 1,
            FieldValue::Missing => self.missing += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSummary {
    pub total_records: usize,
    /// Qualified names present in any record: `category.field` or `unmapped.name`
    pub fields_present: Vec<String>,
    pub value_kinds: BTreeMap<String, KindCounts>,
    pub age_range: Option<AgeRange>,
    /// Lower-cased gender value → record count
    pub gender_distribution: BTreeMap<String, usize>,
}

/// Summarize a set of records. Returns `None` when there are no records.
pub fn summarize_records(records: &[UnifiedPatientRecord]) -> Option<DataSummary> {
    if records.is_empty() {
        return None;
    }

    let mut value_kinds: BTreeMap<String, KindCounts> = BTreeMap::new();
    let mut ages = Vec::new();
    let mut gender_distribution = BTreeMap::new();

    for record in records {
        for (category, fields) in &record.categories {
            for (field, value) in fields {
                value_kinds
                    .entry(format!("{}.{}", category, field))
                    .or_default()
                    .record(value);
            }
        }
        for (name, value) in &record.unmapped {
            value_kinds
                .entry(format!("unmapped.{}", name))
                .or_default()
                .record(value);
        }

        if let Some(age) = record.get(CanonicalField::PatientAge).and_then(numeric) {
            ages.push(age);
        }
        if let Some(gender) = record
            .get(CanonicalField::Gender)
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string().trim().to_lowercase())
        {
            *gender_distribution.entry(gender).or_insert(0) += 1;
        }
    }

    let age_range = if ages.is_empty() {
        None
    } else {
        let min = ages.iter().copied().fold(f64::INFINITY, f64::min);
        let max = ages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = ages.iter().sum::<f64>() / ages.len() as f64;
        Some(AgeRange { min, max, mean })
    };

    Some(DataSummary {
        total_records: records.len(),
        fields_present: value_kinds.keys().cloned().collect(),
        value_kinds,
        age_range,
        gender_distribution,
    })
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse().ok(),
        FieldValue::Missing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordSource, SourceFormat};

    fn record(index: usize, fields: &[(CanonicalField, FieldValue)]) -> UnifiedPatientRecord {
        let mut record = UnifiedPatientRecord::new(RecordSource {
            file_name: "intake.csv".into(),
            format: SourceFormat::Csv,
            batch_index: index,
            digest: "d".into(),
        });
        for (field, value) in fields {
            record
                .categories
                .entry(field.category())
                .or_default()
                .insert(*field, value.clone());
        }
        record
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize_records(&[]).is_none());
    }

    #[test]
    fn test_summary() {
        let mut first = record(
            0,
            &[
                (CanonicalField::PatientAge, FieldValue::Text("40".into())),
                (CanonicalField::Gender, FieldValue::Text("Female".into())),
                (CanonicalField::HeartRate, FieldValue::Number(88.0)),
            ],
        );
        first.unmapped.insert("pt_name".into(), FieldValue::Text("Jane".into()));
        let second = record(
            1,
            &[
                (CanonicalField::PatientAge, FieldValue::Number(60.0)),
                (CanonicalField::Gender, FieldValue::Text("female".into())),
                (CanonicalField::HeartRate, FieldValue::Missing),
            ],
        );
        let third = record(
            2,
            &[
                (CanonicalField::PatientAge, FieldValue::Text("unknown".into())),
                (CanonicalField::Gender, FieldValue::Text("M".into())),
            ],
        );

        let summary = summarize_records(&[first, second, third]).unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(
            summary.fields_present,
            vec![
                "demographics.gender".to_string(),
                "demographics.patient_age".to_string(),
                "unmapped.pt_name".to_string(),
                "vitals.heart_rate".to_string(),
            ]
        );
        assert_eq!(
            summary.value_kinds["demographics.patient_age"],
            KindCounts {
                number: 1,
                text: 2,
                missing: 0
            }
        );
        assert_eq!(
            summary.age_range,
            Some(AgeRange {
                min: 40.0,
                max: 60.0,
                mean: 50.0
            })
        );
        assert_eq!(summary.gender_distribution.get("female"), Some(&2));
        assert_eq!(summary.gender_distribution.get("m"), Some(&1));
    }
}
