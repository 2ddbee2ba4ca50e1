//! Record assembly: file matched fields into category buckets.
//!
//! Later occurrences of a field in the same batch win. The value they
//! replace is kept in a [`FieldFlag::Overwritten`] flag so nothing from the
//! upload disappears without a trace.

use crate::matcher::{FieldMatch, FieldMatcher};
use crate::models::{FieldFlag, FieldValue, RawBatch, RecordSource, UnifiedPatientRecord};

/// Builds unified records from raw batches.
pub struct RecordAssembler<'a> {
    matcher: &'a FieldMatcher,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(matcher: &'a FieldMatcher) -> Self {
        Self { matcher }
    }

    /// Assemble one record from one batch.
    pub fn assemble(&self, batch: &RawBatch, source: RecordSource) -> UnifiedPatientRecord {
        let mut record = UnifiedPatientRecord::new(source);

        for raw in &batch.fields {
            match self.matcher.match_field(&raw.name) {
                FieldMatch::Canonical(field) => {
                    let value = if field.is_vital() {
                        match raw.value.clone().coerce_numeric() {
                            Ok(value) => value,
                            Err(text) => {
                                record.flags.push(FieldFlag::NonNumericVital {
                                    field,
                                    value: text.to_string(),
                                });
                                text
                            }
                        }
                    } else {
                        raw.value.clone()
                    };

                    let previous = record
                        .categories
                        .entry(field.category())
                        .or_default()
                        .insert(field, value);
                    if let Some(previous) = previous {
                        record.flags.push(FieldFlag::Overwritten {
                            field: field.as_str().to_string(),
                            raw_name: raw.name.clone(),
                            previous,
                        });
                    }
                }
                FieldMatch::Unmapped => {
                    if let Some(previous) = record.unmapped.insert(raw.name.clone(), raw.value.clone()) {
                        record.flags.push(FieldFlag::Overwritten {
                            field: raw.name.clone(),
                            raw_name: raw.name.clone(),
                            previous,
                        });
                    }
                }
            }
        }

        record
    }
}
