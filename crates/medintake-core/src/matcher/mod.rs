//! Field-name matching.
//!
//! Raw names are normalized, then looked up exactly in the synonym table.
//! There is no fuzzy matching: a name that misses is reported as unmapped
//! rather than guessed into a medical category. Near misses may be surfaced
//! as advisory [`UnmappedHint`]s, which never change routing.

mod hints;
mod synonyms;

pub use hints::*;
pub use synonyms::*;

use std::sync::Arc;

use crate::models::CanonicalField;

/// Parent segments of a flattened JSON name that may be looked through.
const CONTAINER_SEGMENTS: &[&str] = &[
    "patient",
    "patient info",
    "demographics",
    "vitals",
    "vital signs",
    "vitalsigns",
    "symptoms",
    "history",
    "medications",
    "allergies",
    "notes",
];

/// Result of matching one raw field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMatch {
    Canonical(CanonicalField),
    Unmapped,
}

/// Normalize a raw field name for lookup.
///
/// Lower-cases, turns `_ - . /` and whitespace runs into a single space,
/// removes every other non-alphanumeric character and trims.
pub fn normalize_field_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() || matches!(c, '_' | '-' | '.' | '/') {
            pending_space = true;
        }
    }

    out
}

/// Matches raw field names against a synonym table.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    table: Arc<FieldSynonymTable>,
}

impl Default for FieldMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMatcher {
    /// Matcher over the shared default table.
    pub fn new() -> Self {
        Self {
            table: FieldSynonymTable::shared(),
        }
    }

    pub fn with_table(table: Arc<FieldSynonymTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FieldSynonymTable {
        &self.table
    }

    /// Match a raw field name.
    ///
    /// Dotted names from flattened JSON are tried whole first; if that misses
    /// and every parent segment is a known container (`patient`, `vitals`, ...),
    /// the final segment is tried on its own.
    pub fn match_field(&self, raw_name: &str) -> FieldMatch {
        if let Some(field) = self.table.get(&normalize_field_name(raw_name)) {
            return FieldMatch::Canonical(field);
        }

        if let Some((parents, leaf)) = raw_name.rsplit_once('.') {
            let looks_through = parents.split('.').all(|segment| {
                let segment = normalize_field_name(segment);
                CONTAINER_SEGMENTS.contains(&segment.as_str())
            });
            if looks_through {
                if let Some(field) = self.table.get(&normalize_field_name(leaf)) {
                    return FieldMatch::Canonical(field);
                }
            }
        }

        FieldMatch::Unmapped
    }
}
