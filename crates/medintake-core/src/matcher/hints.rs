//! Advisory suggestions for unmapped field names.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::models::CanonicalField;

use super::{normalize_field_name, FieldSynonymTable};

/// Shortest normalized name worth suggesting for; `hr`-style abbreviations
/// are too short for similarity scores to mean anything.
const MIN_HINT_NAME_LEN: usize = 4;

/// A possible canonical field for a raw name that did not match.
///
/// Hints are reported to the consumer only; the field stays unmapped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnmappedHint {
    pub raw_name: String,
    /// Closest synonym (normalized form)
    pub closest_synonym: String,
    pub suggested_field: CanonicalField,
    /// Jaro-Winkler similarity (0.0 - 1.0)
    pub similarity: f64,
}

/// Find the closest synonym to an unmapped raw name.
pub fn suggest_field(
    table: &FieldSynonymTable,
    raw_name: &str,
    threshold: f64,
) -> Option<UnmappedHint> {
    let normalized = normalize_field_name(raw_name);
    if normalized.chars().count() < MIN_HINT_NAME_LEN {
        return None;
    }

    let (synonym, field, similarity) = table
        .iter()
        .filter(|(synonym, _)| synonym.chars().count() >= MIN_HINT_NAME_LEN)
        .map(|(synonym, field)| (synonym, field, jaro_winkler(&normalized, synonym)))
        // Ties broken on the synonym so results do not depend on map order
        .max_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.cmp(a.0))
        })?;

    (similarity >= threshold).then(|| UnmappedHint {
        raw_name: raw_name.to_string(),
        closest_synonym: synonym.to_string(),
        suggested_field: field,
        similarity,
    })
}
