//! Synonym table mapping raw field names to canonical fields.
//!
//! Keys are stored in normalized form (see [`normalize_field_name`]).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::models::CanonicalField;

use super::normalize_field_name;

/// Default table, built once on first use.
static DEFAULT_TABLE: LazyLock<Arc<FieldSynonymTable>> =
    LazyLock::new(|| Arc::new(FieldSynonymTable::with_defaults()));

/// Synonym conflict: a name already maps to a different field.
#[derive(Debug, Clone, PartialEq)]
pub struct SynonymConflict {
    pub synonym: String,
    pub existing: CanonicalField,
    pub requested: CanonicalField,
}

/// Normalized raw name → canonical field.
#[derive(Debug, Clone)]
pub struct FieldSynonymTable {
    entries: HashMap<String, CanonicalField>,
}

impl FieldSynonymTable {
    /// Shared default table.
    pub fn shared() -> Arc<FieldSynonymTable> {
        Arc::clone(&DEFAULT_TABLE)
    }

    /// Table holding the default synonyms.
    pub fn with_defaults() -> Self {
        let mut entries = HashMap::new();
        for &(field, synonyms) in default_synonyms() {
            // Every canonical key matches itself
            entries.insert(normalize_field_name(field.as_str()), field);
            for synonym in synonyms {
                entries.insert(normalize_field_name(synonym), field);
            }
        }
        Self { entries }
    }

    /// Copy of this table extended with additional synonyms.
    ///
    /// Re-adding an existing synonym for the same field is a no-op; mapping it
    /// to a different field is a conflict.
    pub fn extended<'a, I>(&self, extra: I) -> Result<Self, SynonymConflict>
    where
        I: IntoIterator<Item = (&'a str, CanonicalField)>,
    {
        let mut entries = self.entries.clone();
        for (synonym, field) in extra {
            let key = normalize_field_name(synonym);
            match entries.get(&key) {
                Some(existing) if *existing != field => {
                    return Err(SynonymConflict {
                        synonym: key,
                        existing: *existing,
                        requested: field,
                    });
                }
                _ => {
                    entries.insert(key, field);
                }
            }
        }
        Ok(Self { entries })
    }

    /// Look up an already-normalized name.
    pub fn get(&self, normalized: &str) -> Option<CanonicalField> {
        self.entries.get(normalized).copied()
    }

    /// Iterate over `(normalized synonym, field)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CanonicalField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Default synonym lists, written as they commonly appear in exports.
fn default_synonyms() -> &'static [(CanonicalField, &'static [&'static str])] {
    use CanonicalField::*;

    const SYNONYMS: &[(CanonicalField, &[&str])] = &[
        // Demographics
        (PatientId, &["id", "patientid", "patient number", "mrn", "medical record number"]),
        (PatientName, &["name", "patientname", "full name", "fullname"]),
        (PatientAge, &["age", "age years", "age yrs"]),
        (Gender, &["sex", "patient gender", "patient sex"]),
        (DateOfBirth, &["dob", "birth date", "birthdate"]),

        // Vitals
        (Temperature, &["temp", "body temp", "body temperature", "temp f", "temp c"]),
        (BloodPressure, &["bp", "systolic diastolic"]),
        (BloodPressureSystolic, &["bp systolic", "systolic", "systolic bp", "sbp"]),
        (BloodPressureDiastolic, &["bp diastolic", "diastolic", "diastolic bp", "dbp"]),
        (HeartRate, &["hr", "pulse", "pulse rate", "bpm", "heartrate"]),
        (RespiratoryRate, &["rr", "breathing rate", "resp rate", "respiration rate"]),
        (OxygenSaturation, &["o2 sat", "spo2", "oxygen sat", "o2 saturation", "sao2"]),
        (Weight, &["wt", "body weight", "weight kg", "weight lbs"]),
        (Height, &["ht", "height cm", "height in"]),
        (Bmi, &["body mass index"]),

        // Symptoms
        (ChiefComplaint, &["cc", "complaint", "presenting complaint", "reason for visit"]),
        (Symptoms, &["symptom", "clinical symptoms", "presenting symptoms", "presents with"]),
        (SymptomDuration, &["duration", "onset"]),
        (PainScore, &["pain", "pain scale", "pain level"]),

        // History
        (MedicalHistory, &["history", "pmh", "pmhx", "past medical history"]),
        (SurgicalHistory, &["psh", "past surgical history"]),
        (FamilyHistory, &["fh", "fhx"]),
        (SocialHistory, &["sh", "shx"]),

        // Medications
        (CurrentMedications, &["medications", "medication", "meds", "current meds", "prescriptions", "rx"]),

        // Allergies
        (KnownAllergies, &["allergies", "allergy", "drug allergies", "medication allergies"]),

        // Notes
        (ClinicalNote, &["clinical notes", "notes", "note", "progress note", "comments"]),
        (Assessment, &["impression", "diagnosis"]),
        (Plan, &["treatment plan"]),
        (PhysicalExam, &["pe", "exam", "examination", "physical examination"]),
        (ClinicalNoteRaw, &[]),
    ];

    SYNONYMS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_defaults_cover_every_field() {
        let table = FieldSynonymTable::with_defaults();
        let covered: HashSet<CanonicalField> = table.iter().map(|(_, f)| f).collect();
        for field in CanonicalField::ALL {
            assert!(covered.contains(&field), "{} has no synonym", field);
        }
    }

    #[test]
    fn test_default_synonyms_are_unambiguous() {
        let mut seen: HashMap<String, CanonicalField> = HashMap::new();
        for &(field, synonyms) in default_synonyms() {
            let own = std::iter::once(field.as_str()).chain(synonyms.iter().copied());
            for synonym in own {
                let key = normalize_field_name(synonym);
                if let Some(previous) = seen.insert(key.clone(), field) {
                    panic!("{} maps to both {} and {}", key, previous, field);
                }
            }
        }
    }

    #[test]
    fn test_lookup() {
        let table = FieldSynonymTable::shared();
        assert_eq!(table.get("hr"), Some(CanonicalField::HeartRate));
        assert_eq!(table.get("chief complaint"), Some(CanonicalField::ChiefComplaint));
        assert_eq!(table.get("bp systolic"), Some(CanonicalField::BloodPressureSystolic));
        assert_eq!(table.get("pt name"), None);
    }

    #[test]
    fn test_extended() {
        let table = FieldSynonymTable::with_defaults();
        let extended = table
            .extended([("Heart Beat", CanonicalField::HeartRate), ("HR", CanonicalField::HeartRate)])
            .unwrap();
        assert_eq!(extended.get("heart beat"), Some(CanonicalField::HeartRate));
        assert_eq!(extended.len(), table.len() + 1);

        let conflict = table
            .extended([("hr", CanonicalField::RespiratoryRate)])
            .unwrap_err();
        assert_eq!(conflict.existing, CanonicalField::HeartRate);
        assert_eq!(conflict.requested, CanonicalField::RespiratoryRate);
    }
}
