//! Canonical medical fields and the categories they belong to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bucket a canonical field is filed under in a unified record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Demographics,
    Vitals,
    Symptoms,
    History,
    Medications,
    Allergies,
    Notes,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 7] = [
        Category::Demographics,
        Category::Vitals,
        Category::Symptoms,
        Category::History,
        Category::Medications,
        Category::Allergies,
        Category::Notes,
    ];

    /// Snake-case key used in serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Demographics => "demographics",
            Category::Vitals => "vitals",
            Category::Symptoms => "symptoms",
            Category::History => "history",
            Category::Medications => "medications",
            Category::Allergies => "allergies",
            Category::Notes => "notes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standardized medical data key.
///
/// Each variant belongs to exactly one [`Category`]; see [`CanonicalField::category`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    // Demographics
    PatientId,
    PatientName,
    PatientAge,
    Gender,
    DateOfBirth,

    // Vitals
    Temperature,
    BloodPressure,
    BloodPressureSystolic,
    BloodPressureDiastolic,
    HeartRate,
    RespiratoryRate,
    OxygenSaturation,
    Weight,
    Height,
    Bmi,

    // Symptoms
    ChiefComplaint,
    Symptoms,
    SymptomDuration,
    PainScore,

    // History
    MedicalHistory,
    SurgicalHistory,
    FamilyHistory,
    SocialHistory,

    // Medications
    CurrentMedications,

    // Allergies
    KnownAllergies,

    // Notes
    ClinicalNote,
    Assessment,
    Plan,
    PhysicalExam,
    ClinicalNoteRaw,
}

impl CanonicalField {
    /// Every canonical field.
    pub const ALL: [CanonicalField; 30] = [
        CanonicalField::PatientId,
        CanonicalField::PatientName,
        CanonicalField::PatientAge,
        CanonicalField::Gender,
        CanonicalField::DateOfBirth,
        CanonicalField::Temperature,
        CanonicalField::BloodPressure,
        CanonicalField::BloodPressureSystolic,
        CanonicalField::BloodPressureDiastolic,
        CanonicalField::HeartRate,
        CanonicalField::RespiratoryRate,
        CanonicalField::OxygenSaturation,
        CanonicalField::Weight,
        CanonicalField::Height,
        CanonicalField::Bmi,
        CanonicalField::ChiefComplaint,
        CanonicalField::Symptoms,
        CanonicalField::SymptomDuration,
        CanonicalField::PainScore,
        CanonicalField::MedicalHistory,
        CanonicalField::SurgicalHistory,
        CanonicalField::FamilyHistory,
        CanonicalField::SocialHistory,
        CanonicalField::CurrentMedications,
        CanonicalField::KnownAllergies,
        CanonicalField::ClinicalNote,
        CanonicalField::Assessment,
        CanonicalField::Plan,
        CanonicalField::PhysicalExam,
        CanonicalField::ClinicalNoteRaw,
    ];

    /// Category this field is filed under.
    pub fn category(&self) -> Category {
        use CanonicalField::*;
        match self {
            PatientId | PatientName | PatientAge | Gender | DateOfBirth => Category::Demographics,
            Temperature | BloodPressure | BloodPressureSystolic | BloodPressureDiastolic
            | HeartRate | RespiratoryRate | OxygenSaturation | Weight | Height | Bmi => {
                Category::Vitals
            }
            ChiefComplaint | Symptoms | SymptomDuration | PainScore => Category::Symptoms,
            MedicalHistory | SurgicalHistory | FamilyHistory | SocialHistory => Category::History,
            CurrentMedications => Category::Medications,
            KnownAllergies => Category::Allergies,
            ClinicalNote | Assessment | Plan | PhysicalExam | ClinicalNoteRaw => Category::Notes,
        }
    }

    /// Whether values of this field are vital-sign measurements.
    pub fn is_vital(&self) -> bool {
        self.category() == Category::Vitals
    }

    /// Snake-case key used in serialized records.
    pub fn as_str(&self) -> &'static str {
        use CanonicalField::*;
        match self {
            PatientId => "patient_id",
            PatientName => "patient_name",
            PatientAge => "patient_age",
            Gender => "gender",
            DateOfBirth => "date_of_birth",
            Temperature => "temperature",
            BloodPressure => "blood_pressure",
            BloodPressureSystolic => "blood_pressure_systolic",
            BloodPressureDiastolic => "blood_pressure_diastolic",
            HeartRate => "heart_rate",
            RespiratoryRate => "respiratory_rate",
            OxygenSaturation => "oxygen_saturation",
            Weight => "weight",
            Height => "height",
            Bmi => "bmi",
            ChiefComplaint => "chief_complaint",
            Symptoms => "symptoms",
            SymptomDuration => "symptom_duration",
            PainScore => "pain_score",
            MedicalHistory => "medical_history",
            SurgicalHistory => "surgical_history",
            FamilyHistory => "family_history",
            SocialHistory => "social_history",
            CurrentMedications => "current_medications",
            KnownAllergies => "known_allergies",
            ClinicalNote => "clinical_note",
            Assessment => "assessment",
            Plan => "plan",
            PhysicalExam => "physical_exam",
            ClinicalNoteRaw => "clinical_note_raw",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == key)
            .ok_or_else(|| format!("unknown canonical field: {}", s))
    }
}
