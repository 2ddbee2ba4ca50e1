//! Normalizer configuration, loaded from TOML.
//!
//! ```toml
//! json_collection_keys = ["patients", "data", "records"]
//! pdf_batching = "whole_document"
//! suggestion_threshold = 0.9
//!
//! [extra_synonyms]
//! "heart beat" = "heart_rate"
//! "pt name" = "patient_name"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adapters::PdfBatching;
use crate::matcher::FieldSynonymTable;
use crate::models::CanonicalField;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Synonym '{synonym}' already maps to {existing}, cannot map it to {requested}")]
    SynonymConflict {
        synonym: String,
        existing: CanonicalField,
        requested: CanonicalField,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Raw name → canonical field, added to the default synonym table
    pub extra_synonyms: BTreeMap<String, CanonicalField>,
    /// Top-level JSON keys whose array holds the records
    pub json_collection_keys: Vec<String>,
    /// Longest text label accepted as a `label: value` pair
    pub max_label_len: usize,
    /// Separator for list items collected under a text label
    pub list_separator: String,
    pub pdf_batching: PdfBatching,
    /// Report near-miss suggestions for unmapped fields
    pub suggest_unmapped: bool,
    /// Minimum Jaro-Winkler similarity for a suggestion
    pub suggestion_threshold: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            extra_synonyms: BTreeMap::new(),
            json_collection_keys: vec!["patients".into(), "data".into()],
            max_label_len: 40,
            list_separator: "; ".into(),
            pdf_batching: PdfBatching::PerPage,
            suggest_unmapped: true,
            suggestion_threshold: 0.88,
        }
    }
}

impl IntakeConfig {
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: IntakeConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_label_len == 0 {
            return Err(ConfigError::Invalid("max_label_len must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.suggestion_threshold) {
            return Err(ConfigError::Invalid(format!(
                "suggestion_threshold must be within 0.0..=1.0, got {}",
                self.suggestion_threshold
            )));
        }
        Ok(())
    }

    /// Synonym table for this configuration.
    ///
    /// Shares the default table when there are no extra synonyms.
    pub fn synonym_table(&self) -> ConfigResult<Arc<FieldSynonymTable>> {
        let defaults = FieldSynonymTable::shared();
        if self.extra_synonyms.is_empty() {
            return Ok(defaults);
        }

        let extended = defaults
            .extended(self.extra_synonyms.iter().map(|(k, v)| (k.as_str(), *v)))
            .map_err(|c| ConfigError::SynonymConflict {
                synonym: c.synonym,
                existing: c.existing,
                requested: c.requested,
            })?;
        Ok(Arc::new(extended))
    }
}
