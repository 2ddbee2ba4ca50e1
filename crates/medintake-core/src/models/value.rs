//! Field values as they arrive from uploads.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Unambiguous decimal number, e.g. `88`, `-2`, `98.6`.
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern is valid"));

/// A single field value.
///
/// Serializes untagged: numbers as JSON numbers, text as strings, missing as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Build a text value, treating blank input as missing.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            FieldValue::Missing
        } else {
            FieldValue::Text(trimmed.to_string())
        }
    }

    /// Build a value from a JSON scalar.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Missing,
            serde_json::Value::Bool(b) => FieldValue::Text(b.to_string()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => FieldValue::text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Coerce numeric-looking text to a number.
    ///
    /// Returns `Err(self)` when the value is text that does not match the
    /// numeric pattern or does not fit a finite `f64`. Numbers and missing
    /// values pass through.
    pub fn coerce_numeric(self) -> Result<Self, Self> {
        match self {
            FieldValue::Text(ref s) if NUMERIC.is_match(s) => match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(FieldValue::Number(n)),
                _ => Err(self),
            },
            FieldValue::Text(_) => Err(self),
            other => Ok(other),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }

    /// Short name of the variant, used in summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::Missing => "missing",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Missing => Ok(()),
        }
    }
}
