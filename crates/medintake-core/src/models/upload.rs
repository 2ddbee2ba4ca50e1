//! Uploaded files and their declared formats.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Txt,
    Pdf,
}

impl SourceFormat {
    /// Resolve a format from a file extension (case-insensitive, leading dot allowed).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Some(SourceFormat::Csv),
            "json" => Some(SourceFormat::Json),
            "txt" | "text" => Some(SourceFormat::Txt),
            "pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }

    /// Resolve a format from a MIME type, ignoring parameters such as `charset`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "text/csv" | "application/csv" => Some(SourceFormat::Csv),
            "application/json" | "text/json" => Some(SourceFormat::Json),
            "text/plain" => Some(SourceFormat::Txt),
            "application/pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }

    /// Resolve a format from a file name's extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
            SourceFormat::Txt => "txt",
            SourceFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded file: name, declared MIME type and raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// Detect the format. The file extension wins; the MIME type is the fallback.
    pub fn detect_format(&self) -> Option<SourceFormat> {
        SourceFormat::from_file_name(&self.file_name)
            .or_else(|| self.mime_type.as_deref().and_then(SourceFormat::from_mime))
    }

    /// SHA-256 hex digest of the file contents.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}
