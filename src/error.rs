//! Error types for the extraction core.
//!
//! Fatal problems are returned as [`ExtractionError`]. Problems confined to a
//! single archive member are recorded as [`PartFailure`] values and carried
//! alongside the extracted text, so one broken slide never costs the whole
//! document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors returned by the extraction core.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The MIME type and extension match none of the known families.
    #[error("Unsupported file format '{mime_type}' for '{file_name}'")]
    UnsupportedFormat { mime_type: String, file_name: String },

    /// The container could not be opened and no fallback recovered any text.
    #[error("Could not read '{file_name}': {detail}")]
    CorruptContainer { file_name: String, detail: String },

    /// A pattern table entry is not a valid regular expression.
    #[error("Invalid pattern in category '{category}': {pattern}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Pattern tables or thresholds are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A line could not be classified because its content is not readable text.
    #[error("Line {line_number} is not decodable text")]
    UndecodableLine { line_number: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// A non-fatal failure while reading one archive member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartFailure {
    pub part: String,
    pub detail: String,
}

impl PartFailure {
    pub fn new(part: impl Into<String>, detail: impl ToString) -> Self {
        Self {
            part: part.into(),
            detail: detail.to_string(),
        }
    }
}

impl std::fmt::Display for PartFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "skipped {}: {}", self.part, self.detail)
    }
}
