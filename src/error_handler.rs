//! Batch error policy for directory runs.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{error, warn};

use crate::error::ExtractionError;

#[derive(Debug, Clone)]
pub struct ProcessingError {
    pub file_path: Option<PathBuf>,
    pub error_type: ErrorType,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorType {
    FileNotFound,
    FileCorrupted,
    UnsupportedFormat,
    ConfigurationError,
    ProcessingFailed,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorType::FileNotFound => "file not found",
            ErrorType::FileCorrupted => "file corrupted",
            ErrorType::UnsupportedFormat => "unsupported format",
            ErrorType::ConfigurationError => "configuration error",
            ErrorType::ProcessingFailed => "processing failed",
        };
        f.write_str(label)
    }
}

pub struct ErrorHandler {
    continue_on_error: bool,
    skip_invalid: bool,
    errors: Vec<ProcessingError>,
    warnings: Vec<String>,
}

impl ErrorHandler {
    pub fn new(continue_on_error: bool, skip_invalid: bool) -> Self {
        Self {
            continue_on_error,
            skip_invalid,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Records `error` and returns whether the batch should go on.
    pub fn handle_error(&mut self, error: ProcessingError) -> bool {
        let file = error.display_path();
        match error.error_type {
            ErrorType::FileNotFound | ErrorType::FileCorrupted | ErrorType::UnsupportedFormat => {
                if self.skip_invalid {
                    warn!(file = %file, "skipping invalid file: {}", error.message);
                    self.warnings
                        .push(format!("Skipped invalid file: {} - {}", file, error.message));
                    true
                } else {
                    error!(file = %file, "{}", error.message);
                    self.errors.push(error);
                    self.continue_on_error
                }
            }
            ErrorType::ProcessingFailed => {
                error!(file = %file, "{}", error.message);
                self.errors.push(error);
                self.continue_on_error
            }
            // a bad pattern table breaks every file that follows
            ErrorType::ConfigurationError => {
                error!("{}", error.message);
                self.errors.push(error);
                false
            }
        }
    }

    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn get_summary(&self) -> ErrorSummary {
        let mut error_counts = BTreeMap::new();
        for error in &self.errors {
            *error_counts.entry(error.error_type).or_insert(0) += 1;
        }

        ErrorSummary {
            total_errors: self.errors.len(),
            total_warnings: self.warnings.len(),
            error_counts,
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ErrorSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub error_counts: BTreeMap<ErrorType, usize>,
    pub errors: Vec<ProcessingError>,
    pub warnings: Vec<String>,
}

impl ErrorSummary {
    pub fn is_empty(&self) -> bool {
        self.total_errors == 0 && self.total_warnings == 0
    }
}

impl fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Processing Summary")?;
        writeln!(f, "===================")?;
        if self.total_warnings > 0 {
            writeln!(f, "⚠️  Warnings: {}", self.total_warnings)?;
            for warning in &self.warnings {
                writeln!(f, "   {}", warning)?;
            }
        }
        if self.total_errors > 0 {
            writeln!(f, "❌ Errors: {}", self.total_errors)?;
            for (error_type, count) in &self.error_counts {
                writeln!(f, "   {}: {}", error_type, count)?;
            }
            for error in &self.errors {
                writeln!(f, "   {} - {}", error.display_path(), error.message)?;
            }
        }
        Ok(())
    }
}

impl ProcessingError {
    pub fn file_not_found(path: PathBuf) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::FileNotFound,
            message: "File not found".to_string(),
        }
    }

    pub fn file_corrupted(path: PathBuf, details: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::FileCorrupted,
            message: format!("File corrupted: {}", details),
        }
    }

    pub fn unsupported_format(path: PathBuf, format: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::UnsupportedFormat,
            message: format!("Unsupported or unreadable format: {}", format),
        }
    }

    pub fn config_error(message: String) -> Self {
        Self {
            file_path: None,
            error_type: ErrorType::ConfigurationError,
            message: format!("Configuration error: {}", message),
        }
    }

    pub fn processing_failed(path: PathBuf, message: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::ProcessingFailed,
            message,
        }
    }

    /// Classifies an extraction failure for the batch policy.
    pub fn from_extraction(path: PathBuf, error: &ExtractionError) -> Self {
        match error {
            ExtractionError::UnsupportedFormat { mime_type, .. } => Self::unsupported_format(path, mime_type.clone()),
            ExtractionError::CorruptContainer { detail, .. } => Self::file_corrupted(path, detail.clone()),
            ExtractionError::Io(e) if e.kind() == ErrorKind::NotFound => Self::file_not_found(path),
            ExtractionError::InvalidPattern { .. } | ExtractionError::InvalidConfig(_) => {
                Self::config_error(error.to_string())
            }
            ExtractionError::UndecodableLine { .. } | ExtractionError::Io(_) => {
                Self::processing_failed(path, error.to_string())
            }
        }
    }

    fn display_path(&self) -> String {
        self.file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}
