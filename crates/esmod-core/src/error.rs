//! Error handling for the esmod conversion pipeline
//!
//! This module provides the error types shared by every stage of the
//! legacy-namespace to ES-module conversion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for esmod operations
#[derive(Error, Debug)]
pub enum ConvertError {
    /// Configuration errors, raised before any file is touched
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// The closing form of a self-invoking wrapper could not be recognized,
    /// so text surgery cannot safely proceed for this file
    #[error("Unable to match the closing form of the wrapper in {file}")]
    AmbiguousWrapper { file: PathBuf },

    /// A file expected to carry an export list has none recorded
    #[error("No exports recorded for {file}")]
    MissingExports { file: PathBuf },

    /// The shared-constant aggregate could not be located in the symbol index
    #[error("No owner found for shared constant aggregate marker '{symbol}'")]
    MissingConstants { symbol: String },

    /// A regular expression supplied through configuration failed to compile
    #[error("Invalid replacement pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_with_field<S: Into<String>, F: Into<String>>(
        message: S,
        field: F,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an ambiguous-wrapper error for the given file
    pub fn ambiguous_wrapper<P: Into<PathBuf>>(file: P) -> Self {
        Self::AmbiguousWrapper { file: file.into() }
    }

    /// Create a missing-exports error for the given file
    pub fn missing_exports<P: Into<PathBuf>>(file: P) -> Self {
        Self::MissingExports { file: file.into() }
    }
}

/// Result type for esmod operations
pub type Result<T> = std::result::Result<T, ConvertError>;
