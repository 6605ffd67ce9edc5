//! Error types for the data-loader crate.
//!
//! Every failure while reading the catalog artifacts maps onto one of these
//! variants. Loading is all-or-nothing: any error aborts startup.

use thiserror::Error;

/// Errors that can occur while loading the catalog, the feature matrix or the
/// index manifest
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A required column is missing from the catalog header
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Binary artifact does not start with the expected magic bytes
    #[error("{file} is not a feature matrix (bad magic bytes)")]
    BadMagic { file: String },

    /// Artifact was written by a format version this build can't read
    #[error("Unsupported {artifact} format version {found} (expected {expected})")]
    UnsupportedVersion {
        artifact: String,
        found: u32,
        expected: u32,
    },

    /// Binary artifact ended before all declared data was read
    #[error("{file} is truncated: {reason}")]
    Truncated { file: String, reason: String },

    /// Two artifacts disagree on how many rows they describe
    #[error("Row count mismatch: {left} has {left_rows} rows but {right} has {right_rows}")]
    RowCountMismatch {
        left: String,
        left_rows: usize,
        right: String,
        right_rows: usize,
    },

    /// Index manifest JSON could not be decoded
    #[error("Invalid index manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
