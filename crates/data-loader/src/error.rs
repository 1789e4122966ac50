//! Error types for the data-loader crate.
//!
//! Every failure that can happen while reading feedback or plot files is a
//! variant here. Records that merely reference an item without a document are
//! *not* an error: they are filtered out by the [`Reader`](crate::Reader).

use thiserror::Error;

/// Errors raised while reading feedback or plot files
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A feedback or plot line is malformed
    #[error("{file}:{line}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field parsed but its value is unusable (e.g. a NaN rating)
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The same key appeared twice where keys must be unique
    #[error("Duplicate {entity} id {id} at line {line}")]
    DuplicateKey {
        entity: String,
        id: String,
        line: usize,
    },

    /// Nothing usable is left after filtering, or a record lost its document
    #[error("Invalid dataset: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
