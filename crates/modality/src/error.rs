//! Error types for building item modalities.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ModalityError {
    /// A builder parameter is outside its valid range
    #[error("Invalid modality configuration: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    /// A feature row does not have the table's dimension
    #[error("Feature row for item {item_id} has length {found}, expected {expected}")]
    DimensionMismatch {
        item_id: String,
        expected: usize,
        found: usize,
    },

    /// The same item id appears twice in a feature table
    #[error("Duplicate feature row for item {0}")]
    DuplicateItem(String),

    /// Number of ids and rows differ
    #[error("Got {ids} item ids but {rows} feature rows")]
    LengthMismatch { ids: usize, rows: usize },
}

pub type Result<T> = std::result::Result<T, ModalityError>;
