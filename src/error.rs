//! Error types for the dataset passes

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataset operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised while loading, normalizing or describing the dataset.
///
/// Every variant is fatal to the pass that produced it.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Collection {collection} has an unexpected shape: {message}")]
    InvalidShape { collection: String, message: String },

    #[error("Reference {value} in {field} is not recognized")]
    UnrecognizedReference { field: String, value: String },

    #[error("Reference {value} in {field} has no match in {target}")]
    DanglingReference {
        field: String,
        target: String,
        value: String,
    },

    #[error("Reference {value} in {field} has no amount and no override for record {record_id}")]
    MissingAmount {
        field: String,
        value: String,
        record_id: String,
    },

    #[error("Invalid value for {field}: {value}")]
    Validation { field: String, value: String },

    #[error("Collection {0} is not loaded for this pass")]
    CollectionNotLoaded(String),

    #[error("Unknown pass: {0}")]
    UnknownPass(String),

    #[error("Circular pass dependency detected at: {0}")]
    CircularDependency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
