//! Error types for schema loading and record access.

use thiserror::Error;

use crate::types::ScalarType;
use crate::validate::ValidationError;

/// Errors that can occur while loading schemas or filling records.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Schema file extension is neither JSON nor YAML.
    #[error("unsupported schema file format: {0}")]
    UnsupportedFormat(String),

    /// The loaded schema violates a structural invariant.
    #[error("invalid schema: {0}")]
    Invalid(#[from] ValidationError),

    /// A value of the wrong type was assigned to a field.
    #[error("value type mismatch for field `{field}`: expected {expected}, found {found}")]
    ValueTypeMismatch {
        field: String,
        expected: ScalarType,
        found: ScalarType,
    },

    /// The field does not belong to the record's schema.
    #[error("field `{0}` does not belong to this record")]
    UnknownField(String),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
