//! Error types for statement synthesis and adapter operations.
//!
//! Every failure of the adapter is one of four kinds: a malformed schema or
//! handler setup, an error reported by SQLite, a result SQLite returned that
//! the adapter does not handle, or a column whose storage type does not fit
//! the field being decoded.

use sqlcap_core::{SchemaError, ValidationError};
use thiserror::Error;

/// Errors that can occur during SQLite adapter operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// The schema or handler configuration breaks an invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// SQLite reported an error while preparing or stepping a statement.
    #[error("store failed: {0}")]
    StoreFailed(#[from] rusqlite::Error),

    /// SQLite returned a result the adapter has no handling for.
    #[error("unimplemented statement result: {0}")]
    Unimplemented(String),

    /// A column's storage class does not match the field being decoded.
    #[error("type mismatch in column `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },
}

impl From<ValidationError> for SqliteError {
    fn from(err: ValidationError) -> Self {
        SqliteError::InvariantViolation(err.to_string())
    }
}

impl From<SchemaError> for SqliteError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::ValueTypeMismatch {
                field,
                expected,
                found,
            } => SqliteError::TypeMismatch {
                column: field,
                expected: expected.as_str(),
                found: found.to_string(),
            },
            other => SqliteError::InvariantViolation(other.to_string()),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
