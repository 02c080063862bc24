//! Schema validation.
//!
//! Validates the structural invariants a schema must satisfy before any
//! statement can be synthesized for it: every mapped field resolves to an
//! SQL type and resolved column names are unique.
//!
//! # Examples
//!
//! ```
//! use sqlcap_core::*;
//!
//! let schema = SchemaDescriptor::new("Item")
//!     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key())
//!     .with_field(FieldDescriptor::new("children", ScalarType::List));
//! assert!(validate_schema(&schema).is_empty());
//!
//! // A nested struct must be ignored explicitly
//! let bad = schema.clone().with_field(FieldDescriptor::new("inner", ScalarType::Struct));
//! assert!(!validate_schema(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::{ScalarType, SchemaDescriptor};

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Schema display name is empty or whitespace-only.
    #[error("schema name cannot be empty")]
    EmptySchemaName,
    /// A non-ignored field has neither a canonical SQL type nor an annotation.
    #[error("field `{field}` of type {ty} has no SQL type")]
    UnresolvedSqlType { field: String, ty: ScalarType },
    /// A non-ignored field has a type the codec cannot store in a column.
    #[error("field `{field}` of type {ty} cannot be mapped to a column; annotate it as ignored")]
    UnsupportedFieldType { field: String, ty: ScalarType },
    /// Two mapped fields resolve to the same column name.
    #[error("duplicate column in schema: {0}")]
    DuplicateColumn(String),
    /// The schema maps no field to a column.
    #[error("schema `{0}` has no columns")]
    NoColumns(String),
    /// The statement needs a primary key but no field is annotated as one.
    #[error("schema `{0}` has no primary key columns")]
    NoPrimaryKey(String),
    /// The statement needs value columns but every column is a key.
    #[error("schema `{0}` has no value columns")]
    NoValueColumns(String),
}

/// Validates a schema descriptor, collecting every problem found.
pub fn validate_schema(schema: &SchemaDescriptor) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.name().trim().is_empty() {
        errors.push(ValidationError::EmptySchemaName);
    }

    let mut seen_columns: HashSet<&str> = HashSet::new();
    for field in schema.declared_fields() {
        if field.is_ignored() {
            continue;
        }
        if let Err(err) = field.sql_type() {
            errors.push(err);
            continue;
        }
        if !field.ty().is_mappable() {
            errors.push(ValidationError::UnsupportedFieldType {
                field: field.name().to_string(),
                ty: field.ty(),
            });
            continue;
        }
        let column = field.column_name();
        if !seen_columns.insert(column) {
            errors.push(ValidationError::DuplicateColumn(column.to_string()));
        }
    }

    errors
}

/// Returns the first validation problem of `schema`, if any.
pub fn ensure_valid(schema: &SchemaDescriptor) -> Result<(), ValidationError> {
    match validate_schema(schema).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
