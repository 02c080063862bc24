//! Schema descriptors and record values for the sqlcap SQL adapter.
//!
//! This crate defines the structure-description side of the adapter:
//!
//! - [`SchemaDescriptor`] / [`FieldDescriptor`]: a named record type with
//!   ordered, typed fields and 64-bit-keyed [`Annotation`]s (table name,
//!   namespace, column name, SQL type, primary key, ignore).
//! - The metadata reader: methods such as
//!   [`FieldDescriptor::column_name`], [`FieldDescriptor::sql_type`],
//!   [`SchemaDescriptor::qualified_name`] and [`SchemaDescriptor::pk_fields`]
//!   that derive every fact the SQL layer needs from those annotations.
//! - [`Value`] and the [`RecordReader`] / [`RecordBuilder`] traits through
//!   which field values move in and out of records.
//! - [`SchemaFile`]: JSON/YAML schema declarations.
//!
//! Validation ([`validate_schema`], [`ensure_valid`]) rejects schemas that
//! cannot be mapped onto a table.
//!
//! # Example
//!
//! ```
//! use sqlcap_core::*;
//!
//! let schema = SchemaDescriptor::new("TestAllTypes")
//!     .with_field(FieldDescriptor::new("boolField", ScalarType::Bool))
//!     .with_field(FieldDescriptor::new("pkInt", ScalarType::Uint32).primary_key())
//!     .with_field(FieldDescriptor::new("pkText", ScalarType::Text).primary_key());
//!
//! assert!(validate_schema(&schema).is_empty());
//! assert_eq!(schema.value_fields().count(), 1);
//! assert_eq!(schema.field_by_name("pkText").unwrap().param_index(), 3);
//! ```

mod error;
mod metadata;
mod package;
mod record;
mod types;
mod validate;
mod value;

pub use error::{Result, SchemaError};
pub use package::{FieldEntry, SchemaFile, load_schema};
pub use record::{DynamicRecord, RecordBuilder, RecordReader};
pub use types::*;
pub use validate::{ValidationError, ensure_valid, validate_schema};
pub use value::{EnumOrdinal, FieldValue, Value};
