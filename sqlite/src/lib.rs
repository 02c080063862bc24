//! SQLite adapter for annotated schemas.
//!
//! This crate turns a [`SchemaDescriptor`](sqlcap_core::SchemaDescriptor)
//! into SQL and moves individual records between
//! [`RecordReader`](sqlcap_core::RecordReader)s /
//! [`RecordBuilder`](sqlcap_core::RecordBuilder)s and table rows.
//!
//! # Architecture
//!
//! The crate is organized into four modules:
//!
//! - **`statement`**: CREATE / INSERT / UPDATE / DELETE / SELECT synthesis
//! - **`codec`**: built-in value ↔ column conversion and user handlers
//! - **`adapter`**: prepared statements and record-level operations
//! - **`table`**: table creation and catalog inspection
//!
//! # Quick start
//!
//! ```
//! use rusqlite::Connection;
//! use sqlcap_core::*;
//! use sqlcap_sqlite::{Adapter, create_table};
//!
//! let schema = SchemaDescriptor::new("Point")
//!     .with_field(FieldDescriptor::new("id", ScalarType::Int64).primary_key())
//!     .with_field(FieldDescriptor::new("x", ScalarType::Float64))
//!     .with_field(FieldDescriptor::new("y", ScalarType::Float64));
//!
//! let conn = Connection::open_in_memory().unwrap();
//! create_table(&conn, &schema).unwrap();
//!
//! let mut adapter = Adapter::new(&conn, &schema).unwrap();
//! let mut point = DynamicRecord::new(&schema);
//! point.set_named(&schema, "id", 1i64).unwrap();
//! point.set_named(&schema, "x", 0.5f64).unwrap();
//! point.set_named(&schema, "y", -2.0f64).unwrap();
//! adapter.insert(&point).unwrap();
//!
//! point.set_named(&schema, "x", 4.0f64).unwrap();
//! adapter.update(&point).unwrap();
//!
//! let mut key = DynamicRecord::new(&schema);
//! key.set_named(&schema, "id", 1i64).unwrap();
//! adapter.select(&mut key).unwrap();
//! assert_eq!(key.get_named("x"), Some(&Value::Float64(4.0)));
//! ```
//!
//! # Parameter indices
//!
//! Every statement addresses a field by `?N` with `N` = declaration index + 1,
//! so one binding loop serves all operations and ignored fields simply leave
//! gaps in the numbering.

mod adapter;
mod codec;
mod error;
mod statement;
mod table;

pub use adapter::Adapter;
pub use codec::{Codec, DynHandler, Handler, decode, decode_value_ref, encode};
pub use error::{Result, SqliteError};
pub use statement::{
    StatementKind, Statements, create_statement, delete_statement, insert_statement,
    select_statement, update_statement,
};
pub use table::{ColumnInfo, create_table, table_columns, table_exists};
