//! Record-level access to one table through prepared statements.
//!
//! An [`Adapter`] binds a borrowed connection to one schema. It synthesizes
//! the schema's statements, prepares them once, and then moves records in
//! and out of the table one row at a time.
//!
//! # Example
//!
//! ```
//! use rusqlite::Connection;
//! use sqlcap_core::*;
//! use sqlcap_sqlite::{Adapter, create_table};
//!
//! let schema = SchemaDescriptor::new("Item")
//!     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key())
//!     .with_field(FieldDescriptor::new("label", ScalarType::Text));
//!
//! let conn = Connection::open_in_memory().unwrap();
//! create_table(&conn, &schema).unwrap();
//! let mut adapter = Adapter::new(&conn, &schema).unwrap();
//!
//! let mut item = DynamicRecord::new(&schema);
//! item.set_named(&schema, "id", 1u32).unwrap();
//! item.set_named(&schema, "label", "first").unwrap();
//! adapter.insert(&item).unwrap();
//!
//! let mut key = DynamicRecord::new(&schema);
//! key.set_named(&schema, "id", 1u32).unwrap();
//! assert!(adapter.select(&mut key).unwrap());
//! assert_eq!(key.get_named("label"), Some(&Value::from("first")));
//! ```

use std::borrow::Cow;

use rusqlite::{Connection, Statement};
use sqlcap_core::{FieldDescriptor, RecordBuilder, RecordReader, SchemaDescriptor, Value};
use tracing::{debug, trace};

use crate::codec::{Codec, DynHandler};
use crate::error::{Result, SqliteError};
use crate::statement::Statements;

/// Prepared-statement adapter for one schema.
///
/// The adapter owns its prepared statements and finalizes them when
/// dropped. The connection, the schema and any installed handlers are
/// borrowed and must outlive it. An adapter is not `Sync`; use one per
/// thread.
///
/// The CREATE text is synthesized but not prepared: SQLite resolves table
/// names at prepare time, so the table must already exist when the adapter
/// is constructed (see [`create_table`](crate::create_table)).
pub struct Adapter<'a> {
    conn: &'a Connection,
    schema: &'a SchemaDescriptor,
    sql: Statements,
    insert: Statement<'a>,
    update: Statement<'a>,
    delete: Statement<'a>,
    select: Statement<'a>,
    codec: Codec<'a>,
}

impl<'a> Adapter<'a> {
    /// Synthesizes and prepares the statements for `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvariantViolation`] if the schema cannot be
    /// mapped, or [`SqliteError::StoreFailed`] if SQLite rejects a statement
    /// (for instance because the table does not exist).
    pub fn new(conn: &'a Connection, schema: &'a SchemaDescriptor) -> Result<Self> {
        let sql = Statements::synthesize(schema)?;
        let insert = conn.prepare(&sql.insert)?;
        let update = conn.prepare(&sql.update)?;
        let delete = conn.prepare(&sql.delete)?;
        let select = conn.prepare(&sql.select)?;
        debug!(table = %schema.qualified_name(), "prepared adapter statements");

        Ok(Self {
            conn,
            schema,
            sql,
            insert,
            update,
            delete,
            select,
            codec: Codec::new(),
        })
    }

    pub fn schema(&self) -> &'a SchemaDescriptor {
        self.schema
    }

    /// The synthesized statement texts.
    pub fn statements(&self) -> &Statements {
        &self.sql
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &'a Connection {
        self.conn
    }

    /// Installs a handler for one field of this adapter's schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvariantViolation`] if the field is not part
    /// of the schema, the handler's type differs from the field's, or a
    /// different handler is already installed for the field.
    pub fn add_field_handler(
        &mut self,
        field: &FieldDescriptor,
        handler: &'a dyn DynHandler,
    ) -> Result<()> {
        if !self.schema.contains(field) {
            return Err(SqliteError::InvariantViolation(format!(
                "field `{}` is not part of schema `{}`",
                field.name(),
                self.schema.name()
            )));
        }
        self.codec.add_field_handler(field, handler)
    }

    /// Installs a handler for every field of the handler's scalar type.
    pub fn add_type_handler(&mut self, handler: &'a dyn DynHandler) -> Result<()> {
        self.codec.add_type_handler(handler)
    }

    /// The handler tables used for binding and reading.
    pub fn codec(&self) -> &Codec<'a> {
        &self.codec
    }

    /// Inserts `record` as a new row.
    pub fn insert<R: RecordReader + ?Sized>(&mut self, record: &R) -> Result<()> {
        self.insert.clear_bindings();
        bind_fields(&self.codec, &mut self.insert, self.schema.fields(), record)?;
        execute(&mut self.insert, "insert")
    }

    /// Rewrites the value columns of the row whose key matches `record`.
    pub fn update<R: RecordReader + ?Sized>(&mut self, record: &R) -> Result<()> {
        self.update.clear_bindings();
        bind_fields(&self.codec, &mut self.update, self.schema.fields(), record)?;
        execute(&mut self.update, "update")
    }

    /// Deletes the row whose key matches `record`.
    pub fn delete<R: RecordReader + ?Sized>(&mut self, record: &R) -> Result<()> {
        self.delete.clear_bindings();
        bind_fields(&self.codec, &mut self.delete, self.schema.pk_fields(), record)?;
        execute(&mut self.delete, "delete")
    }

    /// Reads the row whose key matches the key fields already set in
    /// `builder`, and writes its value columns into `builder`.
    ///
    /// Returns whether a row matched. NULL columns leave the corresponding
    /// field untouched.
    pub fn select<B: RecordBuilder + ?Sized>(&mut self, builder: &mut B) -> Result<bool> {
        self.select.clear_bindings();
        bind_fields(&self.codec, &mut self.select, self.schema.pk_fields(), &*builder)?;

        let columns: Vec<String> = self
            .select
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = self.select.raw_query();
        let mut found = false;
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(err) => return Err(step_error(err)),
            };
            found = true;
            for (col, name) in columns.iter().enumerate() {
                let Some(field) = self.schema.field_by_name(name) else {
                    continue;
                };
                if let Some(value) = self.codec.decode_field(field, row, col)? {
                    builder.set(field, value)?;
                }
            }
        }
        trace!(table = %self.schema.qualified_name(), found, "select done");
        Ok(found)
    }
}

/// Binds every field in `fields` at its parameter index. Unset fields bind
/// their type's default value.
fn bind_fields<'f, R: RecordReader + ?Sized>(
    codec: &Codec<'_>,
    stmt: &mut Statement<'_>,
    fields: impl Iterator<Item = &'f FieldDescriptor>,
    record: &R,
) -> Result<()> {
    for field in fields {
        let value = match record.get(field) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::default_for(field.ty()).ok_or_else(|| {
                SqliteError::InvariantViolation(format!(
                    "field `{}` of type {} has no value representation",
                    field.name(),
                    field.ty()
                ))
            })?),
        };
        codec.encode_field(field, &value, stmt, field.param_index())?;
    }
    Ok(())
}

/// Steps a bound statement once. Both "done" and "row" count as success.
fn execute(stmt: &mut Statement<'_>, operation: &str) -> Result<()> {
    match stmt.raw_execute() {
        Ok(changes) => {
            trace!(operation, changes, "statement done");
            Ok(())
        }
        Err(rusqlite::Error::ExecuteReturnedResults) => {
            trace!(operation, "statement returned a row");
            Ok(())
        }
        Err(err) => Err(step_error(err)),
    }
}

/// Engine failures carry SQLite's message; anything else is a result the
/// adapter does not handle.
fn step_error(err: rusqlite::Error) -> SqliteError {
    match err {
        rusqlite::Error::SqliteFailure(..) => SqliteError::StoreFailed(err),
        other => SqliteError::Unimplemented(other.to_string()),
    }
}
