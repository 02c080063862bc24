//! Bidirectional conversion between field values and SQLite columns.
//!
//! The built-in codec binds every scalar type through SQLite's integer,
//! double, text and blob bindings, and reads columns back with a strict
//! storage-class check. A [`Codec`] layers user handlers on top of it:
//!
//! 1. a handler registered for the specific field,
//! 2. otherwise a handler registered for the field's scalar type,
//! 3. otherwise the built-in [`encode`] / [`decode`].
//!
//! # Round-trip guarantees
//!
//! - Integers narrower than 64 bits are promoted on bind and narrowed with
//!   a range check on read.
//! - `uint64` is bound as the bit-identical `i64` and reinterpreted on read.
//! - `float32` widens to `f64` on bind, so it reads back exactly.
//! - Text and blob binds are copied by SQLite before the bind returns.
//! - A NULL column decodes as `None` for every field type.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

use rusqlite::types::ValueRef;
use rusqlite::{Row, Statement};
use sqlcap_core::{EnumOrdinal, FieldDescriptor, FieldValue, ScalarType, Value};
use tracing::trace;

use crate::error::{Result, SqliteError};

/// User-supplied conversion for one static value type.
///
/// # Examples
///
/// ```
/// use rusqlite::types::ValueRef;
/// use rusqlite::{Row, Statement};
/// use sqlcap_sqlite::{Handler, Result, SqliteError};
///
/// /// Stores booleans as 'Y' / 'N'.
/// struct YesNo;
///
/// impl Handler for YesNo {
///     type Value = bool;
///
///     fn encode(&self, value: &bool, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
///         stmt.raw_bind_parameter(param, if *value { "Y" } else { "N" })?;
///         Ok(())
///     }
///
///     fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<bool>> {
///         match row.get_ref(col)? {
///             ValueRef::Null => Ok(None),
///             ValueRef::Text(t) => Ok(Some(t == b"Y")),
///             _ => Err(SqliteError::TypeMismatch {
///                 column: col.to_string(),
///                 expected: "TEXT",
///                 found: "other".into(),
///             }),
///         }
///     }
/// }
/// ```
pub trait Handler {
    type Value: FieldValue;

    /// Binds `value` at the one-based parameter index `param`.
    fn encode(&self, value: &Self::Value, stmt: &mut Statement<'_>, param: usize) -> Result<()>;

    /// Reads column `col` of `row`; `None` leaves the target field untouched.
    fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<Self::Value>>;
}

/// Type-erased [`Handler`], as stored in a [`Codec`]'s tables.
pub trait DynHandler {
    fn scalar_type(&self) -> ScalarType;

    /// Name of the concrete handler type. Together with the address it
    /// identifies a registered handler.
    fn handler_type(&self) -> &'static str;

    fn encode_value(&self, value: &Value, stmt: &mut Statement<'_>, param: usize) -> Result<()>;

    fn decode_value(&self, row: &Row<'_>, col: usize) -> Result<Option<Value>>;
}

impl<H: Handler> DynHandler for H {
    fn scalar_type(&self) -> ScalarType {
        <H::Value as FieldValue>::TYPE
    }

    fn handler_type(&self) -> &'static str {
        std::any::type_name::<H>()
    }

    fn encode_value(&self, value: &Value, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
        let typed = <H::Value as FieldValue>::from_value(value).ok_or_else(|| {
            SqliteError::TypeMismatch {
                column: format!("?{param}"),
                expected: <H::Value as FieldValue>::TYPE.as_str(),
                found: value.scalar_type().to_string(),
            }
        })?;
        self.encode(typed, stmt, param)
    }

    fn decode_value(&self, row: &Row<'_>, col: usize) -> Result<Option<Value>> {
        Ok(self.decode(row, col)?.map(FieldValue::into_value))
    }
}

/// Binds `value` with the built-in conversion for its type.
pub fn encode(value: &Value, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
    match value {
        Value::Bool(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Int8(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Int16(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Int32(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Int64(v) => stmt.raw_bind_parameter(param, *v),
        Value::Uint8(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Uint16(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Uint32(v) => stmt.raw_bind_parameter(param, i64::from(*v)),
        Value::Uint64(v) => stmt.raw_bind_parameter(param, *v as i64),
        Value::Float32(v) => stmt.raw_bind_parameter(param, f64::from(*v)),
        Value::Float64(v) => stmt.raw_bind_parameter(param, *v),
        Value::Text(v) => stmt.raw_bind_parameter(param, v.as_str()),
        Value::Data(v) => stmt.raw_bind_parameter(param, v.as_slice()),
        Value::Enum(v) => stmt.raw_bind_parameter(param, i64::from(v.0)),
    }?;
    Ok(())
}

/// Reads column `col` of `row` as a value of type `ty` with the built-in
/// conversion.
pub fn decode(ty: ScalarType, row: &Row<'_>, col: usize) -> Result<Option<Value>> {
    let raw = row.get_ref(col)?;
    let column = row
        .as_ref()
        .column_name(col)
        .map(str::to_owned)
        .unwrap_or_else(|_| col.to_string());
    decode_value_ref(ty, raw, &column)
}

/// Converts a raw column value to a value of type `ty`.
///
/// `column` only labels errors.
pub fn decode_value_ref(ty: ScalarType, raw: ValueRef<'_>, column: &str) -> Result<Option<Value>> {
    if let ValueRef::Null = raw {
        return Ok(None);
    }

    let value = match ty {
        ScalarType::Bool => Value::Bool(integer(raw, column)? != 0),
        ScalarType::Int8 => Value::Int8(narrow(ty, raw, column)?),
        ScalarType::Int16 => Value::Int16(narrow(ty, raw, column)?),
        ScalarType::Int32 => Value::Int32(narrow(ty, raw, column)?),
        ScalarType::Int64 => Value::Int64(integer(raw, column)?),
        ScalarType::Uint8 => Value::Uint8(narrow(ty, raw, column)?),
        ScalarType::Uint16 => Value::Uint16(narrow(ty, raw, column)?),
        ScalarType::Uint32 => Value::Uint32(narrow(ty, raw, column)?),
        ScalarType::Uint64 => Value::Uint64(integer(raw, column)? as u64),
        ScalarType::Float32 => Value::Float32(real(raw, column)? as f32),
        ScalarType::Float64 => Value::Float64(real(raw, column)?),
        ScalarType::Enum => Value::Enum(EnumOrdinal(narrow(ty, raw, column)?)),
        ScalarType::Text => match raw {
            ValueRef::Text(bytes) => {
                let text = std::str::from_utf8(bytes).map_err(|_| SqliteError::TypeMismatch {
                    column: column.to_string(),
                    expected: "TEXT",
                    found: "TEXT with invalid UTF-8".to_string(),
                })?;
                Value::Text(text.to_owned())
            }
            other => return Err(mismatch(column, "TEXT", other)),
        },
        ScalarType::Data => match raw {
            ValueRef::Blob(bytes) => Value::Data(bytes.to_vec()),
            other => return Err(mismatch(column, "BLOB", other)),
        },
        ScalarType::Void
        | ScalarType::Struct
        | ScalarType::List
        | ScalarType::Interface
        | ScalarType::AnyPointer => {
            return Err(SqliteError::InvariantViolation(format!(
                "no built-in codec for column `{column}` of type {ty}"
            )));
        }
    };
    Ok(Some(value))
}

fn storage_class(raw: ValueRef<'_>) -> &'static str {
    match raw {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "FLOAT",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

fn mismatch(column: &str, expected: &'static str, raw: ValueRef<'_>) -> SqliteError {
    SqliteError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: storage_class(raw).to_string(),
    }
}

fn integer(raw: ValueRef<'_>, column: &str) -> Result<i64> {
    match raw {
        ValueRef::Integer(i) => Ok(i),
        other => Err(mismatch(column, "INTEGER", other)),
    }
}

fn narrow<T: TryFrom<i64>>(ty: ScalarType, raw: ValueRef<'_>, column: &str) -> Result<T> {
    let i = integer(raw, column)?;
    T::try_from(i).map_err(|_| SqliteError::TypeMismatch {
        column: column.to_string(),
        expected: ty.as_str(),
        found: format!("INTEGER {i} out of range"),
    })
}

fn real(raw: ValueRef<'_>, column: &str) -> Result<f64> {
    match raw {
        ValueRef::Real(f) => Ok(f),
        other => Err(mismatch(column, "FLOAT", other)),
    }
}

/// Handler tables consulted before the built-in codec.
///
/// Handlers are borrowed; they must outlive the codec. A handler is
/// identified by its address and its concrete type, so distinct zero-sized
/// handlers of different types never count as the same one.
#[derive(Default)]
pub struct Codec<'h> {
    by_field: HashMap<usize, &'h dyn DynHandler>,
    by_type: HashMap<ScalarType, &'h dyn DynHandler>,
}

impl<'h> Codec<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a handler for one field, keyed by its declaration index.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvariantViolation`] if the handler's type
    /// differs from the field's, or if a different handler is already
    /// installed for the field. Installing the same handler again is a no-op.
    pub(crate) fn add_field_handler(
        &mut self,
        field: &FieldDescriptor,
        handler: &'h dyn DynHandler,
    ) -> Result<()> {
        if handler.scalar_type() != field.ty() {
            return Err(SqliteError::InvariantViolation(format!(
                "handler for {} cannot serve field `{}` of type {}",
                handler.scalar_type(),
                field.name(),
                field.ty()
            )));
        }
        register(&mut self.by_field, field.index(), handler)
            .map_err(|()| duplicate(&format!("field `{}`", field.name())))
    }

    /// Installs a handler for every field of the handler's scalar type.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvariantViolation`] if a different handler is
    /// already installed for that type.
    pub(crate) fn add_type_handler(&mut self, handler: &'h dyn DynHandler) -> Result<()> {
        let ty = handler.scalar_type();
        register(&mut self.by_type, ty, handler).map_err(|()| duplicate(&format!("type {ty}")))
    }

    fn resolve(&self, field: &FieldDescriptor) -> Option<&'h dyn DynHandler> {
        self.by_field
            .get(&field.index())
            .or_else(|| self.by_type.get(&field.ty()))
            .copied()
    }

    /// Binds a field's value at `param`.
    pub fn encode_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
        stmt: &mut Statement<'_>,
        param: usize,
    ) -> Result<()> {
        if value.scalar_type() != field.ty() {
            return Err(SqliteError::TypeMismatch {
                column: field.column_name().to_string(),
                expected: field.ty().as_str(),
                found: value.scalar_type().to_string(),
            });
        }
        trace!(field = field.name(), param, "bind");
        match self.resolve(field) {
            Some(handler) => handler.encode_value(value, stmt, param),
            None => encode(value, stmt, param),
        }
    }

    /// Reads column `col` of `row` into a value for `field`.
    pub fn decode_field(
        &self,
        field: &FieldDescriptor,
        row: &Row<'_>,
        col: usize,
    ) -> Result<Option<Value>> {
        match self.resolve(field) {
            Some(handler) => handler.decode_value(row, col),
            None => decode(field.ty(), row, col),
        }
    }
}

fn register<'h, K: Hash + Eq>(
    table: &mut HashMap<K, &'h dyn DynHandler>,
    key: K,
    handler: &'h dyn DynHandler,
) -> std::result::Result<(), ()> {
    match table.entry(key) {
        Entry::Occupied(existing) if same_handler(*existing.get(), handler) => Ok(()),
        Entry::Occupied(_) => Err(()),
        Entry::Vacant(slot) => {
            slot.insert(handler);
            Ok(())
        }
    }
}

fn same_handler(a: &dyn DynHandler, b: &dyn DynHandler) -> bool {
    std::ptr::addr_eq(a, b) && a.handler_type() == b.handler_type()
}

fn duplicate(target: &str) -> SqliteError {
    SqliteError::InvariantViolation(format!(
        "a different handler is already registered for {target}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn decode_sql(ty: ScalarType, expr: &str) -> Result<Option<Value>> {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare(&format!("SELECT {expr} AS c")).unwrap();
        let mut rows = stmt.query([]).unwrap();
        let row = rows.next().unwrap().unwrap();
        decode(ty, row, 0)
    }

    fn encode_then_read(value: Value) -> String {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT typeof(?1) || ':' || quote(?1)").unwrap();
        encode(&value, &mut stmt, 1).unwrap();
        let mut rows = stmt.raw_query();
        let row = rows.next().unwrap().unwrap();
        row.get(0).unwrap()
    }

    #[test]
    fn test_encode_storage_classes() {
        assert_eq!(encode_then_read(Value::Bool(true)), "integer:1");
        assert_eq!(encode_then_read(Value::Int8(-4)), "integer:-4");
        assert_eq!(encode_then_read(Value::Uint64(u64::MAX)), "integer:-1");
        assert_eq!(encode_then_read(Value::Enum(EnumOrdinal(7))), "integer:7");
        assert_eq!(encode_then_read(Value::Float64(0.5)), "real:0.5");
        assert_eq!(encode_then_read(Value::Text("it's".into())), "text:'it''s'");
        assert_eq!(encode_then_read(Value::Data(vec![0xab, 0x01])), "blob:X'AB01'");
    }

    #[test]
    fn test_decode_null_is_absent_for_every_type() {
        for ty in [ScalarType::Bool, ScalarType::Int32, ScalarType::Text, ScalarType::Data] {
            assert_eq!(decode_sql(ty, "NULL").unwrap(), None, "{ty}");
        }
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_sql(ScalarType::Bool, "2").unwrap(), Some(Value::Bool(true)));
        assert_eq!(decode_sql(ScalarType::Int16, "-300").unwrap(), Some(Value::Int16(-300)));
        assert_eq!(decode_sql(ScalarType::Uint64, "-1").unwrap(), Some(Value::Uint64(u64::MAX)));
        assert_eq!(decode_sql(ScalarType::Float32, "1.5").unwrap(), Some(Value::Float32(1.5)));
        assert_eq!(decode_sql(ScalarType::Text, "'abc'").unwrap(), Some(Value::Text("abc".into())));
        assert_eq!(decode_sql(ScalarType::Data, "X'0102'").unwrap(), Some(Value::Data(vec![1, 2])));
        assert_eq!(
            decode_sql(ScalarType::Enum, "3").unwrap(),
            Some(Value::Enum(EnumOrdinal(3)))
        );
    }

    #[test]
    fn test_decode_storage_class_mismatch() {
        let err = decode_sql(ScalarType::Int32, "'abc'").unwrap_err();
        assert!(matches!(
            err,
            SqliteError::TypeMismatch { ref column, expected: "INTEGER", ref found }
                if column == "c" && found == "TEXT"
        ));
        assert!(matches!(
            decode_sql(ScalarType::Float64, "1"),
            Err(SqliteError::TypeMismatch { expected: "FLOAT", .. })
        ));
        assert!(matches!(
            decode_sql(ScalarType::Data, "'abc'"),
            Err(SqliteError::TypeMismatch { expected: "BLOB", .. })
        ));
    }

    #[test]
    fn test_decode_out_of_range_narrowing() {
        assert!(matches!(
            decode_sql(ScalarType::Int8, "300"),
            Err(SqliteError::TypeMismatch { expected: "int8", .. })
        ));
        assert!(matches!(
            decode_sql(ScalarType::Uint32, "-1"),
            Err(SqliteError::TypeMismatch { expected: "uint32", .. })
        ));
    }

    struct Shout;

    impl Handler for Shout {
        type Value = String;

        fn encode(&self, value: &String, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
            stmt.raw_bind_parameter(param, value.to_uppercase())?;
            Ok(())
        }

        fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<String>> {
            Ok(row.get::<_, Option<String>>(col)?.map(|s| s.to_lowercase()))
        }
    }

    struct Tagged(&'static str);

    impl Handler for Tagged {
        type Value = String;

        fn encode(&self, value: &String, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
            stmt.raw_bind_parameter(param, format!("{}{value}", self.0))?;
            Ok(())
        }

        fn decode(&self, _row: &Row<'_>, _col: usize) -> Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[test]
    fn test_field_handler_type_must_match() {
        let shout = Shout;
        let mut codec = Codec::new();
        let field = FieldDescriptor::new("n", ScalarType::Int32);
        assert!(matches!(
            codec.add_field_handler(&field, &shout),
            Err(SqliteError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_registration_is_idempotent_for_same_handler() {
        let first = Tagged("a:");
        let second = Tagged("b:");
        let field = FieldDescriptor::new("s", ScalarType::Text);
        let mut codec = Codec::new();
        codec.add_field_handler(&field, &first).unwrap();
        codec.add_field_handler(&field, &first).unwrap();
        assert!(codec.add_field_handler(&field, &second).is_err());

        codec.add_type_handler(&second).unwrap();
        codec.add_type_handler(&second).unwrap();
        assert!(codec.add_type_handler(&first).is_err());
    }

    struct Quiet;

    impl Handler for Quiet {
        type Value = String;

        fn encode(&self, value: &String, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
            stmt.raw_bind_parameter(param, value.to_lowercase())?;
            Ok(())
        }

        fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<String>> {
            Ok(row.get(col)?)
        }
    }

    #[test]
    fn test_distinct_zero_sized_handlers_are_not_the_same() {
        let field = FieldDescriptor::new("s", ScalarType::Text);
        let mut codec = Codec::new();

        codec.add_field_handler(&field, &Shout).unwrap();
        codec.add_field_handler(&field, &Shout).unwrap();
        assert!(matches!(
            codec.add_field_handler(&field, &Quiet),
            Err(SqliteError::InvariantViolation(_))
        ));

        codec.add_type_handler(&Quiet).unwrap();
        assert!(matches!(
            codec.add_type_handler(&Shout),
            Err(SqliteError::InvariantViolation(_))
        ));

        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?1").unwrap();
        codec
            .encode_field(&field, &Value::from("Hi"), &mut stmt, 1)
            .unwrap();
        let mut rows = stmt.raw_query();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<_, String>(0).unwrap(), "HI");
    }

    #[test]
    fn test_field_handler_takes_precedence_over_type_handler() {
        let shout = Shout;
        let tagged = Tagged("t:");
        let schema = sqlcap_core::SchemaDescriptor::new("S")
            .with_field(FieldDescriptor::new("a", ScalarType::Text))
            .with_field(FieldDescriptor::new("b", ScalarType::Text));
        let a = &schema.declared_fields()[0];
        let b = &schema.declared_fields()[1];

        let mut codec = Codec::new();
        codec.add_type_handler(&tagged).unwrap();
        codec.add_field_handler(a, &shout).unwrap();

        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?1, ?2").unwrap();
        codec
            .encode_field(a, &Value::from("hi"), &mut stmt, 1)
            .unwrap();
        codec
            .encode_field(b, &Value::from("hi"), &mut stmt, 2)
            .unwrap();
        let mut rows = stmt.raw_query();
        let row = rows.next().unwrap().unwrap();
        assert_eq!(row.get::<_, String>(0).unwrap(), "HI");
        assert_eq!(row.get::<_, String>(1).unwrap(), "t:hi");

        assert_eq!(codec.decode_field(a, row, 0).unwrap(), Some(Value::from("hi")));
        assert_eq!(codec.decode_field(b, row, 1).unwrap(), Some(Value::from("t:")));
    }

    #[test]
    fn test_encode_field_rejects_wrong_value_type() {
        let codec = Codec::new();
        let field = FieldDescriptor::new("n", ScalarType::Int32);
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?1").unwrap();
        assert!(matches!(
            codec.encode_field(&field, &Value::Int64(1), &mut stmt, 1),
            Err(SqliteError::TypeMismatch { expected: "int32", .. })
        ));
    }
}
