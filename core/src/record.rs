//! Record readers and builders.
//!
//! The adapter reads field values out of a [`RecordReader`] when binding
//! statements and writes decoded values into a [`RecordBuilder`] when
//! reading rows back. [`DynamicRecord`] is the schema-driven implementation
//! used by the CLI, demos and tests; callers with their own record types
//! implement the traits directly.
//!
//! # Examples
//!
//! ```
//! use sqlcap_core::*;
//!
//! let schema = SchemaDescriptor::new("Item")
//!     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key())
//!     .with_field(FieldDescriptor::new("label", ScalarType::Text));
//!
//! let mut record = DynamicRecord::new(&schema);
//! let id = schema.field_named("id").unwrap();
//! record.set(id, Value::Uint32(7)).unwrap();
//!
//! assert_eq!(record.get(id), Some(&Value::Uint32(7)));
//! assert!(record.set(id, Value::Text("seven".into())).is_err());
//! ```

use crate::error::{Result, SchemaError};
use crate::types::{FieldDescriptor, ScalarType, SchemaDescriptor};
use crate::value::Value;

/// Read access to a record's field values.
pub trait RecordReader {
    /// Returns the field's value, or `None` if it was never set.
    fn get(&self, field: &FieldDescriptor) -> Option<&Value>;
}

/// Write access to a record's field values.
pub trait RecordBuilder: RecordReader {
    /// Adopts `value` as the field's new value.
    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    name: String,
    ty: ScalarType,
    value: Option<Value>,
}

/// A record laid out after a [`SchemaDescriptor`], one slot per declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    slots: Vec<Slot>,
}

impl DynamicRecord {
    /// Creates a record with every field unset.
    pub fn new(schema: &SchemaDescriptor) -> Self {
        let slots = schema
            .declared_fields()
            .iter()
            .map(|f| Slot {
                name: f.name().to_string(),
                ty: f.ty(),
                value: None,
            })
            .collect();
        Self { slots }
    }

    /// Sets a field by declaration name.
    pub fn set_named(
        &mut self,
        schema: &SchemaDescriptor,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let field = schema
            .field_named(name)
            .ok_or_else(|| SchemaError::UnknownField(name.to_string()))?;
        self.set(field, value.into())
    }

    /// Reads a field by declaration name.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.value.as_ref())
    }

    pub fn is_set(&self, field: &FieldDescriptor) -> bool {
        self.get(field).is_some()
    }

    /// Unsets a field, returning its previous value.
    pub fn clear(&mut self, field: &FieldDescriptor) -> Option<Value> {
        self.slot_mut(field).ok().and_then(|s| s.value.take())
    }

    fn slot_mut(&mut self, field: &FieldDescriptor) -> Result<&mut Slot> {
        match self.slots.get_mut(field.index()) {
            Some(slot) if slot.name == field.name() && slot.ty == field.ty() => Ok(slot),
            _ => Err(SchemaError::UnknownField(field.name().to_string())),
        }
    }
}

impl RecordReader for DynamicRecord {
    fn get(&self, field: &FieldDescriptor) -> Option<&Value> {
        self.slots
            .get(field.index())
            .filter(|s| s.name == field.name())
            .and_then(|s| s.value.as_ref())
    }
}

impl RecordBuilder for DynamicRecord {
    fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        let slot = self.slot_mut(field)?;
        if value.scalar_type() != slot.ty {
            return Err(SchemaError::ValueTypeMismatch {
                field: slot.name.clone(),
                expected: slot.ty,
                found: value.scalar_type(),
            });
        }
        slot.value = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("R")
            .with_field(FieldDescriptor::new("a", ScalarType::Int8))
            .with_field(FieldDescriptor::new("b", ScalarType::Text))
    }

    #[test]
    fn test_unset_fields_read_as_none() {
        let schema = schema();
        let record = DynamicRecord::new(&schema);
        for field in schema.declared_fields() {
            assert!(!record.is_set(field));
        }
    }

    #[test]
    fn test_set_and_clear() {
        let schema = schema();
        let mut record = DynamicRecord::new(&schema);
        record.set_named(&schema, "b", "hello").unwrap();
        assert_eq!(record.get_named("b"), Some(&Value::Text("hello".into())));

        let b = schema.field_named("b").unwrap();
        assert_eq!(record.clear(b), Some(Value::Text("hello".into())));
        assert!(!record.is_set(b));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let schema = schema();
        let mut record = DynamicRecord::new(&schema);
        let err = record.set_named(&schema, "a", 3i32).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::ValueTypeMismatch {
                expected: ScalarType::Int8,
                found: ScalarType::Int32,
                ..
            }
        ));
    }

    #[test]
    fn test_foreign_field_rejected() {
        let schema = schema();
        let other =
            SchemaDescriptor::new("O").with_field(FieldDescriptor::new("z", ScalarType::Int8));
        let mut record = DynamicRecord::new(&schema);
        let err = record.set(&other.declared_fields()[0], Value::Int8(1)).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownField(name) if name == "z"));
        assert!(record.set_named(&schema, "missing", 1i8).is_err());
    }
}
