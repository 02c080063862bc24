//! Dynamically typed field values.
//!
//! A [`Value`] is owned independently of any record. Decoding a column
//! produces one, and a record builder adopts it.

use crate::types::ScalarType;

/// Raw ordinal of an enum field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EnumOrdinal(pub u16);

/// A field value of one of the column-mappable scalar types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Data(Vec<u8>),
    Enum(EnumOrdinal),
}

impl Value {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::Int8(_) => ScalarType::Int8,
            Self::Int16(_) => ScalarType::Int16,
            Self::Int32(_) => ScalarType::Int32,
            Self::Int64(_) => ScalarType::Int64,
            Self::Uint8(_) => ScalarType::Uint8,
            Self::Uint16(_) => ScalarType::Uint16,
            Self::Uint32(_) => ScalarType::Uint32,
            Self::Uint64(_) => ScalarType::Uint64,
            Self::Float32(_) => ScalarType::Float32,
            Self::Float64(_) => ScalarType::Float64,
            Self::Text(_) => ScalarType::Text,
            Self::Data(_) => ScalarType::Data,
            Self::Enum(_) => ScalarType::Enum,
        }
    }

    /// The value an unset field of type `ty` reads as.
    ///
    /// Returns `None` for types that cannot be stored in a column.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlcap_core::{ScalarType, Value};
    ///
    /// assert_eq!(Value::default_for(ScalarType::Text), Some(Value::Text(String::new())));
    /// assert_eq!(Value::default_for(ScalarType::Struct), None);
    /// ```
    pub fn default_for(ty: ScalarType) -> Option<Self> {
        let value = match ty {
            ScalarType::Bool => Self::Bool(false),
            ScalarType::Int8 => Self::Int8(0),
            ScalarType::Int16 => Self::Int16(0),
            ScalarType::Int32 => Self::Int32(0),
            ScalarType::Int64 => Self::Int64(0),
            ScalarType::Uint8 => Self::Uint8(0),
            ScalarType::Uint16 => Self::Uint16(0),
            ScalarType::Uint32 => Self::Uint32(0),
            ScalarType::Uint64 => Self::Uint64(0),
            ScalarType::Float32 => Self::Float32(0.0),
            ScalarType::Float64 => Self::Float64(0.0),
            ScalarType::Text => Self::Text(String::new()),
            ScalarType::Data => Self::Data(Vec::new()),
            ScalarType::Enum => Self::Enum(EnumOrdinal::default()),
            ScalarType::Void
            | ScalarType::Struct
            | ScalarType::List
            | ScalarType::Interface
            | ScalarType::AnyPointer => return None,
        };
        Some(value)
    }
}

/// A Rust type that corresponds to exactly one scalar field type.
///
/// Typed handlers use this to receive `&bool`, `&String`, ... instead of a
/// [`Value`].
pub trait FieldValue: Sized {
    const TYPE: ScalarType;

    /// Borrows the payload if `value` holds this type.
    fn from_value(value: &Value) -> Option<&Self>;

    fn into_value(self) -> Value;
}

macro_rules! field_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl FieldValue for $ty {
            const TYPE: ScalarType = ScalarType::$variant;

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    )*};
}

field_value! {
    bool => Bool,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => Text,
    Vec<u8> => Data,
    EnumOrdinal => Enum,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Data(v.to_vec())
    }
}
