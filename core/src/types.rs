//! Schema descriptor definitions for structure-to-table mapping.
//!
//! This module defines the runtime description of a record type: its
//! scalar field types, the annotations attached to fields and schemas, and
//! the ordered field list that drives column order in every synthesized
//! statement. Descriptors are built once with the `with_*` builder methods
//! and are immutable afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Annotation carrying an explicit SQL column type (text).
pub const SQL_TYPE_ANNOTATION: u64 = 0xab66_71fb_f244_a8de;
/// Annotation marking a field as part of the primary key (bool).
pub const PRIMARY_KEY_ANNOTATION: u64 = 0xbf80_fc30_31df_0b60;
/// Annotation overriding a field's column name (text).
pub const COLUMN_ANNOTATION: u64 = 0xa9bc_db16_cc5b_bc7f;
/// Annotation overriding a schema's table name (text).
pub const TABLE_ANNOTATION: u64 = 0xb337_d975_d55c_655a;
/// Annotation placing a schema's table inside a namespace (text).
pub const SCHEMA_ANNOTATION: u64 = 0x89ea_0152_d4a3_dae3;
/// Annotation excluding a field from SQL mapping (bool).
pub const IGNORE_ANNOTATION: u64 = 0xddc3_b0b2_7d07_6cd1;

/// Type of a field as reported by the structure description.
///
/// Only the scalar types from `Bool` through `Enum` can be stored in a
/// column. `List`, `Interface` and `AnyPointer` are pointer-like and are
/// always ignored; `Void` and `Struct` must be explicitly ignored.
///
/// # Examples
///
/// ```
/// use sqlcap_core::ScalarType;
///
/// assert_eq!(ScalarType::Uint32.canonical_sql_type(), Some("UNSIGNED INTEGER"));
/// assert_eq!(ScalarType::List.canonical_sql_type(), None);
/// assert!(ScalarType::AnyPointer.is_pointer_like());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Text,
    Data,
    Enum,
    Struct,
    List,
    Interface,
    AnyPointer,
}

impl ScalarType {
    /// Returns the SQL type a column of this type gets when no SQL type
    /// annotation is present.
    pub fn canonical_sql_type(self) -> Option<&'static str> {
        match self {
            Self::Bool | Self::Uint8 => Some("UNSIGNED TINYINT"),
            Self::Uint16 | Self::Enum => Some("UNSIGNED SMALLINT"),
            Self::Uint32 | Self::Uint64 => Some("UNSIGNED INTEGER"),
            Self::Int8 => Some("TINYINT"),
            Self::Int16 => Some("SMALLINT"),
            Self::Int32 | Self::Int64 => Some("INTEGER"),
            Self::Float32 | Self::Float64 => Some("REAL"),
            Self::Text => Some("TEXT"),
            Self::Data => Some("BLOB"),
            Self::Void | Self::Struct | Self::List | Self::Interface | Self::AnyPointer => None,
        }
    }

    /// Whether this type can be stored in a single column.
    pub fn is_mappable(self) -> bool {
        self.canonical_sql_type().is_some()
    }

    /// Whether this is a list, interface or opaque pointer type. Such fields
    /// are never mapped, regardless of annotations.
    pub fn is_pointer_like(self) -> bool {
        matches!(self, Self::List | Self::Interface | Self::AnyPointer)
    }

    /// Name used in schema files and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Data => "data",
            Self::Enum => "enum",
            Self::Struct => "struct",
            Self::List => "list",
            Self::Interface => "interface",
            Self::AnyPointer => "anyPointer",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value attached to an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Bool(bool),
    Text(String),
}

impl AnnotationValue {
    /// Returns the boolean payload, or `None` for a text annotation.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(_) => None,
        }
    }

    /// Returns the text payload, or `None` for a boolean annotation.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) => None,
        }
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A key/value pair attached to a field or schema, keyed by a stable 64-bit id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(with = "hex_id")]
    pub id: u64,
    pub value: AnnotationValue,
}

impl Annotation {
    pub fn new(id: u64, value: impl Into<AnnotationValue>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

/// Returns the value of the first annotation with the given id.
pub(crate) fn find_annotation(annotations: &[Annotation], id: u64) -> Option<&AnnotationValue> {
    annotations.iter().find(|a| a.id == id).map(|a| &a.value)
}

/// Annotation ids are written as 16-digit hex strings; plain integers are
/// accepted on input.
mod hex_id {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{id:016x}"))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Hex(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(id) => Ok(id),
            Raw::Hex(s) => {
                let digits = s.trim_start_matches("0x");
                u64::from_str_radix(digits, 16)
                    .map_err(|e| de::Error::custom(format!("invalid annotation id '{s}': {e}")))
            }
        }
    }
}

/// Description of one field of a record type.
///
/// The declaration index is assigned by [`SchemaDescriptor::with_field`];
/// the bind parameter used for this field in every statement is
/// [`param_index`](Self::param_index).
///
/// # Examples
///
/// ```
/// use sqlcap_core::{FieldDescriptor, ScalarType, SchemaDescriptor};
///
/// let schema = SchemaDescriptor::new("Item")
///     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key())
///     .with_field(FieldDescriptor::new("label", ScalarType::Text).with_column("item_label"));
///
/// let label = &schema.declared_fields()[1];
/// assert_eq!(label.index(), 1);
/// assert_eq!(label.param_index(), 2);
/// assert_eq!(label.column_name(), "item_label");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    ty: ScalarType,
    index: usize,
    annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
            index: 0,
            annotations: Vec::new(),
        }
    }

    /// Attaches an arbitrary annotation.
    pub fn with_annotation(mut self, id: u64, value: impl Into<AnnotationValue>) -> Self {
        self.annotations.push(Annotation::new(id, value));
        self
    }

    /// Overrides the column name.
    pub fn with_column(self, column: &str) -> Self {
        self.with_annotation(COLUMN_ANNOTATION, column)
    }

    /// Overrides the SQL column type.
    pub fn with_sql_type(self, sql_type: &str) -> Self {
        self.with_annotation(SQL_TYPE_ANNOTATION, sql_type)
    }

    /// Marks the field as part of the primary key.
    pub fn primary_key(self) -> Self {
        self.with_annotation(PRIMARY_KEY_ANNOTATION, true)
    }

    /// Excludes the field from SQL mapping.
    pub fn ignored(self) -> Self {
        self.with_annotation(IGNORE_ANNOTATION, true)
    }

    /// Declaration name, as written in the structure description.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> ScalarType {
        self.ty
    }

    /// Zero-based declaration index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based bind parameter index, stable across all statements of the schema.
    pub fn param_index(&self) -> usize {
        self.index + 1
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the first annotation value with the given id.
    pub fn annotation(&self, id: u64) -> Option<&AnnotationValue> {
        find_annotation(&self.annotations, id)
    }
}

/// Description of a named record type and its fields.
///
/// # Examples
///
/// ```
/// use sqlcap_core::{FieldDescriptor, ScalarType, SchemaDescriptor};
///
/// let schema = SchemaDescriptor::new("Item")
///     .with_namespace("dbo")
///     .with_table("Items")
///     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key());
///
/// assert_eq!(schema.name(), "Item");
/// assert_eq!(schema.qualified_name(), "[dbo].Items");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    name: String,
    annotations: Vec<Annotation>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaDescriptor {
    /// Creates an empty schema with the given short display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Attaches an arbitrary schema-level annotation.
    pub fn with_annotation(mut self, id: u64, value: impl Into<AnnotationValue>) -> Self {
        self.annotations.push(Annotation::new(id, value));
        self
    }

    /// Overrides the table name.
    pub fn with_table(self, table: &str) -> Self {
        self.with_annotation(TABLE_ANNOTATION, table)
    }

    /// Places the table inside a namespace.
    pub fn with_namespace(self, namespace: &str) -> Self {
        self.with_annotation(SCHEMA_ANNOTATION, namespace)
    }

    /// Appends a field, assigning it the next declaration index.
    pub fn with_field(mut self, mut field: FieldDescriptor) -> Self {
        field.index = self.fields.len();
        self.fields.push(field);
        self
    }

    /// Short display name (the unqualified struct name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the first schema-level annotation value with the given id.
    pub fn annotation(&self, id: u64) -> Option<&AnnotationValue> {
        find_annotation(&self.annotations, id)
    }

    /// Every declared field in declaration order, ignored ones included.
    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a declared field by its declaration name.
    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether `field` is the field declared at its index in this schema.
    pub fn contains(&self, field: &FieldDescriptor) -> bool {
        self.fields.get(field.index) == Some(field)
    }
}
