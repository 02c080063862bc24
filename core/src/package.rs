use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::types::{Annotation, FieldDescriptor, ScalarType, SchemaDescriptor};
use crate::validate::ensure_valid;

/// Serializable declaration of one field in a schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Declaration name.
    pub name: String,
    /// Scalar type (`bool`, `int8`, ..., `text`, `data`, `enum`, `list`, ...).
    #[serde(rename = "type")]
    pub ty: ScalarType,
    /// Column name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// SQL column type override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore: bool,
    /// Additional raw annotations, consulted after the keys above.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

/// Serializable schema declaration, read from JSON or YAML.
///
/// # Examples
///
/// ```
/// use sqlcap_core::SchemaFile;
///
/// let file = SchemaFile::from_yaml(r#"
/// name: Item
/// schema: dbo
/// table: Items
/// fields:
///   - { name: id, type: uint32, primary_key: true }
///   - { name: label, type: text }
/// "#).unwrap();
///
/// let schema = file.into_descriptor();
/// assert_eq!(schema.qualified_name(), "[dbo].Items");
/// assert_eq!(schema.pk_fields().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Short display name of the record type.
    pub name: String,
    /// Namespace the table lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Table name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Additional raw schema annotations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    /// Fields in declaration order.
    pub fields: Vec<FieldEntry>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl SchemaFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads a schema file, choosing the format from the extension
    /// (`.json`, `.yaml` or `.yml`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Err(SchemaError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Builds the descriptor. Explicit keys are attached before the raw
    /// annotations, so they take precedence.
    pub fn into_descriptor(self) -> SchemaDescriptor {
        let mut schema = SchemaDescriptor::new(self.name);
        if let Some(table) = &self.table {
            schema = schema.with_table(table);
        }
        if let Some(namespace) = &self.schema {
            schema = schema.with_namespace(namespace);
        }
        for anno in self.annotations {
            schema = schema.with_annotation(anno.id, anno.value);
        }

        for entry in self.fields {
            let mut field = FieldDescriptor::new(entry.name, entry.ty);
            if let Some(column) = &entry.column {
                field = field.with_column(column);
            }
            if let Some(sql_type) = &entry.sql_type {
                field = field.with_sql_type(sql_type);
            }
            if entry.primary_key {
                field = field.primary_key();
            }
            if entry.ignore {
                field = field.ignored();
            }
            for anno in entry.annotations {
                field = field.with_annotation(anno.id, anno.value);
            }
            schema = schema.with_field(field);
        }
        schema
    }
}

/// Loads a schema file and validates the resulting descriptor.
///
/// # Errors
///
/// Returns [`SchemaError::Invalid`] if the schema violates a structural
/// invariant, besides I/O and parse errors.
pub fn load_schema(path: impl AsRef<Path>) -> Result<SchemaDescriptor> {
    let schema = SchemaFile::load(path)?.into_descriptor();
    ensure_valid(&schema)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SQL_TYPE_ANNOTATION;
    use crate::validate::ValidationError;

    const ALL_TYPES_JSON: &str = r#"{
        "name": "TestAllTypes",
        "fields": [
            { "name": "boolField", "type": "bool" },
            { "name": "int8Field", "type": "int8" },
            { "name": "pkInt", "type": "uint32", "primary_key": true },
            { "name": "pkText", "type": "text", "primary_key": true },
            { "name": "children", "type": "list" }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let schema = SchemaFile::from_json(ALL_TYPES_JSON).unwrap().into_descriptor();
        assert_eq!(schema.name(), "TestAllTypes");
        assert_eq!(schema.declared_fields().len(), 5);
        assert_eq!(schema.fields().count(), 4);
        assert_eq!(schema.pk_fields().count(), 2);
    }

    #[test]
    fn test_explicit_key_beats_raw_annotation() {
        let yaml = r#"
name: T
fields:
  - name: n
    type: int64
    sql_type: BIGINT
    annotations:
      - { id: "ab6671fbf244a8de", value: "NUMERIC" }
"#;
        let schema = SchemaFile::from_yaml(yaml).unwrap().into_descriptor();
        let field = &schema.declared_fields()[0];
        assert_eq!(field.sql_type().unwrap(), "BIGINT");
        assert_eq!(field.annotations().len(), 2);
        assert_eq!(field.annotations()[1].id, SQL_TYPE_ANNOTATION);
    }

    #[test]
    fn test_serialization_omits_defaults() {
        let file = SchemaFile::from_json(ALL_TYPES_JSON).unwrap();
        let json = serde_json::to_string(&file).unwrap();
        assert!(!json.contains("\"ignore\""));
        assert!(json.contains("\"primary_key\":true"));
        assert_eq!(SchemaFile::from_json(&json).unwrap(), file);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("all.json");
        std::fs::write(&json_path, ALL_TYPES_JSON).unwrap();
        let schema = load_schema(&json_path).unwrap();
        assert_eq!(schema.table_name(), "TestAllTypes");

        let txt_path = dir.path().join("all.txt");
        std::fs::write(&txt_path, ALL_TYPES_JSON).unwrap();
        assert!(matches!(
            load_schema(&txt_path),
            Err(SchemaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_rejects_invalid_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(
            &path,
            "name: Bad\nfields:\n  - { name: a, type: int8 }\n  \
             - { name: b, type: int8, column: a }\n",
        )
        .unwrap();
        assert!(matches!(
            load_schema(&path),
            Err(SchemaError::Invalid(ValidationError::DuplicateColumn(c))) if c == "a"
        ));
    }
}
