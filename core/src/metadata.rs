//! Metadata reader: derived facts about fields and schemas.
//!
//! Everything here is a pure function of the descriptors and their
//! annotations. The statement synthesizer and the adapter never read
//! annotations directly.

use crate::types::{
    AnnotationValue, COLUMN_ANNOTATION, FieldDescriptor, IGNORE_ANNOTATION,
    PRIMARY_KEY_ANNOTATION, SCHEMA_ANNOTATION, SQL_TYPE_ANNOTATION, SchemaDescriptor,
    TABLE_ANNOTATION,
};
use crate::validate::ValidationError;

impl FieldDescriptor {
    /// Whether the field is excluded from SQL mapping.
    ///
    /// List, interface and opaque pointer fields are always ignored; any
    /// other field is ignored only when annotated so.
    pub fn is_ignored(&self) -> bool {
        self.ty().is_pointer_like()
            || self
                .annotation(IGNORE_ANNOTATION)
                .and_then(AnnotationValue::as_bool)
                .unwrap_or(false)
    }

    pub fn is_primary_key(&self) -> bool {
        self.annotation(PRIMARY_KEY_ANNOTATION)
            .and_then(AnnotationValue::as_bool)
            .unwrap_or(false)
    }

    /// Column name override, falling back to the declaration name.
    pub fn column_name(&self) -> &str {
        self.annotation(COLUMN_ANNOTATION)
            .and_then(AnnotationValue::as_text)
            .unwrap_or(self.name())
    }

    pub fn annotated_sql_type(&self) -> Option<&str> {
        self.annotation(SQL_TYPE_ANNOTATION)
            .and_then(AnnotationValue::as_text)
    }

    /// Resolved SQL column type: the annotation if present, else the
    /// canonical mapping of the field's type.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnresolvedSqlType`] when the type has no
    /// canonical mapping and no annotation supplies one.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlcap_core::{FieldDescriptor, ScalarType};
    ///
    /// let plain = FieldDescriptor::new("n", ScalarType::Int64);
    /// assert_eq!(plain.sql_type().unwrap(), "INTEGER");
    ///
    /// let annotated = plain.clone().with_sql_type("BIGINT");
    /// assert_eq!(annotated.sql_type().unwrap(), "BIGINT");
    ///
    /// assert!(FieldDescriptor::new("s", ScalarType::Struct).sql_type().is_err());
    /// ```
    pub fn sql_type(&self) -> Result<&str, ValidationError> {
        if let Some(sql_type) = self.annotated_sql_type() {
            return Ok(sql_type);
        }
        self.ty()
            .canonical_sql_type()
            .ok_or_else(|| ValidationError::UnresolvedSqlType {
                field: self.name().to_string(),
                ty: self.ty(),
            })
    }
}

impl SchemaDescriptor {
    /// Table name override, falling back to the display name.
    pub fn table_name(&self) -> &str {
        self.annotation(TABLE_ANNOTATION)
            .and_then(AnnotationValue::as_text)
            .unwrap_or(self.name())
    }

    /// Namespace the table lives in, if annotated.
    pub fn schema_name(&self) -> Option<&str> {
        self.annotation(SCHEMA_ANNOTATION)
            .and_then(AnnotationValue::as_text)
    }

    /// Table reference used in statement text: `[schema].table` or `table`.
    pub fn qualified_name(&self) -> String {
        match self.schema_name() {
            Some(schema) => format!("[{schema}].{}", self.table_name()),
            None => self.table_name().to_string(),
        }
    }

    /// Non-ignored fields with a column-mappable type, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.declared_fields()
            .iter()
            .filter(|f| !f.is_ignored() && f.ty().is_mappable())
    }

    pub fn pk_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields().filter(|f| f.is_primary_key())
    }

    pub fn value_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields().filter(|f| !f.is_primary_key())
    }

    /// Looks up a mapped field by its resolved column name.
    pub fn field_by_name(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|f| f.column_name() == column)
    }
}
