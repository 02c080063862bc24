//! SQL statement synthesis from annotated schemas.
//!
//! Generates the five statement templates an [`Adapter`](crate::Adapter)
//! works with. Every statement refers to the schema's qualified table name
//! and addresses each field by the same positional marker `?N`, where `N` is
//! the field's parameter index (declaration index + 1). A field therefore
//! binds identically in INSERT, UPDATE, DELETE and SELECT.
//!
//! # Example
//!
//! ```
//! use sqlcap_core::{FieldDescriptor, ScalarType, SchemaDescriptor};
//! use sqlcap_sqlite::{delete_statement, insert_statement};
//!
//! let schema = SchemaDescriptor::new("Item")
//!     .with_field(FieldDescriptor::new("label", ScalarType::Text))
//!     .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key());
//!
//! assert_eq!(
//!     insert_statement(&schema).unwrap(),
//!     "INSERT INTO Item (label, id)  VALUES(?1, ?2)"
//! );
//! assert_eq!(delete_statement(&schema).unwrap(), "DELETE FROM Item WHERE id = ?2");
//! ```

use std::fmt;

use sqlcap_core::{FieldDescriptor, SchemaDescriptor, ValidationError, ensure_valid};
use tracing::debug;

use crate::error::Result;

/// One of the five statements synthesized per schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Create,
    Insert,
    Update,
    Delete,
    Select,
}

impl StatementKind {
    pub const ALL: [StatementKind; 5] = [
        StatementKind::Create,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Select,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Create => "CREATE",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Select => "SELECT",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The complete set of statement texts for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    pub create: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
    pub select: String,
}

impl Statements {
    /// Synthesizes all five statements.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvariantViolation`](crate::SqliteError::InvariantViolation)
    /// if the schema is invalid, has no columns, no primary key, or no value
    /// columns.
    pub fn synthesize(schema: &SchemaDescriptor) -> Result<Self> {
        Ok(Self {
            create: create_statement(schema)?,
            insert: insert_statement(schema)?,
            update: update_statement(schema)?,
            delete: delete_statement(schema)?,
            select: select_statement(schema)?,
        })
    }

    pub fn get(&self, kind: StatementKind) -> &str {
        match kind {
            StatementKind::Create => &self.create,
            StatementKind::Insert => &self.insert,
            StatementKind::Update => &self.update,
            StatementKind::Delete => &self.delete,
            StatementKind::Select => &self.select,
        }
    }
}

fn columns(schema: &SchemaDescriptor) -> Result<Vec<&FieldDescriptor>> {
    ensure_valid(schema)?;
    let columns: Vec<_> = schema.fields().collect();
    if columns.is_empty() {
        return Err(ValidationError::NoColumns(schema.name().to_string()).into());
    }
    Ok(columns)
}

fn primary_key(schema: &SchemaDescriptor) -> Result<Vec<&FieldDescriptor>> {
    ensure_valid(schema)?;
    let pk: Vec<_> = schema.pk_fields().collect();
    if pk.is_empty() {
        return Err(ValidationError::NoPrimaryKey(schema.name().to_string()).into());
    }
    Ok(pk)
}

fn value_columns(schema: &SchemaDescriptor) -> Result<Vec<&FieldDescriptor>> {
    let values: Vec<_> = schema.value_fields().collect();
    if values.is_empty() {
        return Err(ValidationError::NoValueColumns(schema.name().to_string()).into());
    }
    Ok(values)
}

fn column_names(fields: &[&FieldDescriptor]) -> String {
    fields
        .iter()
        .map(|f| f.column_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `col = ?N` terms joined by `sep`.
fn assignments(fields: &[&FieldDescriptor], sep: &str) -> String {
    fields
        .iter()
        .map(|f| format!("{} = ?{}", f.column_name(), f.param_index()))
        .collect::<Vec<_>>()
        .join(sep)
}

fn logged(kind: StatementKind, schema: &SchemaDescriptor, sql: String) -> Result<String> {
    debug!(
        statement = %kind,
        table = %schema.qualified_name(),
        sql = %sql,
        "synthesized statement"
    );
    Ok(sql)
}

/// Generates `CREATE TABLE <table> (<col> <type>[ PRIMARY_KEY], ...) `.
pub fn create_statement(schema: &SchemaDescriptor) -> Result<String> {
    let definitions = columns(schema)?
        .into_iter()
        .map(|f| -> Result<String> {
            let sql_type = f.sql_type()?;
            Ok(if f.is_primary_key() {
                format!("{} {sql_type} PRIMARY_KEY", f.column_name())
            } else {
                format!("{} {sql_type}", f.column_name())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let sql = format!(
        "CREATE TABLE {} ({}) ",
        schema.qualified_name(),
        definitions.join(", ")
    );
    logged(StatementKind::Create, schema, sql)
}

/// Generates `INSERT INTO <table> (<cols>)  VALUES(?N, ...)`.
pub fn insert_statement(schema: &SchemaDescriptor) -> Result<String> {
    let columns = columns(schema)?;
    let params = columns
        .iter()
        .map(|f| format!("?{}", f.param_index()))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "INSERT INTO {} ({})  VALUES({params})",
        schema.qualified_name(),
        column_names(&columns)
    );
    logged(StatementKind::Insert, schema, sql)
}

/// Generates `UPDATE <table> SET <value assignments> WHERE <key predicate>`.
pub fn update_statement(schema: &SchemaDescriptor) -> Result<String> {
    let pk = primary_key(schema)?;
    let values = value_columns(schema)?;

    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        schema.qualified_name(),
        assignments(&values, ", "),
        assignments(&pk, " AND ")
    );
    logged(StatementKind::Update, schema, sql)
}

/// Generates `DELETE FROM <table> WHERE <key predicate>`.
pub fn delete_statement(schema: &SchemaDescriptor) -> Result<String> {
    let pk = primary_key(schema)?;

    let sql = format!(
        "DELETE FROM {} WHERE {}",
        schema.qualified_name(),
        assignments(&pk, " AND ")
    );
    logged(StatementKind::Delete, schema, sql)
}

/// Generates `SELECT <value cols> FROM <table> WHERE <key predicate>`.
///
/// Key columns are not selected; the caller already holds them.
pub fn select_statement(schema: &SchemaDescriptor) -> Result<String> {
    let pk = primary_key(schema)?;
    let values = value_columns(schema)?;

    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_names(&values),
        schema.qualified_name(),
        assignments(&pk, " AND ")
    );
    logged(StatementKind::Select, schema, sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqliteError;
    use sqlcap_core::ScalarType;

    fn all_types() -> SchemaDescriptor {
        SchemaDescriptor::new("TestAllTypes")
            .with_field(FieldDescriptor::new("boolField", ScalarType::Bool))
            .with_field(FieldDescriptor::new("int8Field", ScalarType::Int8))
            .with_field(FieldDescriptor::new("int32Field", ScalarType::Int32))
            .with_field(FieldDescriptor::new("float32Field", ScalarType::Float32))
            .with_field(FieldDescriptor::new("float64Field", ScalarType::Float64))
            .with_field(FieldDescriptor::new("pkInt", ScalarType::Uint32).primary_key())
            .with_field(FieldDescriptor::new("pkText", ScalarType::Text).primary_key())
    }

    #[test]
    fn test_create_statement_text() {
        assert_eq!(
            create_statement(&all_types()).unwrap(),
            "CREATE TABLE TestAllTypes (boolField UNSIGNED TINYINT, int8Field TINYINT, \
             int32Field INTEGER, float32Field REAL, float64Field REAL, \
             pkInt UNSIGNED INTEGER PRIMARY_KEY, pkText TEXT PRIMARY_KEY) "
        );
    }

    #[test]
    fn test_insert_statement_text() {
        assert_eq!(
            insert_statement(&all_types()).unwrap(),
            "INSERT INTO TestAllTypes (boolField, int8Field, int32Field, float32Field, \
             float64Field, pkInt, pkText)  VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
    }

    #[test]
    fn test_update_statement_text() {
        assert_eq!(
            update_statement(&all_types()).unwrap(),
            "UPDATE TestAllTypes SET boolField = ?1, int8Field = ?2, int32Field = ?3, \
             float32Field = ?4, float64Field = ?5 WHERE pkInt = ?6 AND pkText = ?7"
        );
    }

    #[test]
    fn test_delete_statement_text() {
        assert_eq!(
            delete_statement(&all_types()).unwrap(),
            "DELETE FROM TestAllTypes WHERE pkInt = ?6 AND pkText = ?7"
        );
    }

    #[test]
    fn test_select_statement_text() {
        assert_eq!(
            select_statement(&all_types()).unwrap(),
            "SELECT boolField, int8Field, int32Field, float32Field, float64Field \
             FROM TestAllTypes WHERE pkInt = ?6 AND pkText = ?7"
        );
    }

    #[test]
    fn test_qualified_name_prefix() {
        let schema = all_types().with_namespace("dbo").with_table("Items");
        let create = create_statement(&schema).unwrap();
        assert!(create.starts_with("CREATE TABLE [dbo].Items ("), "{create}");
        assert!(select_statement(&schema).unwrap().contains("FROM [dbo].Items WHERE"));
    }

    #[test]
    fn test_param_index_stable_across_statements() {
        let schema = all_types();
        let stmts = Statements::synthesize(&schema).unwrap();
        for field in schema.pk_fields() {
            let term = format!("{} = ?{}", field.column_name(), field.param_index());
            for kind in [StatementKind::Update, StatementKind::Delete, StatementKind::Select] {
                assert!(stmts.get(kind).contains(&term), "{kind}: {term}");
            }
            assert!(stmts.insert.contains(&format!("?{}", field.param_index())));
        }
    }

    #[test]
    fn test_ignored_fields_leave_gaps_in_markers() {
        let schema = SchemaDescriptor::new("Gaps")
            .with_field(FieldDescriptor::new("id", ScalarType::Int64).primary_key())
            .with_field(FieldDescriptor::new("children", ScalarType::List))
            .with_field(FieldDescriptor::new("secret", ScalarType::Text).ignored())
            .with_field(FieldDescriptor::new("name", ScalarType::Text));
        let stmts = Statements::synthesize(&schema).unwrap();
        assert_eq!(stmts.insert, "INSERT INTO Gaps (id, name)  VALUES(?1, ?4)");
        assert_eq!(stmts.update, "UPDATE Gaps SET name = ?4 WHERE id = ?1");
        for kind in StatementKind::ALL {
            let sql = stmts.get(kind);
            assert!(!sql.contains("children") && !sql.contains("secret"), "{sql}");
        }
    }

    #[test]
    fn test_annotations_used_verbatim() {
        let schema = SchemaDescriptor::new("Anno")
            .with_field(
                FieldDescriptor::new("id", ScalarType::Int64)
                    .with_sql_type("BIGINT")
                    .with_column("item_id")
                    .primary_key(),
            )
            .with_field(
                FieldDescriptor::new("label", ScalarType::Text).with_sql_type("VARCHAR(32)"),
            );
        assert_eq!(
            create_statement(&schema).unwrap(),
            "CREATE TABLE Anno (item_id BIGINT PRIMARY_KEY, label VARCHAR(32)) "
        );
        assert_eq!(
            select_statement(&schema).unwrap(),
            "SELECT label FROM Anno WHERE item_id = ?1"
        );
    }

    #[test]
    fn test_rejects_missing_primary_key() {
        let schema =
            SchemaDescriptor::new("NoKey").with_field(FieldDescriptor::new("a", ScalarType::Int8));
        assert!(create_statement(&schema).is_ok());
        assert!(insert_statement(&schema).is_ok());
        for result in [
            update_statement(&schema),
            delete_statement(&schema),
            select_statement(&schema),
        ] {
            assert!(matches!(result, Err(SqliteError::InvariantViolation(_))));
        }
    }

    #[test]
    fn test_rejects_key_only_schema_for_update_and_select() {
        let schema = SchemaDescriptor::new("KeyOnly")
            .with_field(FieldDescriptor::new("a", ScalarType::Int8).primary_key());
        assert!(delete_statement(&schema).is_ok());
        assert!(update_statement(&schema).is_err());
        assert!(select_statement(&schema).is_err());
    }

    #[test]
    fn test_rejects_empty_and_invalid_schemas() {
        let empty =
            SchemaDescriptor::new("Empty").with_field(FieldDescriptor::new("l", ScalarType::List));
        assert!(matches!(
            create_statement(&empty),
            Err(SqliteError::InvariantViolation(msg)) if msg.contains("no columns")
        ));

        let nested = SchemaDescriptor::new("Nested")
            .with_field(FieldDescriptor::new("inner", ScalarType::Struct));
        assert!(Statements::synthesize(&nested).is_err());
    }
}
