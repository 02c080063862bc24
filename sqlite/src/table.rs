//! Table lifecycle helpers.
//!
//! Creating the table is kept out of [`Adapter`](crate::Adapter): run
//! [`create_table`] once, then construct adapters against the existing table.
//! There is deliberately no drop or alter counterpart.

use rusqlite::Connection;
use sqlcap_core::SchemaDescriptor;
use tracing::info;

use crate::error::Result;
use crate::statement::create_statement;

/// A column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type text, exactly as written in the CREATE statement.
    pub declared_type: String,
}

/// Executes the schema's CREATE statement.
///
/// # Errors
///
/// Returns [`SqliteError::StoreFailed`](crate::SqliteError::StoreFailed) if
/// the table already exists or SQLite rejects the statement.
pub fn create_table(conn: &Connection, schema: &SchemaDescriptor) -> Result<()> {
    let sql = create_statement(schema)?;
    conn.execute_batch(&sql)?;
    info!(table = %schema.qualified_name(), "created table");
    Ok(())
}

/// `<namespace>.` prefix for catalog queries, empty without a namespace.
fn catalog_prefix(schema: &SchemaDescriptor) -> String {
    schema
        .schema_name()
        .map(|ns| format!("[{ns}]."))
        .unwrap_or_default()
}

/// Checks whether the schema's table exists.
pub fn table_exists(conn: &Connection, schema: &SchemaDescriptor) -> Result<bool> {
    let mut stmt = conn.prepare(&format!(
        "SELECT COUNT(*) FROM {}sqlite_master WHERE type='table' AND name=?1",
        catalog_prefix(schema)
    ))?;
    let count: i64 = stmt.query_row([schema.table_name()], |row| row.get(0))?;
    Ok(count > 0)
}

/// Lists the table's columns in definition order. Empty if the table does
/// not exist.
pub fn table_columns(conn: &Connection, schema: &SchemaDescriptor) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!(
        "PRAGMA {}table_info(\"{}\")",
        catalog_prefix(schema),
        schema.table_name().replace('"', "\"\"")
    ))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                declared_type: row.get("type")?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqliteError;
    use sqlcap_core::{FieldDescriptor, ScalarType};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::new("Note")
            .with_field(FieldDescriptor::new("id", ScalarType::Uint32).primary_key())
            .with_field(FieldDescriptor::new("body", ScalarType::Text).with_column("text_body"))
            .with_field(FieldDescriptor::new("links", ScalarType::List))
    }

    #[test]
    fn test_create_and_inspect() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = schema();
        assert!(!table_exists(&conn, &schema).unwrap());
        assert!(table_columns(&conn, &schema).unwrap().is_empty());

        create_table(&conn, &schema).unwrap();
        assert!(table_exists(&conn, &schema).unwrap());
        assert_eq!(
            table_columns(&conn, &schema).unwrap(),
            vec![
                ColumnInfo {
                    name: "id".into(),
                    declared_type: "UNSIGNED INTEGER PRIMARY_KEY".into()
                },
                ColumnInfo {
                    name: "text_body".into(),
                    declared_type: "TEXT".into()
                },
            ]
        );
    }

    #[test]
    fn test_create_twice_fails() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = schema();
        create_table(&conn, &schema).unwrap();
        assert!(matches!(
            create_table(&conn, &schema),
            Err(SqliteError::StoreFailed(_))
        ));
    }

    #[test]
    fn test_namespaced_table_in_attached_database() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("ATTACH DATABASE ':memory:' AS dbo")
            .unwrap();
        let main = schema();
        let namespaced = schema().with_namespace("dbo").with_table("Notes");

        create_table(&conn, &namespaced).unwrap();
        assert!(table_exists(&conn, &namespaced).unwrap());
        assert!(!table_exists(&conn, &main).unwrap());
        assert_eq!(table_columns(&conn, &namespaced).unwrap().len(), 2);
    }
}
