//! Custom handler example.
//!
//! Demonstrates overriding the built-in codec: a type handler that stores
//! every boolean as 'Y' / 'N', and a field handler that stores one text
//! field in lower case.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p sqlcap-demos --example custom_handler
//! ```

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, Statement};
use sqlcap_core::{DynamicRecord, FieldDescriptor, ScalarType, SchemaDescriptor};
use sqlcap_sqlite::{Adapter, Handler, Result, SqliteError, create_table};

struct YesNo;

impl Handler for YesNo {
    type Value = bool;

    fn encode(&self, value: &bool, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
        stmt.raw_bind_parameter(param, if *value { "Y" } else { "N" })?;
        Ok(())
    }

    fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<bool>> {
        match row.get_ref(col)? {
            ValueRef::Null => Ok(None),
            ValueRef::Text(t) => Ok(Some(t == b"Y")),
            _ => Err(SqliteError::TypeMismatch {
                column: col.to_string(),
                expected: "TEXT",
                found: "other".into(),
            }),
        }
    }
}

struct Lowercase;

impl Handler for Lowercase {
    type Value = String;

    fn encode(&self, value: &String, stmt: &mut Statement<'_>, param: usize) -> Result<()> {
        stmt.raw_bind_parameter(param, value.to_lowercase())?;
        Ok(())
    }

    fn decode(&self, row: &Row<'_>, col: usize) -> Result<Option<String>> {
        Ok(row.get(col)?)
    }
}

fn main() {
    let schema = SchemaDescriptor::new("Account")
        .with_field(FieldDescriptor::new("id", ScalarType::Int64).primary_key())
        .with_field(FieldDescriptor::new("email", ScalarType::Text))
        .with_field(FieldDescriptor::new("verified", ScalarType::Bool).with_sql_type("CHAR(1)"))
        .with_field(FieldDescriptor::new("admin", ScalarType::Bool).with_sql_type("CHAR(1)"));

    let yes_no = YesNo;
    let lowercase = Lowercase;
    let conn = Connection::open_in_memory().unwrap();
    create_table(&conn, &schema).unwrap();

    let mut adapter = Adapter::new(&conn, &schema).unwrap();
    adapter.add_type_handler(&yes_no).unwrap();
    adapter
        .add_field_handler(schema.field_named("email").unwrap(), &lowercase)
        .unwrap();

    let mut account = DynamicRecord::new(&schema);
    account.set_named(&schema, "id", 1i64).unwrap();
    account
        .set_named(&schema, "email", "Someone@Example.COM")
        .unwrap();
    account.set_named(&schema, "verified", true).unwrap();
    account.set_named(&schema, "admin", false).unwrap();
    adapter.insert(&account).unwrap();

    let (email, verified, admin): (String, String, String) = conn
        .query_row("SELECT email, verified, admin FROM Account", [], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .unwrap();
    println!("stored: email={email} verified={verified} admin={admin}");

    let mut copy = DynamicRecord::new(&schema);
    copy.set_named(&schema, "id", 1i64).unwrap();
    adapter.select(&mut copy).unwrap();
    println!("read back: {copy:?}");
}
