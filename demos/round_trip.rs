//! Record round-trip example.
//!
//! Demonstrates the full adapter lifecycle: declaring a schema from a YAML
//! file, printing its statements, creating the table, and moving a record
//! through insert, select, update and delete.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p sqlcap-demos --example round_trip
//! ```

use rusqlite::Connection;
use sqlcap_core::{DynamicRecord, EnumOrdinal, SchemaFile, Value};
use sqlcap_sqlite::{Adapter, StatementKind, create_table, table_columns};

const BOOK_SCHEMA: &str = r#"
name: Book
table: Books
fields:
  - { name: isbn, type: uint64, primary_key: true }
  - { name: title, type: text }
  - { name: year, type: int16 }
  - { name: rating, type: float32 }
  - { name: format, type: enum, column: book_format }
  - { name: cover, type: data, ignore: true }
  - { name: authors, type: list }
"#;

fn main() {
    // === Step 1: Load the schema ===
    let schema = SchemaFile::from_yaml(BOOK_SCHEMA).unwrap().into_descriptor();
    println!("Schema {} maps to table {}", schema.name(), schema.qualified_name());

    // === Step 2: Create the table ===
    let conn = Connection::open_in_memory().unwrap();
    create_table(&conn, &schema).unwrap();
    for column in table_columns(&conn, &schema).unwrap() {
        println!("  {} {}", column.name, column.declared_type);
    }

    // === Step 3: Prepare the adapter ===
    let mut adapter = Adapter::new(&conn, &schema).unwrap();
    println!("\n=== Statements ===");
    for kind in StatementKind::ALL {
        println!("{kind}: {}", adapter.statements().get(kind));
    }

    // === Step 4: Insert ===
    let mut book = DynamicRecord::new(&schema);
    book.set_named(&schema, "isbn", 9780262510875u64).unwrap();
    book.set_named(&schema, "title", "Structure and Interpretation")
        .unwrap();
    book.set_named(&schema, "year", 1985i16).unwrap();
    book.set_named(&schema, "rating", 4.5f32).unwrap();
    book.set_named(&schema, "format", EnumOrdinal(1)).unwrap();
    adapter.insert(&book).unwrap();

    // === Step 5: Select by key ===
    println!("\n=== Select ===");
    let mut copy = DynamicRecord::new(&schema);
    copy.set_named(&schema, "isbn", 9780262510875u64).unwrap();
    let found = adapter.select(&mut copy).unwrap();
    println!("found: {found}, equal to original: {}", copy == book);

    // === Step 6: Update ===
    book.set_named(&schema, "year", 1996i16).unwrap();
    adapter.update(&book).unwrap();
    adapter.select(&mut copy).unwrap();
    if let Some(Value::Int16(year)) = copy.get_named("year") {
        println!("year after update: {year}");
    }

    // === Step 7: Delete ===
    adapter.delete(&book).unwrap();
    let mut gone = DynamicRecord::new(&schema);
    gone.set_named(&schema, "isbn", 9780262510875u64).unwrap();
    println!("found after delete: {}", adapter.select(&mut gone).unwrap());
}
