use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use rusqlite::Connection;
use sqlcap_core::{SchemaDescriptor, SchemaFile, load_schema, validate_schema};
use sqlcap_sqlite::{
    StatementKind, create_statement, create_table, delete_statement, insert_statement,
    select_statement, table_columns, table_exists, update_statement,
};
use tracing::Level;

/// CLI-specific statement kind with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliStatementKind {
    Create,
    Insert,
    Update,
    Delete,
    Select,
}

impl From<CliStatementKind> for StatementKind {
    fn from(kind: CliStatementKind) -> Self {
        match kind {
            CliStatementKind::Create => Self::Create,
            CliStatementKind::Insert => Self::Insert,
            CliStatementKind::Update => Self::Update,
            CliStatementKind::Delete => Self::Delete,
            CliStatementKind::Select => Self::Select,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sqlcap")]
#[command(about = "Map annotated schemas onto SQLite tables")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the SQL statements synthesized for a schema file.
    Statements(StatementsArgs),
    /// Validate one or more schema files.
    Validate(ValidateArgs),
    /// Create a schema's table in a database.
    Create(CreateArgs),
    /// Show a schema's table as the database sees it.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct StatementsArgs {
    /// Schema file (.json, .yaml or .yml).
    file: PathBuf,
    /// Print only this statement.
    #[arg(long)]
    kind: Option<CliStatementKind>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema files to validate.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct DatabaseArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Attach another database file under a namespace (NAME=PATH).
    #[arg(long, value_parser = parse_attachment)]
    attach: Vec<(String, PathBuf)>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Schema file (.json, .yaml or .yml).
    file: PathBuf,
    #[command(flatten)]
    database: DatabaseArgs,
    /// Succeed without changes if the table already exists.
    #[arg(long)]
    if_missing: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Schema file (.json, .yaml or .yml).
    file: PathBuf,
    #[command(flatten)]
    database: DatabaseArgs,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Command::Statements(args) => run_statements(args),
        Command::Validate(args) => run_validate(args),
        Command::Create(args) => run_create(args),
        Command::Inspect(args) => run_inspect(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_statements(args: StatementsArgs) -> Result<(), String> {
    let schema = load(&args.file)?;

    if let Some(kind) = args.kind {
        let sql = synthesize(kind.into(), &schema).map_err(|e| e.to_string())?;
        println!("{sql}");
        return Ok(());
    }

    for kind in StatementKind::ALL {
        match synthesize(kind, &schema) {
            Ok(sql) => println!("-- {kind}\n{sql}"),
            Err(err) => println!("-- {kind} (unavailable: {err})"),
        }
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failed = 0;
    for path in &args.inputs {
        let schema = match SchemaFile::load(path) {
            Ok(file) => file.into_descriptor(),
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                failed += 1;
                continue;
            }
        };
        let problems = validate_schema(&schema);
        if problems.is_empty() {
            continue;
        }
        failed += 1;
        for problem in problems {
            eprintln!("{}: {problem}", path.display());
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} of {} schema file(s) failed validation",
            args.inputs.len()
        ));
    }
    println!("Validated {} schema file(s).", args.inputs.len());
    Ok(())
}

fn run_create(args: CreateArgs) -> Result<(), String> {
    let schema = load(&args.file)?;
    let conn = open_database(&args.database)?;
    let table = schema.qualified_name();

    if args.if_missing && table_exists(&conn, &schema).map_err(|e| e.to_string())? {
        println!("Table {table} already exists.");
        return Ok(());
    }
    create_table(&conn, &schema)
        .map_err(|e| format!("Failed to create table {table}: {e}"))?;
    println!("Created table {table}.");
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let schema = load(&args.file)?;
    let conn = open_database(&args.database)?;
    let table = schema.qualified_name();

    if !table_exists(&conn, &schema).map_err(|e| e.to_string())? {
        return Err(format!(
            "Table {table} does not exist in '{}'",
            args.database.db.display()
        ));
    }
    let columns = table_columns(&conn, &schema).map_err(|e| e.to_string())?;

    println!("Table {table}:");
    for column in &columns {
        let marker = if schema.field_by_name(&column.name).is_some() {
            ' '
        } else {
            '+'
        };
        println!("{marker} {:<24} {}", column.name, column.declared_type);
    }
    for field in schema.fields() {
        if !columns.iter().any(|c| c.name == field.column_name()) {
            println!("- {:<24} (missing)", field.column_name());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load(path: &Path) -> Result<SchemaDescriptor, String> {
    load_schema(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn synthesize(kind: StatementKind, schema: &SchemaDescriptor) -> sqlcap_sqlite::Result<String> {
    match kind {
        StatementKind::Create => create_statement(schema),
        StatementKind::Insert => insert_statement(schema),
        StatementKind::Update => update_statement(schema),
        StatementKind::Delete => delete_statement(schema),
        StatementKind::Select => select_statement(schema),
    }
}

fn open_database(args: &DatabaseArgs) -> Result<Connection, String> {
    let conn = Connection::open(&args.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", args.db.display()))?;
    for (name, path) in &args.attach {
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS \"{}\"", name.replace('"', "\"\"")),
            [path.to_string_lossy()],
        )
        .map_err(|e| format!("Failed to attach '{}' as {name}: {e}", path.display()))?;
    }
    Ok(conn)
}

/// Parses a `NAME=PATH` attachment.
fn parse_attachment(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{raw}'")),
    }
}
