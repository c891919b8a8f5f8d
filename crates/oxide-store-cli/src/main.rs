//! oxide-store CLI
//!
//! Renders the statements `oxide-store` issues for a table and creates or
//! drops tables in a SQLite database.

use clap::{Args, Parser, Subcommand};
use oxide_store_sql::{CompileMode, ConnectionConfig};
use oxide_store_sqlite::SqliteConnection;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_store_cli::{backend_dialect, execute_ddl, render, StatementKind, TableSpec};

/// Object store SQL tooling.
#[derive(Parser)]
#[command(name = "oxide-store")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string, `<backend>://...`.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite://db.sqlite3")]
    database: String,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TableArgs {
    /// Table name.
    table: String,

    /// Columns as `name:type[:size][:pk]`.
    #[arg(required = true)]
    columns: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a statement for a table.
    Render {
        /// Statement to render.
        #[arg(value_enum)]
        statement: StatementKind,

        #[command(flatten)]
        table: TableArgs,

        /// Backend whose dialect renders the statement (`generic` for ANSI).
        #[arg(short, long, default_value = "generic")]
        backend: String,

        /// Insert value, once per column in column order.
        #[arg(long = "value")]
        values: Vec<String>,

        /// Print the statement with placeholders and its bind values as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create a table in the SQLite database.
    Exec {
        #[command(flatten)]
        table: TableArgs,

        /// Drop the table instead of creating it.
        #[arg(long)]
        drop: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render {
            statement,
            table,
            backend,
            values,
            json,
        } => {
            let spec = TableSpec::parse(&table.table, &table.columns)?;
            let dialect = backend_dialect(&backend)?;
            if !values.is_empty() && statement != StatementKind::Insert {
                warn!("--value is only used by `insert`; ignoring {} value(s)", values.len());
            }

            let mode = if json {
                CompileMode::Prepared
            } else {
                CompileMode::Direct
            };
            let rendered = render(statement, &spec, &values, dialect.as_ref(), mode)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                println!("{}", rendered.sql);
            }
        }

        Commands::Exec { table, drop } => {
            let spec = TableSpec::parse(&table.table, &table.columns)?;
            let config = ConnectionConfig::parse(&cli.database)?;
            let mut connection = SqliteConnection::from_config(&config)?;

            execute_ddl(&spec, drop, &mut connection)?;

            let action = if drop { "Dropped" } else { "Created" };
            info!("{action} table `{}` in {}", spec.schema.name, config.host);
        }
    }

    Ok(())
}
