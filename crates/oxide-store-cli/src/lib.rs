//! Command-line front end for `oxide-store`.
//!
//! The `oxide-store` binary renders the statements the object store issues
//! for a table, for any of the stock dialects, and can run the table
//! definition against a SQLite database.
//!
//! A table is described on the command line as a name followed by column
//! descriptions of the form `name:type[:size][:pk]`:
//!
//! ```bash
//! # CREATE TABLE for PostgreSQL
//! oxide-store render create person id:long:pk name:varchar:64 born:date --backend postgres
//!
//! # INSERT with bind values as JSON
//! oxide-store render insert person id:long:pk name:varchar:64 --value 1 --value ada --json
//!
//! # Create the table in a SQLite file
//! oxide-store --database sqlite://people.db exec person id:long:pk name:varchar:64
//! ```

pub mod error;
pub mod table;

pub use error::{CliError, Result};
pub use oxide_store_sql::CompileMode;
pub use table::{
    backend_dialect, execute_ddl, parse_column, render, Rendered, StatementKind, TableSpec,
};
