//! Error types for the command-line tool.

use oxide_store_sql::SqlError;

/// Errors raised while reading a table description or rendering it.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A column description does not follow `name:type[:size][:pk]`.
    #[error("invalid column `{spec}`: {message}")]
    InvalidColumn {
        /// The description as given.
        spec: String,
        /// What is wrong with it.
        message: String,
    },

    /// The table has no columns.
    #[error("table `{0}` needs at least one column")]
    NoColumns(String),

    /// A backend name is not known.
    #[error("unknown backend `{0}`")]
    UnknownBackend(String),

    /// An insert value could not be read as its column's type.
    #[error("value for column `{column}`: {source}")]
    InvalidValue {
        /// Column the value belongs to.
        column: String,
        /// Conversion failure.
        source: SqlError,
    },

    /// Building, rendering or running a statement failed.
    #[error("SQL error: {0}")]
    Sql(#[from] SqlError),

    /// JSON output could not be produced.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for command-line operations.
pub type Result<T> = std::result::Result<T, CliError>;
