//! Error types for statement building, rendering and execution.

use thiserror::Error;

use crate::query::{Operation, QueryState};
use crate::types::DataType;

/// Errors raised while building, compiling or executing SQL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// A builder call is not allowed in the current query state.
    #[error("cannot call `{operation}` while the query is in state `{state}`")]
    InvalidQueryState {
        /// State the query was in.
        state: QueryState,
        /// Operation that was attempted.
        operation: Operation,
    },

    /// The dialect has no mapping for a logical data type.
    #[error("dialect `{dialect}` has no mapping for data type `{data_type}`")]
    UnknownType {
        /// Dialect name.
        dialect: &'static str,
        /// Type that could not be mapped.
        data_type: DataType,
    },

    /// A result row could not be read into the requested field.
    #[error("malformed result for `{field}`: {message}")]
    MalformedResult {
        /// Column or field being read.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// A bind index was out of range for a prepared statement.
    #[error("bind index {index} out of range for statement with {count} placeholders")]
    BindIndex {
        /// Index that was requested.
        index: usize,
        /// Number of placeholders in the statement.
        count: usize,
    },

    /// An object statement got a different number of values than columns.
    #[error("table `{table}` has {expected} columns but {actual} values were given")]
    ColumnMismatch {
        /// Table name.
        table: String,
        /// Number of columns.
        expected: usize,
        /// Number of values.
        actual: usize,
    },

    /// A connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidDsn(String),

    /// The backend driver reported an error.
    #[error("driver error: {0}")]
    Driver(String),
}

impl SqlError {
    /// Shorthand for a [`SqlError::MalformedResult`].
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResult {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for SQL operations.
pub type Result<T> = std::result::Result<T, SqlError>;
