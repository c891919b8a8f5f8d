//! PostgreSQL dialect.

use super::{Dialect, Keywords};
use crate::types::DataType;
use crate::value::SqlValue;

/// PostgreSQL dialect with numbered `$n` placeholders.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect {
    keywords: Keywords,
}

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    fn type_name(&self, data_type: DataType) -> Option<&'static str> {
        match data_type {
            DataType::Char | DataType::Short | DataType::UnsignedChar => Some("SMALLINT"),
            DataType::Int | DataType::UnsignedShort => Some("INTEGER"),
            DataType::Long | DataType::UnsignedInt => Some("BIGINT"),
            DataType::UnsignedLong => Some("NUMERIC(20)"),
            DataType::Bool => Some("BOOLEAN"),
            DataType::Float => Some("REAL"),
            DataType::Double => Some("DOUBLE PRECISION"),
            DataType::CharPointer | DataType::Varchar => Some("VARCHAR"),
            DataType::Text => Some("TEXT"),
            DataType::Date => Some("DATE"),
            DataType::Time => Some("TIME"),
            DataType::Blob => Some("BYTEA"),
            DataType::Unknown => None,
        }
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Blob(bytes) => format!("'\\x{}'", crate::value::hex(bytes)),
            other => other.to_sql_inline(),
        }
    }
}
