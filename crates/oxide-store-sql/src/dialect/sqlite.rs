//! SQLite dialect.

use super::{numeric_bool_literal, Dialect, Keywords};
use crate::types::DataType;
use crate::value::SqlValue;

/// SQLite dialect.
///
/// Types map onto SQLite's storage classes; booleans are stored as integers.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect {
    keywords: Keywords,
}

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    fn type_name(&self, data_type: DataType) -> Option<&'static str> {
        match data_type {
            DataType::Char
            | DataType::Short
            | DataType::Int
            | DataType::Long
            | DataType::UnsignedChar
            | DataType::UnsignedShort
            | DataType::UnsignedInt
            | DataType::UnsignedLong
            | DataType::Bool => Some("INTEGER"),
            DataType::Float | DataType::Double => Some("REAL"),
            DataType::CharPointer | DataType::Varchar => Some("VARCHAR"),
            DataType::Text | DataType::Date | DataType::Time => Some("TEXT"),
            DataType::Blob => Some("BLOB"),
            DataType::Unknown => None,
        }
    }

    fn literal(&self, value: &SqlValue) -> String {
        numeric_bool_literal(value)
    }
}
