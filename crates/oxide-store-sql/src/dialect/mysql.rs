//! MySQL dialect.

use super::{numeric_bool_literal, Dialect, Keywords};
use crate::types::DataType;
use crate::value::SqlValue;

/// MySQL dialect.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect {
    keywords: Keywords,
}

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    fn type_name(&self, data_type: DataType) -> Option<&'static str> {
        match data_type {
            DataType::Char => Some("TINYINT"),
            DataType::Short => Some("SMALLINT"),
            DataType::Int => Some("INTEGER"),
            DataType::Long => Some("BIGINT"),
            DataType::UnsignedChar => Some("TINYINT UNSIGNED"),
            DataType::UnsignedShort => Some("SMALLINT UNSIGNED"),
            DataType::UnsignedInt => Some("INTEGER UNSIGNED"),
            DataType::UnsignedLong => Some("BIGINT UNSIGNED"),
            DataType::Bool => Some("BOOLEAN"),
            DataType::Float => Some("FLOAT"),
            DataType::Double => Some("DOUBLE"),
            DataType::CharPointer | DataType::Varchar => Some("VARCHAR"),
            DataType::Text => Some("TEXT"),
            DataType::Date => Some("DATE"),
            DataType::Time => Some("TIME"),
            DataType::Blob => Some("BLOB"),
            DataType::Unknown => None,
        }
    }

    fn literal(&self, value: &SqlValue) -> String {
        numeric_bool_literal(value)
    }
}
