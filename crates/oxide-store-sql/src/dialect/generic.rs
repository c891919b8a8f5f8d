//! Generic SQL dialect.

use super::{Dialect, Keywords};
use crate::types::DataType;

/// Generic ANSI SQL dialect with the default keyword table.
#[derive(Debug, Clone, Default)]
pub struct GenericDialect {
    keywords: Keywords,
}

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
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
            DataType::Float | DataType::Double => Some("DOUBLE"),
            DataType::CharPointer | DataType::Varchar => Some("VARCHAR"),
            DataType::Text => Some("TEXT"),
            DataType::Date => Some("DATE"),
            DataType::Time => Some("TIME"),
            DataType::Blob => Some("BLOB"),
            DataType::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.placeholder(3), "?");
        assert_eq!(dialect.type_name(DataType::Long), Some("INTEGER"));
    }
}
