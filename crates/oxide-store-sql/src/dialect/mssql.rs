//! Microsoft SQL Server dialect.

use super::{numeric_bool_literal, Dialect, Keywords, LimitStyle};
use crate::token::TokenKind;
use crate::types::DataType;
use crate::value::SqlValue;

/// Microsoft SQL Server dialect.
///
/// Limits render as `SELECT TOP n`; the linker moves the limit fragment
/// right after the select keyword.
#[derive(Debug, Clone)]
pub struct MsSqlDialect {
    keywords: Keywords,
}

impl MsSqlDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keywords: Keywords::new().with(TokenKind::Limit, "TOP"),
        }
    }
}

impl Default for MsSqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MsSqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    fn type_name(&self, data_type: DataType) -> Option<&'static str> {
        match data_type {
            DataType::Char | DataType::Short => Some("SMALLINT"),
            DataType::Int => Some("INT"),
            DataType::Long => Some("BIGINT"),
            DataType::UnsignedChar => Some("TINYINT"),
            DataType::UnsignedShort => Some("INT"),
            DataType::UnsignedInt => Some("BIGINT"),
            DataType::UnsignedLong => Some("NUMERIC(20, 0)"),
            DataType::Bool => Some("BIT"),
            DataType::Float => Some("REAL"),
            DataType::Double => Some("FLOAT"),
            DataType::CharPointer | DataType::Varchar => Some("NVARCHAR"),
            DataType::Text => Some("NVARCHAR(MAX)"),
            DataType::Date => Some("DATE"),
            DataType::Time => Some("TIME"),
            DataType::Blob => Some("VARBINARY(MAX)"),
            DataType::Unknown => None,
        }
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Top
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Blob(bytes) => format!("0x{}", crate::value::hex(bytes)),
            other => numeric_bool_literal(other),
        }
    }
}
