//! SQL dialect support.
//!
//! A dialect supplies the keyword table, the logical-to-SQL type mapping and
//! a handful of rendering hooks (placeholders, literals, limit placement).
//! Everything else is shared by the compiler and linker.

mod generic;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;

use std::collections::HashMap;

pub use generic::GenericDialect;
pub use mssql::MsSqlDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::{Result, SqlError};
use crate::token::{Column, TokenKind};
use crate::types::DataType;
use crate::value::SqlValue;

/// Where a row limit is placed in a `SELECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `... LIMIT n` at the end of the statement.
    Trailing,
    /// `SELECT TOP n ...` right after the select keyword.
    Top,
}

/// Keyword text per token kind.
///
/// Starts out with the default keywords; a dialect replaces individual
/// entries with [`Keywords::replace`].
#[derive(Debug, Clone, Default)]
pub struct Keywords {
    overrides: HashMap<TokenKind, String>,
}

impl Keywords {
    /// Creates the default keyword table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keyword for a token kind.
    #[must_use]
    pub fn get(&self, kind: TokenKind) -> &str {
        self.overrides
            .get(&kind)
            .map_or_else(|| kind.default_text(), String::as_str)
    }

    /// Replaces the keyword for a token kind.
    pub fn replace(&mut self, kind: TokenKind, text: impl Into<String>) {
        self.overrides.insert(kind, text.into());
    }

    /// Builder form of [`Keywords::replace`].
    #[must_use]
    pub fn with(mut self, kind: TokenKind, text: impl Into<String>) -> Self {
        self.replace(kind, text);
        self
    }
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the keyword table.
    fn keywords(&self) -> &Keywords;

    /// Returns the keyword for a token kind.
    fn keyword(&self, kind: TokenKind) -> &str {
        self.keywords().get(kind)
    }

    /// Maps a logical type to this dialect's type name, if supported.
    fn type_name(&self, data_type: DataType) -> Option<&'static str>;

    /// Maps a logical type, failing with [`SqlError::UnknownType`].
    fn map_type(&self, data_type: DataType) -> Result<&'static str> {
        self.type_name(data_type).ok_or(SqlError::UnknownType {
            dialect: self.name(),
            data_type,
        })
    }

    /// Returns the placeholder text for the 1-based bind position.
    fn placeholder(&self, _position: usize) -> String {
        String::from("?")
    }

    /// Returns where a row limit is placed.
    fn limit_style(&self) -> LimitStyle {
        LimitStyle::Trailing
    }

    /// Renders a value inline.
    fn literal(&self, value: &SqlValue) -> String {
        value.to_sql_inline()
    }

    /// Renders a column reference or definition.
    ///
    /// Untyped columns render as their bare name; typed ones as
    /// `name TYPE[(size)]`, with the identifier column marked
    /// `NOT NULL PRIMARY KEY`.
    fn column_definition(&self, column: &Column) -> Result<String> {
        let Some(data_type) = column.data_type else {
            return Ok(column.name.clone());
        };
        let mut sql = format!("{} {}", column.name, self.map_type(data_type)?);
        if let Some(size) = column.size {
            sql.push_str(&format!("({size})"));
        }
        if column.identifier {
            sql.push(' ');
            sql.push_str(self.keyword(TokenKind::NotNull));
            sql.push(' ');
            sql.push_str(self.keyword(TokenKind::PrimaryKey));
        }
        Ok(sql)
    }
}

/// Renders booleans as `1`/`0` for dialects without a boolean literal.
pub(crate) fn numeric_bool_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
        other => other.to_sql_inline(),
    }
}
