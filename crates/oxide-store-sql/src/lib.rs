//! # oxide-store-sql
//!
//! Backend-agnostic SQL statements for the oxide object store.
//!
//! This crate provides:
//! - A token stream representation of one SQL statement ([`Sql`], [`Token`])
//! - Per-backend dialects mapping keywords and logical types ([`Dialect`])
//! - A compiler and linker pair rendering token streams into SQL text or
//!   prepared statements ([`Renderer`])
//! - A state-checked query builder ([`Query`])
//! - The narrow driver contract backends implement ([`Connection`])
//!
//! ## Rendering
//!
//! ```rust
//! use oxide_store_sql::{Column, DataType, GenericDialect, Query};
//!
//! let mut query = Query::new();
//! query
//!     .create_table("person")?
//!     .column(Column::identifier("id", DataType::Int))?
//!     .column(Column::varchar("name", 255))?;
//!
//! assert_eq!(
//!     query.render(&GenericDialect::new())?,
//!     "CREATE TABLE person (id INTEGER NOT NULL PRIMARY KEY, name VARCHAR(255)) "
//! );
//! # Ok::<(), oxide_store_sql::SqlError>(())
//! ```
//!
//! ## Prepared statements
//!
//! Values become placeholders in prepared mode and are collected in
//! placeholder order, renumbered for dialects with positional placeholders:
//!
//! ```rust
//! use oxide_store_sql::{col, PostgresDialect, Query, SqlValue};
//!
//! let mut query = Query::new();
//! query
//!     .delete("person")?
//!     .where_(col("id").eq(7).or(col("name").eq("ada")))?;
//!
//! let prepared = query.render_prepared(&PostgresDialect::new())?;
//! assert_eq!(prepared.sql, "DELETE FROM person WHERE (id = $1 OR name = $2) ");
//! assert_eq!(
//!     prepared.bindings,
//!     vec![SqlValue::Int(7), SqlValue::Text(String::from("ada"))]
//! );
//! # Ok::<(), oxide_store_sql::SqlError>(())
//! ```

pub mod condition;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod query;
pub mod render;
pub mod schema;
pub mod token;
pub mod types;
pub mod value;

pub use condition::{col, ColumnRef, CompareOp, Condition};
pub use config::{dialect_for, Backend, ConnectionConfig};
pub use connection::{Connection, ExecutedStatement, MemoryConnection, ResultSet, Row, Statement};
pub use dialect::{
    Dialect, GenericDialect, Keywords, LimitStyle, MsSqlDialect, MySqlDialect, PostgresDialect,
    SqliteDialect,
};
pub use error::{Result, SqlError};
pub use query::{Operation, Query, QueryState};
pub use render::{CompileMode, PreparedSql, Renderer};
pub use schema::TableSchema;
pub use token::{Column, Order, Sql, Token, TokenKind};
pub use types::DataType;
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
