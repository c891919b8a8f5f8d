//! # oxide-store-sqlite
//!
//! SQLite driver for `oxide-store-sql`, built on `rusqlite`.
//!
//! # How SQLite differs from other backends
//!
//! - **[Type affinity]**: any column can store any value regardless of its
//!   declared type. [`SqliteDialect`] maps the logical types onto the
//!   `INTEGER`, `REAL`, `TEXT` and `BLOB` storage classes; booleans are
//!   stored as integers and dates and times as ISO-8601 text.
//! - **Placeholders**: SQLite accepts `?` placeholders, numbered in order
//!   of appearance, so prepared statements need no renumbering.
//! - **Unsigned integers**: values above `i64::MAX` cannot be stored as
//!   integers and are refused at bind time.
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//!
//! ## Example
//!
//! ```rust
//! use oxide_store_sql::{col, Column, DataType, Query, SqlValue};
//! use oxide_store_sqlite::SqliteConnection;
//!
//! let mut connection = SqliteConnection::open_in_memory()?;
//!
//! Query::new()
//!     .create_table("person")?
//!     .column(Column::identifier("id", DataType::Long))?
//!     .column(Column::varchar("name", 64))?
//!     .execute(&mut connection)?;
//!
//! Query::new()
//!     .insert_into("person")?
//!     .values([SqlValue::Int(1), SqlValue::Text(String::from("ada"))])?
//!     .prepare(&mut connection)?
//!     .execute()?;
//!
//! let rows: Vec<_> = Query::new()
//!     .select()?
//!     .column("name")?
//!     .from("person")?
//!     .where_(col("id").eq(1))?
//!     .execute(&mut connection)?
//!     .collect();
//! assert_eq!(rows[0].read::<String>("name")?, "ada");
//! # Ok::<(), oxide_store_sql::SqlError>(())
//! ```

mod driver;

pub use driver::SqliteConnection;
pub use oxide_store_sql::SqliteDialect;
