//! The `rusqlite` connection.

use std::path::{Path, PathBuf};

use oxide_store_sql::{
    Backend, Connection, ConnectionConfig, Dialect, ResultSet, SqlError, SqlValue, SqliteDialect,
};
use rusqlite::types::{Null, ValueRef};
use tracing::{debug, trace};

type Result<T> = oxide_store_sql::Result<T>;

/// A SQLite database implementing [`Connection`].
///
/// Statements are prepared through `rusqlite`'s statement cache, so
/// flushing many objects of one table reuses the same compiled statement.
pub struct SqliteConnection {
    connection: rusqlite::Connection,
    dialect: SqliteDialect,
    path: Option<PathBuf>,
}

impl SqliteConnection {
    /// Opens or creates a database file.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Driver`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = rusqlite::Connection::open(path).map_err(|e| driver_error(&e))?;
        debug!(path = %path.display(), "opened sqlite database");
        Ok(Self {
            connection,
            dialect: SqliteDialect::new(),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::Driver`] if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        let connection = rusqlite::Connection::open_in_memory().map_err(|e| driver_error(&e))?;
        debug!("opened in-memory sqlite database");
        Ok(Self {
            connection,
            dialect: SqliteDialect::new(),
            path: None,
        })
    }

    /// Opens the database a `sqlite://` connection string names.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::InvalidDsn`] for other backends and
    /// [`SqlError::Driver`] if the database cannot be opened.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        if config.backend != Backend::Sqlite {
            return Err(SqlError::InvalidDsn(format!(
                "`{}` is not a sqlite connection string",
                config.backend.scheme()
            )));
        }
        if config.is_memory() {
            Self::open_in_memory()
        } else {
            Self::open(&config.host)
        }
    }

    /// Database file, or `None` for an in-memory database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn run(&self, sql: &str, bindings: &[SqlValue]) -> Result<ResultSet> {
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(|e| driver_error(&e))?;
        for (index, value) in bindings.iter().enumerate() {
            bind(&mut statement, index + 1, value)?;
        }

        if statement.column_count() == 0 {
            let affected = statement.raw_execute().map_err(|e| driver_error(&e))?;
            trace!(sql, affected, "executed sqlite statement");
            return Ok(ResultSet::affected(affected));
        }

        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = Vec::new();
        let mut cursor = statement.raw_query();
        while let Some(row) = cursor.next().map_err(|e| driver_error(&e))? {
            let values = (0..columns.len())
                .map(|index| row.get_ref(index).map(value_of).map_err(|e| driver_error(&e)))
                .collect::<Result<Vec<_>>>()?;
            rows.push(values);
        }
        trace!(sql, rows = rows.len(), "queried sqlite statement");
        Ok(ResultSet::new(columns, rows))
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn execute(&mut self, sql: &str) -> Result<ResultSet> {
        self.run(sql, &[])
    }

    fn prepare(&mut self, sql: &str) -> Result<()> {
        self.connection
            .prepare_cached(sql)
            .map(|_| ())
            .map_err(|e| driver_error(&e))
    }

    fn execute_prepared(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ResultSet> {
        self.run(sql, bindings)
    }
}

impl core::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

fn bind(statement: &mut rusqlite::Statement<'_>, index: usize, value: &SqlValue) -> Result<()> {
    match value {
        SqlValue::Null => statement.raw_bind_parameter(index, Null),
        SqlValue::Bool(b) => statement.raw_bind_parameter(index, b),
        SqlValue::Int(n) => statement.raw_bind_parameter(index, n),
        SqlValue::UInt(n) => {
            let n = i64::try_from(*n).map_err(|_| {
                SqlError::Driver(format!("unsigned value {n} does not fit a sqlite integer"))
            })?;
            statement.raw_bind_parameter(index, n)
        }
        SqlValue::Float(f) => statement.raw_bind_parameter(index, f),
        SqlValue::Text(s) => statement.raw_bind_parameter(index, s.as_str()),
        SqlValue::Date(d) => statement.raw_bind_parameter(index, d.to_string()),
        SqlValue::Time(t) => statement.raw_bind_parameter(index, t.to_string()),
        SqlValue::Blob(b) => statement.raw_bind_parameter(index, b.as_slice()),
    }
    .map_err(|e| driver_error(&e))
}

fn value_of(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Int(n),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

fn driver_error(error: &rusqlite::Error) -> SqlError {
    match error {
        rusqlite::Error::InvalidColumnType(_, name, found) => {
            SqlError::malformed(name.as_str(), format!("unexpected {found} value"))
        }
        rusqlite::Error::FromSqlConversionFailure(index, found, cause) => {
            SqlError::malformed(format!("column {index}"), format!("{found}: {cause}"))
        }
        other => SqlError::Driver(other.to_string()),
    }
}
