//! Driver interface and result handles.
//!
//! Backends implement [`Connection`]; everything above it only sees rendered
//! SQL text, bindings and buffered [`ResultSet`]s.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dialect::{Dialect, GenericDialect};
use crate::error::{Result, SqlError};
use crate::render::PreparedSql;
use crate::value::{FromSqlValue, SqlValue, ToSqlValue};

/// Narrow driver contract every backend implements.
pub trait Connection {
    /// Dialect used to render statements for this connection.
    fn dialect(&self) -> &dyn Dialect;

    /// Executes statement text with inlined values.
    fn execute(&mut self, sql: &str) -> Result<ResultSet>;

    /// Checks that prepared statement text is accepted by the backend.
    fn prepare(&mut self, _sql: &str) -> Result<()> {
        Ok(())
    }

    /// Executes prepared statement text with bindings in placeholder order.
    fn execute_prepared(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ResultSet>;
}

/// One result row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row; `values` are in `columns` order.
    #[must_use]
    pub const fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the value of a column by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == field)
            .and_then(|i| self.values.get(i))
    }

    /// Reads a column into a Rust value.
    ///
    /// Fails with [`SqlError::MalformedResult`] if the column is missing or
    /// its value does not convert.
    pub fn read<T: FromSqlValue>(&self, field: &str) -> Result<T> {
        let value = self
            .get(field)
            .ok_or_else(|| SqlError::malformed(field, "column missing from result"))?;
        T::from_sql_value(value).map_err(|message| SqlError::malformed(field, message))
    }
}

/// Buffered result of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Arc<Vec<String>>,
    rows: VecDeque<Row>,
    affected: usize,
}

impl ResultSet {
    /// Creates a result set from rows of values.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        let columns = Arc::new(columns);
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self {
            columns,
            rows,
            affected: 0,
        }
    }

    /// Creates a row-less result for a write.
    #[must_use]
    pub fn affected(count: usize) -> Self {
        Self {
            affected: count,
            ..Self::default()
        }
    }

    /// Returns the next row, or `None` at the end.
    pub fn step(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows changed by a write.
    #[must_use]
    pub const fn affected_rows(&self) -> usize {
        self.affected
    }

    /// Rows not yet stepped over.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when every row has been stepped over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Iterator for ResultSet {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.step()
    }
}

/// A prepared statement bound to its connection.
pub struct Statement<'c> {
    connection: &'c mut dyn Connection,
    prepared: PreparedSql,
}

impl<'c> Statement<'c> {
    /// Prepares rendered SQL on a connection.
    pub fn new(connection: &'c mut dyn Connection, prepared: PreparedSql) -> Result<Self> {
        connection.prepare(&prepared.sql)?;
        Ok(Self {
            connection,
            prepared,
        })
    }

    /// Statement text with placeholders.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.prepared.sql
    }

    /// Current bindings in placeholder order.
    #[must_use]
    pub fn bindings(&self) -> &[SqlValue] {
        &self.prepared.bindings
    }

    /// Number of placeholders.
    #[must_use]
    pub fn bind_count(&self) -> usize {
        self.prepared.bindings.len()
    }

    /// Number of columns in the statement.
    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.prepared.column_count
    }

    /// Replaces the value at a zero-based placeholder index.
    pub fn bind<T: ToSqlValue>(&mut self, index: usize, value: T) -> Result<&mut Self> {
        let count = self.prepared.bindings.len();
        let slot = self
            .prepared
            .bindings
            .get_mut(index)
            .ok_or(SqlError::BindIndex { index, count })?;
        *slot = value.to_sql_value();
        Ok(self)
    }

    /// Executes with the current bindings.
    pub fn execute(&mut self) -> Result<ResultSet> {
        debug!(
            sql = %self.prepared.sql,
            bindings = self.prepared.bindings.len(),
            "executing prepared statement"
        );
        self.connection
            .execute_prepared(&self.prepared.sql, &self.prepared.bindings)
    }
}

/// A statement sent to a [`MemoryConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// Statement text.
    pub sql: String,
    /// Bindings; empty for direct statements.
    pub bindings: Vec<SqlValue>,
}

/// In-memory driver that records statements and replays scripted results.
pub struct MemoryConnection {
    dialect: Box<dyn Dialect>,
    executed: Vec<ExecutedStatement>,
    results: VecDeque<ResultSet>,
    failure: Option<String>,
}

impl MemoryConnection {
    /// Creates a connection rendering with the given dialect.
    #[must_use]
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self {
            dialect: Box::new(dialect),
            executed: Vec::new(),
            results: VecDeque::new(),
            failure: None,
        }
    }

    /// Creates a connection using the generic dialect.
    #[must_use]
    pub fn generic() -> Self {
        Self::new(GenericDialect::new())
    }

    /// Queues a result returned by the next execution.
    pub fn push_result(&mut self, result: ResultSet) {
        self.results.push_back(result);
    }

    /// Makes the next execution fail with a driver error.
    pub fn fail_next(&mut self, message: &str) {
        self.failure = Some(String::from(message));
    }

    /// Statements executed so far.
    #[must_use]
    pub fn executed(&self) -> &[ExecutedStatement] {
        &self.executed
    }

    /// Statement texts executed so far.
    #[must_use]
    pub fn statements(&self) -> Vec<&str> {
        self.executed.iter().map(|s| s.sql.as_str()).collect()
    }

    /// Drains the executed statements.
    pub fn take_executed(&mut self) -> Vec<ExecutedStatement> {
        std::mem::take(&mut self.executed)
    }

    fn run(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ResultSet> {
        if let Some(message) = self.failure.take() {
            warn!(sql, %message, "scripted driver failure");
            return Err(SqlError::Driver(message));
        }
        self.executed.push(ExecutedStatement {
            sql: String::from(sql),
            bindings: bindings.to_vec(),
        });
        Ok(self.results.pop_front().unwrap_or_default())
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::generic()
    }
}

impl Connection for MemoryConnection {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn execute(&mut self, sql: &str) -> Result<ResultSet> {
        self.run(sql, &[])
    }

    fn execute_prepared(&mut self, sql: &str, bindings: &[SqlValue]) -> Result<ResultSet> {
        self.run(sql, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> ResultSet {
        ResultSet::new(
            vec![String::from("id"), String::from("name")],
            vec![
                vec![SqlValue::Int(1), SqlValue::Text(String::from("ada"))],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
        )
    }

    #[test]
    fn test_step_until_end() {
        let mut result = people();
        assert_eq!(result.len(), 2);
        let first = result.step().unwrap();
        assert_eq!(first.read::<i64>("id").unwrap(), 1);
        assert_eq!(first.read::<String>("name").unwrap(), "ada");
        let second = result.step().unwrap();
        assert_eq!(second.read::<Option<String>>("name").unwrap(), None);
        assert!(result.step().is_none());
    }

    #[test]
    fn test_read_reports_field() {
        let row = people().step().unwrap();
        let err = row.read::<i64>("name").unwrap_err();
        assert!(matches!(err, SqlError::MalformedResult { ref field, .. } if field == "name"));
        assert!(matches!(
            row.read::<i64>("age"),
            Err(SqlError::MalformedResult { .. })
        ));
    }

    #[test]
    fn test_statement_bind_bounds() {
        let mut connection = MemoryConnection::generic();
        let prepared = PreparedSql {
            sql: String::from("DELETE FROM t WHERE id = ? "),
            bindings: vec![SqlValue::Int(1)],
            column_count: 0,
        };
        let mut statement = Statement::new(&mut connection, prepared).unwrap();
        statement.bind(0, 9_i64).unwrap();
        assert!(matches!(
            statement.bind(1, 3_i64),
            Err(SqlError::BindIndex { index: 1, count: 1 })
        ));
        statement.execute().unwrap();
        assert_eq!(connection.executed()[0].bindings, vec![SqlValue::Int(9)]);
    }

    #[test]
    fn test_scripted_failure() {
        let mut connection = MemoryConnection::generic();
        connection.fail_next("disk full");
        assert_eq!(
            connection.execute("SELECT 1 "),
            Err(SqlError::Driver(String::from("disk full")))
        );
        assert!(connection.execute("SELECT 1 ").is_ok());
    }
}
