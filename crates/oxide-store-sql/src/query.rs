//! State-checked query builder.
//!
//! A [`Query`] wraps one token stream under construction. Every builder call
//! is validated against the transition table in [`transition`] before it
//! touches the stream, so a rejected call leaves the query exactly as it was.
//!
//! ```rust
//! use oxide_store_sql::{col, MemoryConnection, Query};
//!
//! let mut connection = MemoryConnection::generic();
//! let mut query = Query::new();
//! query
//!     .select()?
//!     .column("id")?
//!     .column("name")?
//!     .from("person")?
//!     .where_(col("age").gt(18))?;
//! query.execute(&mut connection)?;
//!
//! assert_eq!(
//!     connection.statements(),
//!     vec!["SELECT id, name FROM person WHERE age > 18 "]
//! );
//! # Ok::<(), oxide_store_sql::SqlError>(())
//! ```

use core::fmt;

use tracing::{debug, trace};

use crate::condition::Condition;
use crate::connection::{Connection, ResultSet, Statement};
use crate::dialect::Dialect;
use crate::error::{Result, SqlError};
use crate::render::{PreparedSql, Renderer};
use crate::schema::TableSchema;
use crate::token::{Column, Order, Sql, Token};
use crate::types::DataType;
use crate::value::SqlValue;

/// Builder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryState {
    #[default]
    Begin,
    Create,
    Drop,
    ObjectSelect,
    ObjectInsert,
    ObjectUpdate,
    Select,
    Distinct,
    Insert,
    Update,
    Delete,
    Column,
    Values,
    Set,
    From,
    Where,
    CondWhere,
    And,
    Or,
    OrderBy,
    GroupBy,
    Limit,
    Executed,
    Prepared,
    Bound,
}

impl QueryState {
    /// Returns `true` for states that end a statement.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::Bound)
    }

    const fn is_filter(self) -> bool {
        matches!(self, Self::Where | Self::CondWhere | Self::And | Self::Or)
    }

    const fn is_select(self) -> bool {
        matches!(self, Self::Select | Self::ObjectSelect)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Builder operation, as reported in [`SqlError::InvalidQueryState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Drop,
    Select,
    SelectObject,
    Insert,
    InsertObject,
    Update,
    UpdateObject,
    Delete,
    Column,
    Distinct,
    Values,
    Set,
    From,
    Where,
    CondWhere,
    And,
    Or,
    OrderBy,
    GroupBy,
    Limit,
    Execute,
    Prepare,
    Bind,
}

impl Operation {
    /// Name of the builder method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Drop => "drop",
            Self::Select => "select",
            Self::SelectObject => "select_object",
            Self::Insert => "insert_into",
            Self::InsertObject => "insert_object",
            Self::Update => "update",
            Self::UpdateObject => "update_object",
            Self::Delete => "delete",
            Self::Column => "column",
            Self::Distinct => "distinct",
            Self::Values => "values",
            Self::Set => "set",
            Self::From => "from",
            Self::Where => "where_raw",
            Self::CondWhere => "where",
            Self::And => "and",
            Self::Or => "or",
            Self::OrderBy => "order_by",
            Self::GroupBy => "group_by",
            Self::Limit => "limit",
            Self::Execute => "execute",
            Self::Prepare => "prepare",
            Self::Bind => "bind",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The transition table.
///
/// `leading` is the state the statement was opened with (the first state
/// after `Begin`); some calls depend on it, e.g. `from` only follows the
/// column list of a `SELECT`.
#[must_use]
pub fn transition(
    operation: Operation,
    state: QueryState,
    leading: QueryState,
) -> Option<QueryState> {
    use QueryState as S;

    let opening = |next: QueryState| (state == S::Begin).then_some(next);
    match operation {
        Operation::Create => opening(S::Create),
        Operation::Drop => opening(S::Drop),
        Operation::Select => opening(S::Select),
        Operation::SelectObject => opening(S::ObjectSelect),
        Operation::Insert => opening(S::Insert),
        Operation::InsertObject => opening(S::ObjectInsert),
        Operation::Update => opening(S::Update),
        Operation::UpdateObject => opening(S::ObjectUpdate),
        Operation::Delete => opening(S::Delete),
        Operation::Column => {
            matches!(state, S::Create | S::Select | S::Distinct | S::Insert | S::Column)
                .then_some(S::Column)
        }
        Operation::Distinct => (state == S::Select).then_some(S::Distinct),
        Operation::Values => (state == S::Insert || (state == S::Column && leading == S::Insert))
            .then_some(S::Values),
        Operation::Set => matches!(state, S::Update | S::Set | S::ObjectUpdate).then_some(S::Set),
        Operation::From => (state == S::Column && leading == S::Select).then_some(S::From),
        Operation::Where | Operation::CondWhere => {
            let next = if operation == Operation::Where {
                S::Where
            } else {
                S::CondWhere
            };
            matches!(state, S::From | S::ObjectSelect | S::Set | S::ObjectUpdate | S::Delete)
                .then_some(next)
        }
        Operation::And => state.is_filter().then_some(S::And),
        Operation::Or => state.is_filter().then_some(S::Or),
        Operation::OrderBy => (leading.is_select()
            && (matches!(state, S::From | S::ObjectSelect) || state.is_filter()))
        .then_some(S::OrderBy),
        Operation::GroupBy => (leading.is_select()
            && (matches!(state, S::From | S::ObjectSelect | S::OrderBy) || state.is_filter()))
        .then_some(S::GroupBy),
        Operation::Limit => (leading.is_select()
            && (matches!(state, S::From | S::ObjectSelect | S::OrderBy | S::GroupBy)
                || state.is_filter()))
        .then_some(S::Limit),
        Operation::Execute => is_complete(state, leading).then_some(S::Executed),
        Operation::Prepare => is_complete(state, leading).then_some(S::Prepared),
        Operation::Bind => (state == S::Prepared).then_some(S::Bound),
    }
}

/// Whether the statement can be rendered and sent as it stands.
const fn is_complete(state: QueryState, leading: QueryState) -> bool {
    use QueryState as S;

    match leading {
        S::Create => matches!(state, S::Column),
        S::Drop => matches!(state, S::Drop),
        S::Select => {
            matches!(state, S::From | S::OrderBy | S::GroupBy | S::Limit) || state.is_filter()
        }
        S::ObjectSelect => {
            matches!(state, S::ObjectSelect | S::OrderBy | S::GroupBy | S::Limit)
                || state.is_filter()
        }
        S::Insert => matches!(state, S::Values),
        S::ObjectInsert => matches!(state, S::ObjectInsert),
        S::Update => matches!(state, S::Set) || state.is_filter(),
        S::ObjectUpdate => matches!(state, S::ObjectUpdate | S::Set) || state.is_filter(),
        S::Delete => matches!(state, S::Delete) || state.is_filter(),
        _ => false,
    }
}

/// A state-checked builder for one statement.
#[derive(Debug, Clone, Default)]
pub struct Query {
    sql: Sql,
    state: QueryState,
    leading: QueryState,
}

impl Query {
    /// Creates a query in `Begin` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> QueryState {
        self.state
    }

    /// Token stream built so far.
    #[must_use]
    pub const fn sql(&self) -> &Sql {
        &self.sql
    }

    fn check(&self, operation: Operation) -> Result<QueryState> {
        transition(operation, self.state, self.leading).ok_or(SqlError::InvalidQueryState {
            state: self.state,
            operation,
        })
    }

    fn enter(&mut self, next: QueryState) {
        if self.state == QueryState::Begin {
            self.leading = next;
        }
        trace!(from = %self.state, to = %next, "query transition");
        self.state = next;
    }

    fn commit(&mut self, next: QueryState, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.enter(next);
        self.sql.extend(tokens);
        self
    }

    /// Starts `CREATE TABLE` with all columns of a schema.
    pub fn create(&mut self, schema: &TableSchema) -> Result<&mut Self> {
        let next = self.check(Operation::Create)?;
        let tokens = std::iter::once(Token::Create {
            table: schema.name.clone(),
        })
        .chain(schema.columns.iter().cloned().map(Token::Column));
        self.commit(next, tokens);
        if !schema.columns.is_empty() {
            self.state = QueryState::Column;
        }
        Ok(self)
    }

    /// Starts `CREATE TABLE` without columns.
    pub fn create_table(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Create)?;
        Ok(self.commit(
            next,
            [Token::Create {
                table: String::from(table),
            }],
        ))
    }

    /// Builds `DROP TABLE`.
    pub fn drop(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Drop)?;
        Ok(self.commit(
            next,
            [Token::Drop {
                table: String::from(table),
            }],
        ))
    }

    /// Starts a `SELECT`.
    pub fn select(&mut self) -> Result<&mut Self> {
        let next = self.check(Operation::Select)?;
        Ok(self.commit(next, [Token::Select]))
    }

    /// Builds `SELECT <all columns> FROM <table>` for a schema.
    pub fn select_object(&mut self, schema: &TableSchema) -> Result<&mut Self> {
        let next = self.check(Operation::SelectObject)?;
        let columns = schema
            .columns
            .iter()
            .map(|c| Token::Column(Column::new(&c.name)));
        let tokens = std::iter::once(Token::Select).chain(columns).chain([Token::From {
            table: schema.name.clone(),
        }]);
        Ok(self.commit(next, tokens))
    }

    /// Starts `INSERT INTO`.
    pub fn insert_into(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Insert)?;
        Ok(self.commit(
            next,
            [Token::Insert {
                table: String::from(table),
            }],
        ))
    }

    /// Builds `INSERT INTO <table> (<columns>) VALUES (<values>)` for a schema.
    ///
    /// `values` are given in schema column order.
    pub fn insert_object(
        &mut self,
        schema: &TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<&mut Self> {
        let next = self.check(Operation::InsertObject)?;
        check_arity(schema, schema.columns.len(), values.len())?;
        let columns = schema
            .columns
            .iter()
            .map(|c| Token::Column(Column::new(&c.name)));
        let tokens = std::iter::once(Token::Insert {
            table: schema.name.clone(),
        })
        .chain(columns)
        .chain([Token::Values])
        .chain(values.into_iter().map(Token::Value));
        Ok(self.commit(next, tokens))
    }

    /// Starts `UPDATE`.
    pub fn update(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Update)?;
        Ok(self.commit(
            next,
            [Token::Update {
                table: String::from(table),
            }],
        ))
    }

    /// Builds `UPDATE <table> SET ...` for every non-identifier column.
    ///
    /// `values` are given in schema column order, identifier included.
    pub fn update_object(
        &mut self,
        schema: &TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<&mut Self> {
        let next = self.check(Operation::UpdateObject)?;
        check_arity(schema, schema.columns.len(), values.len())?;
        let sets = schema
            .columns
            .iter()
            .zip(values)
            .filter(|(column, _)| !column.identifier)
            .map(|(column, value)| Token::Set {
                column: column.name.clone(),
                data_type: column.data_type.unwrap_or(DataType::Unknown),
                value,
            });
        let tokens = std::iter::once(Token::Update {
            table: schema.name.clone(),
        })
        .chain(sets);
        Ok(self.commit(next, tokens))
    }

    /// Starts `DELETE FROM`.
    pub fn delete(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Delete)?;
        Ok(self.commit(
            next,
            [Token::Delete {
                table: String::from(table),
            }],
        ))
    }

    /// Appends a column name or definition.
    pub fn column(&mut self, column: impl Into<Column>) -> Result<&mut Self> {
        let next = self.check(Operation::Column)?;
        Ok(self.commit(next, [Token::Column(column.into())]))
    }

    /// Makes a `SELECT` distinct; must come before the first column.
    pub fn distinct(&mut self) -> Result<&mut Self> {
        let next = self.check(Operation::Distinct)?;
        Ok(self.commit(next, [Token::Distinct]))
    }

    /// Appends `VALUES (...)` to an `INSERT`.
    pub fn values(&mut self, values: impl IntoIterator<Item = SqlValue>) -> Result<&mut Self> {
        let next = self.check(Operation::Values)?;
        let tokens = std::iter::once(Token::Values).chain(values.into_iter().map(Token::Value));
        Ok(self.commit(next, tokens))
    }

    /// Appends one `name=value` assignment.
    ///
    /// The value is formatted with [`fmt::Display`] and read back as
    /// `data_type`; repeated calls build one comma separated list.
    pub fn set<V: fmt::Display>(
        &mut self,
        name: &str,
        data_type: DataType,
        value: V,
    ) -> Result<&mut Self> {
        let next = self.check(Operation::Set)?;
        let value = SqlValue::from_text(&value.to_string(), data_type)?;
        Ok(self.commit(
            next,
            [Token::Set {
                column: String::from(name),
                data_type,
                value,
            }],
        ))
    }

    /// Appends `FROM <table>`.
    pub fn from(&mut self, table: &str) -> Result<&mut Self> {
        let next = self.check(Operation::From)?;
        Ok(self.commit(
            next,
            [Token::From {
                table: String::from(table),
            }],
        ))
    }

    /// Appends `WHERE <condition>`.
    pub fn where_(&mut self, condition: Condition) -> Result<&mut Self> {
        let next = self.check(Operation::CondWhere)?;
        Ok(self.commit(next, [Token::Where, Token::Condition(condition)]))
    }

    /// Appends `WHERE <raw sql>`.
    pub fn where_raw(&mut self, clause: &str) -> Result<&mut Self> {
        let next = self.check(Operation::Where)?;
        Ok(self.commit(next, [Token::Where, Token::Condition(Condition::raw(clause))]))
    }

    /// Appends `AND <condition>`.
    pub fn and(&mut self, condition: Condition) -> Result<&mut Self> {
        let next = self.check(Operation::And)?;
        Ok(self.commit(next, [Token::And, Token::Condition(condition)]))
    }

    /// Appends `OR <condition>`.
    pub fn or(&mut self, condition: Condition) -> Result<&mut Self> {
        let next = self.check(Operation::Or)?;
        Ok(self.commit(next, [Token::Or, Token::Condition(condition)]))
    }

    fn push_order(&mut self, column: &str, order: Option<Order>) -> Result<&mut Self> {
        let next = self.check(Operation::OrderBy)?;
        Ok(self.commit(
            next,
            [Token::OrderBy {
                column: String::from(column),
                order,
            }],
        ))
    }

    /// Appends `ORDER BY <column>`.
    pub fn order_by(&mut self, column: &str) -> Result<&mut Self> {
        self.push_order(column, None)
    }

    /// Appends `ORDER BY <column> ASC`.
    pub fn order_by_asc(&mut self, column: &str) -> Result<&mut Self> {
        self.push_order(column, Some(Order::Asc))
    }

    /// Appends `ORDER BY <column> DESC`.
    pub fn order_by_desc(&mut self, column: &str) -> Result<&mut Self> {
        self.push_order(column, Some(Order::Desc))
    }

    /// Appends `GROUP BY <column>`.
    pub fn group_by(&mut self, column: &str) -> Result<&mut Self> {
        let next = self.check(Operation::GroupBy)?;
        Ok(self.commit(
            next,
            [Token::GroupBy {
                column: String::from(column),
            }],
        ))
    }

    /// Limits the number of rows.
    pub fn limit(&mut self, count: u64) -> Result<&mut Self> {
        let next = self.check(Operation::Limit)?;
        Ok(self.commit(next, [Token::Limit(count)]))
    }

    /// Renders with values inlined, without changing state.
    pub fn render(&self, dialect: &dyn Dialect) -> Result<String> {
        Renderer::new(dialect).direct(&self.sql)
    }

    /// Renders with placeholders, without changing state.
    pub fn render_prepared(&self, dialect: &dyn Dialect) -> Result<PreparedSql> {
        Renderer::new(dialect).prepare(&self.sql)
    }

    /// Renders directly and executes on the connection.
    pub fn execute(&mut self, connection: &mut dyn Connection) -> Result<ResultSet> {
        let next = self.check(Operation::Execute)?;
        let sql = self.render(connection.dialect())?;
        debug!(%sql, "executing query");
        let result = connection.execute(&sql)?;
        self.enter(next);
        Ok(result)
    }

    /// Renders with placeholders and prepares a statement on the connection.
    pub fn prepare<'c>(&mut self, connection: &'c mut dyn Connection) -> Result<Statement<'c>> {
        let next = self.check(Operation::Prepare)?;
        let prepared = self.render_prepared(connection.dialect())?;
        debug!(sql = %prepared.sql, bindings = prepared.bindings.len(), "preparing query");
        let statement = Statement::new(connection, prepared)?;
        self.enter(next);
        Ok(statement)
    }

    /// Binds values in placeholder order to a statement from [`Query::prepare`].
    ///
    /// Placeholders without a value keep the value captured at prepare time.
    pub fn bind(&mut self, statement: &mut Statement<'_>, values: Vec<SqlValue>) -> Result<()> {
        let next = self.check(Operation::Bind)?;
        let count = statement.bind_count();
        if values.len() > count {
            return Err(SqlError::BindIndex {
                index: count,
                count,
            });
        }
        for (index, value) in values.into_iter().enumerate() {
            statement.bind(index, value)?;
        }
        self.enter(next);
        Ok(())
    }

    /// Clears the token stream and returns to `Begin`.
    pub fn reset(&mut self) -> &mut Self {
        self.sql.clear();
        self.state = QueryState::Begin;
        self.leading = QueryState::Begin;
        self
    }
}

fn check_arity(schema: &TableSchema, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SqlError::ColumnMismatch {
            table: schema.name.clone(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::col;
    use crate::connection::MemoryConnection;
    use crate::dialect::{GenericDialect, MsSqlDialect, PostgresDialect};

    fn person() -> TableSchema {
        TableSchema::new("person")
            .with_column(Column::identifier("id", DataType::Int))
            .with_column(Column::varchar("name", 255))
    }

    #[test]
    fn test_create_scenario() {
        let mut connection = MemoryConnection::generic();
        let mut query = Query::new();
        query
            .create_table("person")
            .unwrap()
            .column(Column::identifier("id", DataType::Int))
            .unwrap()
            .column(Column::varchar("name", 255))
            .unwrap();
        query.execute(&mut connection).unwrap();
        assert_eq!(
            connection.statements(),
            vec!["CREATE TABLE person (id INTEGER NOT NULL PRIMARY KEY, name VARCHAR(255)) "]
        );
        assert_eq!(query.state(), QueryState::Executed);
    }

    #[test]
    fn test_create_from_schema_matches_column_calls() {
        let dialect = GenericDialect::new();
        let mut query = Query::new();
        query.create(&person()).unwrap();
        assert_eq!(
            query.render(&dialect).unwrap(),
            "CREATE TABLE person (id INTEGER NOT NULL PRIMARY KEY, name VARCHAR(255)) "
        );
    }

    #[test]
    fn test_set_builds_one_list() {
        let dialect = GenericDialect::new();
        let mut query = Query::new();
        query
            .update("person")
            .unwrap()
            .set("name", DataType::Varchar, "Bob")
            .unwrap()
            .set("age", DataType::Int, 42)
            .unwrap()
            .where_(col("id").eq(7))
            .unwrap();
        assert_eq!(
            query.render(&dialect).unwrap(),
            "UPDATE person SET name='Bob', age=42 WHERE id = 7 "
        );
    }

    #[test]
    fn test_set_rejects_unparsable_value() {
        let mut query = Query::new();
        query.update("person").unwrap();
        let before = query.sql().clone();
        assert!(matches!(
            query.set("age", DataType::Int, "old"),
            Err(SqlError::MalformedResult { .. })
        ));
        assert_eq!(query.sql(), &before);
        assert_eq!(query.state(), QueryState::Update);
    }

    #[test]
    fn test_where_before_from_is_rejected() {
        let mut query = Query::new();
        query.select().unwrap().column("id").unwrap();
        let err = query.where_(col("id").eq(1)).unwrap_err();
        assert_eq!(
            err,
            SqlError::InvalidQueryState {
                state: QueryState::Column,
                operation: Operation::CondWhere,
            }
        );

        let mut reference = Query::new();
        reference.select().unwrap().column("id").unwrap();
        assert_eq!(query.sql(), reference.sql());

        query.from("person").unwrap().where_(col("id").eq(1)).unwrap();
        reference.from("person").unwrap().where_(col("id").eq(1)).unwrap();
        let dialect = GenericDialect::new();
        assert_eq!(query.render(&dialect).unwrap(), reference.render(&dialect).unwrap());
    }

    #[test]
    fn test_new_statement_requires_reset() {
        let mut query = Query::new();
        query.drop("person").unwrap();
        assert!(matches!(
            query.select(),
            Err(SqlError::InvalidQueryState {
                state: QueryState::Drop,
                operation: Operation::Select,
            })
        ));
        query.reset().select().unwrap();
        assert_eq!(query.state(), QueryState::Select);
        assert_eq!(query.sql().len(), 1);
    }

    #[test]
    fn test_incomplete_statements_do_not_execute() {
        let mut connection = MemoryConnection::generic();
        let mut query = Query::new();
        query.select().unwrap().column("id").unwrap();
        assert!(query.execute(&mut connection).is_err());
        query.reset().create_table("t").unwrap();
        assert!(query.execute(&mut connection).is_err());
        assert!(connection.executed().is_empty());
    }

    #[test]
    fn test_leading_keyword_appears_once() {
        let dialect = GenericDialect::new();
        let cases: Vec<(Query, &str)> = vec![
            {
                let mut q = Query::new();
                q.select_object(&person())
                    .unwrap()
                    .where_(col("id").eq(1))
                    .unwrap()
                    .and(col("name").like("a%"))
                    .unwrap();
                (q, "SELECT")
            },
            {
                let mut q = Query::new();
                let values = vec![SqlValue::Int(1), SqlValue::Text(String::from("a"))];
                q.insert_object(&person(), values).unwrap();
                (q, "INSERT INTO")
            },
            {
                let mut q = Query::new();
                let values = vec![SqlValue::Int(1), SqlValue::Text(String::from("b"))];
                q.update_object(&person(), values)
                    .unwrap()
                    .where_(col("id").eq(1))
                    .unwrap();
                (q, "UPDATE")
            },
            {
                let mut q = Query::new();
                q.delete("person")
                    .unwrap()
                    .where_(col("id").eq(1))
                    .unwrap()
                    .or(col("id").eq(2))
                    .unwrap();
                (q, "DELETE FROM")
            },
            {
                let mut q = Query::new();
                q.drop("person").unwrap();
                (q, "DROP TABLE")
            },
        ];
        for (query, keyword) in cases {
            let sql = query.render(&dialect).unwrap();
            assert!(!sql.is_empty());
            assert_eq!(sql.matches(keyword).count(), 1, "{sql}");
        }
    }

    #[test]
    fn test_object_statements() {
        let dialect = GenericDialect::new();
        let values = vec![SqlValue::Int(1), SqlValue::Text(String::from("ada"))];

        let mut insert = Query::new();
        insert.insert_object(&person(), values.clone()).unwrap();
        assert_eq!(
            insert.render(&dialect).unwrap(),
            "INSERT INTO person (id, name) VALUES (1, 'ada') "
        );

        let mut update = Query::new();
        update.update_object(&person(), values).unwrap().where_(col("id").eq(1)).unwrap();
        assert_eq!(
            update.render(&dialect).unwrap(),
            "UPDATE person SET name='ada' WHERE id = 1 "
        );

        let mut select = Query::new();
        select.select_object(&person()).unwrap().order_by_desc("name").unwrap().limit(3).unwrap();
        assert_eq!(
            select.render(&dialect).unwrap(),
            "SELECT id, name FROM person ORDER BY name DESC LIMIT 3 "
        );

        let mut wrong = Query::new();
        assert!(matches!(
            wrong.insert_object(&person(), vec![SqlValue::Int(1)]),
            Err(SqlError::ColumnMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(wrong.state(), QueryState::Begin);
    }

    #[test]
    fn test_prepare_and_bind() {
        let mut connection = MemoryConnection::new(PostgresDialect::new());
        let mut query = Query::new();
        query
            .select()
            .unwrap()
            .column("id")
            .unwrap()
            .from("person")
            .unwrap()
            .where_(col("name").eq("ada"))
            .unwrap()
            .and(col("age").gt(30))
            .unwrap();
        let mut statement = query.prepare(&mut connection).unwrap();
        assert_eq!(
            statement.sql(),
            "SELECT id FROM person WHERE name = $1 AND age > $2 "
        );
        assert_eq!(statement.column_count(), 1);
        query
            .bind(&mut statement, vec![SqlValue::Text(String::from("bob"))])
            .unwrap();
        statement.execute().unwrap();
        assert_eq!(query.state(), QueryState::Bound);
        assert_eq!(
            connection.executed()[0].bindings,
            vec![SqlValue::Text(String::from("bob")), SqlValue::Int(30)]
        );
    }

    #[test]
    fn test_bind_requires_prepared() {
        let mut connection = MemoryConnection::generic();
        let mut other = Query::new();
        other.drop("t").unwrap();
        let mut statement = other.prepare(&mut connection).unwrap();
        let mut query = Query::new();
        assert!(matches!(
            query.bind(&mut statement, Vec::new()),
            Err(SqlError::InvalidQueryState {
                state: QueryState::Begin,
                operation: Operation::Bind,
            })
        ));
    }

    #[test]
    fn test_mssql_distinct_top() {
        let dialect = MsSqlDialect::new();
        let mut query = Query::new();
        query
            .select()
            .unwrap()
            .distinct()
            .unwrap()
            .column("name")
            .unwrap()
            .from("person")
            .unwrap()
            .limit(5)
            .unwrap();
        assert_eq!(
            query.render(&dialect).unwrap(),
            "SELECT DISTINCT TOP 5 name FROM person "
        );
    }

    #[test]
    fn test_distinct_only_once() {
        let dialect = GenericDialect::new();
        let mut query = Query::new();
        query.select().unwrap().distinct().unwrap();
        assert_eq!(query.state(), QueryState::Distinct);
        assert_eq!(
            query.distinct().unwrap_err(),
            SqlError::InvalidQueryState {
                state: QueryState::Distinct,
                operation: Operation::Distinct,
            }
        );
        query.column("name").unwrap().from("person").unwrap();
        assert!(query.distinct().is_err());
        assert_eq!(
            query.render(&dialect).unwrap(),
            "SELECT DISTINCT name FROM person "
        );
    }

    #[test]
    fn test_failed_execute_keeps_state() {
        let mut connection = MemoryConnection::generic();
        let mut query = Query::new();
        query.drop("person").unwrap();
        connection.fail_next("database is locked");
        assert!(matches!(
            query.execute(&mut connection),
            Err(SqlError::Driver(message)) if message == "database is locked"
        ));
        assert_eq!(query.state(), QueryState::Drop);

        query.execute(&mut connection).unwrap();
        assert_eq!(query.state(), QueryState::Executed);
        assert_eq!(connection.statements(), vec!["DROP TABLE person "]);
    }

    #[test]
    fn test_group_by_after_order_by_renders_first() {
        let dialect = GenericDialect::new();
        let mut query = Query::new();
        query
            .select()
            .unwrap()
            .column("name")
            .unwrap()
            .from("person")
            .unwrap()
            .order_by("name")
            .unwrap()
            .group_by("name")
            .unwrap();
        assert_eq!(
            query.render(&dialect).unwrap(),
            "SELECT name FROM person GROUP BY name ORDER BY name "
        );
    }

    #[test]
    fn test_insert_with_columns() {
        let dialect = GenericDialect::new();
        let mut query = Query::new();
        query
            .insert_into("person")
            .unwrap()
            .column("id")
            .unwrap()
            .column("name")
            .unwrap()
            .values([SqlValue::Int(4), SqlValue::Text(String::from("x"))])
            .unwrap();
        assert_eq!(
            query.render(&dialect).unwrap(),
            "INSERT INTO person (id, name) VALUES (4, 'x') "
        );
        assert!(query.column("age").is_err());
    }
}
