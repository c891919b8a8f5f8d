#![allow(dead_code)]

use oxide_store_sql::{
    Dialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgresDialect, Query, Renderer,
    SqliteDialect, SqlValue, Sql, Token,
};

pub fn all_dialects() -> Vec<Box<dyn Dialect>> {
    vec![
        Box::new(GenericDialect::new()),
        Box::new(SqliteDialect::new()),
        Box::new(MySqlDialect::new()),
        Box::new(MsSqlDialect::new()),
        Box::new(PostgresDialect::new()),
    ]
}

pub fn render(query: &Query, dialect: &dyn Dialect) -> String {
    query
        .render(dialect)
        .unwrap_or_else(|e| panic!("Failed to render for {}: {e}", dialect.name()))
}

/// Renders `INSERT INTO t VALUES (<value>)` directly and returns the literal.
pub fn literal_of(value: &SqlValue, dialect: &dyn Dialect) -> String {
    let sql: Sql = [
        Token::Insert {
            table: String::from("t"),
        },
        Token::Values,
        Token::Value(value.clone()),
    ]
    .into_iter()
    .collect();
    let text = Renderer::new(dialect)
        .direct(&sql)
        .unwrap_or_else(|e| panic!("Failed to render {value:?}: {e}"));
    text.strip_prefix("INSERT INTO t VALUES (")
        .and_then(|rest| rest.strip_suffix(") "))
        .unwrap_or_else(|| panic!("Unexpected statement shape: {text}"))
        .to_owned()
}
