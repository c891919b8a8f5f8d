//! Table descriptions read from the command line and the statements rendered
//! from them.

use clap::ValueEnum;
use oxide_store_sql::{
    Backend, Column, CompileMode, Connection, DataType, Dialect, GenericDialect, PreparedSql, Query,
    SqlError, SqlValue, TableSchema,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{CliError, Result};

/// Statement the `render` command produces for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// `CREATE TABLE` with every column.
    Create,
    /// `DROP TABLE`.
    Drop,
    /// `SELECT` of every column.
    Select,
    /// `INSERT` of one row.
    Insert,
}

/// A table given as a name and `name:type[:size][:pk]` column descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Schema built from the descriptions.
    pub schema: TableSchema,
}

impl TableSpec {
    /// Parses the column descriptions of table `name`.
    ///
    /// # Errors
    ///
    /// Fails when there are no columns, when a description is malformed or
    /// when more than one column is marked `pk`.
    pub fn parse(name: &str, columns: &[String]) -> Result<Self> {
        if columns.is_empty() {
            return Err(CliError::NoColumns(name.to_owned()));
        }
        let mut schema = TableSchema::new(name);
        for spec in columns {
            let column = parse_column(spec)?;
            if column.identifier && schema.identifier().is_some() {
                return Err(CliError::InvalidColumn {
                    spec: spec.clone(),
                    message: String::from("the table already has an identifier column"),
                });
            }
            schema.push(column);
        }
        Ok(Self { schema })
    }

    /// Reads one raw text value per column, in column order.
    ///
    /// `null` (any case) gives `NULL` for every column type.
    ///
    /// # Errors
    ///
    /// Fails with [`SqlError::ColumnMismatch`] when the number of values is
    /// not the number of columns and with [`CliError::InvalidValue`] when a
    /// value does not read as its column's type.
    pub fn values(&self, raw: &[String]) -> Result<Vec<SqlValue>> {
        if raw.len() != self.schema.columns.len() {
            return Err(SqlError::ColumnMismatch {
                table: self.schema.name.clone(),
                expected: self.schema.columns.len(),
                actual: raw.len(),
            }
            .into());
        }
        self.schema
            .columns
            .iter()
            .zip(raw)
            .map(|(column, text)| {
                if text.eq_ignore_ascii_case("null") {
                    return Ok(SqlValue::Null);
                }
                let data_type = column.data_type.unwrap_or(DataType::Text);
                SqlValue::from_text(text, data_type).map_err(|source| CliError::InvalidValue {
                    column: column.name.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Parses one `name:type[:size][:pk]` column description.
///
/// Types use the lowercase logical names (`long`, `varchar`, `date`, ...)
/// and the aliases `DataType` accepts. The size, when given, comes before
/// `pk`.
///
/// # Errors
///
/// Returns [`CliError::InvalidColumn`] describing the first problem found.
pub fn parse_column(spec: &str) -> Result<Column> {
    let invalid = |message: String| CliError::InvalidColumn {
        spec: spec.to_owned(),
        message,
    };

    let mut parts = spec.split(':');
    let name = parts
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| invalid(String::from("missing column name")))?;
    let data_type = parts
        .next()
        .ok_or_else(|| invalid(String::from("missing type")))?
        .parse::<DataType>()
        .map_err(invalid)?;

    let mut column = Column::typed(name, data_type);
    for part in parts {
        if part.eq_ignore_ascii_case("pk") {
            if column.identifier {
                return Err(invalid(String::from("`pk` given twice")));
            }
            column = column.primary_key();
        } else if column.identifier || column.size.is_some() {
            return Err(invalid(format!("unexpected `{part}`")));
        } else {
            let size = part
                .parse::<u32>()
                .map_err(|e| invalid(format!("bad size `{part}`: {e}")))?;
            column = column.with_size(size);
        }
    }
    Ok(column)
}

/// Resolves a backend name to its dialect; `generic` selects the ANSI one.
///
/// # Errors
///
/// Returns [`CliError::UnknownBackend`] for names no backend answers to.
pub fn backend_dialect(name: &str) -> Result<Box<dyn Dialect>> {
    if name.eq_ignore_ascii_case("generic") {
        return Ok(Box::new(GenericDialect::new()));
    }
    Backend::from_scheme(name)
        .map(Backend::dialect)
        .ok_or_else(|| CliError::UnknownBackend(name.to_owned()))
}

/// A rendered statement, as printed by `render --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    /// Dialect the statement was rendered for.
    pub dialect: &'static str,
    /// Statement kind.
    pub statement: StatementKind,
    /// Statement text.
    pub sql: String,
    /// Values bound to the placeholders, empty for direct rendering.
    pub bindings: Vec<SqlValue>,
}

/// Renders one statement for `table`.
///
/// In [`CompileMode::Prepared`] insert values become placeholders listed in
/// [`Rendered::bindings`]; in [`CompileMode::Direct`] they are inlined as
/// literals. `values` is only read for [`StatementKind::Insert`].
///
/// # Errors
///
/// Fails when the values do not fit the table or when the dialect cannot
/// render a column type.
pub fn render(
    kind: StatementKind,
    table: &TableSpec,
    values: &[String],
    dialect: &dyn Dialect,
    mode: CompileMode,
) -> Result<Rendered> {
    let schema = &table.schema;
    let mut query = Query::new();
    match kind {
        StatementKind::Create => query.create(schema)?,
        StatementKind::Drop => query.drop(&schema.name)?,
        StatementKind::Select => query.select_object(schema)?,
        StatementKind::Insert => query.insert_object(schema, table.values(values)?)?,
    };

    let (sql, bindings) = match mode {
        CompileMode::Direct => (query.render(dialect)?, Vec::new()),
        CompileMode::Prepared => {
            let PreparedSql { sql, bindings, .. } = query.render_prepared(dialect)?;
            (sql, bindings)
        }
    };
    debug!(dialect = dialect.name(), table = %schema.name, %sql, "rendered statement");

    Ok(Rendered {
        dialect: dialect.name(),
        statement: kind,
        sql: sql.trim_end().to_owned(),
        bindings,
    })
}

/// Creates the table on `connection`, or drops it when `drop` is set, and
/// returns the statement that ran.
///
/// # Errors
///
/// Fails when the statement cannot be rendered or the driver refuses it.
pub fn execute_ddl(
    table: &TableSpec,
    drop: bool,
    connection: &mut dyn Connection,
) -> Result<String> {
    let mut query = Query::new();
    if drop {
        query.drop(&table.schema.name)?;
    } else {
        query.create(&table.schema)?;
    }
    let sql = query.render(connection.dialect())?;
    debug!(table = %table.schema.name, %sql, "executing");
    query.execute(connection)?;
    Ok(sql.trim_end().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> TableSpec {
        TableSpec::parse(
            "person",
            &[String::from("id:int:pk"), String::from("name:varchar:255")],
        )
        .unwrap()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_column("id:long:pk").unwrap(), Column::identifier("id", DataType::Long));
        assert_eq!(parse_column("name:varchar:64").unwrap(), Column::varchar("name", 64));
        assert_eq!(parse_column("born:date").unwrap(), Column::typed("born", DataType::Date));
        assert_eq!(
            parse_column("code:varchar:8:pk").unwrap(),
            Column::varchar("code", 8).primary_key()
        );
        assert_eq!(parse_column("n:INTEGER").unwrap(), Column::typed("n", DataType::Int));
    }

    #[test]
    fn test_parse_column_errors() {
        for spec in ["", ":int", "id", "id:decimal", "id:int:pk:pk", "id:int:pk:8", "id:int:big"] {
            assert!(
                matches!(parse_column(spec), Err(CliError::InvalidColumn { .. })),
                "`{spec}` should be refused"
            );
        }
    }

    #[test]
    fn test_table_needs_columns_and_one_identifier() {
        assert!(matches!(TableSpec::parse("empty", &[]), Err(CliError::NoColumns(_))));
        assert!(matches!(
            TableSpec::parse("twice", &strings(&["a:int:pk", "b:int:pk"])),
            Err(CliError::InvalidColumn { .. })
        ));
    }

    #[test]
    fn test_render_create_and_drop() {
        let dialect = GenericDialect::new();
        let create =
            render(StatementKind::Create, &person(), &[], &dialect, CompileMode::Direct).unwrap();
        assert_eq!(
            create.sql,
            "CREATE TABLE person (id INTEGER NOT NULL PRIMARY KEY, name VARCHAR(255))"
        );
        assert!(create.bindings.is_empty());

        let drop =
            render(StatementKind::Drop, &person(), &[], &dialect, CompileMode::Direct).unwrap();
        assert_eq!(drop.sql, "DROP TABLE person");
    }

    #[test]
    fn test_render_insert() {
        let dialect = GenericDialect::new();
        let values = strings(&["1", "ada"]);

        let inline = render(
            StatementKind::Insert,
            &person(),
            &values,
            &dialect,
            CompileMode::Direct,
        )
        .unwrap();
        assert_eq!(inline.sql, "INSERT INTO person (id, name) VALUES (1, 'ada')");

        let prepared = render(
            StatementKind::Insert,
            &person(),
            &values,
            &dialect,
            CompileMode::Prepared,
        )
        .unwrap();
        assert_eq!(prepared.sql, "INSERT INTO person (id, name) VALUES (?, ?)");
        assert_eq!(
            prepared.bindings,
            [SqlValue::Int(1), SqlValue::Text(String::from("ada"))]
        );
    }

    #[test]
    fn test_render_insert_postgres_placeholders() {
        let dialect = backend_dialect("postgres").unwrap();
        let rendered = render(
            StatementKind::Insert,
            &person(),
            &strings(&["2", "NULL"]),
            dialect.as_ref(),
            CompileMode::Prepared,
        )
        .unwrap();
        assert!(rendered.sql.ends_with("VALUES ($1, $2)"));
        assert_eq!(rendered.bindings, [SqlValue::Int(2), SqlValue::Null]);
        assert_eq!(rendered.dialect, "postgres");
    }

    #[test]
    fn test_insert_values_checked() {
        let dialect = GenericDialect::new();
        let short = strings(&["1"]);
        assert!(matches!(
            render(StatementKind::Insert, &person(), &short, &dialect, CompileMode::Direct),
            Err(CliError::Sql(SqlError::ColumnMismatch { expected: 2, actual: 1, .. }))
        ));
        let wrong = strings(&["one", "ada"]);
        assert!(matches!(
            render(StatementKind::Insert, &person(), &wrong, &dialect, CompileMode::Direct),
            Err(CliError::InvalidValue { column, .. }) if column == "id"
        ));
    }

    #[test]
    fn test_unknown_type_fails_at_render() {
        let table = TableSpec::parse("odd", &strings(&["x:unknown"])).unwrap();
        assert!(matches!(
            render(StatementKind::Create, &table, &[], &GenericDialect::new(), CompileMode::Direct),
            Err(CliError::Sql(SqlError::UnknownType { .. }))
        ));
    }

    #[test]
    fn test_backend_dialect() {
        assert_eq!(backend_dialect("generic").unwrap().name(), "generic");
        assert_eq!(backend_dialect("sqlite").unwrap().name(), "sqlite");
        assert_eq!(backend_dialect("mariadb").unwrap().name(), "mysql");
        assert!(matches!(backend_dialect("oracle"), Err(CliError::UnknownBackend(_))));
    }

    #[test]
    fn test_execute_ddl_on_memory_connection() {
        let mut connection = oxide_store_sql::MemoryConnection::generic();
        let sql = execute_ddl(&person(), false, &mut connection).unwrap();
        assert!(sql.starts_with("CREATE TABLE person"));
        execute_ddl(&person(), true, &mut connection).unwrap();
        assert_eq!(connection.statements().len(), 2);
        assert_eq!(connection.statements()[1], "DROP TABLE person ");
    }

    #[test]
    fn test_rendered_json() {
        let rendered = render(
            StatementKind::Insert,
            &person(),
            &strings(&["1", "ada"]),
            &GenericDialect::new(),
            CompileMode::Prepared,
        )
        .unwrap();
        let json = serde_json::to_value(&rendered).unwrap();
        assert_eq!(json["statement"], "insert");
        assert_eq!(json["bindings"][0]["Int"], 1);
        assert_eq!(json["bindings"][1]["Text"], "ada");
    }
}
