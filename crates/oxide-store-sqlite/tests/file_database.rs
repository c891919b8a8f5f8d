//! On-disk databases survive reopening.

use oxide_store_sql::{Column, ConnectionConfig, DataType, Query, SqlValue, TableSchema};
use oxide_store_sqlite::SqliteConnection;

fn schema() -> TableSchema {
    TableSchema::new("city")
        .with_column(Column::identifier("id", DataType::Long))
        .with_column(Column::varchar("name", 64))
        .with_column(Column::typed("founded", DataType::Date))
}

#[test]
fn test_reopen_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cities.db");

    {
        let mut connection = SqliteConnection::open(&path).unwrap();
        assert_eq!(connection.path(), Some(path.as_path()));
        Query::new().create(&schema()).unwrap().execute(&mut connection).unwrap();
        let mut insert = Query::new();
        insert
            .insert_object(
                &schema(),
                vec![
                    SqlValue::Int(1),
                    SqlValue::Text(String::from("Ghent")),
                    SqlValue::Date(chrono::NaiveDate::from_ymd_opt(1180, 1, 1).unwrap()),
                ],
            )
            .unwrap();
        insert.prepare(&mut connection).unwrap().execute().unwrap();
    }

    let dsn = format!("sqlite://{}", path.display());
    let config = ConnectionConfig::parse(&dsn).unwrap();
    let mut connection = SqliteConnection::from_config(&config).unwrap();
    let rows: Vec<_> = Query::new()
        .select_object(&schema())
        .unwrap()
        .execute(&mut connection)
        .unwrap()
        .collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].read::<String>("name").unwrap(), "Ghent");
    assert_eq!(
        rows[0].read::<chrono::NaiveDate>("founded").unwrap(),
        chrono::NaiveDate::from_ymd_opt(1180, 1, 1).unwrap()
    );
}

#[test]
fn test_drop_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut connection = SqliteConnection::open(dir.path().join("drop.db")).unwrap();
    Query::new().create(&schema()).unwrap().execute(&mut connection).unwrap();
    Query::new().drop("city").unwrap().execute(&mut connection).unwrap();
    assert!(Query::new()
        .select_object(&schema())
        .unwrap()
        .execute(&mut connection)
        .is_err());
}
