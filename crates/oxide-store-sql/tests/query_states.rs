//! Illegal builder calls fail with `InvalidQueryState` and leave the
//! statement untouched.

mod common;

use common::{all_dialects, render};
use oxide_store_sql::{col, Column, DataType, Operation, Query, QueryState, SqlError, SqlValue};

type Call = fn(&mut Query) -> oxide_store_sql::Result<()>;

fn call(name: &'static str, f: Call) -> (&'static str, Call) {
    (name, f)
}

fn calls() -> Vec<(&'static str, Call)> {
    vec![
        call("create_table", |q| q.create_table("t").map(|_| ())),
        call("drop", |q| q.drop("t").map(|_| ())),
        call("select", |q| q.select().map(|_| ())),
        call("insert_into", |q| q.insert_into("t").map(|_| ())),
        call("update", |q| q.update("t").map(|_| ())),
        call("delete", |q| q.delete("t").map(|_| ())),
        call("column", |q| q.column("a").map(|_| ())),
        call("distinct", |q| q.distinct().map(|_| ())),
        call("values", |q| q.values([SqlValue::Int(1)]).map(|_| ())),
        call("set", |q| q.set("a", DataType::Int, 1).map(|_| ())),
        call("from", |q| q.from("t").map(|_| ())),
        call("where", |q| q.where_(col("a").eq(1)).map(|_| ())),
        call("where_raw", |q| q.where_raw("a = 1").map(|_| ())),
        call("and", |q| q.and(col("b").eq(2)).map(|_| ())),
        call("or", |q| q.or(col("b").eq(3)).map(|_| ())),
        call("order_by", |q| q.order_by("a").map(|_| ())),
        call("group_by", |q| q.group_by("a").map(|_| ())),
        call("limit", |q| q.limit(1).map(|_| ())),
    ]
}

/// Prefixes that reach a range of states.
fn prefixes() -> Vec<Vec<usize>> {
    let index = |name: &str| {
        calls()
            .iter()
            .position(|(n, _)| *n == name)
            .unwrap_or_else(|| panic!("no call {name}"))
    };
    let chain = |names: &[&str]| names.iter().map(|n| index(n)).collect::<Vec<_>>();
    vec![
        chain(&[]),
        chain(&["select"]),
        chain(&["select", "distinct"]),
        chain(&["select", "column"]),
        chain(&["select", "column", "from"]),
        chain(&["select", "column", "from", "where"]),
        chain(&["select", "column", "from", "where", "and", "order_by"]),
        chain(&["insert_into", "column"]),
        chain(&["insert_into", "values"]),
        chain(&["update", "set"]),
        chain(&["update", "set", "where_raw", "or"]),
        chain(&["delete"]),
        chain(&["create_table"]),
        chain(&["drop"]),
    ]
}

#[test]
fn test_rejected_calls_do_not_mutate() {
    let calls = calls();
    for prefix in prefixes() {
        let mut base = Query::new();
        for &i in &prefix {
            (calls[i].1)(&mut base).unwrap_or_else(|e| panic!("prefix failed: {e}"));
        }
        for (name, apply) in &calls {
            let mut query = base.clone();
            if let Err(err) = apply(&mut query) {
                assert!(
                    matches!(
                        err,
                        SqlError::InvalidQueryState { state, .. } if state == base.state()
                    ),
                    "{name} from {}: {err}",
                    base.state()
                );
                assert_eq!(query.sql(), base.sql(), "{name} mutated the stream");
                assert_eq!(query.state(), base.state());
            }
        }
    }
}

#[test]
fn test_accepted_sequences_render_one_leading_keyword() {
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
        .where_(col("age").between(18, 65))
        .unwrap()
        .or(col("vip").eq(true))
        .unwrap()
        .order_by_asc("name")
        .unwrap()
        .limit(10)
        .unwrap();
    for dialect in all_dialects() {
        let sql = render(&query, dialect.as_ref());
        assert_eq!(sql.matches("SELECT").count(), 1, "{sql}");
        assert!(sql.contains("BETWEEN 18 AND 65"), "{sql}");
    }
}

#[test]
fn test_error_reports_state_and_operation() {
    let mut query = Query::new();
    query
        .create_table("t")
        .unwrap()
        .column(Column::typed("a", DataType::Int))
        .unwrap();
    let err = query.from("t").unwrap_err();
    assert_eq!(
        err,
        SqlError::InvalidQueryState {
            state: QueryState::Column,
            operation: Operation::From,
        }
    );
    assert_eq!(
        err.to_string(),
        "cannot call `from` while the query is in state `Column`"
    );
}
