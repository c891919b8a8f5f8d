//! Direct-mode literals parse back to the value they were rendered from,
//! for every scalar type each dialect maps.

mod common;

use chrono::{NaiveDate, NaiveTime};
use common::{all_dialects, literal_of};
use oxide_store_sql::{DataType, SqlValue};

fn samples() -> Vec<(DataType, SqlValue)> {
    vec![
        (DataType::Char, SqlValue::Int(-128)),
        (DataType::Short, SqlValue::Int(i64::from(i16::MAX))),
        (DataType::Int, SqlValue::Int(-42)),
        (DataType::Long, SqlValue::Int(i64::MIN)),
        (DataType::UnsignedChar, SqlValue::Int(255)),
        (DataType::UnsignedShort, SqlValue::Int(65_535)),
        (DataType::UnsignedInt, SqlValue::Int(i64::from(u32::MAX))),
        (DataType::UnsignedLong, SqlValue::UInt(u64::MAX)),
        (DataType::Bool, SqlValue::Bool(true)),
        (DataType::Bool, SqlValue::Bool(false)),
        (DataType::Float, SqlValue::Float(f64::from(1.5_f32))),
        (DataType::Double, SqlValue::Float(0.1)),
        (DataType::Double, SqlValue::Float(-2.5e-12)),
        (DataType::CharPointer, SqlValue::Text(String::from("hello"))),
        (DataType::Varchar, SqlValue::Text(String::from("O'Brien"))),
        (DataType::Text, SqlValue::Text(String::from("line one\nline 'two'"))),
        (DataType::Text, SqlValue::Text(String::new())),
        (
            DataType::Date,
            SqlValue::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
        ),
        (
            DataType::Time,
            SqlValue::Time(NaiveTime::from_hms_milli_opt(23, 59, 58, 250).unwrap()),
        ),
        (DataType::Blob, SqlValue::Blob(vec![0x00, 0x7F, 0xFF])),
        (DataType::Int, SqlValue::Null),
    ]
}

#[test]
fn test_literals_round_trip_for_every_dialect() {
    for dialect in all_dialects() {
        for (data_type, value) in samples() {
            assert!(dialect.type_name(data_type).is_some());
            let literal = literal_of(&value, dialect.as_ref());
            let parsed = SqlValue::from_literal(&literal, data_type).unwrap_or_else(|e| {
                panic!("{}: cannot parse {literal} as {data_type}: {e}", dialect.name())
            });
            assert_eq!(parsed, value, "{}: {literal}", dialect.name());
        }
    }
}

#[test]
fn test_boolean_literals_differ_by_dialect() {
    let literals: Vec<(String, String)> = all_dialects()
        .iter()
        .map(|d| (d.name().to_owned(), literal_of(&SqlValue::Bool(true), d.as_ref())))
        .collect();
    for (name, literal) in literals {
        match name.as_str() {
            "generic" | "postgres" => assert_eq!(literal, "TRUE"),
            _ => assert_eq!(literal, "1", "{name}"),
        }
    }
}
