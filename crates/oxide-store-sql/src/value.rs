//! SQL values and conversions between Rust types, literals and driver results.

use core::fmt;
use core::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};
use crate::types::DataType;

/// A SQL value that can be bound to a placeholder or rendered inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value too large for `Int`.
    UInt(u64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// **Warning**: Prefer prepared statements for untrusted input.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::UInt(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote(s),
            Self::Date(d) => quote(&d.to_string()),
            Self::Time(t) => quote(&t.to_string()),
            Self::Blob(b) => format!("X'{}'", hex(b)),
        }
    }

    /// Short name of the variant, used in conversion errors.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::UInt(_) => "unsigned integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Blob(_) => "blob",
        }
    }

    /// Returns `true` for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interprets raw text (not a SQL literal) as a value of the given type.
    ///
    /// Numbers are parsed and range checked, text is taken as-is, dates and
    /// times use ISO 8601 and blobs are hexadecimal.
    pub fn from_text(text: &str, data_type: DataType) -> Result<Self> {
        let malformed = |message: String| SqlError::malformed(data_type.name(), message);
        let trimmed = text.trim();
        match data_type {
            ty if ty.is_signed_integer() => {
                let n: i64 = trimmed
                    .parse()
                    .map_err(|e| malformed(format!("`{text}` is not an integer: {e}")))?;
                let fits = match ty {
                    DataType::Char => i8::try_from(n).is_ok(),
                    DataType::Short => i16::try_from(n).is_ok(),
                    DataType::Int => i32::try_from(n).is_ok(),
                    _ => true,
                };
                if fits {
                    Ok(Self::Int(n))
                } else {
                    Err(malformed(format!("{n} is out of range")))
                }
            }
            ty if ty.is_unsigned_integer() => {
                let n: u64 = trimmed
                    .parse()
                    .map_err(|e| malformed(format!("`{text}` is not an unsigned integer: {e}")))?;
                let fits = match ty {
                    DataType::UnsignedChar => u8::try_from(n).is_ok(),
                    DataType::UnsignedShort => u16::try_from(n).is_ok(),
                    DataType::UnsignedInt => u32::try_from(n).is_ok(),
                    _ => true,
                };
                match (fits, i64::try_from(n)) {
                    (false, _) => Err(malformed(format!("{n} is out of range"))),
                    (true, Ok(signed)) => Ok(Self::Int(signed)),
                    (true, Err(_)) => Ok(Self::UInt(n)),
                }
            }
            DataType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(Self::Bool(true)),
                "0" | "false" => Ok(Self::Bool(false)),
                _ => Err(malformed(format!("`{text}` is not a boolean"))),
            },
            DataType::Float | DataType::Double => trimmed
                .parse()
                .map(Self::Float)
                .map_err(|e| malformed(format!("`{text}` is not a number: {e}"))),
            DataType::CharPointer | DataType::Varchar | DataType::Text => {
                Ok(Self::Text(text.to_owned()))
            }
            DataType::Date => NaiveDate::from_str(trimmed)
                .map(Self::Date)
                .map_err(|e| malformed(format!("`{text}` is not a date: {e}"))),
            DataType::Time => NaiveTime::from_str(trimmed)
                .map(Self::Time)
                .map_err(|e| malformed(format!("`{text}` is not a time: {e}"))),
            DataType::Blob => unhex(trimmed)
                .map(Self::Blob)
                .ok_or_else(|| malformed(format!("`{text}` is not hexadecimal"))),
            _ => Err(malformed(String::from("no conversion for this type"))),
        }
    }

    /// Parses a SQL literal as produced by a dialect back into a value.
    pub fn from_literal(literal: &str, data_type: DataType) -> Result<Self> {
        let literal = literal.trim();
        if literal.eq_ignore_ascii_case("NULL") {
            return Ok(Self::Null);
        }
        match data_type {
            DataType::Blob => {
                let quoted = || {
                    literal
                        .strip_prefix("X'")
                        .or_else(|| literal.strip_prefix("x'"))
                        .or_else(|| literal.strip_prefix("'\\x"))
                        .and_then(|rest| rest.strip_suffix('\''))
                };
                let digits = literal
                    .strip_prefix("0x")
                    .or_else(quoted)
                    .ok_or_else(|| {
                        let message = format!("`{literal}` is not a blob literal");
                        SqlError::malformed(data_type.name(), message)
                    })?;
                Self::from_text(digits, data_type)
            }
            ty if ty.is_textual() || matches!(ty, DataType::Date | DataType::Time) => {
                let text = unquote(literal).ok_or_else(|| {
                    let message = format!("`{literal}` is not a quoted literal");
                    SqlError::malformed(data_type.name(), message)
                })?;
                Self::from_text(&text, data_type)
            }
            _ => Self::from_text(literal, data_type),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_inline())
    }
}

fn quote(text: &str) -> String {
    // Escape single quotes by doubling them
    let escaped = text.replace('\'', "''");
    format!("'{escaped}'")
}

fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

fn unhex(digits: &str) -> Option<Vec<u8>> {
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql {
    ($($ty:ty),*) => {$(
        impl ToSqlValue for $ty {
            fn to_sql_value(self) -> SqlValue {
                SqlValue::Int(i64::from(self))
            }
        }
    )*};
}

int_to_sql!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        i64::try_from(self).map_or(SqlValue::UInt(self), SqlValue::Int)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Time(self)
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// Trait for types that can be read back from a result value.
///
/// Errors are plain messages; [`crate::Row::read`] attaches the field name.
pub trait FromSqlValue: Sized {
    /// Converts a borrowed value into `Self`.
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        Ok(value.clone())
    }
}

macro_rules! int_from_sql {
    ($($ty:ty),*) => {$(
        impl FromSqlValue for $ty {
            fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
                match value {
                    SqlValue::Int(n) => <$ty>::try_from(*n).map_err(|e| e.to_string()),
                    SqlValue::UInt(n) => <$ty>::try_from(*n).map_err(|e| e.to_string()),
                    SqlValue::Bool(b) => Ok(<$ty>::from(*b)),
                    SqlValue::Text(s) => s
                        .trim()
                        .parse()
                        .map_err(|e: core::num::ParseIntError| e.to_string()),
                    other => Err(format!("expected an integer, found {}", other.kind_name())),
                }
            }
        }
    )*};
}

int_from_sql!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(n) => Ok(*n != 0),
            SqlValue::UInt(n) => Ok(*n != 0),
            SqlValue::Text(s) => match SqlValue::from_text(s, DataType::Bool) {
                Ok(SqlValue::Bool(b)) => Ok(b),
                _ => Err(format!("`{s}` is not a boolean")),
            },
            other => Err(format!("expected a boolean, found {}", other.kind_name())),
        }
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(n) => Ok(*n as Self),
            SqlValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|e: core::num::ParseFloatError| e.to_string()),
            other => Err(format!("expected a number, found {}", other.kind_name())),
        }
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        #[allow(clippy::cast_possible_truncation)]
        f64::from_sql_value(value).map(|f| f as Self)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Int(n) => Ok(n.to_string()),
            SqlValue::UInt(n) => Ok(n.to_string()),
            SqlValue::Float(f) => Ok(f.to_string()),
            other => Err(format!("expected text, found {}", other.kind_name())),
        }
    }
}

impl FromSqlValue for NaiveDate {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::Text(s) => Self::from_str(s.trim()).map_err(|e| e.to_string()),
            other => Err(format!("expected a date, found {}", other.kind_name())),
        }
    }
}

impl FromSqlValue for NaiveTime {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Time(t) => Ok(*t),
            SqlValue::Text(s) => Self::from_str(s.trim()).map_err(|e| e.to_string()),
            other => Err(format!("expected a time, found {}", other.kind_name())),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Blob(b) => Ok(b.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(format!("expected a blob, found {}", other.kind_name())),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> core::result::Result<Self, String> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}
