//! Logical column types shared by every dialect.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend-independent column type.
///
/// Dialects map each variant to a concrete SQL type name. [`DataType::Unknown`]
/// is never mapped and always fails with [`crate::SqlError::UnknownType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 8-bit signed integer.
    Char,
    /// 16-bit signed integer.
    Short,
    /// 32-bit signed integer.
    Int,
    /// 64-bit signed integer.
    Long,
    /// 8-bit unsigned integer.
    UnsignedChar,
    /// 16-bit unsigned integer.
    UnsignedShort,
    /// 32-bit unsigned integer.
    UnsignedInt,
    /// 64-bit unsigned integer.
    UnsignedLong,
    /// Boolean.
    Bool,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Unbounded character string held by pointer in the source object.
    CharPointer,
    /// Bounded character string.
    Varchar,
    /// Long text.
    Text,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Raw bytes.
    Blob,
    /// Placeholder for types no dialect can map.
    Unknown,
}

impl DataType {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::Char,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::UnsignedChar,
        Self::UnsignedShort,
        Self::UnsignedInt,
        Self::UnsignedLong,
        Self::Bool,
        Self::Float,
        Self::Double,
        Self::CharPointer,
        Self::Varchar,
        Self::Text,
        Self::Date,
        Self::Time,
        Self::Blob,
        Self::Unknown,
    ];

    /// Returns the lowercase name used in logs and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::UnsignedChar => "unsigned_char",
            Self::UnsignedShort => "unsigned_short",
            Self::UnsignedInt => "unsigned_int",
            Self::UnsignedLong => "unsigned_long",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Double => "double",
            Self::CharPointer => "char_pointer",
            Self::Varchar => "varchar",
            Self::Text => "text",
            Self::Date => "date",
            Self::Time => "time",
            Self::Blob => "blob",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` for signed integer types.
    #[must_use]
    pub const fn is_signed_integer(self) -> bool {
        matches!(self, Self::Char | Self::Short | Self::Int | Self::Long)
    }

    /// Returns `true` for unsigned integer types.
    #[must_use]
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            Self::UnsignedChar | Self::UnsignedShort | Self::UnsignedInt | Self::UnsignedLong
        )
    }

    /// Returns `true` for floating point types.
    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Returns `true` for character types.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::CharPointer | Self::Varchar | Self::Text)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        match lowered.as_str() {
            "integer" | "i32" => Ok(Self::Int),
            "bigint" | "i64" => Ok(Self::Long),
            "string" => Ok(Self::Varchar),
            "boolean" => Ok(Self::Bool),
            "real" | "f64" => Ok(Self::Double),
            other => Self::ALL
                .into_iter()
                .find(|ty| ty.name() == other)
                .ok_or_else(|| format!("unknown data type `{s}`")),
        }
    }
}
