//! Field visiting protocol.
//!
//! Every persistent type exposes its fields through
//! [`Persistent::visit_fields`], handing each one to a [`FieldVisitor`] as a
//! [`Field`]. The store's visitors (inserter, deleter, schema builder, row
//! reader, value collector) are all implementations of [`FieldVisitor`] that
//! pattern match on the field kind.

use core::fmt;
use core::ops::Deref;

use chrono::{NaiveDate, NaiveTime};
use oxide_store_sql::{DataType, FromSqlValue, SqlValue, ToSqlValue};

use crate::holder::ObjectHolder;
use crate::proxy::ObjectId;
use crate::relation::RelationField;

/// A type whose fields can be stored.
///
/// Usually derived:
///
/// ```rust
/// use oxide_store::{Identifier, Persistent, Varchar};
///
/// #[derive(Debug, Default, Persistent)]
/// struct Person {
///     id: Identifier,
///     name: Varchar<255>,
///     age: i32,
/// }
/// ```
pub trait Persistent: Default + 'static {
    /// Hands every field, in declaration order, to the visitor.
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor);
}

/// Receives the fields of a persistent object.
pub trait FieldVisitor {
    /// Visits one named field.
    fn visit(&mut self, name: &str, field: Field<'_>);
}

/// A mutable view of one field, tagged by kind.
pub enum Field<'a> {
    /// The primary key.
    Identifier(&'a mut ObjectId),
    /// A plain column value.
    Scalar(&'a mut dyn Scalar),
    /// A pointer or reference to another stored object.
    Object(&'a mut dyn ObjectHolder),
    /// A has-many container.
    Relation(&'a mut dyn RelationField),
}

impl fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(&scalar.to_value()).finish(),
            Self::Object(holder) => f.debug_tuple("Object").field(&holder.target_id()).finish(),
            Self::Relation(_) => f.write_str("Relation"),
        }
    }
}

/// Anything that can appear as a field of a persistent type.
pub trait Attribute {
    /// Returns the tagged field view.
    fn field(&mut self) -> Field<'_>;
}

/// A field stored in a single column.
pub trait Scalar {
    /// Logical column type.
    fn data_type(&self) -> DataType;

    /// Column size for bounded types.
    fn size(&self) -> Option<u32> {
        None
    }

    /// Current value.
    fn to_value(&self) -> SqlValue;

    /// Replaces the value from a result column.
    fn assign(&mut self, value: &SqlValue) -> Result<(), String>;
}

macro_rules! scalar {
    ($($ty:ty => $data_type:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            fn data_type(&self) -> DataType {
                DataType::$data_type
            }

            fn to_value(&self) -> SqlValue {
                self.clone().to_sql_value()
            }

            fn assign(&mut self, value: &SqlValue) -> Result<(), String> {
                *self = <$ty>::from_sql_value(value)?;
                Ok(())
            }
        }

        impl Attribute for $ty {
            fn field(&mut self) -> Field<'_> {
                Field::Scalar(self)
            }
        }
    )*};
}

scalar! {
    i8 => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    u8 => UnsignedChar,
    u16 => UnsignedShort,
    u32 => UnsignedInt,
    u64 => UnsignedLong,
    bool => Bool,
    f32 => Float,
    f64 => Double,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    Vec<u8> => Blob,
}

/// Optional columns store `NULL` for `None`.
impl<T: Scalar + Default> Scalar for Option<T> {
    fn data_type(&self) -> DataType {
        self.as_ref().map_or_else(|| T::default().data_type(), Scalar::data_type)
    }

    fn size(&self) -> Option<u32> {
        self.as_ref().map_or_else(|| T::default().size(), Scalar::size)
    }

    fn to_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, Scalar::to_value)
    }

    fn assign(&mut self, value: &SqlValue) -> Result<(), String> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }
        let mut inner = T::default();
        inner.assign(value)?;
        *self = Some(inner);
        Ok(())
    }
}

impl<T: Scalar + Default> Attribute for Option<T> {
    fn field(&mut self) -> Field<'_> {
        Field::Scalar(self)
    }
}

/// Primary-key field; receives the store id on insert while it is still 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(ObjectId);

impl Identifier {
    /// Creates an identifier with a known value.
    #[must_use]
    pub const fn new(id: ObjectId) -> Self {
        Self(id)
    }

    /// Current value, 0 until the object is inserted.
    #[must_use]
    pub const fn value(self) -> ObjectId {
        self.0
    }
}

impl Attribute for Identifier {
    fn field(&mut self) -> Field<'_> {
        Field::Identifier(&mut self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A string column declared as `VARCHAR(N)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Varchar<const N: u32>(pub String);

impl<const N: u32> Varchar<N> {
    /// Wraps a string.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(String::from(text))
    }

    /// Returns the string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: u32> Deref for Varchar<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<const N: u32> From<&str> for Varchar<N> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<const N: u32> fmt::Display for Varchar<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: u32> Scalar for Varchar<N> {
    fn data_type(&self) -> DataType {
        DataType::Varchar
    }

    fn size(&self) -> Option<u32> {
        Some(N)
    }

    fn to_value(&self) -> SqlValue {
        SqlValue::Text(self.0.clone())
    }

    fn assign(&mut self, value: &SqlValue) -> Result<(), String> {
        self.0 = String::from_sql_value(value)?;
        Ok(())
    }
}

impl<const N: u32> Attribute for Varchar<N> {
    fn field(&mut self) -> Field<'_> {
        Field::Scalar(self)
    }
}
