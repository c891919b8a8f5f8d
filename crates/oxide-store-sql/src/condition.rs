//! Filter conditions for `WHERE`, `AND` and `OR` clauses.

use crate::value::{SqlValue, ToSqlValue};

/// Creates a column reference to build conditions from.
#[must_use]
pub fn col(name: &str) -> ColumnRef {
    ColumnRef {
        name: String::from(name),
    }
}

/// A column reference.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    name: String,
}

impl ColumnRef {
    fn compare<T: ToSqlValue>(self, op: CompareOp, value: T) -> Condition {
        Condition::Compare {
            column: self.name,
            op,
            value: value.to_sql_value(),
        }
    }

    /// Creates an equality condition.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// Creates an inequality condition.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::NotEq, value)
    }

    /// Creates a less-than condition.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// Creates a less-than-or-equal condition.
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::LtEq, value)
    }

    /// Creates a greater-than condition.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// Creates a greater-than-or-equal condition.
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Condition {
        self.compare(CompareOp::GtEq, value)
    }

    /// Creates a LIKE condition.
    #[must_use]
    pub fn like<T: ToSqlValue>(self, pattern: T) -> Condition {
        self.compare(CompareOp::Like, pattern)
    }

    /// Creates an IN condition.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Condition {
        Condition::In {
            column: self.name,
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        }
    }

    /// Creates a BETWEEN condition.
    #[must_use]
    pub fn between<T: ToSqlValue>(self, low: T, high: T) -> Condition {
        Condition::Between {
            column: self.name,
            low: low.to_sql_value(),
            high: high.to_sql_value(),
        }
    }

    /// Creates an IS NULL condition.
    #[must_use]
    pub fn is_null(self) -> Condition {
        Condition::Null {
            column: self.name,
            negated: false,
        }
    }

    /// Creates an IS NOT NULL condition.
    #[must_use]
    pub fn is_not_null(self) -> Condition {
        Condition::Null {
            column: self.name,
            negated: true,
        }
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
}

impl CompareOp {
    /// Returns the SQL representation of this operator.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
        }
    }
}

/// A filter condition.
///
/// Compound conditions hold their operands as nested conditions; the
/// renderer compiles each operand in its own build context.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column <op> value`.
    Compare {
        column: String,
        op: CompareOp,
        value: SqlValue,
    },
    /// `column IN (values)`.
    In { column: String, values: Vec<SqlValue> },
    /// `column BETWEEN low AND high`.
    Between {
        column: String,
        low: SqlValue,
        high: SqlValue,
    },
    /// `column IS [NOT] NULL`.
    Null { column: String, negated: bool },
    /// `(left AND right)`.
    And(Box<Condition>, Box<Condition>),
    /// `(left OR right)`.
    Or(Box<Condition>, Box<Condition>),
    /// `NOT (inner)`.
    Not(Box<Condition>),
    /// Raw SQL text, rendered verbatim.
    Raw(String),
}

impl Condition {
    /// Raw SQL text.
    #[must_use]
    pub fn raw(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }

    /// Combines with another condition using AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Combines with another condition using OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negates this condition.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_builders() {
        assert_eq!(
            col("age").gt(18),
            Condition::Compare {
                column: String::from("age"),
                op: CompareOp::Gt,
                value: SqlValue::Int(18),
            }
        );
        assert_eq!(
            col("deleted_at").is_null(),
            Condition::Null {
                column: String::from("deleted_at"),
                negated: false,
            }
        );
    }

    #[test]
    fn test_compound() {
        let cond = col("a").eq(1).and(col("b").eq(2)).negate();
        assert!(matches!(cond, Condition::Not(inner) if matches!(*inner, Condition::And(_, _))));
    }
}
