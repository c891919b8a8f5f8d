//! Token types that make up a backend-independent statement.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::types::DataType;
use crate::value::SqlValue;

/// Kind of a token; keys the dialect keyword table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    CreateTable,
    DropTable,
    Delete,
    Insert,
    Values,
    Value,
    Update,
    Select,
    Columns,
    Column,
    From,
    Where,
    And,
    Or,
    OrderBy,
    GroupBy,
    Asc,
    Desc,
    Limit,
    Offset,
    Distinct,
    Condition,
    Set,
    NotNull,
    PrimaryKey,
}

impl TokenKind {
    /// Default keyword text, used when a dialect does not replace it.
    #[must_use]
    pub const fn default_text(self) -> &'static str {
        match self {
            Self::CreateTable => "CREATE TABLE",
            Self::DropTable => "DROP TABLE",
            Self::Delete => "DELETE FROM",
            Self::Insert => "INSERT INTO",
            Self::Values => "VALUES",
            Self::Value => "",
            Self::Update => "UPDATE",
            Self::Select => "SELECT",
            Self::Columns => "COLUMNS",
            Self::Column => "COLUMN",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::OrderBy => "ORDER BY",
            Self::GroupBy => "GROUP BY",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Distinct => "DISTINCT",
            Self::Condition => "",
            Self::Set => "SET",
            Self::NotNull => "NOT NULL",
            Self::PrimaryKey => "PRIMARY KEY",
        }
    }

    /// Kinds whose consecutive fragments the linker joins into one list.
    #[must_use]
    pub const fn is_list_item(self) -> bool {
        matches!(self, Self::Column | Self::Value | Self::Set)
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl Order {
    /// Returns the token kind holding this direction's keyword.
    #[must_use]
    pub const fn kind(self) -> TokenKind {
        match self {
            Self::Asc => TokenKind::Asc,
            Self::Desc => TokenKind::Desc,
        }
    }
}

/// A column as it appears in a select list, an insert list or a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Logical type; `None` for plain name references.
    pub data_type: Option<DataType>,
    /// Size for bounded types such as `VARCHAR(n)`.
    pub size: Option<u32>,
    /// Whether this is the identifier (primary key) column.
    pub identifier: bool,
}

impl Column {
    /// A plain column reference.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            data_type: None,
            size: None,
            identifier: false,
        }
    }

    /// A typed column definition.
    #[must_use]
    pub fn typed(name: &str, data_type: DataType) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::new(name)
        }
    }

    /// A `VARCHAR(size)` column definition.
    #[must_use]
    pub fn varchar(name: &str, size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::typed(name, DataType::Varchar)
        }
    }

    /// The identifier column definition.
    #[must_use]
    pub fn identifier(name: &str, data_type: DataType) -> Self {
        Self {
            identifier: true,
            ..Self::typed(name, data_type)
        }
    }

    /// Sets the size.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Marks the column as identifier.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.identifier = true;
        self
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A single token of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `CREATE TABLE <table>`.
    Create { table: String },
    /// `DROP TABLE <table>`.
    Drop { table: String },
    /// `SELECT`.
    Select,
    /// `DISTINCT`.
    Distinct,
    /// `INSERT INTO <table>`.
    Insert { table: String },
    /// `VALUES`.
    Values,
    /// `UPDATE <table>`.
    Update { table: String },
    /// `DELETE FROM <table>`.
    Delete { table: String },
    /// A column name or definition.
    Column(Column),
    /// A literal or bound value.
    Value(SqlValue),
    /// One `column=value` assignment.
    Set {
        column: String,
        data_type: DataType,
        value: SqlValue,
    },
    /// `FROM <table>`.
    From { table: String },
    /// `WHERE`.
    Where,
    /// `AND`.
    And,
    /// `OR`.
    Or,
    /// A filter condition.
    Condition(Condition),
    /// `ORDER BY <column> [ASC|DESC]`.
    OrderBy { column: String, order: Option<Order> },
    /// `GROUP BY <column>`.
    GroupBy { column: String },
    /// `LIMIT <n>` (or `TOP <n>`).
    Limit(u64),
}

impl Token {
    /// Returns the kind of this token.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        match self {
            Self::Create { .. } => TokenKind::CreateTable,
            Self::Drop { .. } => TokenKind::DropTable,
            Self::Select => TokenKind::Select,
            Self::Distinct => TokenKind::Distinct,
            Self::Insert { .. } => TokenKind::Insert,
            Self::Values => TokenKind::Values,
            Self::Update { .. } => TokenKind::Update,
            Self::Delete { .. } => TokenKind::Delete,
            Self::Column(_) => TokenKind::Column,
            Self::Value(_) => TokenKind::Value,
            Self::Set { .. } => TokenKind::Set,
            Self::From { .. } => TokenKind::From,
            Self::Where => TokenKind::Where,
            Self::And => TokenKind::And,
            Self::Or => TokenKind::Or,
            Self::Condition(_) => TokenKind::Condition,
            Self::OrderBy { .. } => TokenKind::OrderBy,
            Self::GroupBy { .. } => TokenKind::GroupBy,
            Self::Limit(_) => TokenKind::Limit,
        }
    }
}

/// An ordered token stream making up one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    tokens: Vec<Token>,
}

impl Sql {
    /// Creates an empty stream.
    #[must_use]
    pub const fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Appends a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Returns the tokens in order.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` if the stream holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Removes every token.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

impl FromIterator<Token> for Sql {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl Extend<Token> for Sql {
    fn extend<I: IntoIterator<Item = Token>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
