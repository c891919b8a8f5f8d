//! Table descriptions used for CREATE TABLE and object statements.

use serde::{Deserialize, Serialize};

use crate::token::Column;

/// Name and ordered column definitions of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Creates a schema without columns.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a column in place.
    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Returns the identifier column, if any.
    #[must_use]
    pub fn identifier(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.identifier)
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn test_schema_lookup() {
        let schema = TableSchema::new("person")
            .with_column(Column::identifier("id", DataType::Long))
            .with_column(Column::varchar("name", 255));
        assert_eq!(schema.identifier().map(|c| c.name.as_str()), Some("id"));
        assert_eq!(schema.column_names(), vec!["id", "name"]);
        assert!(schema.column("age").is_none());
    }
}
