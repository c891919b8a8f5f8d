//! Visitors converting between objects and table rows.

use oxide_store_sql::{Row, SqlError, SqlValue, ToSqlValue};
use tracing::trace;

use crate::field::{Field, FieldVisitor};
use crate::holder::HolderKind;
use crate::proxy::ObjectId;
use crate::store::StoreInner;

/// Collects column values in field order for INSERT and UPDATE.
///
/// Pointers and references contribute the id of their target, or `NULL`.
/// Relation containers have no column.
#[derive(Debug, Default)]
pub(crate) struct ValueCollector {
    pub(crate) values: Vec<SqlValue>,
}

impl FieldVisitor for ValueCollector {
    fn visit(&mut self, _name: &str, field: Field<'_>) {
        let value = match field {
            Field::Identifier(id) => id.to_sql_value(),
            Field::Scalar(scalar) => scalar.to_value(),
            Field::Object(holder) => match holder.target_id() {
                0 => SqlValue::Null,
                id => id.to_sql_value(),
            },
            Field::Relation(_) => return,
        };
        self.values.push(value);
    }
}

/// Fills an object from a result row.
///
/// Pointers and references are resolved against objects already in the
/// store; anything else becomes a placeholder.
pub(crate) struct RowReader<'a> {
    row: &'a Row,
    store: &'a StoreInner,
    error: Option<SqlError>,
}

impl<'a> RowReader<'a> {
    pub(crate) const fn new(row: &'a Row, store: &'a StoreInner) -> Self {
        Self {
            row,
            store,
            error: None,
        }
    }

    pub(crate) fn finish(self) -> Result<(), SqlError> {
        self.error.map_or(Ok(()), Err)
    }

    fn id(&self, name: &str) -> Result<ObjectId, SqlError> {
        match self.row.get(name) {
            None => Err(SqlError::malformed(name, "column missing from result")),
            Some(SqlValue::Null) => Ok(0),
            Some(_) => self.row.read::<ObjectId>(name),
        }
    }
}

impl FieldVisitor for RowReader<'_> {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        if self.error.is_some() {
            return;
        }
        let outcome = match field {
            Field::Identifier(id) => self.id(name).map(|value| *id = value),
            Field::Scalar(scalar) => match self.row.get(name) {
                Some(value) => scalar
                    .assign(value)
                    .map_err(|message| SqlError::malformed(name, message)),
                None => Err(SqlError::malformed(name, "column missing from result")),
            },
            Field::Object(holder) => self.id(name).map(|id| {
                let target = self
                    .store
                    .objects
                    .get(&id)
                    .filter(|entry| entry.proxy.object_type() == holder.target_type())
                    .map(|entry| entry.proxy.clone());
                let resolved = target.is_some();
                holder.resolve(target, id);
                if let Some(target) = holder.target().filter(|_| resolved) {
                    match holder.kind() {
                        HolderKind::Pointer => target.link_ptr(),
                        HolderKind::Reference => target.link_ref(),
                    }
                    holder.set_internal(true);
                }
                trace!(field = name, id, resolved, "read object field");
            }),
            Field::Relation(_) => Ok(()),
        };
        if let Err(error) = outcome {
            self.error = Some(error);
        }
    }
}
