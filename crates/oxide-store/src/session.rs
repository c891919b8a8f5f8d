//! Sessions: an object store paired with a database connection.
//!
//! The store records what changed; [`Session::flush`] turns its journal into
//! INSERT, UPDATE and DELETE statements, in that order and by ascending id
//! within each kind.

use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

use oxide_store_sql::{col, Connection, Query, Row, SqlValue};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::field::{Field, FieldVisitor, Persistent};
use crate::holder::ObjectPtr;
use crate::prototype::{owner_column, Prototype};
use crate::proxy::{downcast, ErasedProxy, ObjectId, Proxy};
use crate::relation::RelationField;
use crate::row::{RowReader, ValueCollector};
use crate::store::{Journal, ObjectStore, StoreInner};

/// Statements sent by one [`Session::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// INSERT statements.
    pub inserted: usize,
    /// UPDATE statements.
    pub updated: usize,
    /// DELETE statements.
    pub deleted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Insert,
    Update,
    Delete,
}

struct Pending {
    id: ObjectId,
    prototype: String,
    change: Change,
    query: Query,
}

/// An object store writing through to a connection.
pub struct Session<C> {
    store: ObjectStore,
    connection: C,
}

impl<C: Connection> Session<C> {
    /// A session with an empty store.
    pub fn new(connection: C) -> Self {
        Self::with_store(ObjectStore::new(), connection)
    }

    /// A session over an existing store.
    pub const fn with_store(store: ObjectStore, connection: C) -> Self {
        Self { store, connection }
    }

    /// The object store.
    pub const fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// The connection.
    pub fn connection(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Splits the session into its store and connection.
    pub fn into_parts(self) -> (ObjectStore, C) {
        (self.store, self.connection)
    }

    /// Creates the tables of every prototype, in registration order.
    pub fn create(&mut self) -> Result<()> {
        for prototype in self.store.prototypes() {
            Query::new()
                .create(&prototype.schema)?
                .execute(&mut self.connection)?;
            info!(table = %prototype.name, "created table");
        }
        Ok(())
    }

    /// Drops the tables of every prototype, in reverse registration order.
    pub fn drop(&mut self) -> Result<()> {
        for prototype in self.store.prototypes().iter().rev() {
            Query::new()
                .drop(&prototype.name)?
                .execute(&mut self.connection)?;
            info!(table = %prototype.name, "dropped table");
        }
        Ok(())
    }

    /// Inserts an object graph and flushes.
    pub fn insert<T: Persistent>(&mut self, object: T) -> Result<ObjectPtr<T>> {
        let ptr = self.store.insert(object)?;
        self.flush()?;
        Ok(ptr)
    }

    /// Removes an object and flushes.
    pub fn remove<T: Persistent>(&mut self, ptr: &ObjectPtr<T>) -> Result<()> {
        self.store.remove(ptr)?;
        self.flush()?;
        Ok(())
    }

    /// Writes pending changes to the database.
    ///
    /// On failure, the changes not yet written stay pending.
    pub fn flush(&mut self) -> Result<FlushSummary> {
        let journal = self.store.take_journal()?;
        if journal.is_empty() {
            return Ok(FlushSummary::default());
        }
        let mut pending = match self.statements(&journal) {
            Ok(pending) => pending,
            Err(error) => {
                self.store.restore_journal(journal)?;
                return Err(error);
            }
        };

        let mut summary = FlushSummary::default();
        for index in 0..pending.len() {
            let step = &mut pending[index];
            let outcome = step
                .query
                .prepare(&mut self.connection)
                .and_then(|mut statement| statement.execute());
            if let Err(error) = outcome {
                warn!(id = step.id, prototype = %step.prototype, %error, "flush failed");
                self.store.restore_journal(unwritten(&pending[index..]))?;
                return Err(error.into());
            }
            match step.change {
                Change::Insert => summary.inserted += 1,
                Change::Update => summary.updated += 1,
                Change::Delete => summary.deleted += 1,
            }
        }
        info!(
            inserted = summary.inserted,
            updated = summary.updated,
            deleted = summary.deleted,
            "flushed session"
        );
        Ok(summary)
    }

    fn statements(&self, journal: &Journal) -> Result<Vec<Pending>> {
        let inner = self.store.read()?;
        let mut pending = Vec::new();

        for &id in &journal.inserted {
            let Some((proxy, prototype)) = stored(&inner, id)? else {
                continue;
            };
            let mut query = Query::new();
            query.insert_object(&prototype.schema, collect(&proxy)?)?;
            pending.push(Pending {
                id,
                prototype: prototype.name.clone(),
                change: Change::Insert,
                query,
            });
        }

        for &id in journal.modified.difference(&journal.inserted) {
            let Some((proxy, prototype)) = stored(&inner, id)? else {
                continue;
            };
            if prototype.schema.columns.iter().all(|c| c.identifier) {
                continue;
            }
            let mut query = Query::new();
            query
                .update_object(&prototype.schema, collect(&proxy)?)?
                .where_(col(prototype.identifier()).eq(id))?;
            pending.push(Pending {
                id,
                prototype: prototype.name.clone(),
                change: Change::Update,
                query,
            });
        }

        for (&id, name) in &journal.removed {
            let Some(prototype) = inner.prototypes.get(name) else {
                warn!(id, prototype = %name, "prototype detached before flush, skipping delete");
                continue;
            };
            let mut query = Query::new();
            query
                .delete(&prototype.name)?
                .where_(col(prototype.identifier()).eq(id))?;
            pending.push(Pending {
                id,
                prototype: prototype.name.clone(),
                change: Change::Delete,
                query,
            });
        }

        debug!(statements = pending.len(), "prepared flush");
        Ok(pending)
    }

    /// Reads every row of `T`'s table into the store.
    ///
    /// Rows whose id is already stored are not read again. Has-many fields
    /// are filled from their item tables. Pointers to objects that are not
    /// loaded yet stay placeholders.
    pub fn load<T: Persistent>(&mut self) -> Result<Vec<ObjectPtr<T>>> {
        let prototype = self
            .store
            .prototype_of::<T>()
            .ok_or_else(|| {
                StoreError::TypeNotRegistered(String::from(core::any::type_name::<T>()))
            })?;
        let rows = Query::new()
            .select_object(&prototype.schema)?
            .execute(&mut self.connection)?;

        let mut loaded = Vec::new();
        let mut owners: HashMap<ObjectId, Rc<dyn ErasedProxy>> = HashMap::new();
        {
            let mut inner = self.store.write()?;
            for row in rows {
                let id = row.read::<ObjectId>(prototype.identifier())?;
                if let Some(entry) = inner.objects.get(&id) {
                    if let Some(proxy) = downcast::<T>(Rc::clone(&entry.proxy)) {
                        loaded.push(ObjectPtr::from_proxy(proxy));
                    }
                    continue;
                }
                let mut object = T::default();
                let mut reader = RowReader::new(&row, &inner);
                object.visit_fields(&mut reader);
                reader.finish()?;

                let proxy = Rc::new(Proxy::new(object));
                let erased: Rc<dyn ErasedProxy> = Rc::clone(&proxy) as Rc<dyn ErasedProxy>;
                inner.adopt(&erased, id, &prototype.name, None);
                owners.insert(id, erased);
                loaded.push(ObjectPtr::from_proxy(proxy));
            }
        }

        for (field, table) in &prototype.relations {
            self.load_relation(&prototype, field, table, &owners)?;
        }
        info!(table = %prototype.name, objects = loaded.len(), "loaded table");
        Ok(loaded)
    }

    fn load_relation(
        &mut self,
        owner: &Prototype,
        field: &str,
        table: &str,
        owners: &HashMap<ObjectId, Rc<dyn ErasedProxy>>,
    ) -> Result<()> {
        let Some(prototype) = self.store.prototype(table) else {
            return Ok(());
        };
        let owner_field = owner_column(&owner.name);
        let rows: Vec<Row> = Query::new()
            .select_object(&prototype.schema)?
            .execute(&mut self.connection)?
            .collect();

        let mut inner = self.store.write()?;
        let mut loader = RelationLoader {
            field,
            table,
            owner_field: &owner_field,
            owner: 0,
            item: None,
            store: &mut *inner,
            error: None,
        };
        for (&id, proxy) in owners {
            loader.owner = id;
            loader.run(proxy)?;
        }
        for row in &rows {
            let owner = row.read::<ObjectId>(&owner_field)?;
            let item = row.read::<ObjectId>(prototype.identifier())?;
            let Some(proxy) = owners.get(&owner) else {
                continue;
            };
            if loader.store.objects.contains_key(&item) {
                continue;
            }
            loader.owner = owner;
            loader.item = Some((item, row));
            loader.run(proxy)?;
        }
        Ok(())
    }
}

/// Attaches one has-many field of a loaded owner and restores an item row
/// into it.
struct RelationLoader<'a, 'r> {
    field: &'a str,
    table: &'a str,
    owner_field: &'a str,
    owner: ObjectId,
    item: Option<(ObjectId, &'r Row)>,
    store: &'a mut StoreInner,
    error: Option<StoreError>,
}

impl RelationLoader<'_, '_> {
    fn run(&mut self, owner: &Rc<dyn ErasedProxy>) -> Result<()> {
        owner.visit(self)?;
        self.item = None;
        self.error.take().map_or(Ok(()), Err)
    }

    fn apply(&mut self, relation: &mut dyn RelationField) -> Result<()> {
        if relation.owner() != Some(self.owner) {
            relation.attach(self.store.handle(), self.owner, self.table, self.owner_field)?;
        }
        let Some((id, row)) = self.item else {
            return Ok(());
        };
        let item = relation.new_item();
        let mut reader = RowReader::new(row, &*self.store);
        item.visit(&mut reader)?;
        reader.finish()?;
        self.store.adopt(&item, id, self.table, Some(self.owner));
        relation.restore(item)
    }
}

impl FieldVisitor for RelationLoader<'_, '_> {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        let Field::Relation(relation) = field else {
            return;
        };
        if name != self.field || self.error.is_some() {
            return;
        }
        if let Err(error) = self.apply(relation) {
            self.error = Some(error);
        }
    }
}

fn stored<'i>(
    inner: &'i StoreInner,
    id: ObjectId,
) -> Result<Option<(Rc<dyn ErasedProxy>, &'i Prototype)>> {
    let Some(entry) = inner.objects.get(&id) else {
        return Ok(None);
    };
    let prototype = inner
        .prototypes
        .get(&entry.prototype)
        .ok_or_else(|| StoreError::PrototypeNotFound(entry.prototype.clone()))?;
    Ok(Some((Rc::clone(&entry.proxy), prototype)))
}

fn collect(proxy: &Rc<dyn ErasedProxy>) -> Result<Vec<SqlValue>> {
    let mut collector = ValueCollector::default();
    proxy.visit(&mut collector)?;
    Ok(collector.values)
}

fn unwritten(pending: &[Pending]) -> Journal {
    let mut journal = Journal::default();
    for step in pending {
        match step.change {
            Change::Insert => {
                journal.inserted.insert(step.id);
            }
            Change::Update => {
                journal.modified.insert(step.id);
            }
            Change::Delete => {
                journal.removed.insert(step.id, step.prototype.clone());
            }
        }
    }
    journal
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
