//! Has-many relation containers.
//!
//! A [`HasMany`] holds its elements as relation items, each a stored object
//! of its own that pairs the owner id with one value. Two storages back it:
//! [`VectorStorage`] for random access and [`ListStorage`] for positions that
//! survive mutation.
//!
//! Once the owner is stored, every insert and erase is mirrored into the
//! store before the local sequence changes, and marks the owner modified.

mod list;
mod vector;

use core::cell::Ref;
use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

use oxide_store_sql::TableSchema;
use tracing::trace;

pub use list::{ListPosition, ListStorage};
pub use vector::VectorStorage;

use crate::error::{Result, StoreError};
use crate::field::{Attribute, Field, FieldVisitor, Identifier, Persistent};
use crate::prototype::{SchemaBuilder, ITEM_COLUMN};
use crate::proxy::{downcast, ErasedProxy, ObjectId, Proxy};
use crate::store::StoreHandle;

/// Stored link between an owner and one value of a has-many field.
#[derive(Debug, Default)]
pub struct RelationItem<T> {
    id: Identifier,
    owner: ObjectId,
    value: T,
    owner_field: String,
    item_field: String,
}

impl<T> RelationItem<T> {
    fn new(value: T, owner: ObjectId, owner_field: &str) -> Self {
        Self {
            id: Identifier::default(),
            owner,
            value,
            owner_field: String::from(owner_field),
            item_field: String::from(ITEM_COLUMN),
        }
    }

    /// Id of the owning object.
    #[must_use]
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// The related value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Names of the owner and value columns.
    #[must_use]
    pub fn fields(&self) -> (&str, &str) {
        (&self.owner_field, &self.item_field)
    }
}

impl<T: Attribute + Default + 'static> Persistent for RelationItem<T> {
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) {
        visitor.visit("id", self.id.field());
        visitor.visit(&self.owner_field, Field::Scalar(&mut self.owner));
        visitor.visit(&self.item_field, self.value.field());
    }
}

/// Shared proxy of one relation item.
pub type ItemProxy<T> = Rc<Proxy<RelationItem<T>>>;

/// Sequence operations a has-many storage provides.
pub trait RelationStorage<T>: Default {
    /// Element position.
    type Position: Copy + Eq + fmt::Debug;

    /// Position of the first element.
    fn begin(&self) -> Self::Position;

    /// Position one past the last element.
    fn end(&self) -> Self::Position;

    /// Position after `position`.
    fn next(&self, position: Self::Position) -> Self::Position;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a position.
    fn get(&self, position: Self::Position) -> Option<&ItemProxy<T>>;

    /// Checks that an element can be inserted before `position`.
    fn check_insert(&self, position: Self::Position) -> Result<()>;

    /// Inserts before a position accepted by [`RelationStorage::check_insert`]
    /// and returns the position of the new element.
    fn insert_before(&mut self, position: Self::Position, item: ItemProxy<T>) -> Self::Position;

    /// Removes the element at `position`, returning it and the position that
    /// follows.
    fn remove(&mut self, position: Self::Position) -> Option<(ItemProxy<T>, Self::Position)>;

    /// Removes `[first, last)` in forward order, calling `before_remove` for
    /// each element first and stopping at its first error.
    fn erase_range(
        &mut self,
        first: Self::Position,
        last: Self::Position,
        before_remove: impl FnMut(&ItemProxy<T>) -> Result<()>,
    ) -> Result<Self::Position>;

    /// Elements in order.
    fn iter(&self) -> Box<dyn Iterator<Item = &ItemProxy<T>> + '_>;

    /// Appends without any checks.
    fn push_back(&mut self, item: ItemProxy<T>);
}

/// Type-erased access to a has-many field.
pub trait RelationField {
    /// Layout of the item table.
    fn item_schema(&self, table: &str, owner_field: &str) -> TableSchema;

    /// Binds the container to a stored owner.
    fn attach(
        &mut self,
        store: StoreHandle,
        owner: ObjectId,
        prototype: &str,
        owner_field: &str,
    ) -> Result<()>;

    /// Drops the binding; elements stay in the container.
    fn detach(&mut self);

    /// Id of the owner the container is bound to.
    fn owner(&self) -> Option<ObjectId>;

    /// Item proxies in order.
    fn items(&self) -> Vec<Rc<dyn ErasedProxy>>;

    /// A fresh, detached item proxy for loading a row into.
    fn new_item(&self) -> Rc<dyn ErasedProxy>;

    /// Appends a loaded item without mirroring it into the store.
    fn restore(&mut self, item: Rc<dyn ErasedProxy>) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Attachment {
    store: StoreHandle,
    owner: ObjectId,
    prototype: String,
    owner_field: String,
}

enum Mirror {
    Insert(Rc<dyn ErasedProxy>),
    Remove(Rc<dyn ErasedProxy>),
}

/// Applies one element change to the store, then marks the owner modified.
fn mirror(attachment: Option<&Attachment>, change: Mirror) -> Result<()> {
    let Some(attachment) = attachment else {
        return Ok(());
    };
    let Some(store) = attachment.store.upgrade() else {
        return Ok(());
    };
    let mut store = store.try_borrow_mut().map_err(|_| StoreError::StoreBusy)?;
    match change {
        Mirror::Insert(item) => {
            trace!(
                owner = attachment.owner,
                prototype = %attachment.prototype,
                "mirroring relation insert"
            );
            store.insert(item, Some(attachment.prototype.as_str()), Some(attachment.owner))?;
        }
        Mirror::Remove(item) => {
            trace!(owner = attachment.owner, item = item.id(), "mirroring relation erase");
            store.remove(&item)?;
        }
    }
    store.mark_modified(attachment.owner);
    Ok(())
}

/// A has-many field.
///
/// ```rust
/// use oxide_store::{HasMany, Identifier, ObjectStore, Persistent};
///
/// #[derive(Debug, Default, Persistent)]
/// struct Person {
///     id: Identifier,
///     nicknames: HasMany<String>,
/// }
///
/// let store = ObjectStore::new();
/// store.attach::<Person>("person")?;
///
/// let person = store.insert(Person::default())?;
/// person.modify(|p| p.nicknames.push(String::from("ada")))??;
/// assert_eq!(store.len(), 2);
/// # Ok::<(), oxide_store::StoreError>(())
/// ```
pub struct HasMany<T, S = VectorStorage<T>> {
    storage: S,
    attachment: Option<Attachment>,
    _item: PhantomData<T>,
}

/// Has-many backed by a list.
pub type HasManyList<T> = HasMany<T, ListStorage<T>>;

impl<T, S: Default> Default for HasMany<T, S> {
    fn default() -> Self {
        Self {
            storage: S::default(),
            attachment: None,
            _item: PhantomData,
        }
    }
}

impl<T, S> HasMany<T, S>
where
    T: Attribute + Default + 'static,
    S: RelationStorage<T>,
{
    /// An empty, unattached container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Whether the container is bound to a stored owner.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Position of the first element.
    #[must_use]
    pub fn begin(&self) -> S::Position {
        self.storage.begin()
    }

    /// Position one past the last element.
    #[must_use]
    pub fn end(&self) -> S::Position {
        self.storage.end()
    }

    /// Position after `position`.
    #[must_use]
    pub fn next(&self, position: S::Position) -> S::Position {
        self.storage.next(position)
    }

    /// Positions of all elements, in order.
    #[must_use]
    pub fn positions(&self) -> Vec<S::Position> {
        let mut positions = Vec::with_capacity(self.len());
        let mut position = self.begin();
        while position != self.end() {
            positions.push(position);
            position = self.next(position);
        }
        positions
    }

    /// Borrows the value at a position.
    #[must_use]
    pub fn get(&self, position: S::Position) -> Option<Ref<'_, T>> {
        self.storage.get(position).and_then(|item| value_of(item))
    }

    /// Store id of the item at a position.
    #[must_use]
    pub fn item_id(&self, position: S::Position) -> Option<ObjectId> {
        self.storage.get(position).map(|item| item.id())
    }

    /// Borrows every value in order.
    pub fn iter(&self) -> impl Iterator<Item = Ref<'_, T>> + '_ {
        self.storage.iter().filter_map(|item| value_of(item))
    }

    /// Appends a value.
    pub fn push(&mut self, value: T) -> Result<S::Position> {
        let end = self.end();
        self.insert(end, value)
    }

    /// Inserts a value before `position`.
    pub fn insert(&mut self, position: S::Position, value: T) -> Result<S::Position> {
        self.storage.check_insert(position)?;
        let item = self.wrap(value);
        mirror(self.attachment.as_ref(), Mirror::Insert(Rc::clone(&item) as Rc<dyn ErasedProxy>))?;
        Ok(self.storage.insert_before(position, item))
    }

    /// Erases the element at `position` and returns the following position.
    pub fn erase(&mut self, position: S::Position) -> Result<S::Position> {
        let len = self.storage.len();
        let missing = move || StoreError::InvalidPosition {
            position: format!("{position:?}"),
            len,
        };
        let item = self.storage.get(position).ok_or_else(missing)?;
        mirror(self.attachment.as_ref(), Mirror::Remove(Rc::clone(item) as Rc<dyn ErasedProxy>))?;
        self.storage.remove(position).map(|(_, next)| next).ok_or_else(missing)
    }

    /// Erases `[first, last)` one element at a time.
    ///
    /// Stops at the first element whose removal fails; elements erased
    /// before it stay erased.
    pub fn erase_range(&mut self, first: S::Position, last: S::Position) -> Result<S::Position> {
        let attachment = self.attachment.as_ref();
        self.storage.erase_range(first, last, |item| {
            mirror(attachment, Mirror::Remove(Rc::clone(item) as Rc<dyn ErasedProxy>))
        })
    }

    /// Erases every element.
    pub fn clear(&mut self) -> Result<()> {
        let (begin, end) = (self.begin(), self.end());
        self.erase_range(begin, end).map(|_| ())
    }

    fn wrap(&self, value: T) -> ItemProxy<T> {
        let item = match &self.attachment {
            Some(attachment) => RelationItem::new(value, attachment.owner, &attachment.owner_field),
            None => RelationItem::new(value, 0, "owner_id"),
        };
        Rc::new(Proxy::new(item))
    }
}

fn value_of<T: Attribute + Default + 'static>(item: &ItemProxy<T>) -> Option<Ref<'_, T>> {
    item.borrow().map(|item| Ref::map(item, |item| &item.value))
}

impl<T, S> RelationField for HasMany<T, S>
where
    T: Attribute + Default + 'static,
    S: RelationStorage<T>,
{
    fn item_schema(&self, table: &str, owner_field: &str) -> TableSchema {
        let mut builder = SchemaBuilder::new(table);
        RelationItem::<T>::new(T::default(), 0, owner_field).visit_fields(&mut builder);
        builder.into_schema()
    }

    fn attach(
        &mut self,
        store: StoreHandle,
        owner: ObjectId,
        prototype: &str,
        owner_field: &str,
    ) -> Result<()> {
        for item in self.storage.iter() {
            let mut item = item.borrow_mut()?;
            item.owner = owner;
            item.owner_field = String::from(owner_field);
        }
        self.attachment = Some(Attachment {
            store,
            owner,
            prototype: String::from(prototype),
            owner_field: String::from(owner_field),
        });
        Ok(())
    }

    fn detach(&mut self) {
        self.attachment = None;
    }

    fn owner(&self) -> Option<ObjectId> {
        self.attachment.as_ref().map(|a| a.owner)
    }

    fn items(&self) -> Vec<Rc<dyn ErasedProxy>> {
        self.storage
            .iter()
            .map(|item| Rc::clone(item) as Rc<dyn ErasedProxy>)
            .collect()
    }

    fn new_item(&self) -> Rc<dyn ErasedProxy> {
        let owner_field = self.attachment.as_ref().map_or("owner_id", |a| a.owner_field.as_str());
        Rc::new(Proxy::new(RelationItem::<T>::new(T::default(), 0, owner_field)))
    }

    fn restore(&mut self, item: Rc<dyn ErasedProxy>) -> Result<()> {
        let id = item.id();
        let item = downcast::<RelationItem<T>>(item).ok_or(StoreError::ObjectNotFound(id))?;
        self.storage.push_back(item);
        Ok(())
    }
}

impl<T, S> Attribute for HasMany<T, S>
where
    T: Attribute + Default + 'static,
    S: RelationStorage<T>,
{
    fn field(&mut self) -> Field<'_> {
        Field::Relation(self)
    }
}

impl<T, S: RelationStorage<T>> fmt::Debug for HasMany<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasMany")
            .field("len", &self.storage.len())
            .field("owner", &self.attachment.as_ref().map(|a| a.owner))
            .finish()
    }
}
