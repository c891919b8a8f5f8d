//! The object store.
//!
//! The store is an arena of proxies keyed by id. It assigns ids (never
//! reusing one for a different object), owns the prototype registry, and
//! keeps a journal of inserted, modified and removed objects for
//! [`crate::Session::flush`].

use core::any::TypeId;
use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::error::{Result, StoreError};
use crate::field::Persistent;
use crate::graph::{Deleter, Inserter, RemovalCheck, TypeCheck};
use crate::holder::ObjectPtr;
use crate::prototype::{Prototype, PrototypeRegistry};
use crate::proxy::{address, downcast, ErasedProxy, ObjectId};

/// Weak handle from proxies and relation containers back to their store.
#[derive(Clone, Default)]
pub struct StoreHandle(Weak<RefCell<StoreInner>>);

impl StoreHandle {
    pub(crate) fn upgrade(&self) -> Option<Rc<RefCell<StoreInner>>> {
        self.0.upgrade()
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Re-walks a stored object after it changed and marks it modified.
    pub(crate) fn refresh(&self, proxy: Rc<dyn ErasedProxy>) -> Result<()> {
        let Some(store) = self.upgrade() else {
            return Ok(());
        };
        let mut store = store.try_borrow_mut().map_err(|_| StoreError::StoreBusy)?;
        let id = proxy.id();
        store.insert(proxy, None, None)?;
        store.mark_modified(id);
        Ok(())
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Pending changes since the last flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    /// Objects registered since the last flush.
    pub inserted: BTreeSet<ObjectId>,
    /// Stored objects changed since the last flush.
    pub modified: BTreeSet<ObjectId>,
    /// Objects removed since the last flush, with their prototype name.
    pub removed: BTreeMap<ObjectId, String>,
}

impl Journal {
    /// Whether there is nothing to flush.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Folds older, unflushed changes back in under the newer ones.
    pub(crate) fn merge(&mut self, older: Self) {
        for (id, prototype) in older.removed {
            if self.inserted.remove(&id) {
                self.modified.insert(id);
            } else {
                self.removed.entry(id).or_insert(prototype);
            }
        }
        for id in older.inserted {
            if self.removed.remove(&id).is_none() {
                self.modified.remove(&id);
                self.inserted.insert(id);
            }
        }
        for id in older.modified {
            if !self.removed.contains_key(&id) && !self.inserted.contains(&id) {
                self.modified.insert(id);
            }
        }
    }
}

pub(crate) struct Entry {
    pub(crate) proxy: Rc<dyn ErasedProxy>,
    pub(crate) prototype: String,
    pub(crate) owner: Option<ObjectId>,
}

pub(crate) struct StoreInner {
    pub(crate) objects: BTreeMap<ObjectId, Entry>,
    pub(crate) prototypes: PrototypeRegistry,
    pub(crate) journal: Journal,
    released: HashMap<ObjectId, usize>,
    last_id: ObjectId,
    handle: StoreHandle,
}

impl StoreInner {
    fn new(handle: StoreHandle) -> Self {
        Self {
            objects: BTreeMap::new(),
            prototypes: PrototypeRegistry::default(),
            journal: Journal::default(),
            released: HashMap::new(),
            last_id: 0,
            handle,
        }
    }

    pub(crate) fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    /// Whether this store holds exactly this proxy.
    pub(crate) fn holds(&self, proxy: &Rc<dyn ErasedProxy>) -> bool {
        self.objects
            .get(&proxy.id())
            .is_some_and(|entry| address(&entry.proxy) == address(proxy))
    }

    fn prototype_for(&self, proxy: &Rc<dyn ErasedProxy>) -> Result<String> {
        if let Some(entry) = self.objects.get(&proxy.id()).filter(|_| self.holds(proxy)) {
            return Ok(entry.prototype.clone());
        }
        self.prototypes
            .name_of(proxy.object_type())
            .map(String::from)
            .ok_or_else(|| StoreError::TypeNotRegistered(String::from(proxy.type_name())))
    }

    /// Assigns an id and binds the proxy to this store.
    ///
    /// A proxy removed from this store earlier gets its old id back.
    pub(crate) fn register(
        &mut self,
        proxy: &Rc<dyn ErasedProxy>,
        prototype: &str,
        owner: Option<ObjectId>,
    ) -> ObjectId {
        let previous = proxy.id();
        let id = if previous != 0 && self.released.get(&previous) == Some(&address(proxy)) {
            self.released.remove(&previous);
            previous
        } else {
            self.last_id += 1;
            self.last_id
        };
        proxy.set_id(id);
        proxy.bind(self.handle());
        self.objects.insert(
            id,
            Entry {
                proxy: Rc::clone(proxy),
                prototype: String::from(prototype),
                owner,
            },
        );
        if self.journal.removed.remove(&id).is_some() {
            self.journal.modified.insert(id);
        } else {
            self.journal.inserted.insert(id);
        }
        trace!(id, prototype, "registered object");
        id
    }

    /// Registers an object read from the database under its stored id.
    pub(crate) fn adopt(
        &mut self,
        proxy: &Rc<dyn ErasedProxy>,
        id: ObjectId,
        prototype: &str,
        owner: Option<ObjectId>,
    ) {
        proxy.set_id(id);
        proxy.bind(self.handle());
        self.last_id = self.last_id.max(id);
        self.objects.insert(
            id,
            Entry {
                proxy: Rc::clone(proxy),
                prototype: String::from(prototype),
                owner,
            },
        );
        trace!(id, prototype, "adopted loaded object");
    }

    pub(crate) fn unregister(&mut self, id: ObjectId) -> Option<Entry> {
        let entry = self.objects.remove(&id)?;
        if !self.journal.inserted.remove(&id) {
            self.journal.removed.insert(id, entry.prototype.clone());
        }
        self.journal.modified.remove(&id);
        self.released.insert(id, address(&entry.proxy));
        entry.proxy.bind(StoreHandle::default());
        if let Some(owner) = entry.owner {
            self.mark_modified(owner);
        }
        Some(entry)
    }

    /// Marks an object and its chain of owners modified.
    pub(crate) fn mark_modified(&mut self, id: ObjectId) {
        let mut seen = BTreeSet::new();
        let mut next = Some(id);
        while let Some(id) = next {
            let Some(entry) = self.objects.get(&id) else {
                break;
            };
            if !seen.insert(id) {
                break;
            }
            if !self.journal.inserted.contains(&id) {
                self.journal.modified.insert(id);
            }
            next = entry.owner;
        }
    }

    /// Inserts an object graph rooted at `proxy`.
    ///
    /// Without an explicit prototype, the proxy's own entry or its type
    /// decides.
    pub(crate) fn insert(
        &mut self,
        proxy: Rc<dyn ErasedProxy>,
        prototype: Option<&str>,
        owner: Option<ObjectId>,
    ) -> Result<()> {
        let prototype = match prototype {
            Some(name) if self.prototypes.get(name).is_none() => {
                return Err(StoreError::PrototypeNotFound(String::from(name)));
            }
            Some(name) => String::from(name),
            None => self.prototype_for(&proxy)?,
        };
        TypeCheck::new(&self.prototypes).run(&proxy, &prototype)?;
        Inserter::new(self).insert(proxy, prototype, owner)?;
        if let Some(owner) = owner {
            self.mark_modified(owner);
        }
        Ok(())
    }

    pub(crate) fn remove(&mut self, proxy: &Rc<dyn ErasedProxy>) -> Result<()> {
        if !self.holds(proxy) {
            return Err(StoreError::ObjectNotFound(proxy.id()));
        }
        let owned = RemovalCheck::run(proxy)?;
        Deleter::new(self, owned).remove(Rc::clone(proxy))
    }
}

/// Id-indexed arena of object proxies with a prototype registry.
///
/// ```rust
/// use oxide_store::{Identifier, ObjectPtr, ObjectStore, Persistent, StoreError};
///
/// #[derive(Debug, Default, Persistent)]
/// struct Address {
///     id: Identifier,
///     street: String,
/// }
///
/// #[derive(Debug, Default, Persistent)]
/// struct Person {
///     id: Identifier,
///     address: ObjectPtr<Address>,
/// }
///
/// let store = ObjectStore::new();
/// store.attach::<Address>("address")?;
/// store.attach::<Person>("person")?;
///
/// let person = store.insert(Person {
///     address: ObjectPtr::new(Address::default()),
///     ..Person::default()
/// })?;
/// assert_eq!(store.len(), 2);
///
/// let address = person.get().unwrap().address.clone();
/// assert!(matches!(store.remove(&address), Err(StoreError::StillReferenced { .. })));
/// store.remove(&person)?;
/// assert!(!address.is_inserted());
/// assert!(store.is_empty());
/// # Ok::<(), StoreError>(())
/// ```
pub struct ObjectStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl ObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new_cyclic(|weak| RefCell::new(StoreInner::new(StoreHandle(weak.clone())))),
        }
    }

    pub(crate) fn write(&self) -> Result<RefMut<'_, StoreInner>> {
        self.inner.try_borrow_mut().map_err(|_| StoreError::StoreBusy)
    }

    pub(crate) fn read(&self) -> Result<Ref<'_, StoreInner>> {
        self.inner.try_borrow().map_err(|_| StoreError::StoreBusy)
    }

    /// Registers a prototype for `T` under a table name.
    pub fn attach<T: Persistent>(&self, name: &str) -> Result<()> {
        self.write()?.prototypes.attach::<T>(name, None)
    }

    /// Registers `T` as derived from the already registered `P`.
    pub fn attach_derived<T: Persistent, P: Persistent>(&self, name: &str) -> Result<()> {
        let mut inner = self.write()?;
        let parent = inner
            .prototypes
            .name_of(TypeId::of::<P>())
            .ok_or_else(|| {
                StoreError::TypeNotRegistered(String::from(core::any::type_name::<P>()))
            })?
            .to_owned();
        inner.prototypes.attach::<T>(name, Some(&parent))
    }

    /// Removes a prototype that has no objects and no derived prototypes.
    pub fn detach(&self, name: &str) -> Result<()> {
        let mut inner = self.write()?;
        let StoreInner {
            prototypes, objects, ..
        } = &mut *inner;
        prototypes.detach(name, |prototype| objects.values().any(|e| e.prototype == prototype))
    }

    /// Looks up a prototype by name.
    #[must_use]
    pub fn prototype(&self, name: &str) -> Option<Prototype> {
        self.read().ok()?.prototypes.get(name).cloned()
    }

    /// Looks up the prototype registered for `T`.
    #[must_use]
    pub fn prototype_of<T: Persistent>(&self) -> Option<Prototype> {
        let inner = self.read().ok()?;
        let name = inner.prototypes.name_of(TypeId::of::<T>())?;
        inner.prototypes.get(name).cloned()
    }

    /// All prototypes in registration order.
    #[must_use]
    pub fn prototypes(&self) -> Vec<Prototype> {
        self.read().map(|inner| inner.prototypes.all().to_vec()).unwrap_or_default()
    }

    /// Names of the prototypes derived from `name`.
    #[must_use]
    pub fn children(&self, name: &str) -> Vec<String> {
        self.read().map(|inner| inner.prototypes.children(name)).unwrap_or_default()
    }

    /// Inserts an object and everything it owns.
    pub fn insert<T: Persistent>(&self, object: T) -> Result<ObjectPtr<T>> {
        let ptr = ObjectPtr::new(object);
        self.insert_ptr(&ptr)?;
        Ok(ptr)
    }

    /// Inserts the object behind an existing pointer.
    ///
    /// Inserting an object that is already stored registers whatever new
    /// objects it has picked up since.
    pub fn insert_ptr<T: Persistent>(&self, ptr: &ObjectPtr<T>) -> Result<()> {
        let proxy = ptr.erased().ok_or(StoreError::ObjectNotFound(0))?;
        self.write()?.insert(proxy, None, None)?;
        debug!(id = ptr.id(), "inserted object");
        Ok(())
    }

    /// Removes an object, the relation items it owns and the objects it is
    /// the only pointer to.
    ///
    /// Fails with [`StoreError::StillReferenced`] while other stored objects
    /// point at it, or while an object it would take along is referenced.
    /// Nothing changes on failure.
    pub fn remove<T: Persistent>(&self, ptr: &ObjectPtr<T>) -> Result<()> {
        let proxy = ptr.erased().ok_or(StoreError::ObjectNotFound(0))?;
        self.write()?.remove(&proxy)
    }

    /// Returns the object with this id if it is a `T`.
    #[must_use]
    pub fn get<T: Persistent>(&self, id: ObjectId) -> Option<ObjectPtr<T>> {
        let proxy = Rc::clone(&self.read().ok()?.objects.get(&id)?.proxy);
        downcast::<T>(proxy).map(ObjectPtr::from_proxy)
    }

    /// Whether an object with this id is stored.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.read().is_ok_and(|inner| inner.objects.contains_key(&id))
    }

    /// Number of stored objects, relation items included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().map_or(0, |inner| inner.objects.len())
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of all stored objects in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ObjectId> {
        self.read().map(|inner| inner.objects.keys().copied().collect()).unwrap_or_default()
    }

    /// Number of objects stored under a prototype.
    #[must_use]
    pub fn count(&self, prototype: &str) -> usize {
        self.read()
            .map_or(0, |inner| inner.objects.values().filter(|e| e.prototype == prototype).count())
    }

    /// Counts an additional owning holder on the target.
    pub fn link_ptr<T: Persistent>(&self, ptr: &ObjectPtr<T>) {
        if let Some(proxy) = ptr.erased() {
            proxy.link_ptr();
        }
    }

    /// Gives back an owning holder count. Never removes the target.
    pub fn unlink_ptr<T: Persistent>(&self, ptr: &ObjectPtr<T>) {
        if let Some(proxy) = ptr.erased() {
            proxy.unlink_ptr();
        }
    }

    /// Counts an additional non-owning holder on the target.
    pub fn link_ref<T: Persistent>(&self, ptr: &ObjectPtr<T>) {
        if let Some(proxy) = ptr.erased() {
            proxy.link_ref();
        }
    }

    /// Gives back a non-owning holder count.
    pub fn unlink_ref<T: Persistent>(&self, ptr: &ObjectPtr<T>) {
        if let Some(proxy) = ptr.erased() {
            proxy.unlink_ref();
        }
    }

    /// Marks a stored object, and its owners, modified.
    pub fn mark_modified(&self, id: ObjectId) -> Result<()> {
        let mut inner = self.write()?;
        if !inner.objects.contains_key(&id) {
            return Err(StoreError::ObjectNotFound(id));
        }
        inner.mark_modified(id);
        Ok(())
    }

    /// Pending changes.
    #[must_use]
    pub fn journal(&self) -> Journal {
        self.read().map(|inner| inner.journal.clone()).unwrap_or_default()
    }

    pub(crate) fn take_journal(&self) -> Result<Journal> {
        Ok(core::mem::take(&mut self.write()?.journal))
    }

    pub(crate) fn restore_journal(&self, journal: Journal) -> Result<()> {
        self.write()?.journal.merge(journal);
        Ok(())
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("objects", &self.len())
            .field("prototypes", &self.prototypes().len())
            .finish()
    }
}
