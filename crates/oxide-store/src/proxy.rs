//! Object proxies.
//!
//! A proxy is the identity cell of one object: it owns the object value and
//! carries the store id, the pointer and reference counters, and a handle to
//! the store it is registered in.

use core::any::{Any, TypeId};
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;
use std::rc::Rc;

use crate::error::{Result, StoreError};
use crate::field::{FieldVisitor, Persistent};
use crate::store::StoreHandle;

/// Store-assigned object id; 0 means not inserted yet.
pub type ObjectId = u64;

/// Identity and lifetime cell for one object.
pub struct Proxy<T> {
    id: Cell<ObjectId>,
    object: RefCell<Option<T>>,
    pointers: Cell<usize>,
    references: Cell<usize>,
    store: RefCell<StoreHandle>,
}

impl<T: Persistent> Proxy<T> {
    /// Wraps a detached object.
    #[must_use]
    pub fn new(object: T) -> Self {
        Self {
            id: Cell::new(0),
            object: RefCell::new(Some(object)),
            pointers: Cell::new(0),
            references: Cell::new(0),
            store: RefCell::new(StoreHandle::default()),
        }
    }

    /// An unresolved proxy that only knows the id of its object.
    #[must_use]
    pub fn placeholder(id: ObjectId) -> Self {
        Self {
            id: Cell::new(id),
            object: RefCell::new(None),
            pointers: Cell::new(0),
            references: Cell::new(0),
            store: RefCell::new(StoreHandle::default()),
        }
    }

    pub(crate) fn borrow(&self) -> Option<Ref<'_, T>> {
        let object = self.object.try_borrow().ok()?;
        Ref::filter_map(object, Option::as_ref).ok()
    }

    pub(crate) fn borrow_mut(&self) -> Result<RefMut<'_, T>> {
        let object = self.object.try_borrow_mut().map_err(|_| StoreError::StoreBusy)?;
        RefMut::filter_map(object, Option::as_mut)
            .map_err(|_| StoreError::ObjectNotFound(self.id.get()))
    }

    pub(crate) fn store(&self) -> StoreHandle {
        self.store.borrow().clone()
    }
}

/// Type-erased proxy operations used by the store and its visitors.
pub trait ErasedProxy: Any {
    /// Store id, 0 before the first insert.
    fn id(&self) -> ObjectId;

    /// Sets the store id.
    fn set_id(&self, id: ObjectId);

    /// `TypeId` of the contained object type.
    fn object_type(&self) -> TypeId;

    /// Rust name of the contained object type.
    fn type_name(&self) -> &'static str;

    /// Number of owning pointer holders.
    fn pointers(&self) -> usize;

    /// Number of non-owning reference holders.
    fn references(&self) -> usize;

    /// Adds an owning holder.
    fn link_ptr(&self);

    /// Removes an owning holder.
    fn unlink_ptr(&self);

    /// Adds a non-owning holder.
    fn link_ref(&self);

    /// Removes a non-owning holder.
    fn unlink_ref(&self);

    /// Whether the proxy holds no object.
    fn is_placeholder(&self) -> bool;

    /// Whether the proxy is registered in a live store.
    fn is_inserted(&self) -> bool;

    /// Binds the proxy to a store, or unbinds it with a detached handle.
    fn bind(&self, store: StoreHandle);

    /// Visits the fields of the contained object.
    ///
    /// Placeholders have no fields. Fails with [`StoreError::StoreBusy`]
    /// while the object is borrowed.
    fn visit(&self, visitor: &mut dyn FieldVisitor) -> Result<()>;

    /// Converts into `Rc<dyn Any>` for downcasting.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Persistent> ErasedProxy for Proxy<T> {
    fn id(&self) -> ObjectId {
        self.id.get()
    }

    fn set_id(&self, id: ObjectId) {
        self.id.set(id);
    }

    fn object_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn pointers(&self) -> usize {
        self.pointers.get()
    }

    fn references(&self) -> usize {
        self.references.get()
    }

    fn link_ptr(&self) {
        self.pointers.set(self.pointers.get() + 1);
    }

    fn unlink_ptr(&self) {
        self.pointers.set(self.pointers.get().saturating_sub(1));
    }

    fn link_ref(&self) {
        self.references.set(self.references.get() + 1);
    }

    fn unlink_ref(&self) {
        self.references.set(self.references.get().saturating_sub(1));
    }

    fn is_placeholder(&self) -> bool {
        self.object.try_borrow().is_ok_and(|o| o.is_none())
    }

    fn is_inserted(&self) -> bool {
        self.id.get() != 0 && self.store.borrow().is_alive()
    }

    fn bind(&self, store: StoreHandle) {
        *self.store.borrow_mut() = store;
    }

    fn visit(&self, visitor: &mut dyn FieldVisitor) -> Result<()> {
        let mut object = self.object.try_borrow_mut().map_err(|_| StoreError::StoreBusy)?;
        if let Some(object) = object.as_mut() {
            object.visit_fields(visitor);
        }
        Ok(())
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<T> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("id", &self.id.get())
            .field("pointers", &self.pointers.get())
            .field("references", &self.references.get())
            .finish_non_exhaustive()
    }
}

/// Identity of a proxy allocation, used for visited sets.
pub(crate) fn address(proxy: &Rc<dyn ErasedProxy>) -> usize {
    Rc::as_ptr(proxy).cast::<()>() as usize
}

/// Downcasts an erased proxy to its concrete type.
pub(crate) fn downcast<T: Persistent>(proxy: Rc<dyn ErasedProxy>) -> Option<Rc<Proxy<T>>> {
    proxy.into_any().downcast::<Proxy<T>>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Identifier};

    #[derive(Debug, Default)]
    struct Note {
        id: Identifier,
        text: String,
    }

    impl Persistent for Note {
        fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) {
            visitor.visit("id", crate::Attribute::field(&mut self.id));
            visitor.visit("text", crate::Attribute::field(&mut self.text));
        }
    }

    struct Names(Vec<String>);

    impl FieldVisitor for Names {
        fn visit(&mut self, name: &str, _field: Field<'_>) {
            self.0.push(String::from(name));
        }
    }

    #[test]
    fn test_counters() {
        let proxy = Proxy::new(Note::default());
        proxy.link_ptr();
        proxy.link_ref();
        proxy.link_ref();
        proxy.unlink_ptr();
        proxy.unlink_ptr();
        assert_eq!(proxy.pointers(), 0);
        assert_eq!(proxy.references(), 2);
        assert!(!proxy.is_inserted());
    }

    #[test]
    fn test_placeholder_has_no_fields() {
        let proxy: Proxy<Note> = Proxy::placeholder(9);
        assert!(proxy.is_placeholder());
        assert_eq!(proxy.id(), 9);
        let mut names = Names(Vec::new());
        proxy.visit(&mut names).unwrap();
        assert!(names.0.is_empty());
    }

    #[test]
    fn test_visit_while_borrowed_is_busy() {
        let proxy = Proxy::new(Note {
            text: String::from("hi"),
            ..Note::default()
        });
        let mut names = Names(Vec::new());
        proxy.visit(&mut names).unwrap();
        assert_eq!(names.0, ["id", "text"]);

        let _guard = proxy.borrow_mut().unwrap();
        assert_eq!(proxy.visit(&mut names), Err(StoreError::StoreBusy));
    }

    #[test]
    fn test_downcast() {
        let proxy: Rc<dyn ErasedProxy> = Rc::new(Proxy::new(Note::default()));
        assert_eq!(proxy.object_type(), TypeId::of::<Note>());
        assert!(downcast::<Note>(proxy).is_some());
    }
}
