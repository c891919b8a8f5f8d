//! Object holders: owning [`ObjectPtr`] and non-owning [`ObjectRef`].
//!
//! A holder becomes *internal* once the inserter has counted it on its
//! target proxy. Internal holders give their count back when dropped or when
//! the object holding them is removed from the store.

use core::any::TypeId;
use core::cell::Ref;
use core::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::error::{Result, StoreError};
use crate::field::{Attribute, Field, Persistent};
use crate::proxy::{downcast, ErasedProxy, ObjectId, Proxy};

/// Whether a holder owns its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderKind {
    /// Owning; blocks removal of the target.
    Pointer,
    /// Non-owning; counted for diagnostics only.
    Reference,
}

/// Type-erased access to a holder field.
pub trait ObjectHolder {
    /// Owning or non-owning.
    fn kind(&self) -> HolderKind;

    /// The target proxy, if any.
    fn target(&self) -> Option<Rc<dyn ErasedProxy>>;

    /// Id of the target, 0 for null or detached targets.
    fn target_id(&self) -> ObjectId;

    /// `TypeId` of the target object type.
    fn target_type(&self) -> TypeId;

    /// Whether this holder is counted on its target.
    fn is_internal(&self) -> bool;

    /// Marks the holder as counted or not.
    fn set_internal(&mut self, internal: bool);

    /// Points the holder at a loaded proxy, or at a placeholder carrying
    /// `id` when no proxy is given.
    fn resolve(&mut self, target: Option<Rc<dyn ErasedProxy>>, id: ObjectId);
}

/// Owning pointer to a stored object.
pub struct ObjectPtr<T: Persistent> {
    proxy: Option<Rc<Proxy<T>>>,
    internal: bool,
}

impl<T: Persistent> ObjectPtr<T> {
    /// Wraps a detached object.
    #[must_use]
    pub fn new(object: T) -> Self {
        Self::from_proxy(Rc::new(Proxy::new(object)))
    }

    /// A pointer to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            proxy: None,
            internal: false,
        }
    }

    pub(crate) const fn from_proxy(proxy: Rc<Proxy<T>>) -> Self {
        Self {
            proxy: Some(proxy),
            internal: false,
        }
    }

    /// Returns `true` for a null pointer.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.proxy.is_none()
    }

    /// Store id of the target, 0 when null or not inserted.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.proxy.as_ref().map_or(0, |p| p.id())
    }

    /// Whether the target is registered in a store.
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        self.proxy.as_ref().is_some_and(|p| p.is_inserted())
    }

    /// Whether the target is an unresolved placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.proxy.as_ref().is_some_and(|p| p.is_placeholder())
    }

    /// Number of owning holders counted on the target.
    #[must_use]
    pub fn pointers(&self) -> usize {
        self.proxy.as_ref().map_or(0, |p| p.pointers())
    }

    /// Number of non-owning holders counted on the target.
    #[must_use]
    pub fn references(&self) -> usize {
        self.proxy.as_ref().map_or(0, |p| p.references())
    }

    /// Borrows the target object.
    ///
    /// `None` for null pointers, placeholders, and objects currently being
    /// modified.
    #[must_use]
    pub fn get(&self) -> Option<Ref<'_, T>> {
        self.proxy.as_ref()?.borrow()
    }

    /// Mutates the target object.
    ///
    /// When the object is stored, the store picks up new nested objects and
    /// marks the object modified afterwards.
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let proxy = self.proxy.as_ref().ok_or(StoreError::ObjectNotFound(0))?;
        let result = {
            let mut object = proxy.borrow_mut()?;
            f(&mut object)
        };
        if proxy.is_inserted() {
            proxy.store().refresh(Rc::clone(proxy) as Rc<dyn ErasedProxy>)?;
        }
        Ok(result)
    }

    /// Returns `true` if both point at the same proxy, or both are null.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.proxy, &other.proxy) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn erased(&self) -> Option<Rc<dyn ErasedProxy>> {
        self.proxy.as_ref().map(|p| Rc::clone(p) as Rc<dyn ErasedProxy>)
    }
}

impl<T: Persistent> Default for ObjectPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Clones are external holders; they are not counted on the target.
impl<T: Persistent> Clone for ObjectPtr<T> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            internal: false,
        }
    }
}

impl<T: Persistent> PartialEq for ObjectPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: Persistent> Drop for ObjectPtr<T> {
    fn drop(&mut self) {
        if self.internal {
            if let Some(proxy) = &self.proxy {
                proxy.unlink_ptr();
            }
        }
    }
}

impl<T: Persistent> fmt::Debug for ObjectPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPtr")
            .field("id", &self.id())
            .field("internal", &self.internal)
            .finish()
    }
}

impl<T: Persistent> ObjectHolder for ObjectPtr<T> {
    fn kind(&self) -> HolderKind {
        HolderKind::Pointer
    }

    fn target(&self) -> Option<Rc<dyn ErasedProxy>> {
        self.erased()
    }

    fn target_id(&self) -> ObjectId {
        self.id()
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn is_internal(&self) -> bool {
        self.internal
    }

    fn set_internal(&mut self, internal: bool) {
        self.internal = internal;
    }

    fn resolve(&mut self, target: Option<Rc<dyn ErasedProxy>>, id: ObjectId) {
        let replacement = match target.and_then(downcast::<T>) {
            Some(proxy) => Self::from_proxy(proxy),
            None if id == 0 => Self::null(),
            None => {
                warn!(
                    id,
                    target = core::any::type_name::<T>(),
                    "unresolved pointer, keeping placeholder"
                );
                Self::from_proxy(Rc::new(Proxy::placeholder(id)))
            }
        };
        *self = replacement;
    }
}

impl<T: Persistent> Attribute for ObjectPtr<T> {
    fn field(&mut self) -> Field<'_> {
        Field::Object(self)
    }
}

/// Non-owning reference to a stored object.
///
/// Never blocks removal of its target. Once the target is gone the
/// reference keeps only the id.
pub struct ObjectRef<T: Persistent> {
    target: Weak<Proxy<T>>,
    id: ObjectId,
    internal: bool,
}

impl<T: Persistent> ObjectRef<T> {
    /// Refers to the target of a pointer.
    #[must_use]
    pub fn new(ptr: &ObjectPtr<T>) -> Self {
        Self {
            target: ptr.proxy.as_ref().map_or_else(Weak::new, Rc::downgrade),
            id: ptr.id(),
            internal: false,
        }
    }

    /// A reference to nothing.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            target: Weak::new(),
            id: 0,
            internal: false,
        }
    }

    /// Id of the target.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.target.upgrade().map_or(self.id, |p| p.id())
    }

    /// Returns an external pointer to the target while it is alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectPtr<T>> {
        self.target.upgrade().map(ObjectPtr::from_proxy)
    }

    /// Whether the target has been dropped or was never set.
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        self.target.strong_count() == 0
    }
}

impl<T: Persistent> Default for ObjectRef<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Persistent> Clone for ObjectRef<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            id: self.id,
            internal: false,
        }
    }
}

impl<T: Persistent> Drop for ObjectRef<T> {
    fn drop(&mut self) {
        if self.internal {
            if let Some(proxy) = self.target.upgrade() {
                proxy.unlink_ref();
            }
        }
    }
}

impl<T: Persistent> fmt::Debug for ObjectRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.id())
            .field("dangling", &self.is_dangling())
            .finish()
    }
}

impl<T: Persistent> ObjectHolder for ObjectRef<T> {
    fn kind(&self) -> HolderKind {
        HolderKind::Reference
    }

    fn target(&self) -> Option<Rc<dyn ErasedProxy>> {
        self.target.upgrade().map(|p| p as Rc<dyn ErasedProxy>)
    }

    fn target_id(&self) -> ObjectId {
        self.id()
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn is_internal(&self) -> bool {
        self.internal
    }

    fn set_internal(&mut self, internal: bool) {
        self.internal = internal;
    }

    fn resolve(&mut self, target: Option<Rc<dyn ErasedProxy>>, id: ObjectId) {
        let target = target.and_then(downcast::<T>);
        if target.is_none() && id != 0 {
            warn!(id, target = core::any::type_name::<T>(), "unresolved reference");
        }
        *self = Self {
            target: target.as_ref().map_or_else(Weak::new, Rc::downgrade),
            id,
            internal: false,
        };
    }
}

impl<T: Persistent> Attribute for ObjectRef<T> {
    fn field(&mut self) -> Field<'_> {
        Field::Object(self)
    }
}
