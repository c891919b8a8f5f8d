//! Object graph traversal: the inserter and the deleter.
//!
//! Both walk an object's fields. The inserter registers not-yet-stored
//! objects reachable through pointers and relation containers, depth first
//! and pre-order, and counts every holder it passes on its target. The
//! deleter gives those counts back. It removes relation items with their
//! owner, and pointees whose only pointer was the removed object.
//!
//! Each walk is preceded by a read-only check pass so that lookup errors
//! and blocked removals surface before anything changes.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{Result, StoreError};
use crate::field::{Field, FieldVisitor};
use crate::holder::{HolderKind, ObjectHolder};
use crate::prototype::{owner_column, relation_table, PrototypeRegistry};
use crate::proxy::{address, ErasedProxy, ObjectId};
use crate::relation::RelationField;
use crate::store::StoreInner;

/// Verifies that every object an insert would register has a prototype.
pub(crate) struct TypeCheck<'s> {
    registry: &'s PrototypeRegistry,
    visited: HashSet<usize>,
    prototypes: Vec<String>,
    error: Option<StoreError>,
}

impl<'s> TypeCheck<'s> {
    pub(crate) fn new(registry: &'s PrototypeRegistry) -> Self {
        Self {
            registry,
            visited: HashSet::new(),
            prototypes: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn run(mut self, root: &Rc<dyn ErasedProxy>, prototype: &str) -> Result<()> {
        self.visited.insert(address(root));
        self.descend(root, prototype)?;
        self.error.map_or(Ok(()), Err)
    }

    fn descend(&mut self, proxy: &Rc<dyn ErasedProxy>, prototype: &str) -> Result<()> {
        self.prototypes.push(String::from(prototype));
        let visited = proxy.visit(self);
        self.prototypes.pop();
        visited
    }

    fn pointee(&mut self, target: &Rc<dyn ErasedProxy>) -> Result<()> {
        if !self.visited.insert(address(target))
            || target.is_inserted()
            || target.is_placeholder()
        {
            return Ok(());
        }
        let prototype = self
            .registry
            .name_of(target.object_type())
            .ok_or_else(|| StoreError::TypeNotRegistered(String::from(target.type_name())))?
            .to_owned();
        self.descend(target, &prototype)
    }

    fn relation(&mut self, name: &str, relation: &dyn RelationField) -> Result<()> {
        let Some(owner) = self.prototypes.last() else {
            return Ok(());
        };
        let prototype = relation_table(owner, name);
        if self.registry.get(&prototype).is_none() {
            return Err(StoreError::PrototypeNotFound(prototype));
        }
        for item in relation.items() {
            if self.visited.insert(address(&item)) {
                self.descend(&item, &prototype)?;
            }
        }
        Ok(())
    }
}

impl FieldVisitor for TypeCheck<'_> {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        if self.error.is_some() {
            return;
        }
        let outcome = match field {
            Field::Object(holder) if holder.kind() == HolderKind::Pointer => {
                holder.target().map_or(Ok(()), |target| self.pointee(&target))
            }
            Field::Relation(relation) => self.relation(name, relation),
            _ => Ok(()),
        };
        if let Err(error) = outcome {
            self.error = Some(error);
        }
    }
}

/// Registers an object graph in the store.
pub(crate) struct Inserter<'s> {
    store: &'s mut StoreInner,
    visited: HashSet<usize>,
    owners: Vec<(ObjectId, String)>,
    error: Option<StoreError>,
}

impl<'s> Inserter<'s> {
    pub(crate) fn new(store: &'s mut StoreInner) -> Self {
        Self {
            store,
            visited: HashSet::new(),
            owners: Vec::new(),
            error: None,
        }
    }

    /// Registers `proxy` unless this store already holds it, then walks its
    /// fields.
    pub(crate) fn insert(
        &mut self,
        proxy: Rc<dyn ErasedProxy>,
        prototype: String,
        owner: Option<ObjectId>,
    ) -> Result<()> {
        if !self.visited.insert(address(&proxy)) {
            return Ok(());
        }
        let id = if self.store.holds(&proxy) {
            proxy.id()
        } else {
            self.store.register(&proxy, &prototype, owner)
        };
        self.owners.push((id, prototype));
        let visited = proxy.visit(self);
        self.owners.pop();
        visited?;
        self.error.take().map_or(Ok(()), Err)
    }

    fn object(&mut self, current: ObjectId, holder: &mut dyn ObjectHolder) -> Result<()> {
        if holder.is_internal() {
            return Ok(());
        }
        let Some(target) = holder.target() else {
            return Ok(());
        };
        match holder.kind() {
            HolderKind::Pointer => {
                if target.is_placeholder() {
                    warn!(id = target.id(), "skipping unresolved pointer");
                    return Ok(());
                }
                if !target.is_inserted() {
                    let prototype = self
                        .store
                        .prototypes
                        .name_of(target.object_type())
                        .ok_or_else(|| {
                            StoreError::TypeNotRegistered(String::from(target.type_name()))
                        })?
                        .to_owned();
                    trace!(owner = current, prototype = %prototype, "cascading insert");
                    self.insert(Rc::clone(&target), prototype, Some(current))?;
                }
                target.link_ptr();
            }
            HolderKind::Reference => target.link_ref(),
        }
        holder.set_internal(true);
        Ok(())
    }

    fn relation(
        &mut self,
        current: ObjectId,
        owner: &str,
        name: &str,
        relation: &mut dyn RelationField,
    ) -> Result<()> {
        if relation.owner() == Some(current) {
            return Ok(());
        }
        let prototype = relation_table(owner, name);
        relation.attach(self.store.handle(), current, &prototype, &owner_column(owner))?;
        let items = relation.items();
        trace!(owner = current, prototype = %prototype, items = items.len(), "attaching relation");
        for item in items {
            self.insert(item, prototype.clone(), Some(current))?;
        }
        Ok(())
    }
}

impl FieldVisitor for Inserter<'_> {
    fn visit(&mut self, name: &str, field: Field<'_>) {
        if self.error.is_some() {
            return;
        }
        let Some((current, prototype)) = self.owners.last().cloned() else {
            return;
        };
        let outcome = match field {
            Field::Identifier(id) => {
                if *id == 0 {
                    *id = current;
                }
                Ok(())
            }
            Field::Scalar(_) => Ok(()),
            Field::Object(holder) => self.object(current, holder),
            Field::Relation(relation) => self.relation(current, &prototype, name, relation),
        };
        if let Err(error) = outcome {
            self.error = Some(error);
        }
    }
}

/// Decides what a removal takes along and refuses it while anything taken
/// along is still held.
///
/// Removal takes the relation items an object owns and the pointees it is
/// the only pointer to. The removed object and its items must not be held
/// by pointers. Pointees taken along must not be held by references.
pub(crate) struct RemovalCheck {
    visited: HashSet<usize>,
    current: Vec<ObjectId>,
    owned: HashSet<usize>,
    error: Option<StoreError>,
}

impl RemovalCheck {
    /// Returns the addresses of the pointees to remove with `proxy`.
    pub(crate) fn run(proxy: &Rc<dyn ErasedProxy>) -> Result<HashSet<usize>> {
        still_referenced(proxy.as_ref())?;
        let mut check = Self {
            visited: HashSet::new(),
            current: Vec::new(),
            owned: HashSet::new(),
            error: None,
        };
        check.descend(proxy)?;
        check.error.map_or(Ok(check.owned), Err)
    }

    fn descend(&mut self, proxy: &Rc<dyn ErasedProxy>) -> Result<()> {
        if !self.visited.insert(address(proxy)) {
            return Ok(());
        }
        self.current.push(proxy.id());
        let visited = proxy.visit(self);
        self.current.pop();
        visited
    }

    fn pointee(&mut self, target: &Rc<dyn ErasedProxy>) -> Result<()> {
        if target.pointers() != 1 || !target.is_inserted() {
            return Ok(());
        }
        if target.references() > 0 {
            warn!(
                id = target.id(),
                references = target.references(),
                "owned object is still referenced"
            );
            return Err(StoreError::StillReferenced {
                id: target.id(),
                pointers: target.pointers(),
                references: target.references(),
            });
        }
        self.owned.insert(address(target));
        self.descend(target)
    }

    fn relation(&mut self, relation: &dyn RelationField) -> Result<()> {
        if relation.owner() != self.current.last().copied() {
            return Ok(());
        }
        for item in relation.items() {
            still_referenced(item.as_ref())?;
            self.descend(&item)?;
        }
        Ok(())
    }
}

fn still_referenced(proxy: &dyn ErasedProxy) -> Result<()> {
    match proxy.pointers() {
        0 => Ok(()),
        pointers => {
            warn!(id = proxy.id(), pointers, "object is still referenced");
            Err(StoreError::StillReferenced {
                id: proxy.id(),
                pointers,
                references: proxy.references(),
            })
        }
    }
}

impl FieldVisitor for RemovalCheck {
    fn visit(&mut self, _name: &str, field: Field<'_>) {
        if self.error.is_some() {
            return;
        }
        let outcome = match field {
            Field::Object(holder)
                if holder.is_internal() && holder.kind() == HolderKind::Pointer =>
            {
                holder.target().map_or(Ok(()), |target| self.pointee(&target))
            }
            Field::Relation(relation) => self.relation(relation),
            _ => Ok(()),
        };
        if let Err(error) = outcome {
            self.error = Some(error);
        }
    }
}

/// Unregisters an object, cascading into the relation items and the
/// pointees a [`RemovalCheck`] found it owns.
pub(crate) struct Deleter<'s> {
    store: &'s mut StoreInner,
    owned: HashSet<usize>,
    current: Vec<ObjectId>,
    error: Option<StoreError>,
}

impl<'s> Deleter<'s> {
    pub(crate) fn new(store: &'s mut StoreInner, owned: HashSet<usize>) -> Self {
        Self {
            store,
            owned,
            current: Vec::new(),
            error: None,
        }
    }

    pub(crate) fn remove(&mut self, proxy: Rc<dyn ErasedProxy>) -> Result<()> {
        let id = proxy.id();
        self.current.push(id);
        let visited = proxy.visit(self);
        self.current.pop();
        visited?;
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.store.unregister(id);
        debug!(id, "removed object");
        Ok(())
    }

    fn pointee(&mut self, target: Rc<dyn ErasedProxy>) -> Result<()> {
        target.unlink_ptr();
        if target.pointers() > 0 || !self.owned.remove(&address(&target)) {
            return Ok(());
        }
        if !self.store.holds(&target) {
            return Ok(());
        }
        trace!(pointee = target.id(), "cascading removal");
        self.remove(target)
    }
}

impl FieldVisitor for Deleter<'_> {
    fn visit(&mut self, _name: &str, field: Field<'_>) {
        if self.error.is_some() {
            return;
        }
        match field {
            Field::Object(holder) if holder.is_internal() => {
                holder.set_internal(false);
                let Some(target) = holder.target() else {
                    return;
                };
                match holder.kind() {
                    HolderKind::Pointer => {
                        if let Err(error) = self.pointee(target) {
                            self.error = Some(error);
                        }
                    }
                    HolderKind::Reference => target.unlink_ref(),
                }
            }
            Field::Relation(relation) if relation.owner() == self.current.last().copied() => {
                for item in relation.items() {
                    trace!(item = item.id(), "cascading removal");
                    if let Err(error) = self.remove(item) {
                        self.error = Some(error);
                        return;
                    }
                }
                relation.detach();
            }
            _ => {}
        }
    }
}
