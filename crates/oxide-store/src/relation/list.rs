//! Node-list relation storage.
//!
//! Nodes live in a slab and are chained both ways. A position names a node
//! and stays valid until that node is erased, whatever else changes. Slots
//! are reused, so positions carry the slot generation they were issued for
//! and a stale position never names a newer node.

use crate::error::{Result, StoreError};
use crate::relation::{ItemProxy, RelationStorage};

/// Position in a [`ListStorage`]; `ListPosition::END` is one past the tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListPosition(Option<Slot>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Slot {
    index: usize,
    generation: u64,
}

impl ListPosition {
    /// One past the last node.
    pub const END: Self = Self(None);
}

#[derive(Debug)]
struct Node<T> {
    item: ItemProxy<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Entry<T> {
    node: Option<Node<T>>,
    generation: u64,
}

/// Linked storage with stable node positions.
#[derive(Debug)]
pub struct ListStorage<T> {
    nodes: Vec<Entry<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for ListStorage<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }
}

impl<T> ListStorage<T> {
    /// The position of a live slot, or `END`.
    fn position(&self, index: Option<usize>) -> ListPosition {
        ListPosition(index.and_then(|index| {
            self.nodes.get(index).map(|entry| Slot {
                index,
                generation: entry.generation,
            })
        }))
    }

    /// The slot a position names, if its node is still there.
    fn index(&self, position: ListPosition) -> Option<usize> {
        let slot = position.0?;
        let entry = self.nodes.get(slot.index)?;
        (entry.generation == slot.generation && entry.node.is_some()).then_some(slot.index)
    }

    fn node(&self, position: ListPosition) -> Option<&Node<T>> {
        self.nodes.get(self.index(position)?)?.node.as_ref()
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(index)?.node.as_mut()
    }

    fn is_valid(&self, position: ListPosition) -> bool {
        position == ListPosition::END || self.index(position).is_some()
    }

    fn out_of_range(&self, position: ListPosition) -> StoreError {
        StoreError::InvalidPosition {
            position: format!("{position:?}"),
            len: self.len,
        }
    }

    fn allocate(&mut self, node: Node<T>) -> usize {
        if let Some(index) = self.free.pop() {
            if let Some(entry) = self.nodes.get_mut(index) {
                entry.node = Some(node);
                return index;
            }
        }
        self.nodes.push(Entry {
            node: Some(node),
            generation: 0,
        });
        self.nodes.len() - 1
    }
}

impl<T> RelationStorage<T> for ListStorage<T> {
    type Position = ListPosition;

    fn begin(&self) -> ListPosition {
        self.position(self.head)
    }

    fn end(&self) -> ListPosition {
        ListPosition::END
    }

    fn next(&self, position: ListPosition) -> ListPosition {
        self.position(self.node(position).and_then(|n| n.next))
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, position: ListPosition) -> Option<&ItemProxy<T>> {
        self.node(position).map(|n| &n.item)
    }

    fn check_insert(&self, position: ListPosition) -> Result<()> {
        if self.is_valid(position) {
            Ok(())
        } else {
            Err(self.out_of_range(position))
        }
    }

    fn insert_before(&mut self, position: ListPosition, item: ItemProxy<T>) -> ListPosition {
        let next = self.index(position);
        let prev = match next {
            Some(index) => self.node_mut(index).and_then(|n| n.prev),
            None => self.tail,
        };
        let index = self.allocate(Node { item, prev, next });
        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = Some(index);
                }
            }
            None => self.tail = Some(index),
        }
        self.len += 1;
        self.position(Some(index))
    }

    fn remove(&mut self, position: ListPosition) -> Option<(ItemProxy<T>, ListPosition)> {
        let index = self.index(position)?;
        let entry = self.nodes.get_mut(index)?;
        let node = entry.node.take()?;
        entry.generation += 1;
        match node.prev {
            Some(prev) => {
                if let Some(p) = self.node_mut(prev) {
                    p.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(n) = self.node_mut(next) {
                    n.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
        self.free.push(index);
        self.len -= 1;
        Some((node.item, self.position(node.next)))
    }

    fn erase_range(
        &mut self,
        first: ListPosition,
        last: ListPosition,
        mut before_remove: impl FnMut(&ItemProxy<T>) -> Result<()>,
    ) -> Result<ListPosition> {
        if !self.is_valid(first) {
            return Err(self.out_of_range(first));
        }
        let mut cursor = first;
        while cursor != last {
            if cursor == ListPosition::END {
                return Err(self.out_of_range(last));
            }
            cursor = self.next(cursor);
        }

        let mut position = first;
        while position != last {
            if let Some(item) = self.get(position) {
                before_remove(item)?;
            }
            position = match self.remove(position) {
                Some((_, next)) => next,
                None => break,
            };
        }
        Ok(last)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &ItemProxy<T>> + '_> {
        let mut index = self.head;
        Box::new(core::iter::from_fn(move || {
            let node = self.nodes.get(index?)?.node.as_ref()?;
            index = node.next;
            Some(&node.item)
        }))
    }

    fn push_back(&mut self, item: ItemProxy<T>) {
        self.insert_before(ListPosition::END, item);
    }
}
