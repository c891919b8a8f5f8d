//! Array-backed relation storage.

use crate::error::{Result, StoreError};
use crate::relation::{ItemProxy, RelationStorage};

/// Random-access storage; positions are indices and shift on mutation.
#[derive(Debug)]
pub struct VectorStorage<T> {
    items: Vec<ItemProxy<T>>,
}

impl<T> Default for VectorStorage<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> VectorStorage<T> {
    fn out_of_range(&self, position: usize) -> StoreError {
        StoreError::InvalidPosition {
            position: position.to_string(),
            len: self.items.len(),
        }
    }
}

impl<T> RelationStorage<T> for VectorStorage<T> {
    type Position = usize;

    fn begin(&self) -> usize {
        0
    }

    fn end(&self) -> usize {
        self.items.len()
    }

    fn next(&self, position: usize) -> usize {
        (position + 1).min(self.items.len())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, position: usize) -> Option<&ItemProxy<T>> {
        self.items.get(position)
    }

    fn check_insert(&self, position: usize) -> Result<()> {
        if position <= self.items.len() {
            Ok(())
        } else {
            Err(self.out_of_range(position))
        }
    }

    fn insert_before(&mut self, position: usize, item: ItemProxy<T>) -> usize {
        self.items.insert(position, item);
        position
    }

    fn remove(&mut self, position: usize) -> Option<(ItemProxy<T>, usize)> {
        (position < self.items.len()).then(|| (self.items.remove(position), position))
    }

    fn erase_range(
        &mut self,
        first: usize,
        last: usize,
        mut before_remove: impl FnMut(&ItemProxy<T>) -> Result<()>,
    ) -> Result<usize> {
        if first > last {
            return Err(self.out_of_range(first));
        }
        if last > self.items.len() {
            return Err(self.out_of_range(last));
        }
        for _ in first..last {
            before_remove(&self.items[first])?;
            self.items.remove(first);
        }
        Ok(first)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &ItemProxy<T>> + '_> {
        Box::new(self.items.iter())
    }

    fn push_back(&mut self, item: ItemProxy<T>) {
        self.items.push(item);
    }
}
