//! # Index Registry
//!
//! [`ObjectStore`] owns one [`Table`] per registered object kind and drives
//! undo frames across all of them in lock-step.

use crate::{Id, IndexSpec, Object, ObjectId, StoreError, Table, UndoDatabase};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::ops::RangeBounds;

/// Object-safe view of a [`Table`] used for frame operations that span kinds.
trait AnyTable: Any {
    fn type_name(&self) -> &'static str;
    fn start_undo(&mut self);
    fn undo(&mut self) -> Result<(), StoreError>;
    fn merge(&mut self) -> Result<(), StoreError>;
    fn commit_oldest(&mut self);
    fn collect_changes(&self, out: &mut ChangeSet) -> Result<(), StoreError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Object> AnyTable for Table<T> {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn start_undo(&mut self) {
        Table::start_undo(self)
    }

    fn undo(&mut self) -> Result<(), StoreError> {
        Table::undo(self)
    }

    fn merge(&mut self) -> Result<(), StoreError> {
        Table::merge(self)
    }

    fn commit_oldest(&mut self) {
        Table::commit_oldest(self)
    }

    fn collect_changes(&self, out: &mut ChangeSet) -> Result<(), StoreError> {
        let (changed, removed) = self.frame_changes();
        out.changed.extend(changed);
        for (id, value) in removed {
            let value = serde_json::to_value(value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            out.removed.push(RemovedObject { id, value });
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Final value of an object removed under the newest frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovedObject {
    pub id: ObjectId,
    pub value: serde_json::Value,
}

/// Objects touched under the newest frame, across all kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub changed: Vec<ObjectId>,
    pub removed: Vec<RemovedObject>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Registry of every table in the chain state.
#[derive(Default)]
pub struct ObjectStore {
    tables: Vec<Box<dyn AnyTable>>,
    slots: HashMap<TypeId, usize>,
    kinds: HashMap<(u8, u8), usize>,
    depth: usize,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the table for `T`. A table registered while frames are open
    /// starts with the same number of (empty) frames.
    pub fn register<T: Object>(&mut self) -> Result<(), StoreError> {
        let kind = (T::SPACE_ID, T::TYPE_ID);
        if self.kinds.contains_key(&kind) || self.slots.contains_key(&TypeId::of::<T>()) {
            return Err(StoreError::AlreadyRegistered {
                type_name: T::TYPE_NAME,
                space: T::SPACE_ID,
                type_id: T::TYPE_ID,
            });
        }

        let mut table = Table::<T>::with_indices();
        for _ in 0..self.depth {
            table.start_undo();
        }

        let slot = self.tables.len();
        self.tables.push(Box::new(table));
        self.slots.insert(TypeId::of::<T>(), slot);
        self.kinds.insert(kind, slot);
        tracing::debug!(kind = T::TYPE_NAME, space = kind.0, type_id = kind.1, "table registered");
        Ok(())
    }

    pub fn is_registered<T: Object>(&self) -> bool {
        self.slots.contains_key(&TypeId::of::<T>())
    }

    /// Registered kinds as `(space, type, name)`.
    pub fn kinds(&self) -> Vec<(u8, u8, &'static str)> {
        let mut out: Vec<_> = self
            .kinds
            .iter()
            .map(|(&(space, type_id), &slot)| (space, type_id, self.tables[slot].type_name()))
            .collect();
        out.sort();
        out
    }

    /// # Panics
    ///
    /// If `T` was never registered.
    pub fn table<T: Object>(&self) -> &Table<T> {
        self.slots
            .get(&TypeId::of::<T>())
            .and_then(|slot| self.tables[*slot].as_any().downcast_ref::<Table<T>>())
            .unwrap_or_else(|| panic!("table {} not registered", T::TYPE_NAME))
    }

    /// # Panics
    ///
    /// If `T` was never registered.
    pub fn table_mut<T: Object>(&mut self) -> &mut Table<T> {
        let slot = match self.slots.get(&TypeId::of::<T>()) {
            Some(slot) => *slot,
            None => panic!("table {} not registered", T::TYPE_NAME),
        };
        self.tables[slot]
            .as_any_mut()
            .downcast_mut::<Table<T>>()
            .unwrap_or_else(|| panic!("table slot {} is not {}", slot, T::TYPE_NAME))
    }

    // =========================================================================
    // OBJECT ACCESS
    // =========================================================================

    pub fn create<T: Object>(&mut self, init: impl FnOnce(Id<T>) -> T) -> Result<Id<T>, StoreError> {
        self.table_mut::<T>().create(init)
    }

    pub fn modify<T: Object>(&mut self, id: Id<T>, f: impl FnOnce(&mut T)) -> Result<(), StoreError> {
        self.table_mut::<T>().modify(id, f)
    }

    pub fn remove<T: Object>(&mut self, id: Id<T>) -> Result<T, StoreError> {
        self.table_mut::<T>().remove(id)
    }

    pub fn get<T: Object>(&self, id: Id<T>) -> Result<&T, StoreError> {
        self.table::<T>().get(id)
    }

    pub fn find<T: Object>(&self, id: Id<T>) -> Option<&T> {
        self.table::<T>().find(id)
    }

    pub fn find_by<T: Object, S: IndexSpec<T>>(&self, key: &S::Key) -> Option<&T> {
        self.table::<T>().find_by::<S>(key)
    }

    pub fn iter_by<T: Object, S: IndexSpec<T>>(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.table::<T>().iter_by::<S>()
    }

    pub fn range_by<T, S, R>(&self, range: R) -> impl DoubleEndedIterator<Item = &T> + '_
    where
        T: Object,
        S: IndexSpec<T>,
        R: RangeBounds<S::Key>,
    {
        self.table::<T>().range_by::<S, R>(range)
    }

    // =========================================================================
    // UNDO FRAMES
    // =========================================================================

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Makes the oldest frame permanent.
    pub fn commit(&mut self) {
        if self.depth == 0 {
            return;
        }
        for table in &mut self.tables {
            table.commit_oldest();
        }
        self.depth -= 1;
    }

    /// Makes every open frame permanent.
    pub fn commit_all(&mut self) {
        while self.depth > 0 {
            self.commit();
        }
    }

    /// Changes recorded under the newest frame.
    pub fn changes(&self) -> Result<ChangeSet, StoreError> {
        let mut out = ChangeSet::default();
        for table in &self.tables {
            table.collect_changes(&mut out)?;
        }
        Ok(out)
    }
}

impl UndoDatabase for ObjectStore {
    fn start_undo(&mut self) {
        for table in &mut self.tables {
            table.start_undo();
        }
        self.depth += 1;
    }

    fn undo(&mut self) -> Result<(), StoreError> {
        if self.depth == 0 {
            return Err(StoreError::NoActiveSession);
        }
        for table in &mut self.tables {
            table.undo()?;
        }
        self.depth -= 1;
        Ok(())
    }

    fn merge(&mut self) -> Result<(), StoreError> {
        if self.depth == 0 {
            return Err(StoreError::NoActiveSession);
        }
        for table in &mut self.tables {
            table.merge()?;
        }
        self.depth -= 1;
        Ok(())
    }
}
