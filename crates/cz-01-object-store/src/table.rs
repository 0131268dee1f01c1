//! # Entity Table
//!
//! Primary storage for one object kind plus its secondary indices and undo
//! frames.
//!
//! ## Data Structures
//!
//! - `objects`: `BTreeMap<instance, T>` - primary key, iteration in id order
//! - `indices`: every registered [`SecondaryIndex`], updated on each mutation
//! - `undo_stack`: one [`UndoState`] per open frame, oldest at the front
//!
//! ## Mutation Protocol
//!
//! 1. Build the candidate value (clone for `modify`, initializer for `create`)
//! 2. `check` it against every index; any conflict aborts with nothing changed
//! 3. Update indices and the primary record
//! 4. Record the prior state in the newest undo frame, if one is open

use crate::{Id, IndexSpec, Object, ObjectId, OrderedIndex, SecondaryIndex, StoreError};
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::ops::RangeBounds;

/// Prior state recorded by one undo frame.
#[derive(Debug, Clone)]
pub struct UndoState<T> {
    /// Values of objects that existed when the frame opened and were modified.
    old_values: BTreeMap<u64, T>,
    /// Values of objects that existed when the frame opened and were removed.
    removed: BTreeMap<u64, T>,
    /// Objects created inside the frame and still present.
    new_ids: BTreeSet<u64>,
    old_next_id: u64,
}

impl<T> UndoState<T> {
    fn new(next_id: u64) -> Self {
        Self {
            old_values: BTreeMap::new(),
            removed: BTreeMap::new(),
            new_ids: BTreeSet::new(),
            old_next_id: next_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.old_values.is_empty() && self.removed.is_empty() && self.new_ids.is_empty()
    }

    fn on_create(&mut self, id: u64) {
        self.new_ids.insert(id);
    }

    fn on_modify(&mut self, id: u64, before: &T)
    where
        T: Clone,
    {
        if self.new_ids.contains(&id) || self.old_values.contains_key(&id) {
            return;
        }
        self.old_values.insert(id, before.clone());
    }

    fn on_remove(&mut self, id: u64, value: T) {
        if self.new_ids.remove(&id) {
            return;
        }
        let original = self.old_values.remove(&id).unwrap_or(value);
        self.removed.insert(id, original);
    }

    /// Folds `child` (the newer frame) into `self` so that undoing the result
    /// is equivalent to undoing `child` then `self`.
    fn absorb(&mut self, child: UndoState<T>) {
        for (id, value) in child.old_values {
            if self.new_ids.contains(&id) || self.old_values.contains_key(&id) {
                continue;
            }
            self.old_values.insert(id, value);
        }

        self.new_ids.extend(child.new_ids);

        for (id, value) in child.removed {
            if self.new_ids.remove(&id) {
                continue;
            }
            let original = self.old_values.remove(&id).unwrap_or(value);
            self.removed.insert(id, original);
        }
    }
}

/// Storage for all objects of kind `T`.
pub struct Table<T: Object> {
    objects: BTreeMap<u64, T>,
    next_id: u64,
    indices: Vec<Box<dyn SecondaryIndex<T>>>,
    index_slots: HashMap<TypeId, usize>,
    undo_stack: VecDeque<UndoState<T>>,
}

impl<T: Object> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Object> Table<T> {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
            indices: Vec::new(),
            index_slots: HashMap::new(),
            undo_stack: VecDeque::new(),
        }
    }

    /// Creates a table with its declared indices already registered.
    pub fn with_indices() -> Self {
        let mut table = Self::new();
        T::register_indices(&mut table);
        table
    }

    // =========================================================================
    // INDEX REGISTRATION
    // =========================================================================

    /// Registers the ordering described by `S`.
    pub fn add_index<S: IndexSpec<T>>(&mut self) {
        self.add_secondary(OrderedIndex::<T, S>::new());
    }

    /// Registers a custom secondary index, populating it from current contents.
    pub fn add_secondary<I: SecondaryIndex<T>>(&mut self, mut index: I) {
        let key = TypeId::of::<I>();
        if self.index_slots.contains_key(&key) {
            return;
        }
        for obj in self.objects.values() {
            index.insert(obj);
        }
        self.index_slots.insert(key, self.indices.len());
        self.indices.push(Box::new(index));
    }

    /// Typed access to a registered index.
    ///
    /// # Panics
    ///
    /// If `I` was never registered on this table.
    pub fn secondary<I: SecondaryIndex<T>>(&self) -> &I {
        self.index_slots
            .get(&TypeId::of::<I>())
            .and_then(|slot| self.indices[*slot].as_any().downcast_ref::<I>())
            .unwrap_or_else(|| {
                panic!(
                    "index {} not registered on {}",
                    std::any::type_name::<I>(),
                    T::TYPE_NAME
                )
            })
    }

    fn ordered<S: IndexSpec<T>>(&self) -> &OrderedIndex<T, S> {
        self.secondary::<OrderedIndex<T, S>>()
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn next_id(&self) -> Id<T> {
        Id::new(self.next_id)
    }

    pub fn find(&self, id: Id<T>) -> Option<&T> {
        self.objects.get(&id.instance())
    }

    pub fn get(&self, id: Id<T>) -> Result<&T, StoreError> {
        self.find(id).ok_or_else(|| not_found::<T>(id.instance()))
    }

    /// First object stored under `key` in the ordering `S`.
    pub fn find_by<S: IndexSpec<T>>(&self, key: &S::Key) -> Option<&T> {
        self.ordered::<S>()
            .first_id(key)
            .and_then(|id| self.objects.get(&id))
    }

    /// All objects stored under `key` in the ordering `S`, in id order.
    pub fn equal_range<S: IndexSpec<T>>(
        &self,
        key: &S::Key,
    ) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let objects = &self.objects;
        self.ordered::<S>()
            .equal_ids(key)
            .filter_map(move |id| objects.get(&id))
    }

    /// Objects in primary-key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.objects.values()
    }

    /// Objects in the order defined by `S`.
    pub fn iter_by<S: IndexSpec<T>>(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let objects = &self.objects;
        self.ordered::<S>()
            .ids()
            .filter_map(move |id| objects.get(&id))
    }

    /// Objects whose `S` key falls in `range`, in `S` order.
    pub fn range_by<S, R>(&self, range: R) -> impl DoubleEndedIterator<Item = &T> + '_
    where
        S: IndexSpec<T>,
        R: RangeBounds<S::Key>,
    {
        let objects = &self.objects;
        self.ordered::<S>()
            .range_ids(range)
            .filter_map(move |id| objects.get(&id))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Inserts a new object. `init` receives the id the table allocated and
    /// must build an object carrying that id.
    pub fn create<F>(&mut self, init: F) -> Result<Id<T>, StoreError>
    where
        F: FnOnce(Id<T>) -> T,
    {
        let id = self.next_id;
        let obj = init(Id::new(id));
        ensure_id::<T>(id, &obj)?;

        for index in &self.indices {
            index.check(&obj)?;
        }
        for index in &mut self.indices {
            index.insert(&obj);
        }

        self.objects.insert(id, obj);
        self.next_id += 1;
        if let Some(frame) = self.undo_stack.back_mut() {
            frame.on_create(id);
        }
        Ok(Id::new(id))
    }

    /// Applies `f` to the object. If the result would violate an index
    /// constraint nothing is changed.
    pub fn modify<F>(&mut self, id: Id<T>, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut T),
    {
        let id = id.instance();
        let before = self
            .objects
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found::<T>(id))?;

        let mut after = before.clone();
        f(&mut after);
        ensure_id::<T>(id, &after)?;

        for index in &self.indices {
            index.check(&after)?;
        }
        for index in &mut self.indices {
            index.about_to_modify(&before);
            index.modified(&after);
        }

        self.objects.insert(id, after);
        if let Some(frame) = self.undo_stack.back_mut() {
            frame.on_modify(id, &before);
        }
        Ok(())
    }

    pub fn remove(&mut self, id: Id<T>) -> Result<T, StoreError> {
        let id = id.instance();
        let obj = self.objects.remove(&id).ok_or_else(|| not_found::<T>(id))?;
        for index in &mut self.indices {
            index.remove(&obj);
        }
        if let Some(frame) = self.undo_stack.back_mut() {
            frame.on_remove(id, obj.clone());
        }
        Ok(obj)
    }

    // =========================================================================
    // UNDO FRAMES
    // =========================================================================

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn start_undo(&mut self) {
        self.undo_stack.push_back(UndoState::new(self.next_id));
    }

    /// Reverts every mutation recorded since the newest frame opened.
    pub fn undo(&mut self) -> Result<(), StoreError> {
        let frame = self.undo_stack.pop_back().ok_or(StoreError::NoActiveSession)?;

        for id in &frame.new_ids {
            if let Some(obj) = self.objects.remove(id) {
                for index in &mut self.indices {
                    index.remove(&obj);
                }
            }
        }

        for (id, old) in frame.old_values {
            if let Some(current) = self.objects.get(&id) {
                for index in &mut self.indices {
                    index.about_to_modify(current);
                    index.modified(&old);
                }
            }
            self.objects.insert(id, old);
        }

        for (id, obj) in frame.removed {
            for index in &mut self.indices {
                index.insert(&obj);
            }
            self.objects.insert(id, obj);
        }

        self.next_id = frame.old_next_id;
        Ok(())
    }

    /// Folds the newest frame into the one below it. With a single frame open
    /// the frame is discarded and its changes become permanent.
    pub fn merge(&mut self) -> Result<(), StoreError> {
        let child = self.undo_stack.pop_back().ok_or(StoreError::NoActiveSession)?;
        if let Some(parent) = self.undo_stack.back_mut() {
            parent.absorb(child);
        }
        Ok(())
    }

    /// Drops the oldest frame, making its changes permanent.
    pub fn commit_oldest(&mut self) {
        self.undo_stack.pop_front();
    }

    /// Objects created or modified, and values removed, under the newest frame.
    pub fn frame_changes(&self) -> (Vec<ObjectId>, Vec<(ObjectId, &T)>) {
        let Some(frame) = self.undo_stack.back() else {
            return (Vec::new(), Vec::new());
        };

        let changed: BTreeSet<u64> = frame
            .new_ids
            .iter()
            .chain(frame.old_values.keys())
            .copied()
            .filter(|id| self.objects.contains_key(id))
            .collect();

        let changed = changed
            .into_iter()
            .map(|id| Id::<T>::new(id).object_id())
            .collect();
        let removed = frame
            .removed
            .iter()
            .map(|(id, value)| (Id::<T>::new(*id).object_id(), value))
            .collect();
        (changed, removed)
    }
}

fn not_found<T: Object>(instance: u64) -> StoreError {
    StoreError::NotFound {
        type_name: T::TYPE_NAME,
        id: Id::<T>::new(instance).object_id(),
    }
}

fn ensure_id<T: Object>(expected: u64, obj: &T) -> Result<(), StoreError> {
    let actual = obj.id().instance();
    if actual != expected {
        return Err(StoreError::IdMismatch {
            type_name: T::TYPE_NAME,
            expected: Id::<T>::new(expected).object_id(),
            actual: Id::<T>::new(actual).object_id(),
        });
    }
    Ok(())
}
