//! # Secondary Indices
//!
//! Two flavours share the [`SecondaryIndex`] interface:
//!
//! - [`OrderedIndex`]: declarative ordering over a key extracted from the
//!   object, with the primary instance number as tie-break. Declared through
//!   an [`IndexSpec`] marker type.
//! - Custom indices: anything implementing [`SecondaryIndex`] directly, for
//!   mappings that are not a single ordering (e.g. one object under many keys).
//!
//! ## Data Structures
//!
//! - `entries`: `BTreeSet<(Key, instance)>` - O(log n) insert/remove, ordered
//!   iteration, range scans. Non-unique keys are kept in id order.

use crate::{Object, StoreError};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Bound, RangeBounds};

/// Observer of one table's contents.
///
/// The table calls `check` for every candidate value before touching any
/// index, then `insert`/`remove`/`about_to_modify`/`modified` to keep the
/// index in step with the primary record.
pub trait SecondaryIndex<T: Object>: Any {
    fn name(&self) -> &'static str;

    /// Rejects `obj` if storing it would violate a uniqueness constraint.
    fn check(&self, _obj: &T) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(&mut self, obj: &T);

    fn remove(&mut self, obj: &T);

    fn about_to_modify(&mut self, before: &T) {
        self.remove(before);
    }

    fn modified(&mut self, after: &T) {
        self.insert(after);
    }

    fn as_any(&self) -> &dyn Any;
}

/// Declaration of an ordering over objects of kind `T`.
///
/// ```ignore
/// struct ByName;
/// impl IndexSpec<Account> for ByName {
///     type Key = AccountName;
///     const NAME: &'static str = "by_name";
///     const UNIQUE: bool = true;
///     fn key(account: &Account) -> AccountName { account.name.clone() }
/// }
/// ```
pub trait IndexSpec<T: Object>: 'static {
    type Key: Ord + Clone + fmt::Debug + 'static;
    const NAME: &'static str;
    const UNIQUE: bool = false;

    fn key(obj: &T) -> Self::Key;
}

/// Ordered secondary index built from an [`IndexSpec`].
pub struct OrderedIndex<T: Object, S: IndexSpec<T>> {
    entries: BTreeSet<(S::Key, u64)>,
    _spec: PhantomData<fn() -> (T, S)>,
}

impl<T: Object, S: IndexSpec<T>> Default for OrderedIndex<T, S> {
    fn default() -> Self {
        Self {
            entries: BTreeSet::new(),
            _spec: PhantomData,
        }
    }
}

impl<T: Object, S: IndexSpec<T>> OrderedIndex<T, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Instances stored under exactly `key`, in id order.
    pub fn equal_ids(&self, key: &S::Key) -> impl DoubleEndedIterator<Item = u64> + '_ {
        self.entries
            .range((
                Bound::Included((key.clone(), 0)),
                Bound::Included((key.clone(), u64::MAX)),
            ))
            .map(|(_, id)| *id)
    }

    pub fn first_id(&self, key: &S::Key) -> Option<u64> {
        self.equal_ids(key).next()
    }

    /// All instances in index order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = u64> + '_ {
        self.entries.iter().map(|(_, id)| *id)
    }

    /// Instances whose key falls in `range`, in index order.
    pub fn range_ids<R>(&self, range: R) -> impl DoubleEndedIterator<Item = u64> + '_
    where
        R: RangeBounds<S::Key>,
    {
        let lower = match range.start_bound() {
            Bound::Included(k) => Bound::Included((k.clone(), 0)),
            Bound::Excluded(k) => Bound::Excluded((k.clone(), u64::MAX)),
            Bound::Unbounded => Bound::Unbounded,
        };
        let upper = match range.end_bound() {
            Bound::Included(k) => Bound::Included((k.clone(), u64::MAX)),
            Bound::Excluded(k) => Bound::Excluded((k.clone(), 0)),
            Bound::Unbounded => Bound::Unbounded,
        };
        self.entries.range((lower, upper)).map(|(_, id)| *id)
    }
}

impl<T: Object, S: IndexSpec<T>> SecondaryIndex<T> for OrderedIndex<T, S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn check(&self, obj: &T) -> Result<(), StoreError> {
        if !S::UNIQUE {
            return Ok(());
        }
        let key = S::key(obj);
        match self.first_id(&key) {
            Some(existing) if existing != obj.id().instance() => Err(StoreError::UniqueConstraint {
                type_name: T::TYPE_NAME,
                index: S::NAME,
                key: format!("{:?}", key),
            }),
            _ => Ok(()),
        }
    }

    fn insert(&mut self, obj: &T) {
        self.entries.insert((S::key(obj), obj.id().instance()));
    }

    fn remove(&mut self, obj: &T) {
        self.entries.remove(&(S::key(obj), obj.id().instance()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
