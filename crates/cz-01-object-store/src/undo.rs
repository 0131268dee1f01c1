//! # Undo Sessions
//!
//! [`Session`] is a scoped guard over one undo frame. Leaving scope without
//! calling [`Session::merge`] or [`Session::push`] reverts the frame, so an
//! early `?` return inside an evaluator rolls its writes back.
//!
//! ```ignore
//! let mut block = db.start_session();
//! {
//!     let mut tx = block.start_session();
//!     apply(&mut tx, &op)?;   // error: tx dropped, frame undone
//!     tx.merge()?;            // success: folded into the block frame
//! }
//! block.push();               // keep the block frame open for pop_block
//! ```

use crate::StoreError;
use std::ops::{Deref, DerefMut};

/// A state container supporting nested undo frames.
pub trait UndoDatabase {
    fn start_undo(&mut self);

    /// Reverts and closes the newest frame.
    fn undo(&mut self) -> Result<(), StoreError>;

    /// Closes the newest frame, folding it into its parent.
    fn merge(&mut self) -> Result<(), StoreError>;

    fn start_session(&mut self) -> Session<'_, Self>
    where
        Self: Sized,
    {
        Session::new(self)
    }
}

/// Guard over one open undo frame.
#[must_use = "dropping a session immediately undoes it"]
pub struct Session<'a, D: UndoDatabase> {
    db: &'a mut D,
    active: bool,
}

impl<'a, D: UndoDatabase> Session<'a, D> {
    pub fn new(db: &'a mut D) -> Self {
        db.start_undo();
        Self { db, active: true }
    }

    pub fn merge(mut self) -> Result<(), StoreError> {
        self.active = false;
        self.db.merge()
    }

    pub fn undo(mut self) -> Result<(), StoreError> {
        self.active = false;
        self.db.undo()
    }

    /// Releases the guard, leaving the frame open on the database.
    pub fn push(mut self) {
        self.active = false;
    }
}

impl<D: UndoDatabase> Deref for Session<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.db
    }
}

impl<D: UndoDatabase> DerefMut for Session<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.db
    }
}

impl<D: UndoDatabase> Drop for Session<'_, D> {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = self.db.undo() {
                tracing::error!(error = %e, "failed to undo abandoned session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Id, Object, ObjectStore};
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct Counter {
        id: Id<Counter>,
        value: i64,
    }

    impl Object for Counter {
        const SPACE_ID: u8 = 8;
        const TYPE_ID: u8 = 0;
        const TYPE_NAME: &'static str = "counter";
        fn id(&self) -> Id<Self> {
            self.id
        }
    }

    fn store_with_counter() -> (ObjectStore, Id<Counter>) {
        let mut store = ObjectStore::new();
        store.register::<Counter>().unwrap();
        let id = store.create(|id| Counter { id, value: 0 }).unwrap();
        (store, id)
    }

    fn value(store: &ObjectStore, id: Id<Counter>) -> i64 {
        store.get(id).unwrap().value
    }

    #[test]
    fn test_dropped_session_is_undone() {
        let (mut store, id) = store_with_counter();
        {
            let mut session = store.start_session();
            session.modify(id, |c| c.value = 5).unwrap();
        }
        assert_eq!(value(&store, id), 0);
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_nested_merge_then_outer_undo() {
        let (mut store, id) = store_with_counter();
        let mut outer = store.start_session();
        outer.modify(id, |c| c.value = 1).unwrap();
        {
            let mut inner = outer.start_session();
            inner.modify(id, |c| c.value = 2).unwrap();
            inner.merge().unwrap();
        }
        assert_eq!(value(&outer, id), 2);
        outer.undo().unwrap();
        assert_eq!(value(&store, id), 0);
    }

    #[test]
    fn test_inner_failure_keeps_outer_writes() {
        let (mut store, id) = store_with_counter();
        let mut outer = store.start_session();
        outer.modify(id, |c| c.value = 1).unwrap();
        {
            let mut inner = outer.start_session();
            inner.modify(id, |c| c.value = 9).unwrap();
        }
        assert_eq!(value(&outer, id), 1);
        outer.merge().unwrap();
        assert_eq!(value(&store, id), 1);
    }

    #[test]
    fn test_pushed_session_leaves_frame_open() {
        let (mut store, id) = store_with_counter();
        let mut session = store.start_session();
        session.modify(id, |c| c.value = 3).unwrap();
        session.push();
        assert_eq!(store.depth(), 1);
        store.undo().unwrap();
        assert_eq!(value(&store, id), 0);
    }
}
