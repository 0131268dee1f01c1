//! # cz-01-object-store
//!
//! Generic indexed object store for Cadenza-Chain.
//!
//! ## Role in System
//!
//! - **Entity Tables**: one [`Table`] per object kind, primary key plus any
//!   number of secondary orderings
//! - **Index Registry**: [`ObjectStore`] owns every table and hands out typed
//!   access by object kind
//! - **Undo Manager**: nested undo frames recorded per table, driven through
//!   [`UndoDatabase`] and the scoped [`Session`] guard
//!
//! ## Layering
//!
//! ```text
//!   evaluators ──→ Session<'_, D> ──deref──→ D: UndoDatabase
//!                                               │
//!                                          ObjectStore
//!                                   ┌───────────┼───────────┐
//!                                Table<A>    Table<B>    Table<C>
//!                              (primary +  (primary +  (primary +
//!                              secondaries) secondaries) secondaries)
//! ```
//!
//! ## Guarantees
//!
//! - A mutation updates the primary record and every secondary index together;
//!   unique-key conflicts are detected before anything changes.
//! - Undoing a frame restores primary and secondary state to exactly what it
//!   was when the frame started, including objects that straddle frames.
//! - The store is single-threaded; exclusive access is expressed with `&mut`.

pub mod errors;
pub mod id;
pub mod index;
pub mod object;
pub mod registry;
pub mod table;
pub mod undo;

pub use errors::*;
pub use id::*;
pub use index::*;
pub use object::*;
pub use registry::*;
pub use table::*;
pub use undo::*;
