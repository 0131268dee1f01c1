//! # Shared Types Crate
//!
//! Protocol layer of Cadenza-Chain: everything the state core consumes from
//! the serialization/signature layer, already deserialized.
//!
//! ## Design Principles
//!
//! - **Stateless validation**: every operation exposes `validate()` which needs
//!   no chain state. The chain calls it before any evaluator runs.
//! - **Closed operation set**: [`Operation`] is a sum type; dispatch is by
//!   [`OperationTag`], never by downcasting.
//! - **Virtual operations** share the sum type so observers see one ordered
//!   stream, but they are rejected if submitted in a transaction.

pub mod asset;
pub mod authority;
pub mod block;
pub mod constants;
pub mod errors;
pub mod names;
pub mod operations;

pub use asset::*;
pub use authority::*;
pub use block::*;
pub use errors::*;
pub use names::*;
pub use operations::*;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;
