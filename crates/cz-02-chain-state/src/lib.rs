//! # cz-02-chain-state
//!
//! Evaluator-driven state transition engine for Cadenza-Chain.
//!
//! ## Role in System
//!
//! - **Database**: owns the [`ObjectStore`](cz_01_object_store::ObjectStore)
//!   with every chain table and the block/transaction/operation session
//!   boundary
//! - **Evaluators**: one per operation kind, registered by
//!   [`OperationTag`](shared_types::OperationTag) in the [`EvaluatorRegistry`]
//! - **State mutation**: balances, vesting and delegation, proxied votes, the
//!   friend graph and score, streaming report accounting, markets and
//!   proposals
//! - **Invariants**: whole-state checks run after per-block processing
//!
//! ## Block Flow
//!
//! ```text
//! Block ──→ begin_block_session ──→ push_transaction* ──→ commit_block
//!                                        │                    │
//!                              validate ─┴─ evaluate    process_block
//!                              (stateless)  (stateful)  check_all_invariants
//!                                                       notify ChainObserver
//! ```
//!
//! ## Error Policy
//!
//! `NotFound` and `PreconditionFailed` reject one transaction and leave the
//! block open. `InvariantViolation` and `StructuralError` abort the block.

pub mod adapters;
pub mod database;
pub mod domain;
pub mod evaluators;
pub mod events;
pub mod invariants;
pub mod ports;

pub use adapters::*;
pub use database::{compute_score, Database, SessionPhase};
pub use domain::*;
pub use evaluators::{Evaluator, EvaluatorRegistry, OperationEvaluator};
pub use events::*;
pub use invariants::{check_all_invariants, InvariantCheckResult, InvariantViolation};
pub use ports::*;
