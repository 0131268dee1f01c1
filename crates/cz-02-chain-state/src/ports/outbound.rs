//! Driven ports.

use crate::events::{AppliedOperation, BlockChanges};

/// Receives committed chain activity.
///
/// Observers get shared references only and run after the block's writes
/// are final, so they cannot affect consensus state.
pub trait ChainObserver: Send + Sync {
    /// Called once per applied operation, in application order.
    fn on_applied_operation(&self, _note: &AppliedOperation) {}

    /// Called once per committed block, after its operations.
    fn on_block_committed(&self, _changes: &BlockChanges) {}
}
