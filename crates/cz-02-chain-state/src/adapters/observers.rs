//! Observer adapters.

use crate::events::{AppliedOperation, BlockChanges};
use crate::ports::ChainObserver;
use cadenza_telemetry::log_event;
use parking_lot::Mutex;

/// Keeps every notification in memory. Used by tests and tooling that
/// inspect what a block produced.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    operations: Mutex<Vec<AppliedOperation>>,
    blocks: Mutex<Vec<BlockChanges>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> Vec<AppliedOperation> {
        self.operations.lock().clone()
    }

    pub fn blocks(&self) -> Vec<BlockChanges> {
        self.blocks.lock().clone()
    }

    /// Operations produced by the chain itself rather than by transactions.
    pub fn virtual_operations(&self) -> Vec<AppliedOperation> {
        self.operations
            .lock()
            .iter()
            .filter(|note| note.virtual_op)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.operations.lock().clear();
        self.blocks.lock().clear();
    }
}

impl ChainObserver for RecordingObserver {
    fn on_applied_operation(&self, note: &AppliedOperation) {
        self.operations.lock().push(note.clone());
    }

    fn on_block_committed(&self, changes: &BlockChanges) {
        self.blocks.lock().push(changes.clone());
    }
}

/// Writes committed activity to the log at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl ChainObserver for LoggingObserver {
    fn on_applied_operation(&self, note: &AppliedOperation) {
        match payload_json(note) {
            Ok(payload) => log_event!(
                debug,
                "observer",
                "operation applied",
                operation = note.op.tag().name(),
                block_num = note.block_num,
                virtual_op = note.virtual_op,
                payload = %payload
            ),
            Err(err) => log_event!(
                warn,
                "observer",
                "operation payload not serializable",
                operation = note.op.tag().name(),
                block_num = note.block_num,
                error = %err
            ),
        }
    }

    fn on_block_committed(&self, changes: &BlockChanges) {
        log_event!(
            debug,
            "observer",
            "block committed",
            block_num = changes.block_num,
            changed = changes.changed.len(),
            removed = changes.removed.len()
        );
    }
}

fn payload_json(note: &AppliedOperation) -> Result<String, serde_json::Error> {
    serde_json::to_string(&note.op)
}
