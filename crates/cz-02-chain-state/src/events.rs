//! Notifications delivered to [`ChainObserver`](crate::ChainObserver)s when a
//! block commits.

use cz_01_object_store::{ObjectId, RemovedObject};
use serde::Serialize;
use shared_types::{Operation, Timestamp};

/// One fully applied operation, user-submitted or virtual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedOperation {
    pub op: Operation,
    pub block_num: u64,
    /// `None` for operations produced by per-block processing
    pub trx_in_block: Option<u32>,
    pub op_in_trx: u32,
    pub virtual_op: bool,
    pub timestamp: Timestamp,
}

/// Objects touched by a committed block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockChanges {
    pub block_num: u64,
    pub timestamp: Timestamp,
    pub changed: Vec<ObjectId>,
    pub removed: Vec<RemovedObject>,
}
