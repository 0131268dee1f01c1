use crate::{AccountName, Operation, ProtocolError, Timestamp};
use serde::{Deserialize, Serialize};

/// A transaction whose signatures have already been verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub expiration: Timestamp,
    pub operations: Vec<Operation>,
}

impl SignedTransaction {
    pub fn new(expiration: Timestamp, operations: Vec<Operation>) -> Self {
        Self {
            expiration,
            operations,
        }
    }

    /// Every operation must be valid and user-submittable.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.operations.is_empty() {
            return Err(ProtocolError::EmptyTransaction);
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: Timestamp,
    pub witness: AccountName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<SignedTransaction>,
}

impl Block {
    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }
}
