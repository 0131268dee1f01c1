use crate::ObjectId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{type_name} not found: {id}")]
    NotFound { type_name: &'static str, id: ObjectId },

    #[error("Unique constraint violated on {type_name}.{index}: key {key}")]
    UniqueConstraint {
        type_name: &'static str,
        index: &'static str,
        key: String,
    },

    #[error("Object id mismatch on {type_name}: expected {expected}, got {actual}")]
    IdMismatch {
        type_name: &'static str,
        expected: ObjectId,
        actual: ObjectId,
    },

    #[error("Table already registered for {type_name} ({space}.{type_id})")]
    AlreadyRegistered {
        type_name: &'static str,
        space: u8,
        type_id: u8,
    },

    #[error("No active undo session")]
    NoActiveSession,

    #[error("Serialization error: {0}")]
    Serialization(String),
}
