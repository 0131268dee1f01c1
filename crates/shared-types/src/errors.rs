//! # Error Types
//!
//! Stateless validation failures raised by the protocol layer.

use thiserror::Error;

/// An operation or transaction is malformed independent of chain state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid account name: {0:?}")]
    InvalidAccountName(String),

    #[error("Invalid amount for {field}: {reason}")]
    InvalidAmount { field: &'static str, reason: String },

    #[error("Wrong asset for {field}: expected {expected}, got {actual}")]
    WrongSymbol {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid authority: {0}")]
    InvalidAuthority(String),

    #[error("Percentage out of range for {field}: {value}")]
    InvalidPercent { field: &'static str, value: u16 },

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Virtual operation {0} cannot be submitted")]
    VirtualOperation(&'static str),

    #[error("Proposal operations cannot be nested inside a proposal")]
    NestedProposal,

    #[error("Transaction contains no operations")]
    EmptyTransaction,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),
}

impl ProtocolError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
