use cz_01_object_store::StoreError;
use shared_types::ProtocolError;
use std::fmt;
use thiserror::Error;

/// How far an error propagates.
///
/// `NotFound` and `PreconditionFailed` reject the operation (and its
/// transaction). `InvariantViolation` and `StructuralError` abort the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    PreconditionFailed,
    InvariantViolation,
    StructuralError,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::PreconditionFailed => "precondition_failed",
            ErrorCategory::InvariantViolation => "invariant_violation",
            ErrorCategory::StructuralError => "structural_error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Structural error: {0}")]
    StructuralError(String),

    #[error("Invalid operation: {0}")]
    Protocol(#[from] ProtocolError),
}

pub type ChainResult<T> = Result<T, ChainError>;

impl ChainError {
    pub fn not_found(kind: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChainError::NotFound { .. } => ErrorCategory::NotFound,
            ChainError::PreconditionFailed(_) | ChainError::Protocol(_) => {
                ErrorCategory::PreconditionFailed
            }
            ChainError::InvariantViolation(_) => ErrorCategory::InvariantViolation,
            ChainError::StructuralError(_) => ErrorCategory::StructuralError,
        }
    }

    /// Fatal errors invalidate the whole block.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::InvariantViolation | ErrorCategory::StructuralError
        )
    }
}

impl From<StoreError> for ChainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { type_name, id } => ChainError::not_found(type_name, id),
            StoreError::UniqueConstraint { .. } => ChainError::PreconditionFailed(err.to_string()),
            other => ChainError::StructuralError(other.to_string()),
        }
    }
}

/// Returns `PreconditionFailed` with a formatted message unless `$cond` holds.
#[macro_export]
macro_rules! chain_ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::ChainError::PreconditionFailed(format!($($arg)+)));
        }
    };
}

/// Returns `StructuralError` with a formatted message unless `$cond` holds.
#[macro_export]
macro_rules! structural_ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::ChainError::StructuralError(format!($($arg)+)));
        }
    };
}
