//! # Evaluators
//!
//! One evaluator per user operation kind, looked up by [`OperationTag`].
//! The database validates the operation and opens a nested undo session
//! before calling [`Evaluator::apply`], so an evaluator may return early
//! with `?` at any point without leaving partial writes behind.
//!
//! Virtual operations have no evaluator; they are produced by the chain.

mod account;
mod content;
mod market;
mod proposal;
mod social;
mod streaming;
mod witness;

pub use account::*;
pub use content::*;
pub use market::*;
pub use proposal::*;
pub use social::*;
pub use streaming::*;
pub use witness::*;

use crate::database::Database;
use crate::domain::{ChainError, ChainResult};
use shared_types::{Operation, OperationTag};
use std::collections::HashMap;

/// Applies one kind of operation to the database.
pub trait Evaluator: Send + Sync {
    fn tag(&self) -> OperationTag;

    fn apply(&self, db: &mut Database, op: &Operation) -> ChainResult<()>;
}

/// Typed evaluator for a single operation payload.
pub trait OperationEvaluator: Send + Sync {
    type Op;
    const TAG: OperationTag;

    fn extract(op: &Operation) -> Option<&Self::Op>;

    fn do_apply(&self, db: &mut Database, op: &Self::Op) -> ChainResult<()>;
}

impl<E: OperationEvaluator> Evaluator for E {
    fn tag(&self) -> OperationTag {
        E::TAG
    }

    fn apply(&self, db: &mut Database, op: &Operation) -> ChainResult<()> {
        let payload = E::extract(op).ok_or_else(|| {
            ChainError::StructuralError(format!(
                "{} evaluator received {}",
                E::TAG.name(),
                op.tag().name()
            ))
        })?;
        self.do_apply(db, payload)
    }
}

/// Declares a unit evaluator struct bound to one `Operation` variant.
macro_rules! define_evaluator {
    ($name:ident, $variant:ident, $op:ty, $apply:path) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl $crate::evaluators::OperationEvaluator for $name {
            type Op = $op;
            const TAG: shared_types::OperationTag = shared_types::OperationTag::$variant;

            fn extract(op: &shared_types::Operation) -> Option<&$op> {
                match op {
                    shared_types::Operation::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn do_apply(
                &self,
                db: &mut $crate::database::Database,
                op: &$op,
            ) -> $crate::domain::ChainResult<()> {
                $apply(db, op)
            }
        }
    };
}
pub(crate) use define_evaluator;

/// Dispatch table from operation tag to evaluator.
#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<OperationTag, Box<dyn Evaluator>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an evaluator for every user operation.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(AccountCreateEvaluator);
        registry.register(TransferEvaluator);
        registry.register(TransferToVestingEvaluator);
        registry.register(WithdrawVestingEvaluator);
        registry.register(DelegateVestingSharesEvaluator);
        registry.register(BalanceClaimEvaluator);
        registry.register(WitnessUpdateEvaluator);
        registry.register(AccountWitnessVoteEvaluator);
        registry.register(AccountWitnessProxyEvaluator);
        registry.register(FeedPublishEvaluator);
        registry.register(LimitOrderCreateEvaluator);
        registry.register(LimitOrderCancelEvaluator);
        registry.register(ConvertEvaluator);
        registry.register(StreamingPlatformUpdateEvaluator);
        registry.register(AccountStreamingPlatformVoteEvaluator);
        registry.register(RequestStreamReportingEvaluator);
        registry.register(CancelStreamReportingEvaluator);
        registry.register(StreamingPlatformReportEvaluator);
        registry.register(FriendshipEvaluator);
        registry.register(UnfriendEvaluator);
        registry.register(ContentCreateEvaluator);
        registry.register(ContentUpdateEvaluator);
        registry.register(ContentDisableEvaluator);
        registry.register(VoteEvaluator);
        registry.register(ProposalCreateEvaluator);
        registry.register(ProposalUpdateEvaluator);
        registry.register(ProposalDeleteEvaluator);
        registry
    }

    /// Installs `evaluator`, replacing any previous one for its tag.
    pub fn register<E: Evaluator + 'static>(&mut self, evaluator: E) {
        self.evaluators.insert(evaluator.tag(), Box::new(evaluator));
    }

    pub fn contains(&self, tag: OperationTag) -> bool {
        self.evaluators.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    pub fn apply(&self, db: &mut Database, op: &Operation) -> ChainResult<()> {
        let evaluator = self.evaluators.get(&op.tag()).ok_or_else(|| {
            ChainError::StructuralError(format!("no evaluator registered for {}", op.tag().name()))
        })?;
        evaluator.apply(db, op)
    }
}
