//! # Database
//!
//! The chain state and its session boundary.
//!
//! ```text
//! begin_block_session ──► begin_transaction_session ──► apply_operation* ──► commit_transaction
//!        │                          │                          │               abort_transaction
//!        │                          └── one undo frame per ────┘
//!        │                              transaction, one per operation
//!        └──► commit_block (maintenance, invariants, notify, retire frame)
//!             abort_block
//! ```
//!
//! Every level owns one undo frame. Operation frames merge into the
//! transaction frame on success and are undone on error; transaction frames
//! merge into the block frame. A committed block frame is either made
//! permanent or, with `max_undo_history > 0`, retained for [`Database::pop_block`].
//!
//! Observers only see a block's operations once the block commits.

mod balance;
mod friends;
mod listening;
mod maintenance;
mod market;
mod proposals;
mod votes;

pub use friends::compute_score;
pub(crate) use votes::ProxyDelta;

use crate::domain::*;
use crate::evaluators::EvaluatorRegistry;
use crate::events::{AppliedOperation, BlockChanges};
use crate::ports::ChainObserver;
use crate::{chain_ensure, structural_ensure};
use cadenza_telemetry::{
    log_block_event, log_event, metric_inc, metric_set, BLOCKS_ABORTED, BLOCKS_COMMITTED,
    INVARIANT_FAILURES, OPERATIONS_APPLIED, OPERATIONS_REJECTED, TRANSACTIONS_REJECTED,
    UNDO_SESSION_DEPTH,
};
use cz_01_object_store::{Id, ObjectStore, StoreError, UndoDatabase};
use shared_types::constants::BLOCK_INTERVAL;
use shared_types::{
    AccountName, AssetSymbol, Authority, BlockHeader, Block, Operation, PublicKey,
    SignedTransaction, Timestamp,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

/// Which session level is innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Block,
    Transaction,
}

pub struct Database {
    store: ObjectStore,
    config: ChainConfig,
    evaluators: Arc<EvaluatorRegistry>,
    observers: Vec<Arc<dyn ChainObserver>>,
    phase: SessionPhase,
    /// Operations applied since the last block commit
    pending_notes: Vec<AppliedOperation>,
    /// `pending_notes` length at the start of each open undo frame
    note_marks: Vec<usize>,
    /// Block numbers whose frames are still open after commit
    retained_blocks: VecDeque<u64>,
    next_trx_in_block: u32,
    trx_in_block: Option<u32>,
    op_in_trx: u32,
}

impl UndoDatabase for Database {
    fn start_undo(&mut self) {
        self.store.start_undo();
        self.note_marks.push(self.pending_notes.len());
    }

    fn undo(&mut self) -> Result<(), StoreError> {
        self.store.undo()?;
        if let Some(mark) = self.note_marks.pop() {
            self.pending_notes.truncate(mark);
        }
        Ok(())
    }

    fn merge(&mut self) -> Result<(), StoreError> {
        self.store.merge()?;
        self.note_marks.pop();
        Ok(())
    }
}

fn register_tables(store: &mut ObjectStore) -> Result<(), StoreError> {
    store.register::<GlobalProperties>()?;
    store.register::<Account>()?;
    store.register::<UnclaimedBalance>()?;
    store.register::<VestingDelegation>()?;
    store.register::<VestingDelegationExpiration>()?;
    store.register::<Witness>()?;
    store.register::<WitnessVote>()?;
    store.register::<StreamingPlatform>()?;
    store.register::<StreamingPlatformVote>()?;
    store.register::<PseudonymousListener>()?;
    store.register::<StreamReportRequest>()?;
    store.register::<Report>()?;
    store.register::<Content>()?;
    store.register::<ContentVote>()?;
    store.register::<LimitOrder>()?;
    store.register::<ConvertRequest>()?;
    store.register::<Proposal>()?;
    Ok(())
}

impl Database {
    /// Opens a fresh chain at genesis with the default evaluators.
    pub fn open(config: ChainConfig) -> ChainResult<Self> {
        Self::open_with_evaluators(config, EvaluatorRegistry::with_defaults())
    }

    pub fn open_with_evaluators(
        config: ChainConfig,
        evaluators: EvaluatorRegistry,
    ) -> ChainResult<Self> {
        config
            .validate()
            .map_err(|e| ChainError::StructuralError(e.to_string()))?;

        let mut store = ObjectStore::new();
        register_tables(&mut store)?;

        let mut db = Self {
            store,
            config,
            evaluators: Arc::new(evaluators),
            observers: Vec::new(),
            phase: SessionPhase::Idle,
            pending_notes: Vec::new(),
            note_marks: Vec::new(),
            retained_blocks: VecDeque::new(),
            next_trx_in_block: 0,
            trx_in_block: None,
            op_in_trx: 0,
        };
        db.init_genesis()?;

        log_event!(
            info,
            "chain",
            "database opened at genesis",
            init_account = %db.config.init_account,
            init_supply = db.config.init_supply
        );
        Ok(db)
    }

    fn init_genesis(&mut self) -> ChainResult<()> {
        let config = self.config.clone();

        let mut unclaimed: BTreeMap<(PublicKey, AssetSymbol), i64> = BTreeMap::new();
        for entry in &config.genesis_balances {
            *unclaimed
                .entry((entry.owner.clone(), entry.balance.symbol))
                .or_default() += entry.balance.amount;
        }
        let unclaimed_of = |symbol: AssetSymbol| -> i64 {
            unclaimed
                .iter()
                .filter(|((_, s), _)| *s == symbol)
                .map(|(_, amount)| *amount)
                .sum()
        };
        let core_unclaimed = unclaimed_of(AssetSymbol::Core);
        let stable_unclaimed = unclaimed_of(AssetSymbol::Stable);

        let global_id = self.store.create(|id| GlobalProperties {
            id,
            head_block_number: 0,
            head_block_time: config.genesis_time,
            current_witness: config.init_account.clone(),
            current_supply: config.init_supply + core_unclaimed,
            current_sbd_supply: stable_unclaimed,
            total_vesting_fund: 0,
            total_vesting_shares: 0,
            total_reward_fund: 0,
            sbd_interest_rate: config.sbd_interest_rate,
            current_median_price: None,
            aggregates: ListeningAggregates::default(),
            last_content_payout: config.genesis_time,
            recent_slots_filled: u128::MAX,
            participation_count: 128,
        })?;
        structural_ensure!(
            global_id == GlobalProperties::ID,
            "global properties created as {}",
            global_id
        );

        let key_authority = Authority::key(config.init_public_key.clone());
        self.store.create(|id| Account {
            owner: key_authority.clone(),
            active: key_authority.clone(),
            basic: key_authority.clone(),
            memo_key: config.init_public_key.clone(),
            balance: config.init_supply,
            ..Account::new(id, config.init_account.clone(), config.genesis_time)
        })?;
        self.store.create(|id| Witness {
            id,
            owner: config.init_account.clone(),
            url: String::new(),
            votes: 0,
            signing_key: config.init_public_key.clone(),
            created: config.genesis_time,
            exchange_rate: None,
            last_feed_update: 0,
        })?;

        for ((owner, symbol), amount) in unclaimed {
            self.store.create(|id| UnclaimedBalance {
                id,
                owner,
                balance: shared_types::Asset::new(amount, symbol),
            })?;
        }
        Ok(())
    }

    // =========================================================================
    // SESSION BOUNDARY
    // =========================================================================

    /// Opens the block session and advances head block number, time and
    /// witness participation.
    pub fn begin_block_session(&mut self, header: &BlockHeader) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Idle,
            "block session opened while {:?} session is active",
            self.phase
        );
        let global = self.global()?;
        chain_ensure!(
            header.number == global.head_block_number + 1,
            "block {} does not follow head block {}",
            header.number,
            global.head_block_number
        );
        chain_ensure!(
            header.timestamp > global.head_block_time,
            "block time {} is not after head block time {}",
            header.timestamp,
            global.head_block_time
        );
        self.get_account(&header.witness)?;

        let missed_slots = ((header.timestamp - global.head_block_time) / BLOCK_INTERVAL).saturating_sub(1);
        let shift = u32::try_from(missed_slots.saturating_add(1)).unwrap_or(u32::MAX);

        self.start_undo();
        self.phase = SessionPhase::Block;
        self.next_trx_in_block = 0;
        self.trx_in_block = None;
        self.op_in_trx = 0;

        let advanced = self.modify_global(|g| {
            g.head_block_number = header.number;
            g.head_block_time = header.timestamp;
            g.current_witness = header.witness.clone();
            g.recent_slots_filled = g.recent_slots_filled.checked_shl(shift).unwrap_or(0) | 1;
            g.participation_count = g.recent_slots_filled.count_ones() as u8;
        });
        if let Err(err) = advanced {
            self.abort_block()?;
            return Err(err);
        }

        metric_set!(UNDO_SESSION_DEPTH, self.store.depth() as f64);
        log_block_event!(
            debug,
            "chain",
            "block session opened",
            header.number,
            header.timestamp,
            witness = %header.witness
        );
        Ok(())
    }

    pub fn begin_transaction_session(&mut self) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Block,
            "transaction session requires an open block session, phase is {:?}",
            self.phase
        );
        self.start_undo();
        self.phase = SessionPhase::Transaction;
        self.trx_in_block = Some(self.next_trx_in_block);
        self.op_in_trx = 0;
        Ok(())
    }

    /// Validates and applies one operation inside the open transaction.
    ///
    /// A recoverable error leaves the transaction as it was before the call.
    /// A fatal error aborts the whole block before it is returned.
    pub fn apply_operation(&mut self, op: &Operation) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Transaction,
            "apply_operation requires an open transaction session, phase is {:?}",
            self.phase
        );
        match self.apply_nested_operation(op) {
            Ok(()) => {
                self.op_in_trx += 1;
                Ok(())
            }
            Err(err) => {
                metric_inc!(OPERATIONS_REJECTED, &[op.tag().name(), err.category().as_str()]);
                if err.is_fatal() {
                    log_event!(
                        error,
                        "chain",
                        "fatal error while applying operation, aborting block",
                        operation = op.tag().name(),
                        error = %err
                    );
                    if let Err(abort_err) = self.abort_block() {
                        log_event!(error, "chain", "block abort failed", error = %abort_err);
                    }
                } else {
                    log_event!(
                        debug,
                        "chain",
                        "operation rejected",
                        operation = op.tag().name(),
                        error = %err
                    );
                }
                Err(err)
            }
        }
    }

    /// Applies `op` in its own undo frame. Used for transaction operations
    /// and for operations executed by proposals.
    pub(crate) fn apply_nested_operation(&mut self, op: &Operation) -> ChainResult<()> {
        op.validate()?;
        let evaluators = Arc::clone(&self.evaluators);
        let mut session = self.start_session();
        session.push_note(op.clone(), false)?;
        evaluators.apply(&mut session, op)?;
        session.merge()?;
        metric_inc!(OPERATIONS_APPLIED, &[op.tag().name()]);
        tracing::debug!(operation = op.tag().name(), "operation applied");
        Ok(())
    }

    pub fn commit_transaction(&mut self) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Transaction,
            "no transaction session to commit"
        );
        self.merge()?;
        self.phase = SessionPhase::Block;
        self.next_trx_in_block += 1;
        self.trx_in_block = None;
        Ok(())
    }

    pub fn abort_transaction(&mut self) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Transaction,
            "no transaction session to abort"
        );
        self.undo()?;
        self.phase = SessionPhase::Block;
        self.trx_in_block = None;
        metric_inc!(TRANSACTIONS_REJECTED);
        Ok(())
    }

    /// Runs per-block processing and the invariant check, then notifies
    /// observers and retires the block frame. Any failure aborts the block.
    pub fn commit_block(&mut self) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Block,
            "commit_block requires an open block session without a transaction, phase is {:?}",
            self.phase
        );

        let changes = match self.finalize_block() {
            Ok(changes) => changes,
            Err(err) => {
                log_event!(error, "chain", "block failed to finalize, aborting", error = %err);
                self.abort_block()?;
                return Err(err);
            }
        };

        let notes = std::mem::take(&mut self.pending_notes);
        for mark in &mut self.note_marks {
            *mark = 0;
        }
        for observer in &self.observers {
            for note in &notes {
                observer.on_applied_operation(note);
            }
            observer.on_block_committed(&changes);
        }

        self.retained_blocks.push_back(changes.block_num);
        while self.retained_blocks.len() > self.config.max_undo_history {
            self.retained_blocks.pop_front();
            self.store.commit();
            if !self.note_marks.is_empty() {
                self.note_marks.remove(0);
            }
        }
        self.phase = SessionPhase::Idle;

        metric_inc!(BLOCKS_COMMITTED);
        metric_set!(UNDO_SESSION_DEPTH, self.store.depth() as f64);
        log_block_event!(
            info,
            "chain",
            "block committed",
            changes.block_num,
            changes.timestamp,
            operations = notes.len(),
            changed = changes.changed.len(),
            removed = changes.removed.len()
        );
        Ok(())
    }

    fn finalize_block(&mut self) -> ChainResult<BlockChanges> {
        self.process_block()?;
        if self.config.validate_invariants_per_block {
            if let Err(err) = self.validate_invariants() {
                metric_inc!(INVARIANT_FAILURES);
                return Err(err);
            }
        }
        let global = self.global()?;
        let (block_num, timestamp) = (global.head_block_number, global.head_block_time);
        let set = self.store.changes()?;
        Ok(BlockChanges {
            block_num,
            timestamp,
            changed: set.changed,
            removed: set.removed,
        })
    }

    /// Undoes everything since `begin_block_session`, including an open
    /// transaction.
    pub fn abort_block(&mut self) -> ChainResult<()> {
        match self.phase {
            SessionPhase::Idle => {
                return Err(ChainError::StructuralError("no block session to abort".into()))
            }
            SessionPhase::Transaction => self.abort_transaction()?,
            SessionPhase::Block => {}
        }
        self.undo()?;
        self.phase = SessionPhase::Idle;
        self.trx_in_block = None;

        metric_inc!(BLOCKS_ABORTED);
        metric_set!(UNDO_SESSION_DEPTH, self.store.depth() as f64);
        log_event!(warn, "chain", "block session aborted");
        Ok(())
    }

    /// Undoes the most recently committed block still within
    /// `max_undo_history`.
    pub fn pop_block(&mut self) -> ChainResult<u64> {
        structural_ensure!(
            self.phase == SessionPhase::Idle,
            "pop_block while {:?} session is active",
            self.phase
        );
        let Some(block_num) = self.retained_blocks.pop_back() else {
            return Err(ChainError::PreconditionFailed(
                "no retained block to pop".to_string(),
            ));
        };
        self.undo()?;
        metric_set!(UNDO_SESSION_DEPTH, self.store.depth() as f64);
        log_event!(info, "chain", "block popped", block_num = block_num);
        Ok(block_num)
    }

    /// Applies a transaction in its own session. On error the transaction
    /// leaves no trace; the block session stays open unless the error is
    /// fatal.
    pub fn push_transaction(&mut self, tx: &SignedTransaction) -> ChainResult<()> {
        structural_ensure!(
            self.phase == SessionPhase::Block,
            "push_transaction requires an open block session, phase is {:?}",
            self.phase
        );
        tx.validate()?;
        let now = self.head_block_time()?;
        chain_ensure!(
            tx.expiration >= now,
            "transaction expired at {}, head block time is {}",
            tx.expiration,
            now
        );

        self.begin_transaction_session()?;
        for op in &tx.operations {
            if let Err(err) = self.apply_operation(op) {
                if self.phase == SessionPhase::Transaction {
                    self.abort_transaction()?;
                }
                log_event!(warn, "chain", "transaction rejected", error = %err);
                return Err(err);
            }
        }
        self.commit_transaction()
    }

    /// Applies a whole block. Any failing transaction invalidates the block.
    pub fn apply_block(&mut self, block: &Block) -> ChainResult<()> {
        self.begin_block_session(&block.header)?;
        for tx in &block.transactions {
            if let Err(err) = self.push_transaction(tx) {
                if self.phase != SessionPhase::Idle {
                    self.abort_block()?;
                }
                return Err(err);
            }
        }
        self.commit_block()
    }

    pub fn validate_invariants(&self) -> ChainResult<()> {
        match crate::invariants::check_all_invariants(self) {
            crate::invariants::InvariantCheckResult::Valid => Ok(()),
            crate::invariants::InvariantCheckResult::Invalid(violations) => {
                let joined = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ChainError::InvariantViolation(joined))
            }
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn ChainObserver>) {
        self.observers.push(observer);
    }

    // =========================================================================
    // NOTES
    // =========================================================================

    fn push_note(&mut self, op: Operation, virtual_op: bool) -> ChainResult<()> {
        let global = self.global()?;
        let note = AppliedOperation {
            op,
            block_num: global.head_block_number,
            trx_in_block: self.trx_in_block,
            op_in_trx: self.op_in_trx,
            virtual_op,
            timestamp: global.head_block_time,
        };
        self.pending_notes.push(note);
        Ok(())
    }

    /// Records an operation produced by the chain itself.
    pub(crate) fn push_virtual_operation(&mut self, op: impl Into<Operation>) -> ChainResult<()> {
        let op = op.into();
        metric_inc!(OPERATIONS_APPLIED, &[op.tag().name()]);
        self.push_note(op, true)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Read-only view of every table.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    pub fn global(&self) -> ChainResult<&GlobalProperties> {
        self.store
            .find(GlobalProperties::ID)
            .ok_or_else(|| ChainError::StructuralError("global properties missing".into()))
    }

    pub fn head_block_time(&self) -> ChainResult<Timestamp> {
        Ok(self.global()?.head_block_time)
    }

    pub fn head_block_num(&self) -> ChainResult<u64> {
        Ok(self.global()?.head_block_number)
    }

    pub fn find_account(&self, name: &AccountName) -> Option<&Account> {
        self.store.find_by::<Account, AccountByName>(name)
    }

    pub fn get_account(&self, name: &AccountName) -> ChainResult<&Account> {
        self.find_account(name)
            .ok_or_else(|| ChainError::not_found("account", name))
    }

    pub fn find_witness(&self, owner: &AccountName) -> Option<&Witness> {
        self.store.find_by::<Witness, WitnessByOwner>(owner)
    }

    pub fn get_witness(&self, owner: &AccountName) -> ChainResult<&Witness> {
        self.find_witness(owner)
            .ok_or_else(|| ChainError::not_found("witness", owner))
    }

    pub fn find_streaming_platform(&self, owner: &AccountName) -> Option<&StreamingPlatform> {
        self.store.find_by::<StreamingPlatform, PlatformByOwner>(owner)
    }

    pub fn get_streaming_platform(&self, owner: &AccountName) -> ChainResult<&StreamingPlatform> {
        self.find_streaming_platform(owner)
            .ok_or_else(|| ChainError::not_found("streaming platform", owner))
    }

    pub fn find_content(&self, url: &str) -> Option<&Content> {
        self.store.find_by::<Content, ContentByUrl>(&url.to_string())
    }

    pub fn get_content(&self, url: &str) -> ChainResult<&Content> {
        self.find_content(url)
            .ok_or_else(|| ChainError::not_found("content", url))
    }

    pub fn find_limit_order(&self, owner: &AccountName, orderid: u32) -> Option<&LimitOrder> {
        self.store
            .find_by::<LimitOrder, OrderByAccount>(&(owner.clone(), orderid))
    }

    pub fn find_stream_report_request(
        &self,
        requestor: &AccountName,
        reporter: &AccountName,
    ) -> Option<&StreamReportRequest> {
        self.store
            .find_by::<StreamReportRequest, RequestByPair>(&(requestor.clone(), reporter.clone()))
    }

    pub fn find_delegation(
        &self,
        delegator: &AccountName,
        delegatee: &AccountName,
    ) -> Option<&VestingDelegation> {
        self.store
            .find_by::<VestingDelegation, DelegationByPair>(&(delegator.clone(), delegatee.clone()))
    }

    pub fn get_proposal(&self, id: u64) -> ChainResult<&Proposal> {
        Ok(self.store.get(Id::<Proposal>::new(id))?)
    }

    /// Proposals that list `name` among their required approvals.
    pub fn proposals_awaiting(&self, name: &AccountName) -> Vec<&Proposal> {
        let table = self.store.table::<Proposal>();
        table
            .secondary::<RequiredApprovalIndex>()
            .awaiting(name)
            .filter_map(|id| table.find(id))
            .collect()
    }

    /// Accounts by liquid balance, largest first, ties by id.
    pub fn accounts_by_balance(&self) -> impl Iterator<Item = &Account> + '_ {
        self.store.iter_by::<Account, AccountByBalance>()
    }

    /// Accounts by score, highest first, ties by id.
    pub fn accounts_by_score(&self) -> impl Iterator<Item = &Account> + '_ {
        self.store.iter_by::<Account, AccountByScore>()
    }

    pub fn witnesses_by_vote(&self) -> impl Iterator<Item = &Witness> + '_ {
        self.store.iter_by::<Witness, WitnessByVote>()
    }

    pub fn streaming_platforms_by_vote(&self) -> impl Iterator<Item = &StreamingPlatform> + '_ {
        self.store.iter_by::<StreamingPlatform, PlatformByVote>()
    }

    // =========================================================================
    // MUTATION HELPERS
    // =========================================================================

    pub(crate) fn modify_account(
        &mut self,
        name: &AccountName,
        f: impl FnOnce(&mut Account),
    ) -> ChainResult<()> {
        let id = self.get_account(name)?.id;
        self.store.modify(id, f)?;
        Ok(())
    }

    pub(crate) fn modify_global(&mut self, f: impl FnOnce(&mut GlobalProperties)) -> ChainResult<()> {
        self.store.modify(GlobalProperties::ID, f)?;
        Ok(())
    }

    pub(crate) fn modify_streaming_platform(
        &mut self,
        owner: &AccountName,
        f: impl FnOnce(&mut StreamingPlatform),
    ) -> ChainResult<()> {
        let id = self.get_streaming_platform(owner)?.id;
        self.store.modify(id, f)?;
        Ok(())
    }

    /// Creates a named account with default voting state.
    pub(crate) fn create_account(
        &mut self,
        name: AccountName,
        init: impl FnOnce(&mut Account),
    ) -> ChainResult<()> {
        let created = self.head_block_time()?;
        self.store.create(|id| {
            let mut account = Account::new(id, name, created);
            init(&mut account);
            account
        })?;
        Ok(())
    }
}
