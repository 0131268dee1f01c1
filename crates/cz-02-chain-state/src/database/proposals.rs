//! Proposal approval resolution and execution.

use super::Database;
use crate::domain::*;
use crate::chain_ensure;
use cadenza_telemetry::log_event;
use cz_01_object_store::{Id, UndoDatabase};
use shared_types::{AccountName, Authority, Operation, Timestamp};
use std::collections::BTreeSet;

/// Required approvals of a proposal, indexed by [`ApprovalTier`].
pub(crate) type RequiredApprovals = [BTreeSet<AccountName>; 5];

impl Database {
    /// Names whose approval `ops` need in each tier. A name required at a
    /// higher tier is not repeated at a lower one. Content tiers resolve to
    /// the accounts of the content's management authority.
    pub(crate) fn resolve_required_approvals(&self, ops: &[Operation]) -> ChainResult<RequiredApprovals> {
        let mut owner = BTreeSet::new();
        let mut active = BTreeSet::new();
        let mut basic = BTreeSet::new();
        let mut master = BTreeSet::new();
        let mut comp = BTreeSet::new();

        for op in ops {
            let auths = op.required_authorities();
            owner.extend(auths.owner);
            active.extend(auths.active);
            basic.extend(auths.basic);
            for url in &auths.master_content {
                master.extend(management_accounts(&self.get_content(url)?.manage_master));
            }
            for url in &auths.comp_content {
                let content = self.get_content(url)?;
                let Some(manage_comp) = &content.manage_comp else {
                    return Err(ChainError::PreconditionFailed(format!(
                        "content {url} has no composition management"
                    )));
                };
                comp.extend(management_accounts(manage_comp));
            }
        }

        active.retain(|name| !owner.contains(name));
        basic.retain(|name| !owner.contains(name) && !active.contains(name));

        for name in owner.iter().chain(&active).chain(&basic).chain(&master).chain(&comp) {
            self.get_account(name)?;
        }
        Ok([owner, active, basic, master, comp])
    }

    /// Applies every proposed operation in one nested session. Nothing is
    /// kept unless all of them succeed.
    fn execute_proposal(&mut self, id: Id<Proposal>) -> ChainResult<()> {
        let ops = self.store.get(id)?.proposed_ops.clone();
        let mut session = self.start_session();
        for op in &ops {
            session.apply_nested_operation(op)?;
        }
        session.merge()?;
        Ok(())
    }

    /// Executes and removes an authorized proposal. A recoverable failure
    /// leaves the proposal in place and returns `false`.
    pub(crate) fn try_execute_proposal(&mut self, id: Id<Proposal>) -> ChainResult<bool> {
        match self.execute_proposal(id) {
            Ok(()) => {
                self.store.remove(id)?;
                log_event!(debug, "proposal", "proposal executed", proposal = %id);
                Ok(true)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                log_event!(
                    warn,
                    "proposal",
                    "proposal execution failed",
                    proposal = %id,
                    error = %err
                );
                Ok(false)
            }
        }
    }

    /// Removes proposals that reached their expiration, executing the
    /// authorized ones first.
    pub(crate) fn clear_expired_proposals(&mut self, now: Timestamp) -> ChainResult<()> {
        let expired: Vec<_> = self
            .store
            .range_by::<Proposal, ProposalByExpiration, _>(..=now)
            .map(|p| p.id)
            .collect();
        for id in expired {
            if self.store.get(id)?.is_authorized() && self.try_execute_proposal(id)? {
                continue;
            }
            self.store.remove(id)?;
        }
        Ok(())
    }

    /// Applies one tier's approval changes.
    pub(crate) fn update_approvals(
        &mut self,
        id: Id<Proposal>,
        tier: ApprovalTier,
        add: &BTreeSet<AccountName>,
        remove: &BTreeSet<AccountName>,
    ) -> ChainResult<()> {
        if add.is_empty() && remove.is_empty() {
            return Ok(());
        }
        let proposal = self.store.get(id)?;
        let set = proposal.tier(tier);
        for name in add {
            chain_ensure!(
                !set.available.contains(name),
                "{} already approved proposal {} at {:?}",
                name,
                id,
                tier
            );
        }
        for name in remove {
            chain_ensure!(
                set.available.contains(name),
                "{} has not approved proposal {} at {:?}",
                name,
                id,
                tier
            );
        }
        self.store.modify(id, |p| {
            let set = p.tier_mut(tier);
            set.available.extend(add.iter().cloned());
            set.available.retain(|name| !remove.contains(name));
        })?;
        Ok(())
    }
}

fn management_accounts(authority: &Authority) -> impl Iterator<Item = AccountName> + '_ {
    authority.account_auths.keys().cloned()
}
