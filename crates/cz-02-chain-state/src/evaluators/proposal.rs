use super::define_evaluator;
use crate::chain_ensure;
use crate::database::Database;
use crate::domain::*;
use cz_01_object_store::Id;
use shared_types::constants::MAX_PROPOSAL_LIFETIME_SEC;
use shared_types::{ProposalCreateOperation, ProposalDeleteOperation, ProposalUpdateOperation};

define_evaluator!(ProposalCreateEvaluator, ProposalCreate, ProposalCreateOperation, proposal_create);
define_evaluator!(ProposalUpdateEvaluator, ProposalUpdate, ProposalUpdateOperation, proposal_update);
define_evaluator!(ProposalDeleteEvaluator, ProposalDelete, ProposalDeleteOperation, proposal_delete);

fn proposal_create(db: &mut Database, op: &ProposalCreateOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    chain_ensure!(
        op.expiration_time > now,
        "proposal expiration {} is not after head block time {}",
        op.expiration_time,
        now
    );
    chain_ensure!(
        op.expiration_time <= now + MAX_PROPOSAL_LIFETIME_SEC,
        "proposal expiration {} is more than {} seconds away",
        op.expiration_time,
        MAX_PROPOSAL_LIFETIME_SEC
    );
    let review_period_time = match op.review_period_seconds {
        Some(review) => {
            let starts = op.expiration_time.saturating_sub(u64::from(review));
            chain_ensure!(
                starts > now,
                "review period of {} seconds starts before head block time",
                review
            );
            Some(starts)
        }
        None => None,
    };
    db.get_account(&op.proposer)?;

    let [owner, active, basic, master, comp] = db.resolve_required_approvals(&op.proposed_ops)?;
    let approval = |required| ApprovalSet {
        required,
        available: Default::default(),
    };
    db.store_mut().create(|id| Proposal {
        id,
        proposer: op.proposer.clone(),
        proposed_ops: op.proposed_ops.clone(),
        expiration_time: op.expiration_time,
        review_period_time,
        owner: approval(owner),
        active: approval(active),
        basic: approval(basic),
        master_content: approval(master),
        comp_content: approval(comp),
    })?;
    Ok(())
}

fn proposal_update(db: &mut Database, op: &ProposalUpdateOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let id = Id::<Proposal>::new(op.proposal);
    let proposal = db.store().get(id)?;
    let adds = op.tiers().iter().any(|t| !t.add.is_empty());
    let review_period_time = proposal.review_period_time;

    if let Some(review) = review_period_time {
        chain_ensure!(
            !adds || now < review,
            "proposal {} is in review; approvals can only be withdrawn",
            op.proposal
        );
    }
    chain_ensure!(
        !adds || !proposal.is_authorized(),
        "proposal {} is already satisfied",
        op.proposal
    );
    for (tier, delta) in ApprovalTier::ALL.iter().zip(op.tiers()) {
        for name in &delta.add {
            chain_ensure!(
                proposal.tier(*tier).required.contains(name),
                "{} is not a required {:?} approver of proposal {}",
                name,
                tier,
                op.proposal
            );
        }
    }

    for (tier, delta) in ApprovalTier::ALL.into_iter().zip(op.tiers()) {
        db.update_approvals(id, tier, &delta.add, &delta.remove)?;
    }

    if review_period_time.is_none() && db.store().get(id)?.is_authorized() {
        db.try_execute_proposal(id)?;
    }
    Ok(())
}

fn proposal_delete(db: &mut Database, op: &ProposalDeleteOperation) -> ChainResult<()> {
    let id = Id::<Proposal>::new(op.proposal);
    let proposal = db.store().get(id)?;
    chain_ensure!(
        proposal.required_accounts().contains(&op.deleter),
        "{} is not a required approver of proposal {}",
        op.deleter,
        op.proposal
    );
    db.store_mut().remove(id)?;
    Ok(())
}
