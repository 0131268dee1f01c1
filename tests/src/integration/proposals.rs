//! Multi-party proposals: approval tiers, review periods and expiry.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::{ErrorCategory, Proposal};
    use shared_types::{
        AccountName, ApprovalDelta, Asset, Operation, ProposalCreateOperation,
        ProposalDeleteOperation, ProposalUpdateOperation,
    };

    fn propose(chain: &TestChain, proposer: &AccountName, op: Operation, lifetime: u64, review: Option<u32>) -> Operation {
        ProposalCreateOperation {
            proposer: proposer.clone(),
            proposed_ops: vec![op],
            expiration_time: chain.now() + lifetime,
            review_period_seconds: review,
        }
        .into()
    }

    fn approve_active(proposal: u64, approver: &AccountName) -> Operation {
        let mut delta = ApprovalDelta::default();
        delta.add.insert(approver.clone());
        ProposalUpdateOperation {
            proposal,
            owner_approvals: ApprovalDelta::default(),
            active_approvals: delta,
            basic_approvals: ApprovalDelta::default(),
            master_content_approvals: ApprovalDelta::default(),
            comp_content_approvals: ApprovalDelta::default(),
        }
        .into()
    }

    /// `alice` holds 500 core and `bob` proposes that she pays him 100.
    fn pending_payment(lifetime: u64, review: Option<u32>) -> (TestChain, AccountName, AccountName, u64) {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.fund(&alice, 500);

        let payment = transfer(&alice, &bob, Asset::core(100));
        let create = propose(&chain, &bob, payment, lifetime, review);
        chain.push(vec![create]).unwrap();

        let awaiting = chain.db.proposals_awaiting(&alice);
        assert_eq!(awaiting.len(), 1);
        let id = awaiting[0].id.instance();
        (chain, alice, bob, id)
    }

    #[test]
    fn test_active_approval_executes() {
        let (mut chain, alice, bob, id) = pending_payment(3_600, None);
        let proposal = chain.db.get_proposal(id).unwrap();
        assert!(proposal.active.required.contains(&alice));
        assert!(!proposal.active.required.contains(&bob));

        chain.push(vec![approve_active(id, &alice)]).unwrap();

        assert!(chain.db.get_proposal(id).is_err());
        assert_eq!(chain.account("alice").balance, 400);
        assert_eq!(chain.account("bob").balance, 100);
        assert!(chain.db.proposals_awaiting(&alice).is_empty());
    }

    #[test]
    fn test_unrequired_approval_is_rejected() {
        let (mut chain, _, bob, id) = pending_payment(3_600, None);
        let err = chain.push(vec![approve_active(id, &bob)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert!(chain.db.get_proposal(id).is_ok());
    }

    #[test]
    fn test_failed_execution_keeps_the_proposal() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let overdraft = transfer(&alice, &bob, Asset::core(100));
        let create = propose(&chain, &bob, overdraft, 3_600, None);
        chain.push(vec![create]).unwrap();
        let id = chain.db.proposals_awaiting(&alice)[0].id.instance();

        chain.push(vec![approve_active(id, &alice)]).unwrap();
        let proposal = chain.db.get_proposal(id).unwrap();
        assert!(proposal.is_authorized());
        assert_eq!(chain.account("bob").balance, 0);
    }

    #[test]
    fn test_only_required_approvers_delete() {
        let (mut chain, alice, bob, id) = pending_payment(3_600, None);
        let delete = |deleter: &AccountName| -> Operation {
            ProposalDeleteOperation {
                proposal: id,
                deleter: deleter.clone(),
                using_owner_authority: false,
            }
            .into()
        };

        let err = chain.push(vec![delete(&bob)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);

        chain.push(vec![delete(&alice)]).unwrap();
        assert!(chain.db.get_proposal(id).is_err());
        assert_eq!(chain.db.store().table::<Proposal>().iter().count(), 0);
    }

    #[test]
    fn test_review_period_defers_execution() {
        let (mut chain, alice, _, id) = pending_payment(600, Some(300));
        chain.push(vec![approve_active(id, &alice)]).unwrap();
        assert_eq!(chain.account("bob").balance, 0);
        assert!(chain.db.get_proposal(id).unwrap().is_authorized());

        chain.skip_time(600);
        assert!(chain.db.get_proposal(id).is_err());
        assert_eq!(chain.account("bob").balance, 100);
    }

    #[test]
    fn test_approvals_close_with_the_review_period() {
        let (mut chain, alice, _, id) = pending_payment(600, Some(300));
        chain.skip_time(300);

        let err = chain.push(vec![approve_active(id, &alice)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    }

    #[test]
    fn test_unapproved_proposal_expires() {
        let (mut chain, alice, _, id) = pending_payment(600, None);
        chain.skip_time(600);

        assert!(chain.db.get_proposal(id).is_err());
        assert!(chain.db.proposals_awaiting(&alice).is_empty());
        assert_eq!(chain.account("alice").balance, 500);
    }
}
