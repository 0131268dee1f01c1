use super::BaseOperation;
use crate::constants::MAX_PROPOSAL_LIFETIME_SEC;
use crate::{AccountName, Operation, ProtocolError, RequiredAuthorities, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCreateOperation {
    pub proposer: AccountName,
    pub proposed_ops: Vec<Operation>,
    pub expiration_time: Timestamp,
    /// When set, the proposal only executes at expiration, and approvals
    /// are frozen for the final `review_period_seconds`.
    #[serde(default)]
    pub review_period_seconds: Option<u32>,
}

impl BaseOperation for ProposalCreateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.proposer.validate()?;
        if self.proposed_ops.is_empty() {
            return Err(ProtocolError::field("proposed_ops", "must not be empty"));
        }
        for op in &self.proposed_ops {
            if op.is_proposal_management() {
                return Err(ProtocolError::NestedProposal);
            }
            op.validate()?;
        }
        if let Some(review) = self.review_period_seconds {
            if u64::from(review) > MAX_PROPOSAL_LIFETIME_SEC {
                return Err(ProtocolError::field("review_period_seconds", "longer than proposal lifetime"));
            }
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.proposer.clone());
    }
}

/// One tier's approval delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDelta {
    #[serde(default)]
    pub add: BTreeSet<AccountName>,
    #[serde(default)]
    pub remove: BTreeSet<AccountName>,
}

impl ApprovalDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    fn validate(&self, field: &'static str) -> Result<(), ProtocolError> {
        for name in self.add.iter().chain(&self.remove) {
            name.validate()?;
        }
        if self.add.intersection(&self.remove).next().is_some() {
            return Err(ProtocolError::field(field, "cannot add and remove the same approval"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalUpdateOperation {
    pub proposal: u64,
    #[serde(default)]
    pub owner_approvals: ApprovalDelta,
    #[serde(default)]
    pub active_approvals: ApprovalDelta,
    #[serde(default)]
    pub basic_approvals: ApprovalDelta,
    #[serde(default)]
    pub master_content_approvals: ApprovalDelta,
    #[serde(default)]
    pub comp_content_approvals: ApprovalDelta,
}

impl ProposalUpdateOperation {
    pub fn tiers(&self) -> [&ApprovalDelta; 5] {
        [
            &self.owner_approvals,
            &self.active_approvals,
            &self.basic_approvals,
            &self.master_content_approvals,
            &self.comp_content_approvals,
        ]
    }
}

impl BaseOperation for ProposalUpdateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        if self.tiers().iter().all(|t| t.is_empty()) {
            return Err(ProtocolError::field("proposal_update", "no approvals changed"));
        }
        self.owner_approvals.validate("owner_approvals")?;
        self.active_approvals.validate("active_approvals")?;
        self.basic_approvals.validate("basic_approvals")?;
        self.master_content_approvals.validate("master_content_approvals")?;
        self.comp_content_approvals.validate("comp_content_approvals")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.owner.extend(self.owner_approvals.add.iter().cloned());
        auths.owner.extend(self.owner_approvals.remove.iter().cloned());
        for tier in [
            &self.active_approvals,
            &self.master_content_approvals,
            &self.comp_content_approvals,
        ] {
            auths.active.extend(tier.add.iter().cloned());
            auths.active.extend(tier.remove.iter().cloned());
        }
        auths.basic.extend(self.basic_approvals.add.iter().cloned());
        auths.basic.extend(self.basic_approvals.remove.iter().cloned());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDeleteOperation {
    pub proposal: u64,
    pub deleter: AccountName,
    #[serde(default)]
    pub using_owner_authority: bool,
}

impl BaseOperation for ProposalDeleteOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.deleter.validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        if self.using_owner_authority {
            auths.owner.insert(self.deleter.clone());
        } else {
            auths.active.insert(self.deleter.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FriendshipOperation, UnfriendOperation};

    #[test]
    fn test_nested_proposal_rejected() {
        let inner = ProposalDeleteOperation {
            proposal: 0,
            deleter: "alice".into(),
            using_owner_authority: false,
        };
        let op = ProposalCreateOperation {
            proposer: "alice".into(),
            proposed_ops: vec![inner.into()],
            expiration_time: 1_000,
            review_period_seconds: None,
        };
        assert_eq!(op.validate(), Err(ProtocolError::NestedProposal));
    }

    #[test]
    fn test_proposed_ops_are_validated() {
        let op = ProposalCreateOperation {
            proposer: "alice".into(),
            proposed_ops: vec![
                FriendshipOperation {
                    account: "alice".into(),
                    other: "bob".into(),
                }
                .into(),
                UnfriendOperation {
                    account: "bob".into(),
                    other: "bob".into(),
                }
                .into(),
            ],
            expiration_time: 1_000,
            review_period_seconds: None,
        };
        assert!(op.validate().is_err());
    }

    #[test]
    fn test_update_overlap_rejected() {
        let mut op = ProposalUpdateOperation {
            proposal: 1,
            owner_approvals: ApprovalDelta::default(),
            active_approvals: ApprovalDelta::default(),
            basic_approvals: ApprovalDelta::default(),
            master_content_approvals: ApprovalDelta::default(),
            comp_content_approvals: ApprovalDelta::default(),
        };
        assert!(op.validate().is_err());
        op.active_approvals.add.insert("alice".into());
        assert!(op.validate().is_ok());
        op.active_approvals.remove.insert("alice".into());
        assert!(op.validate().is_err());
    }
}
