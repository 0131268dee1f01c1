use super::{type_ids, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, SecondaryIndex, Table};
use serde::Serialize;
use shared_types::{AccountName, Operation, Timestamp};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApprovalTier {
    Owner,
    Active,
    Basic,
    MasterContent,
    CompContent,
}

impl ApprovalTier {
    pub const ALL: [ApprovalTier; 5] = [
        ApprovalTier::Owner,
        ApprovalTier::Active,
        ApprovalTier::Basic,
        ApprovalTier::MasterContent,
        ApprovalTier::CompContent,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalSet {
    pub required: BTreeSet<AccountName>,
    pub available: BTreeSet<AccountName>,
}

impl ApprovalSet {
    pub fn is_satisfied(&self) -> bool {
        self.required.is_subset(&self.available)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Proposal {
    pub id: Id<Proposal>,
    pub proposer: AccountName,
    pub proposed_ops: Vec<Operation>,
    pub expiration_time: Timestamp,
    /// Approvals are frozen from this time on; execution waits for expiration
    pub review_period_time: Option<Timestamp>,
    pub owner: ApprovalSet,
    pub active: ApprovalSet,
    pub basic: ApprovalSet,
    pub master_content: ApprovalSet,
    pub comp_content: ApprovalSet,
}

impl Proposal {
    pub fn tier(&self, tier: ApprovalTier) -> &ApprovalSet {
        match tier {
            ApprovalTier::Owner => &self.owner,
            ApprovalTier::Active => &self.active,
            ApprovalTier::Basic => &self.basic,
            ApprovalTier::MasterContent => &self.master_content,
            ApprovalTier::CompContent => &self.comp_content,
        }
    }

    pub fn tier_mut(&mut self, tier: ApprovalTier) -> &mut ApprovalSet {
        match tier {
            ApprovalTier::Owner => &mut self.owner,
            ApprovalTier::Active => &mut self.active,
            ApprovalTier::Basic => &mut self.basic,
            ApprovalTier::MasterContent => &mut self.master_content,
            ApprovalTier::CompContent => &mut self.comp_content,
        }
    }

    /// True once every required approval in every tier is present.
    pub fn is_authorized(&self) -> bool {
        ApprovalTier::ALL.iter().all(|t| self.tier(*t).is_satisfied())
    }

    pub fn required_accounts(&self) -> BTreeSet<&AccountName> {
        ApprovalTier::ALL
            .iter()
            .flat_map(|t| self.tier(*t).required.iter())
            .collect()
    }
}

impl Object for Proposal {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::PROPOSAL;
    const TYPE_NAME: &'static str = "proposal";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ProposalByExpiration>();
        table.add_secondary(RequiredApprovalIndex::default());
    }
}

pub struct ProposalByExpiration;

impl IndexSpec<Proposal> for ProposalByExpiration {
    type Key = Timestamp;
    const NAME: &'static str = "by_expiration";

    fn key(obj: &Proposal) -> Timestamp {
        obj.expiration_time
    }
}

/// Account name to the proposals that list it as a required approver.
///
/// Required sets are fixed at creation, so modifications are ignored.
#[derive(Debug, Default)]
pub struct RequiredApprovalIndex {
    awaiting: BTreeMap<AccountName, BTreeSet<u64>>,
}

impl RequiredApprovalIndex {
    pub fn awaiting(&self, name: &AccountName) -> impl Iterator<Item = Id<Proposal>> + '_ {
        self.awaiting
            .get(name)
            .into_iter()
            .flatten()
            .map(|instance| Id::new(*instance))
    }
}

impl SecondaryIndex<Proposal> for RequiredApprovalIndex {
    fn name(&self) -> &'static str {
        "required_approval"
    }

    fn insert(&mut self, obj: &Proposal) {
        for name in obj.required_accounts() {
            self.awaiting
                .entry(name.clone())
                .or_default()
                .insert(obj.id.instance());
        }
    }

    fn remove(&mut self, obj: &Proposal) {
        for name in obj.required_accounts() {
            if let Some(ids) = self.awaiting.get_mut(name) {
                ids.remove(&obj.id.instance());
                if ids.is_empty() {
                    self.awaiting.remove(name);
                }
            }
        }
    }

    fn about_to_modify(&mut self, _before: &Proposal) {}

    fn modified(&mut self, _after: &Proposal) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}
