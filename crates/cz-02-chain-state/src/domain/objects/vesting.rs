use super::{type_ids, IMPLEMENTATION_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::{AccountName, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VestingDelegation {
    pub id: Id<VestingDelegation>,
    pub delegator: AccountName,
    pub delegatee: AccountName,
    pub vesting_shares: i64,
    pub min_delegation_time: Timestamp,
}

impl Object for VestingDelegation {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::VESTING_DELEGATION;
    const TYPE_NAME: &'static str = "vesting_delegation";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<DelegationByPair>();
    }
}

pub struct DelegationByPair;

impl IndexSpec<VestingDelegation> for DelegationByPair {
    type Key = (AccountName, AccountName);
    const NAME: &'static str = "by_delegation";
    const UNIQUE: bool = true;

    fn key(obj: &VestingDelegation) -> Self::Key {
        (obj.delegator.clone(), obj.delegatee.clone())
    }
}

/// Delegated vesting on its way back to the delegator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VestingDelegationExpiration {
    pub id: Id<VestingDelegationExpiration>,
    pub delegator: AccountName,
    pub vesting_shares: i64,
    pub expiration: Timestamp,
}

impl Object for VestingDelegationExpiration {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::VESTING_DELEGATION_EXPIRATION;
    const TYPE_NAME: &'static str = "vesting_delegation_expiration";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ExpirationByTime>();
    }
}

pub struct ExpirationByTime;

impl IndexSpec<VestingDelegationExpiration> for ExpirationByTime {
    type Key = Timestamp;
    const NAME: &'static str = "by_expiration";

    fn key(obj: &VestingDelegationExpiration) -> Timestamp {
        obj.expiration
    }
}
