use super::{type_ids, IMPLEMENTATION_SPACE, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::{AccountName, Price, PublicKey, Timestamp};
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Witness {
    pub id: Id<Witness>,
    pub owner: AccountName,
    pub url: String,
    pub votes: i64,
    pub signing_key: PublicKey,
    pub created: Timestamp,
    /// Latest published stable/liquid rate, if any
    pub exchange_rate: Option<Price>,
    pub last_feed_update: Timestamp,
}

impl Object for Witness {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::WITNESS;
    const TYPE_NAME: &'static str = "witness";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<WitnessByOwner>();
        table.add_index::<WitnessByVote>();
    }
}

pub struct WitnessByOwner;

impl IndexSpec<Witness> for WitnessByOwner {
    type Key = AccountName;
    const NAME: &'static str = "by_owner";
    const UNIQUE: bool = true;

    fn key(obj: &Witness) -> AccountName {
        obj.owner.clone()
    }
}

pub struct WitnessByVote;

impl IndexSpec<Witness> for WitnessByVote {
    type Key = Reverse<i64>;
    const NAME: &'static str = "by_vote";

    fn key(obj: &Witness) -> Reverse<i64> {
        Reverse(obj.votes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WitnessVote {
    pub id: Id<WitnessVote>,
    pub witness: AccountName,
    pub account: AccountName,
}

impl Object for WitnessVote {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::WITNESS_VOTE;
    const TYPE_NAME: &'static str = "witness_vote";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<WitnessVoteByWitness>();
        table.add_index::<WitnessVoteByAccount>();
    }
}

pub struct WitnessVoteByWitness;

impl IndexSpec<WitnessVote> for WitnessVoteByWitness {
    type Key = (AccountName, AccountName);
    const NAME: &'static str = "by_witness_account";
    const UNIQUE: bool = true;

    fn key(obj: &WitnessVote) -> Self::Key {
        (obj.witness.clone(), obj.account.clone())
    }
}

pub struct WitnessVoteByAccount;

impl IndexSpec<WitnessVote> for WitnessVoteByAccount {
    type Key = AccountName;
    const NAME: &'static str = "by_account";

    fn key(obj: &WitnessVote) -> AccountName {
        obj.account.clone()
    }
}
