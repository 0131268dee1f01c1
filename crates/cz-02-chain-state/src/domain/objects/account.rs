use super::{type_ids, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::constants::{MAX_PROXY_RECURSION_DEPTH, PERCENT_100, TIME_MAX};
use shared_types::{AccountName, Authority, PublicKey, Timestamp};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Share of received vesting passed on to one reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Redelegation {
    pub redelegate_pct: u16,
    pub redelegated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: Id<Account>,
    pub name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub basic: Authority,
    pub memo_key: PublicKey,
    pub json_metadata: String,
    pub created: Timestamp,

    pub balance: i64,

    pub sbd_balance: i64,
    /// Stable balance integrated over time since the last interest payment
    pub sbd_seconds: u128,
    pub sbd_seconds_last_update: Timestamp,
    pub sbd_last_interest_payment: Timestamp,

    pub vesting_shares: i64,
    pub delegated_vesting_shares: i64,
    pub received_vesting_shares: i64,
    pub redelegated_vesting_shares: i64,
    pub rereceived_vesting_shares: i64,

    pub vesting_withdraw_rate: i64,
    pub next_vesting_withdrawal: Timestamp,
    pub withdrawn: i64,
    pub to_withdraw: i64,

    pub proxy: Option<AccountName>,
    /// `proxied_vsf_votes[n]` is vesting proxied to this account from `n + 1`
    /// hops away
    pub proxied_vsf_votes: [i64; MAX_PROXY_RECURSION_DEPTH],
    pub witnesses_voted_for: u16,
    pub streaming_platforms_voted_for: u16,

    pub voting_power: u16,
    pub last_vote_time: Timestamp,

    pub average_bandwidth: u64,
    pub last_bandwidth_update: Timestamp,

    pub redelegations: BTreeMap<AccountName, Redelegation>,

    pub friends: BTreeSet<AccountName>,
    pub second_level: BTreeSet<AccountName>,
    /// Accounts whose friend request this account has not answered
    pub waiting: BTreeSet<AccountName>,

    /// Same-day listening, capped per account
    pub total_listening_time: u32,
    pub listening_time_by_platform: BTreeMap<AccountName, u32>,

    pub score: i64,
}

impl Account {
    /// Weight this account adds to the witnesses and platforms it votes for.
    pub fn witness_vote_weight(&self) -> i64 {
        self.vesting_shares + self.proxied_vsf_votes_total()
    }

    pub fn proxied_vsf_votes_total(&self) -> i64 {
        self.proxied_vsf_votes.iter().sum()
    }

    /// Vesting this account controls for content voting.
    pub fn effective_vesting_shares(&self) -> i64 {
        self.vesting_shares - self.delegated_vesting_shares + self.received_vesting_shares
            - self.redelegated_vesting_shares
            + self.rereceived_vesting_shares
    }

    /// Vesting not yet committed to delegations or a pending withdrawal.
    pub fn available_vesting_shares(&self) -> i64 {
        self.vesting_shares - self.delegated_vesting_shares - (self.to_withdraw - self.withdrawn)
    }

    pub fn total_redelegation_pct(&self) -> u32 {
        self.redelegations
            .values()
            .map(|r| u32::from(r.redelegate_pct))
            .sum()
    }

    pub fn new(id: Id<Account>, name: AccountName, created: Timestamp) -> Self {
        Self {
            id,
            name,
            owner: Authority::default(),
            active: Authority::default(),
            basic: Authority::default(),
            memo_key: PublicKey::default(),
            json_metadata: String::new(),
            created,
            balance: 0,
            sbd_balance: 0,
            sbd_seconds: 0,
            sbd_seconds_last_update: created,
            sbd_last_interest_payment: created,
            vesting_shares: 0,
            delegated_vesting_shares: 0,
            received_vesting_shares: 0,
            redelegated_vesting_shares: 0,
            rereceived_vesting_shares: 0,
            vesting_withdraw_rate: 0,
            next_vesting_withdrawal: TIME_MAX,
            withdrawn: 0,
            to_withdraw: 0,
            proxy: None,
            proxied_vsf_votes: Default::default(),
            witnesses_voted_for: 0,
            streaming_platforms_voted_for: 0,
            voting_power: PERCENT_100,
            last_vote_time: 0,
            average_bandwidth: 0,
            last_bandwidth_update: created,
            redelegations: BTreeMap::new(),
            friends: Default::default(),
            second_level: Default::default(),
            waiting: Default::default(),
            total_listening_time: 0,
            listening_time_by_platform: BTreeMap::new(),
            score: 0,
        }
    }
}

impl Object for Account {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::ACCOUNT;
    const TYPE_NAME: &'static str = "account";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<AccountByName>();
        table.add_index::<AccountByBalance>();
        table.add_index::<AccountByScore>();
        table.add_index::<AccountByNextWithdrawal>();
    }
}

pub struct AccountByName;

impl IndexSpec<Account> for AccountByName {
    type Key = AccountName;
    const NAME: &'static str = "by_name";
    const UNIQUE: bool = true;

    fn key(obj: &Account) -> AccountName {
        obj.name.clone()
    }
}

/// Largest liquid balance first.
pub struct AccountByBalance;

impl IndexSpec<Account> for AccountByBalance {
    type Key = Reverse<i64>;
    const NAME: &'static str = "by_balance";

    fn key(obj: &Account) -> Reverse<i64> {
        Reverse(obj.balance)
    }
}

/// Highest score first.
pub struct AccountByScore;

impl IndexSpec<Account> for AccountByScore {
    type Key = Reverse<i64>;
    const NAME: &'static str = "by_score";

    fn key(obj: &Account) -> Reverse<i64> {
        Reverse(obj.score)
    }
}

pub struct AccountByNextWithdrawal;

impl IndexSpec<Account> for AccountByNextWithdrawal {
    type Key = Timestamp;
    const NAME: &'static str = "by_next_vesting_withdrawal";

    fn key(obj: &Account) -> Timestamp {
        obj.next_vesting_withdrawal
    }
}

/// A balance created at genesis, claimable by the holder of `owner`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnclaimedBalance {
    pub id: Id<UnclaimedBalance>,
    pub owner: PublicKey,
    pub balance: shared_types::Asset,
}

impl Object for UnclaimedBalance {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::UNCLAIMED_BALANCE;
    const TYPE_NAME: &'static str = "unclaimed_balance";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<BalanceByOwner>();
    }
}

pub struct BalanceByOwner;

impl IndexSpec<UnclaimedBalance> for BalanceByOwner {
    type Key = (PublicKey, shared_types::AssetSymbol);
    const NAME: &'static str = "by_owner";
    const UNIQUE: bool = true;

    fn key(obj: &UnclaimedBalance) -> Self::Key {
        (obj.owner.clone(), obj.balance.symbol)
    }
}
