//! # Chain Invariants
//!
//! Whole-state consistency checks, run after per-block processing when
//! `validate_invariants_per_block` is set and available to tests at any
//! time. Each check recomputes a derived quantity from the primary records
//! and compares it with the stored value.
//!
//! - Supply: every unit of the core and stable assets is held somewhere
//! - Vesting: `total_vesting_shares` is the sum of account vesting, and all
//!   of it is counted exactly once in witness vote weight
//! - Vote tallies: witness and platform votes equal the weight of their voters
//! - Delegation and redelegation bookkeeping on both ends
//! - Friend graph: symmetric, second level and score up to date
//! - Listening aggregates match the subject totals they summarize

use crate::database::{compute_score, Database};
use crate::domain::*;
use shared_types::constants::{MAX_PROXY_RECURSION_DEPTH, PERCENT_100};
use shared_types::{AccountName, AssetSymbol};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Core and stable supply equal the sum of everything that holds them.
pub fn check_supply_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let Ok(global) = db.global() else {
        violations.push(InvariantViolation::MissingGlobalProperties);
        return;
    };
    let store = db.store();

    let mut core: i128 = i128::from(global.total_vesting_fund) + i128::from(global.total_reward_fund);
    let mut stable: i128 = 0;
    for account in store.table::<Account>().iter() {
        core += i128::from(account.balance);
        stable += i128::from(account.sbd_balance);
    }
    for order in store.table::<LimitOrder>().iter() {
        match order.sell_price.base.symbol {
            AssetSymbol::Core => core += i128::from(order.for_sale),
            AssetSymbol::Stable => stable += i128::from(order.for_sale),
            AssetSymbol::Vests => {}
        }
    }
    for unclaimed in store.table::<UnclaimedBalance>().iter() {
        match unclaimed.balance.symbol {
            AssetSymbol::Core => core += i128::from(unclaimed.balance.amount),
            AssetSymbol::Stable => stable += i128::from(unclaimed.balance.amount),
            AssetSymbol::Vests => {}
        }
    }
    for request in store.table::<ConvertRequest>().iter() {
        stable += i128::from(request.amount);
    }

    if core != i128::from(global.current_supply) {
        violations.push(InvariantViolation::SupplyMismatch {
            symbol: AssetSymbol::Core,
            recorded: global.current_supply,
            computed: core,
        });
    }
    if stable != i128::from(global.current_sbd_supply) {
        violations.push(InvariantViolation::SupplyMismatch {
            symbol: AssetSymbol::Stable,
            recorded: global.current_sbd_supply,
            computed: stable,
        });
    }
}

/// `total_vesting_shares` is the sum of account vesting, and the vesting
/// counted in votes (own weight of non-proxying accounts, plus weight
/// stranded past the proxy depth limit) adds up to the same total.
pub fn check_vesting_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let Ok(global) = db.global() else {
        violations.push(InvariantViolation::MissingGlobalProperties);
        return;
    };
    let mut shares: i128 = 0;
    let mut voting: i128 = 0;
    for account in db.store().table::<Account>().iter() {
        shares += i128::from(account.vesting_shares);
        voting += match account.proxy {
            None => i128::from(account.witness_vote_weight()),
            Some(_) => i128::from(account.proxied_vsf_votes[MAX_PROXY_RECURSION_DEPTH - 1]),
        };
    }
    let recorded = global.total_vesting_shares;
    if shares != i128::from(recorded) {
        violations.push(InvariantViolation::VestingSharesMismatch {
            recorded,
            computed: shares,
        });
    }
    if voting != i128::from(recorded) {
        violations.push(InvariantViolation::VotingWeightMismatch {
            recorded,
            computed: voting,
        });
    }
}

/// Witness and platform tallies equal the weight of the accounts voting
/// for them, and voters never have a proxy.
pub fn check_vote_tally_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let store = db.store();
    let weight_of = |name: &AccountName| db.find_account(name).map(|a| (a.witness_vote_weight(), a.proxy.is_some()));

    let mut witness_tallies: BTreeMap<&AccountName, i64> = BTreeMap::new();
    let mut witness_counts: BTreeMap<&AccountName, u16> = BTreeMap::new();
    for vote in store.table::<WitnessVote>().iter() {
        match weight_of(&vote.account) {
            Some((_, true)) => violations.push(InvariantViolation::ProxiedVoter {
                account: vote.account.clone(),
            }),
            Some((weight, false)) => *witness_tallies.entry(&vote.witness).or_default() += weight,
            None => violations.push(InvariantViolation::DanglingReference {
                kind: "witness vote",
                name: vote.account.clone(),
            }),
        }
        *witness_counts.entry(&vote.account).or_default() += 1;
    }
    for witness in store.table::<Witness>().iter() {
        let computed = witness_tallies.get(&witness.owner).copied().unwrap_or(0);
        if witness.votes != computed {
            violations.push(InvariantViolation::VoteTallyMismatch {
                kind: "witness",
                owner: witness.owner.clone(),
                recorded: witness.votes,
                computed,
            });
        }
    }

    let mut platform_tallies: BTreeMap<&AccountName, i64> = BTreeMap::new();
    let mut platform_counts: BTreeMap<&AccountName, u16> = BTreeMap::new();
    for vote in store.table::<StreamingPlatformVote>().iter() {
        match weight_of(&vote.account) {
            Some((_, true)) => violations.push(InvariantViolation::ProxiedVoter {
                account: vote.account.clone(),
            }),
            Some((weight, false)) => {
                *platform_tallies.entry(&vote.streaming_platform).or_default() += weight
            }
            None => violations.push(InvariantViolation::DanglingReference {
                kind: "streaming platform vote",
                name: vote.account.clone(),
            }),
        }
        *platform_counts.entry(&vote.account).or_default() += 1;
    }
    for platform in store.table::<StreamingPlatform>().iter() {
        let computed = platform_tallies.get(&platform.owner).copied().unwrap_or(0);
        if platform.votes != computed {
            violations.push(InvariantViolation::VoteTallyMismatch {
                kind: "streaming platform",
                owner: platform.owner.clone(),
                recorded: platform.votes,
                computed,
            });
        }
    }

    for account in store.table::<Account>().iter() {
        let witnesses = witness_counts.get(&account.name).copied().unwrap_or(0);
        let platforms = platform_counts.get(&account.name).copied().unwrap_or(0);
        if account.witnesses_voted_for != witnesses || account.streaming_platforms_voted_for != platforms {
            violations.push(InvariantViolation::VoteCountMismatch {
                account: account.name.clone(),
                recorded: (account.witnesses_voted_for, account.streaming_platforms_voted_for),
                computed: (witnesses, platforms),
            });
        }
    }
}

/// Delegated and received vesting match the delegation records, and
/// redelegation stays within what was received.
pub fn check_delegation_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let store = db.store();
    let mut delegated: BTreeMap<&AccountName, i64> = BTreeMap::new();
    let mut received: BTreeMap<&AccountName, i64> = BTreeMap::new();
    for delegation in store.table::<VestingDelegation>().iter() {
        *delegated.entry(&delegation.delegator).or_default() += delegation.vesting_shares;
        *received.entry(&delegation.delegatee).or_default() += delegation.vesting_shares;
    }
    for expiration in store.table::<VestingDelegationExpiration>().iter() {
        *delegated.entry(&expiration.delegator).or_default() += expiration.vesting_shares;
    }

    let mut rereceived: BTreeMap<&AccountName, i64> = BTreeMap::new();
    for account in store.table::<Account>().iter() {
        for (reporter, entry) in &account.redelegations {
            *rereceived.entry(reporter).or_default() += entry.redelegated;
        }
    }

    for account in store.table::<Account>().iter() {
        let name = &account.name;
        let mut mismatch = |field: &'static str, recorded: i64, computed: i64| {
            if recorded != computed {
                violations.push(InvariantViolation::DelegationMismatch {
                    account: name.clone(),
                    field,
                    recorded,
                    computed,
                });
            }
        };
        mismatch(
            "delegated_vesting_shares",
            account.delegated_vesting_shares,
            delegated.get(name).copied().unwrap_or(0),
        );
        mismatch(
            "received_vesting_shares",
            account.received_vesting_shares,
            received.get(name).copied().unwrap_or(0),
        );
        mismatch(
            "redelegated_vesting_shares",
            account.redelegated_vesting_shares,
            account.redelegations.values().map(|r| r.redelegated).sum(),
        );
        mismatch(
            "rereceived_vesting_shares",
            account.rereceived_vesting_shares,
            rereceived.get(name).copied().unwrap_or(0),
        );

        if account.total_redelegation_pct() > u32::from(PERCENT_100)
            || account.redelegated_vesting_shares > account.received_vesting_shares
        {
            violations.push(InvariantViolation::RedelegationExceedsReceived {
                account: name.clone(),
                pct: account.total_redelegation_pct(),
                redelegated: account.redelegated_vesting_shares,
                received: account.received_vesting_shares,
            });
        }
    }
}

/// Friendship is symmetric, second-level sets are current and scores
/// match their inputs.
pub fn check_friend_graph_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let weights = &db.config().score;
    for account in db.store().table::<Account>().iter() {
        for friend in &account.friends {
            let symmetric = db
                .find_account(friend)
                .is_some_and(|other| other.friends.contains(&account.name));
            if !symmetric {
                violations.push(InvariantViolation::AsymmetricFriendship {
                    account: account.name.clone(),
                    friend: friend.clone(),
                });
            }
        }
        match db.second_level_of(account) {
            Ok(expected) if expected == account.second_level => {}
            _ => violations.push(InvariantViolation::StaleSecondLevel {
                account: account.name.clone(),
            }),
        }
        let score = compute_score(account, weights);
        if score != account.score {
            violations.push(InvariantViolation::StaleScore {
                account: account.name.clone(),
                recorded: account.score,
                computed: score,
            });
        }
    }
}

/// Global and per-platform aggregates equal a fresh computation over the
/// subject totals.
pub fn check_listening_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    let Ok(global) = db.global() else {
        violations.push(InvariantViolation::MissingGlobalProperties);
        return;
    };
    let store = db.store();

    let mut all_totals: Vec<u64> = Vec::new();
    let mut by_platform: BTreeMap<&AccountName, Vec<u64>> = BTreeMap::new();
    for account in store.table::<Account>().iter() {
        all_totals.push(u64::from(account.total_listening_time));
        for (platform, seconds) in &account.listening_time_by_platform {
            by_platform.entry(platform).or_default().push(u64::from(*seconds));
        }
    }
    for listener in store.table::<PseudonymousListener>().iter() {
        all_totals.push(listener.total_listening_time);
        by_platform
            .entry(&listener.streaming_platform)
            .or_default()
            .push(listener.total_listening_time);
    }
    for platform in store.table::<StreamingPlatform>().iter() {
        all_totals.push(platform.anonymous_listening_time);
        by_platform
            .entry(&platform.owner)
            .or_default()
            .push(platform.anonymous_listening_time);
    }

    let expected = ListeningAggregates::from_totals(all_totals);
    if expected != global.aggregates {
        violations.push(InvariantViolation::StaleListeningAggregates {
            scope: "global".to_string(),
        });
    }
    for platform in store.table::<StreamingPlatform>().iter() {
        let totals = by_platform.remove(&platform.owner).unwrap_or_default();
        if ListeningAggregates::from_totals(totals) != platform.aggregates {
            violations.push(InvariantViolation::StaleListeningAggregates {
                scope: platform.owner.to_string(),
            });
        }
    }
}

/// No account holds a negative amount of anything.
pub fn check_balances_invariant(db: &Database, violations: &mut Vec<InvariantViolation>) {
    for account in db.store().table::<Account>().iter() {
        let fields = [
            ("balance", account.balance),
            ("sbd_balance", account.sbd_balance),
            ("vesting_shares", account.vesting_shares),
            ("delegated_vesting_shares", account.delegated_vesting_shares),
            ("received_vesting_shares", account.received_vesting_shares),
        ];
        for (field, amount) in fields {
            if amount < 0 {
                violations.push(InvariantViolation::NegativeBalance {
                    account: account.name.clone(),
                    field,
                    amount,
                });
            }
        }
    }
}

/// Runs every check against the current state.
#[must_use]
pub fn check_all_invariants(db: &Database) -> InvariantCheckResult {
    let mut violations = Vec::new();

    check_supply_invariant(db, &mut violations);
    check_vesting_invariant(db, &mut violations);
    check_vote_tally_invariant(db, &mut violations);
    check_delegation_invariant(db, &mut violations);
    check_friend_graph_invariant(db, &mut violations);
    check_listening_invariant(db, &mut violations);
    check_balances_invariant(db, &mut violations);

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking all invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    Valid,
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    MissingGlobalProperties,
    SupplyMismatch {
        symbol: AssetSymbol,
        recorded: i64,
        computed: i128,
    },
    VestingSharesMismatch { recorded: i64, computed: i128 },
    VotingWeightMismatch { recorded: i64, computed: i128 },
    VoteTallyMismatch {
        kind: &'static str,
        owner: AccountName,
        recorded: i64,
        computed: i64,
    },
    VoteCountMismatch {
        account: AccountName,
        recorded: (u16, u16),
        computed: (u16, u16),
    },
    /// An account with a proxy still holds direct votes
    ProxiedVoter { account: AccountName },
    DanglingReference { kind: &'static str, name: AccountName },
    DelegationMismatch {
        account: AccountName,
        field: &'static str,
        recorded: i64,
        computed: i64,
    },
    RedelegationExceedsReceived {
        account: AccountName,
        pct: u32,
        redelegated: i64,
        received: i64,
    },
    AsymmetricFriendship { account: AccountName, friend: AccountName },
    StaleSecondLevel { account: AccountName },
    StaleScore {
        account: AccountName,
        recorded: i64,
        computed: i64,
    },
    StaleListeningAggregates { scope: String },
    NegativeBalance {
        account: AccountName,
        field: &'static str,
        amount: i64,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGlobalProperties => write!(f, "global properties missing"),
            Self::SupplyMismatch {
                symbol,
                recorded,
                computed,
            } => write!(f, "{symbol:?} supply is {recorded}, holdings add up to {computed}"),
            Self::VestingSharesMismatch { recorded, computed } => {
                write!(f, "total vesting shares is {recorded}, accounts hold {computed}")
            }
            Self::VotingWeightMismatch { recorded, computed } => {
                write!(f, "total vesting shares is {recorded}, voting weight adds up to {computed}")
            }
            Self::VoteTallyMismatch {
                kind,
                owner,
                recorded,
                computed,
            } => write!(f, "{kind} {owner} has {recorded} votes, voters weigh {computed}"),
            Self::VoteCountMismatch {
                account,
                recorded,
                computed,
            } => write!(
                f,
                "{account} counts {recorded:?} witness/platform votes, {computed:?} exist"
            ),
            Self::ProxiedVoter { account } => {
                write!(f, "{account} has a proxy but still votes directly")
            }
            Self::DanglingReference { kind, name } => {
                write!(f, "{kind} references missing account {name}")
            }
            Self::DelegationMismatch {
                account,
                field,
                recorded,
                computed,
            } => write!(f, "{account}.{field} is {recorded}, records add up to {computed}"),
            Self::RedelegationExceedsReceived {
                account,
                pct,
                redelegated,
                received,
            } => write!(
                f,
                "{account} redelegates {redelegated} ({pct} bp) of {received} received"
            ),
            Self::AsymmetricFriendship { account, friend } => {
                write!(f, "{account} lists {friend} as friend but not vice versa")
            }
            Self::StaleSecondLevel { account } => {
                write!(f, "second-level friends of {account} are out of date")
            }
            Self::StaleScore {
                account,
                recorded,
                computed,
            } => write!(f, "score of {account} is {recorded}, expected {computed}"),
            Self::StaleListeningAggregates { scope } => {
                write!(f, "listening aggregates of {scope} are out of date")
            }
            Self::NegativeBalance {
                account,
                field,
                amount,
            } => write!(f, "{account}.{field} is negative: {amount}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cz_01_object_store::UndoDatabase;

    fn open() -> Database {
        Database::open(ChainConfig::default()).expect("genesis")
    }

    #[test]
    fn test_genesis_is_valid() {
        let db = open();
        assert_eq!(check_all_invariants(&db), InvariantCheckResult::Valid);
    }

    #[test]
    fn test_detects_minted_balance() {
        let mut db = open();
        let init = db.config().init_account.clone();
        db.start_undo();
        db.modify_account(&init, |a| a.balance += 5).unwrap();

        let mut violations = Vec::new();
        check_supply_invariant(&db, &mut violations);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0],
            InvariantViolation::SupplyMismatch {
                symbol: AssetSymbol::Core,
                ..
            }
        ));

        db.undo().unwrap();
        assert!(check_all_invariants(&db).is_valid());
    }

    #[test]
    fn test_detects_one_sided_friendship() {
        let mut db = open();
        let init = db.config().init_account.clone();
        db.create_account(AccountName::from("bob"), |_| {}).unwrap();
        db.modify_account(&init, |a| {
            a.friends.insert(AccountName::from("bob"));
        })
        .unwrap();

        let mut violations = Vec::new();
        check_friend_graph_invariant(&db, &mut violations);
        assert!(violations.contains(&InvariantViolation::AsymmetricFriendship {
            account: init.clone(),
            friend: AccountName::from("bob"),
        }));
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::StaleScore { .. })));
    }

    #[test]
    fn test_detects_stale_listening_aggregates() {
        let mut db = open();
        let init = db.config().init_account.clone();
        db.modify_account(&init, |a| a.total_listening_time = 600).unwrap();

        let mut violations = Vec::new();
        check_listening_invariant(&db, &mut violations);
        assert_eq!(
            violations,
            vec![InvariantViolation::StaleListeningAggregates {
                scope: "global".to_string()
            }]
        );
    }

    #[test]
    fn test_violation_display() {
        let v = InvariantViolation::NegativeBalance {
            account: AccountName::from("alice"),
            field: "balance",
            amount: -3,
        };
        assert_eq!(v.to_string(), "alice.balance is negative: -3");
    }
}
