//! Friend graph and score.
//!
//! `friends` is symmetric. `second_level` of an account is the union of its
//! friends' friend sets without the account itself. Confirming a friendship
//! extends the affected sets in place; unfriending rebuilds them.

use super::Database;
use crate::domain::*;
use crate::{chain_ensure, structural_ensure};
use shared_types::AccountName;
use std::collections::BTreeSet;

/// Vesting shares per score unit (one whole VESTS).
const VESTS_PER_SCORE_UNIT: u64 = 1_000_000;

/// Score of `account` under `weights`. Depends only on the account's own
/// vesting and friend sets.
pub fn compute_score(account: &Account, weights: &ScoreWeights) -> i64 {
    let units = u64::try_from(account.vesting_shares).unwrap_or(0) / VESTS_PER_SCORE_UNIT;
    let vesting = i64::try_from(isqrt(units)).unwrap_or(i64::MAX);
    let friends = i64::try_from(account.friends.len()).unwrap_or(i64::MAX);
    let second = i64::try_from(account.second_level.len()).unwrap_or(i64::MAX);
    weights
        .vesting
        .saturating_mul(vesting)
        .saturating_add(weights.friend.saturating_mul(friends))
        .saturating_add(weights.second_level.saturating_mul(second))
}

fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = x / 2 + 1;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

impl Database {
    /// Records a friend request, or confirms the friendship if `other` has
    /// already asked.
    pub(crate) fn request_friendship(&mut self, account: &AccountName, other: &AccountName) -> ChainResult<()> {
        let requester = self.get_account(account)?;
        chain_ensure!(
            !requester.friends.contains(other),
            "{} and {} are already friends",
            account,
            other
        );
        let pending_from_other = requester.waiting.contains(other);
        let target = self.get_account(other)?;
        chain_ensure!(
            !target.waiting.contains(account),
            "{} already asked {} to be friends",
            account,
            other
        );

        if pending_from_other {
            self.confirm_friendship(account, other)
        } else {
            self.modify_account(other, |a| {
                a.waiting.insert(account.clone());
            })
        }
    }

    fn confirm_friendship(&mut self, a: &AccountName, b: &AccountName) -> ChainResult<()> {
        self.modify_account(a, |x| {
            x.waiting.remove(b);
            x.friends.insert(b.clone());
        })?;
        self.modify_account(b, |x| {
            x.waiting.remove(a);
            x.friends.insert(a.clone());
        })?;

        let a_friends = self.get_account(a)?.friends.clone();
        let b_friends = self.get_account(b)?.friends.clone();

        self.modify_account(a, |x| {
            x.second_level.extend(b_friends.iter().filter(|n| *n != a).cloned());
        })?;
        self.modify_account(b, |x| {
            x.second_level.extend(a_friends.iter().filter(|n| *n != b).cloned());
        })?;

        let mut touched: BTreeSet<AccountName> = [a.clone(), b.clone()].into();
        for friend in a_friends.iter().filter(|n| *n != b) {
            self.modify_account(friend, |x| {
                x.second_level.insert(b.clone());
            })?;
            touched.insert(friend.clone());
        }
        for friend in b_friends.iter().filter(|n| *n != a) {
            self.modify_account(friend, |x| {
                x.second_level.insert(a.clone());
            })?;
            touched.insert(friend.clone());
        }

        for name in &touched {
            self.recalculate_score(name)?;
        }
        Ok(())
    }

    /// Withdraws a pending request or ends a friendship.
    pub(crate) fn unfriend(&mut self, account: &AccountName, other: &AccountName) -> ChainResult<()> {
        let is_friend = self.get_account(account)?.friends.contains(other);
        let target = self.get_account(other)?;

        if !is_friend {
            if target.waiting.contains(account) {
                return self.modify_account(other, |a| {
                    a.waiting.remove(account);
                });
            }
            if self.get_account(account)?.waiting.contains(other) {
                return self.modify_account(account, |a| {
                    a.waiting.remove(other);
                });
            }
            return Err(ChainError::PreconditionFailed(format!(
                "{account} and {other} are not friends"
            )));
        }

        structural_ensure!(
            target.friends.contains(account),
            "friendship {} -> {} is one-sided",
            account,
            other
        );
        self.modify_account(account, |a| {
            a.friends.remove(other);
        })?;
        self.modify_account(other, |a| {
            a.friends.remove(account);
        })?;

        let mut affected: BTreeSet<AccountName> = [account.clone(), other.clone()].into();
        affected.extend(self.get_account(account)?.friends.iter().cloned());
        affected.extend(self.get_account(other)?.friends.iter().cloned());

        for name in &affected {
            let rebuilt = self.second_level_of(self.get_account(name)?)?;
            self.modify_account(name, |a| a.second_level = rebuilt)?;
        }
        for name in &affected {
            self.recalculate_score(name)?;
        }
        Ok(())
    }

    /// Second-level set of `account` recomputed from its friends' friend sets.
    pub(crate) fn second_level_of(&self, account: &Account) -> ChainResult<BTreeSet<AccountName>> {
        let mut out = BTreeSet::new();
        for friend in &account.friends {
            out.extend(
                self.get_account(friend)?
                    .friends
                    .iter()
                    .filter(|n| **n != account.name)
                    .cloned(),
            );
        }
        Ok(out)
    }

    pub(crate) fn recalculate_score(&mut self, name: &AccountName) -> ChainResult<()> {
        let account = self.get_account(name)?;
        let score = compute_score(account, &self.config.score);
        if score != account.score {
            self.modify_account(name, |a| a.score = score)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cz_01_object_store::Id;

    fn account(vesting: i64, friends: &[&str], second: &[&str]) -> Account {
        let mut a = Account::new(Id::new(1), AccountName::from("alice"), 0);
        a.vesting_shares = vesting;
        a.friends = friends.iter().map(|n| AccountName::from(*n)).collect();
        a.second_level = second.iter().map(|n| AccountName::from(*n)).collect();
        a
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u64::from(u32::MAX) * u64::from(u32::MAX)), u64::from(u32::MAX));
    }

    #[test]
    fn test_score_weights() {
        let weights = ScoreWeights::default();
        let a = account(100 * 1_000_000, &["bob", "carol"], &["dave"]);
        assert_eq!(compute_score(&a, &weights), 10 + 2 * 10 + 1);
    }

    #[test]
    fn test_score_is_monotone_in_vesting() {
        let weights = ScoreWeights::default();
        let mut last = 0;
        for vests in [0, 1_000_000, 4_000_000, 50_000_000, 1_000_000_000] {
            let score = compute_score(&account(vests, &[], &[]), &weights);
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn test_recalculate_score_is_idempotent() {
        let mut db = Database::open(ChainConfig::default()).expect("genesis");
        let bob = AccountName::from("bob");
        db.create_account(bob.clone(), |a| {
            a.vesting_shares = 9 * 1_000_000;
            a.friends.insert(AccountName::from("carol"));
        })
        .unwrap();

        db.recalculate_score(&bob).unwrap();
        let once = db.get_account(&bob).unwrap().clone();
        assert_eq!(once.score, 3 + 10);
        let table: Vec<Account> = db.store().table::<Account>().iter().cloned().collect();

        db.recalculate_score(&bob).unwrap();
        assert_eq!(db.get_account(&bob).unwrap(), &once);
        let again: Vec<Account> = db.store().table::<Account>().iter().cloned().collect();
        assert_eq!(again, table);
    }

    #[test]
    fn test_negative_vesting_scores_zero() {
        assert_eq!(compute_score(&account(-5, &[], &[]), &ScoreWeights::default()), 0);
    }
}
