//! Friend requests, the second-level set and score.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::ErrorCategory;
    use shared_types::{AccountName, FriendshipOperation, Operation, UnfriendOperation};
    use std::collections::BTreeSet;

    fn request(account: &AccountName, other: &AccountName) -> Operation {
        FriendshipOperation {
            account: account.clone(),
            other: other.clone(),
        }
        .into()
    }

    fn unfriend(account: &AccountName, other: &AccountName) -> Operation {
        UnfriendOperation {
            account: account.clone(),
            other: other.clone(),
        }
        .into()
    }

    fn befriend(chain: &mut TestChain, a: &AccountName, b: &AccountName) {
        chain.push(vec![request(a, b)]).unwrap();
        chain.push(vec![request(b, a)]).unwrap();
    }

    fn names(list: &[&str]) -> BTreeSet<AccountName> {
        list.iter().map(|n| name(n)).collect()
    }

    #[test]
    fn test_friendship_needs_both_sides() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");

        chain.push(vec![request(&alice, &bob)]).unwrap();
        assert_eq!(chain.account("bob").waiting, names(&["alice"]));
        assert!(chain.account("alice").friends.is_empty());

        chain.push(vec![request(&bob, &alice)]).unwrap();
        let (a, b) = (chain.account("alice"), chain.account("bob"));
        assert_eq!(a.friends, names(&["bob"]));
        assert_eq!(b.friends, names(&["alice"]));
        assert!(a.waiting.is_empty() && b.waiting.is_empty());
        // one score unit of vesting plus one friend
        assert_eq!(a.score, 11);
        assert_eq!(b.score, 11);
    }

    #[test]
    fn test_repeated_request_is_rejected() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.push(vec![request(&alice, &bob)]).unwrap();

        let err = chain.push(vec![request(&alice, &bob)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);

        chain.push(vec![request(&bob, &alice)]).unwrap();
        let err = chain.push(vec![request(&alice, &bob)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    }

    #[test]
    fn test_second_level_follows_the_graph() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");

        befriend(&mut chain, &alice, &bob);
        befriend(&mut chain, &bob, &carol);

        let (a, b, c) = (chain.account("alice"), chain.account("bob"), chain.account("carol"));
        assert_eq!(a.second_level, names(&["carol"]));
        assert_eq!(c.second_level, names(&["alice"]));
        assert!(b.second_level.is_empty());
        assert_eq!(a.score, 1 + 10 + 1);
        assert_eq!(b.score, 1 + 20);
        assert_eq!(c.score, 1 + 10 + 1);

        chain.push(vec![unfriend(&bob, &carol)]).unwrap();

        let (a, b, c) = (chain.account("alice"), chain.account("bob"), chain.account("carol"));
        assert!(a.second_level.is_empty());
        assert!(c.friends.is_empty() && c.second_level.is_empty());
        assert_eq!(b.friends, names(&["alice"]));
        assert_eq!(a.score, 11);
        assert_eq!(b.score, 11);
        assert_eq!(c.score, 1);
    }

    #[test]
    fn test_triangle_keeps_second_level_on_unfriend() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");
        let dave = chain.create_account("dave");

        befriend(&mut chain, &alice, &bob);
        befriend(&mut chain, &alice, &carol);
        befriend(&mut chain, &bob, &dave);
        befriend(&mut chain, &carol, &dave);
        assert_eq!(chain.account("alice").second_level, names(&["dave"]));

        // dave is still reachable through carol
        chain.push(vec![unfriend(&bob, &dave)]).unwrap();
        assert_eq!(chain.account("alice").second_level, names(&["dave"]));
        assert_eq!(chain.account("dave").second_level, names(&["alice"]));
        assert!(chain.account("bob").second_level.contains(&carol));
    }

    #[test]
    fn test_unfriend_withdraws_a_pending_request() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.push(vec![request(&alice, &bob)]).unwrap();

        chain.push(vec![unfriend(&alice, &bob)]).unwrap();
        assert!(chain.account("bob").waiting.is_empty());

        let err = chain.push(vec![unfriend(&alice, &bob)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    }

    #[test]
    fn test_closing_a_triangle() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");
        befriend(&mut chain, &alice, &bob);
        befriend(&mut chain, &bob, &carol);
        assert!(chain.account("bob").second_level.is_empty());

        befriend(&mut chain, &alice, &carol);

        let b = chain.account("bob");
        assert_eq!(b.friends, names(&["alice", "carol"]));
        assert_eq!(b.second_level, names(&["alice", "carol"]));
        // second level is the plain union over friends' friends, so a
        // direct friend reachable through another friend is listed too
        assert_eq!(chain.account("alice").second_level, names(&["bob", "carol"]));
        assert_eq!(chain.account("carol").second_level, names(&["alice", "bob"]));
        for n in ["alice", "bob", "carol"] {
            assert_eq!(chain.account(n).score, 1 + 2 * 10 + 2);
        }
    }
}

