//! Transfers, vesting, delegation, redelegation and vote proxies.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::{check_all_invariants, ErrorCategory};
    use shared_types::constants::{
        DELEGATION_RETURN_PERIOD, VESTING_WITHDRAW_INTERVALS, VESTING_WITHDRAW_INTERVAL_SECONDS,
    };
    use shared_types::{
        AccountName, AccountWitnessProxyOperation, AccountWitnessVoteOperation, Asset,
        CancelStreamReportingOperation, DelegateVestingSharesOperation, Operation,
        RequestStreamReportingOperation, TransferToVestingOperation, WithdrawVestingOperation,
    };

    fn delegate(delegator: &AccountName, delegatee: &AccountName, vests: i64) -> Operation {
        DelegateVestingSharesOperation {
            delegator: delegator.clone(),
            delegatee: delegatee.clone(),
            vesting_shares: Asset::vests(vests),
        }
        .into()
    }

    fn request_reporting(requestor: &AccountName, reporter: &AccountName, redelegate_pct: u16) -> Operation {
        RequestStreamReportingOperation {
            requestor: requestor.clone(),
            reporter: reporter.clone(),
            reward_pct: 500,
            redelegate_pct,
        }
        .into()
    }

    // =========================================================================
    // TRANSFERS AND VESTING
    // =========================================================================

    #[test]
    fn test_account_create_vests_the_fee() {
        let mut chain = TestChain::new();
        let init_balance = chain.account("initminer").balance;

        chain.create_account("alice");

        let alice = chain.account("alice");
        assert_eq!(alice.vesting_shares, ACCOUNT_FEE * VESTS_PER_CORE);
        assert_eq!(alice.balance, 0);
        assert_eq!(chain.account("initminer").balance, init_balance - ACCOUNT_FEE);
        assert!(check_all_invariants(&chain.db).is_valid());
    }

    #[test]
    fn test_duplicate_account_is_rejected() {
        let mut chain = TestChain::new();
        chain.create_account("alice");
        let init_balance = chain.account("initminer").balance;

        let op = account_create(&chain.init(), "alice");
        let err = chain.push(vec![op]).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(chain.account("initminer").balance, init_balance);
    }

    #[test]
    fn test_overdraft_rejects_the_whole_transaction() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.fund(&alice, 500);

        let err = chain
            .push(vec![
                transfer(&alice, &bob, Asset::core(200)),
                transfer(&alice, &bob, Asset::core(400)),
            ])
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(chain.account("alice").balance, 500);
        assert_eq!(chain.account("bob").balance, 0);

        chain
            .push(vec![transfer(&alice, &bob, Asset::core(500))])
            .unwrap();
        assert_eq!(chain.account("alice").balance, 0);
        assert_eq!(chain.account("bob").balance, 500);
    }

    #[test]
    fn test_transfer_to_vesting() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.fund(&alice, 2_000);

        chain
            .push(vec![TransferToVestingOperation {
                from: alice.clone(),
                to: Some(bob),
                amount: Asset::core(2_000),
            }
            .into()])
            .unwrap();

        assert_eq!(chain.account("alice").balance, 0);
        assert_eq!(
            chain.account("bob").vesting_shares,
            (ACCOUNT_FEE + 2_000) * VESTS_PER_CORE
        );
    }

    #[test]
    fn test_vesting_withdrawal_pays_one_interval() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let vests = ACCOUNT_FEE * VESTS_PER_CORE;

        chain
            .push(vec![WithdrawVestingOperation {
                account: alice.clone(),
                vesting_shares: Asset::vests(vests),
            }
            .into()])
            .unwrap();
        let rate = vests / i64::from(VESTING_WITHDRAW_INTERVALS);
        assert_eq!(chain.account("alice").vesting_withdraw_rate, rate);

        chain.skip_time(VESTING_WITHDRAW_INTERVAL_SECONDS);

        let alice = chain.account("alice");
        assert_eq!(alice.vesting_shares, vests - rate);
        assert_eq!(alice.withdrawn, rate);
        assert_eq!(alice.balance, rate / VESTS_PER_CORE);
    }

    // =========================================================================
    // DELEGATION
    // =========================================================================

    #[test]
    fn test_delegation_returns_after_period() {
        let mut chain = TestChain::new();
        let init = chain.init();
        let alice = chain.create_account("alice");

        chain.push(vec![delegate(&init, &alice, 5_000)]).unwrap();
        assert_eq!(chain.account("alice").received_vesting_shares, 5_000);
        assert_eq!(chain.account("initminer").delegated_vesting_shares, 5_000);

        chain.push(vec![delegate(&init, &alice, 0)]).unwrap();
        assert_eq!(chain.account("alice").received_vesting_shares, 0);
        assert_eq!(chain.account("initminer").delegated_vesting_shares, 5_000);
        assert!(chain.db.find_delegation(&init, &alice).is_none());

        chain.skip_time(DELEGATION_RETURN_PERIOD);
        assert_eq!(chain.account("initminer").delegated_vesting_shares, 0);
    }

    #[test]
    fn test_redelegation_follows_received_vesting() {
        let mut chain = TestChain::new();
        let init = chain.init();
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");
        chain.push(vec![delegate(&init, &bob, 1_000)]).unwrap();

        chain.push(vec![request_reporting(&bob, &carol, 3_000)]).unwrap();
        assert_eq!(chain.account("bob").redelegated_vesting_shares, 300);
        assert_eq!(chain.account("carol").rereceived_vesting_shares, 300);

        chain.push(vec![request_reporting(&bob, &carol, 1_000)]).unwrap();
        let bob_account = chain.account("bob");
        assert_eq!(bob_account.redelegated_vesting_shares, 100);
        assert_eq!(bob_account.redelegations[&carol].redelegated, 100);
        assert_eq!(chain.account("carol").rereceived_vesting_shares, 100);

        // bob cannot give back vesting that is passed on to carol
        let err = chain.push(vec![delegate(&init, &bob, 50)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(chain.account("bob").received_vesting_shares, 1_000);

        chain
            .push(vec![CancelStreamReportingOperation {
                requestor: bob.clone(),
                reporter: carol.clone(),
            }
            .into()])
            .unwrap();
        let bob_account = chain.account("bob");
        assert_eq!(bob_account.redelegated_vesting_shares, 0);
        assert!(bob_account.redelegations.is_empty());
        assert_eq!(chain.account("carol").rereceived_vesting_shares, 0);
        assert!(chain.db.find_stream_report_request(&bob, &carol).is_none());
    }

    #[test]
    fn test_redelegation_percentages_are_capped() {
        let mut chain = TestChain::new();
        let init = chain.init();
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");
        let dave = chain.create_account("dave");
        chain.push(vec![delegate(&init, &bob, 1_000)]).unwrap();

        chain.push(vec![request_reporting(&bob, &carol, 6_000)]).unwrap();
        let err = chain
            .push(vec![request_reporting(&bob, &dave, 5_000)])
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(chain.account("bob").redelegated_vesting_shares, 600);
        assert_eq!(chain.account("dave").rereceived_vesting_shares, 0);
    }

    #[test]
    fn test_redelegation_without_received_vesting_is_rejected() {
        let mut chain = TestChain::new();
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");

        let err = chain
            .push(vec![request_reporting(&bob, &carol, 3_000)])
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);

        chain.push(vec![request_reporting(&bob, &carol, 0)]).unwrap();
        assert!(chain.db.find_stream_report_request(&bob, &carol).is_some());
    }

    // =========================================================================
    // WITNESS VOTES AND PROXIES
    // =========================================================================

    #[test]
    fn test_proxy_carries_vote_weight() {
        let mut chain = TestChain::new();
        let init = chain.init();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let vests = ACCOUNT_FEE * VESTS_PER_CORE;

        chain
            .push(vec![AccountWitnessVoteOperation {
                account: alice.clone(),
                witness: init.clone(),
                approve: true,
            }
            .into()])
            .unwrap();
        assert_eq!(chain.db.get_witness(&init).unwrap().votes, vests);

        let set_proxy = |proxy: Option<AccountName>| -> Operation {
            AccountWitnessProxyOperation {
                account: bob.clone(),
                proxy,
            }
            .into()
        };
        chain.push(vec![set_proxy(Some(alice.clone()))]).unwrap();
        assert_eq!(chain.account("alice").proxied_vsf_votes[0], vests);
        assert_eq!(chain.db.get_witness(&init).unwrap().votes, 2 * vests);

        chain.push(vec![set_proxy(None)]).unwrap();
        assert_eq!(chain.account("alice").proxied_vsf_votes[0], 0);
        assert_eq!(chain.db.get_witness(&init).unwrap().votes, vests);
    }

    #[test]
    fn test_proxy_loop_is_rejected() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");

        chain
            .push(vec![AccountWitnessProxyOperation {
                account: bob.clone(),
                proxy: Some(alice.clone()),
            }
            .into()])
            .unwrap();
        let err = chain
            .push(vec![AccountWitnessProxyOperation {
                account: alice,
                proxy: Some(bob),
            }
            .into()])
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert!(chain.account("alice").proxy.is_none());
    }

    #[test]
    fn test_rankings_break_ties_by_id() {
        let mut chain = TestChain::new();
        let bob = chain.create_account("bob");
        let carol = chain.create_account("carol");
        let dave = chain.create_account("dave");
        chain.fund(&bob, 50);
        chain.fund(&carol, 70);
        chain.fund(&dave, 3_050);
        chain
            .push(vec![TransferToVestingOperation {
                from: dave.clone(),
                to: None,
                amount: Asset::core(3_000),
            }
            .into()])
            .unwrap();

        let by_balance = |chain: &TestChain| -> Vec<AccountName> {
            chain.db.accounts_by_balance().map(|a| a.name.clone()).collect()
        };
        let by_score = |chain: &TestChain| -> Vec<AccountName> {
            chain
                .db
                .accounts_by_score()
                .map(|a| a.name.clone())
                .filter(|n| *n != chain.init())
                .collect()
        };
        let balances = by_balance(&chain);
        assert_eq!(balances, vec![chain.init(), carol.clone(), bob.clone(), dave.clone()]);
        assert_eq!(chain.account("bob").balance, chain.account("dave").balance);
        // dave vested 4 VESTS units, the others 1
        let scores = by_score(&chain);
        assert_eq!(scores, vec![dave.clone(), bob.clone(), carol.clone()]);

        let err = chain
            .push(vec![transfer(&bob, &carol, Asset::core(1_000))])
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(by_balance(&chain), balances);
        assert_eq!(by_score(&chain), scores);
    }
}
