//! Order book, genesis balance claims and stable conversions.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::{ChainConfig, ErrorCategory, GenesisBalance, UnclaimedBalance};
    use shared_types::{
        AccountName, Asset, BalanceClaimOperation, ConvertOperation, FeedPublishOperation,
        LimitOrderCancelOperation, LimitOrderCreateOperation, Operation, Price,
    };

    const GENESIS_STABLE: i64 = 10_000;

    /// A chain where `bob` owns an unclaimed stable genesis balance and
    /// `alice` holds 1000 core.
    fn market() -> (TestChain, AccountName, AccountName) {
        let config = ChainConfig {
            genesis_balances: vec![GenesisBalance {
                owner: key("bob"),
                balance: Asset::stable(GENESIS_STABLE),
            }],
            ..ChainConfig::default()
        };
        let mut chain = TestChain::with_config(config);
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        chain.fund(&alice, 1_000);
        chain.push(vec![claim(&bob, GENESIS_STABLE)]).unwrap();
        (chain, alice, bob)
    }

    fn claim(to: &AccountName, amount: i64) -> Operation {
        BalanceClaimOperation {
            deposit_to_account: to.clone(),
            balance_owner_key: key(to.as_str()),
            total_claimed: Asset::stable(amount),
        }
        .into()
    }

    fn order(chain: &TestChain, owner: &AccountName, orderid: u32, sell: Asset, receive: Asset) -> LimitOrderCreateOperation {
        LimitOrderCreateOperation {
            owner: owner.clone(),
            orderid,
            amount_to_sell: sell,
            min_to_receive: receive,
            fill_or_kill: false,
            expiration: chain.now() + 3_600,
        }
    }

    #[test]
    fn test_claim_moves_genesis_balance() {
        let config = ChainConfig {
            genesis_balances: vec![GenesisBalance {
                owner: key("bob"),
                balance: Asset::stable(GENESIS_STABLE),
            }],
            ..ChainConfig::default()
        };
        let mut chain = TestChain::with_config(config);
        let bob = chain.create_account("bob");

        chain.push(vec![claim(&bob, 4_000)]).unwrap();
        assert_eq!(chain.account("bob").sbd_balance, 4_000);
        let left: Vec<_> = chain.db.store().table::<UnclaimedBalance>().iter().cloned().collect();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].balance, Asset::stable(6_000));

        let err = chain.push(vec![claim(&bob, 6_001)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);

        chain.push(vec![claim(&bob, 6_000)]).unwrap();
        assert_eq!(chain.db.store().table::<UnclaimedBalance>().iter().count(), 0);
        let err = chain.push(vec![claim(&bob, 1)]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_crossing_orders_fill() {
        let (mut chain, alice, bob) = market();
        let ask = order(&chain, &alice, 1, Asset::core(1_000), Asset::stable(1_000));
        chain.push(vec![ask.into()]).unwrap();
        assert_eq!(chain.account("alice").balance, 0);
        assert!(chain.db.find_limit_order(&alice, 1).is_some());

        let bid = order(&chain, &bob, 7, Asset::stable(1_000), Asset::core(1_000));
        chain.push(vec![bid.into()]).unwrap();

        assert!(chain.db.find_limit_order(&alice, 1).is_none());
        assert!(chain.db.find_limit_order(&bob, 7).is_none());
        let (a, b) = (chain.account("alice"), chain.account("bob"));
        assert_eq!(a.sbd_balance, 1_000);
        assert_eq!(b.balance, 1_000);
        assert_eq!(b.sbd_balance, GENESIS_STABLE - 1_000);
    }

    #[test]
    fn test_partial_fill_leaves_remainder_on_book() {
        let (mut chain, alice, bob) = market();
        let ask = order(&chain, &alice, 1, Asset::core(1_000), Asset::stable(1_000));
        chain.push(vec![ask.into()]).unwrap();

        let bid = order(&chain, &bob, 2, Asset::stable(400), Asset::core(400));
        chain.push(vec![bid.into()]).unwrap();

        let resting = chain.db.find_limit_order(&alice, 1).expect("remainder rests");
        assert_eq!(resting.for_sale, 600);
        assert_eq!(chain.account("bob").balance, 400);
        assert_eq!(chain.account("alice").sbd_balance, 400);
    }

    #[test]
    fn test_fill_or_kill_without_counterparty_is_rejected() {
        let (mut chain, alice, _) = market();
        let mut op = order(&chain, &alice, 1, Asset::core(500), Asset::stable(500));
        op.fill_or_kill = true;

        let err = chain.push(vec![op.into()]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert!(chain.db.find_limit_order(&alice, 1).is_none());
        assert_eq!(chain.account("alice").balance, 1_000);
    }

    #[test]
    fn test_cancel_refunds() {
        let (mut chain, alice, _) = market();
        let ask = order(&chain, &alice, 3, Asset::core(700), Asset::stable(900));
        chain.push(vec![ask.into()]).unwrap();
        assert_eq!(chain.account("alice").balance, 300);

        let cancel: Operation = LimitOrderCancelOperation {
            owner: alice.clone(),
            orderid: 3,
        }
        .into();
        chain.push(vec![cancel.clone()]).unwrap();
        assert_eq!(chain.account("alice").balance, 1_000);

        let err = chain.push(vec![cancel]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_expired_order_is_refunded() {
        let (mut chain, alice, _) = market();
        let mut ask = order(&chain, &alice, 1, Asset::core(1_000), Asset::stable(2_000));
        ask.expiration = chain.now() + 60;
        chain.push(vec![ask.into()]).unwrap();
        assert_eq!(chain.account("alice").balance, 0);

        chain.skip_time(60);
        assert!(chain.db.find_limit_order(&alice, 1).is_none());
        assert_eq!(chain.account("alice").balance, 1_000);
    }

    #[test]
    fn test_conversion_pays_at_median_feed() {
        let (mut chain, _, bob) = market();
        let init = chain.init();
        chain
            .push(vec![FeedPublishOperation {
                publisher: init,
                exchange_rate: Price::new(Asset::stable(1), Asset::core(2)),
            }
            .into()])
            .unwrap();

        chain
            .push(vec![ConvertOperation {
                owner: bob.clone(),
                requestid: 1,
                amount: Asset::stable(1_000),
            }
            .into()])
            .unwrap();
        assert_eq!(chain.account("bob").sbd_balance, GENESIS_STABLE - 1_000);
        assert_eq!(chain.account("bob").balance, 0);

        let delay = chain.db.config().conversion_delay;
        chain.skip_time(delay);
        assert_eq!(chain.account("bob").balance, 2_000);
    }
}
