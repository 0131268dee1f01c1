//! Block and transaction sessions, undo history and observers.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use cz_02_chain_state::{Account, ChainConfig, ErrorCategory, GlobalProperties, RecordingObserver, SessionPhase};
    use proptest::prelude::*;
    use shared_types::constants::BLOCK_INTERVAL;
    use shared_types::{Asset, Block, Operation, SignedTransaction};
    use std::sync::Arc;

    fn snapshot(chain: &TestChain) -> (GlobalProperties, Vec<Account>) {
        let global = chain.db.global().expect("global properties").clone();
        let accounts = chain.db.store().table::<Account>().iter().cloned().collect();
        (global, accounts)
    }

    fn with_history(blocks: usize) -> TestChain {
        TestChain::with_config(ChainConfig {
            max_undo_history: blocks,
            ..ChainConfig::default()
        })
    }

    #[test]
    fn test_pop_block_restores_previous_head() {
        let mut chain = with_history(3);
        let alice = chain.create_account("alice");
        let before = snapshot(&chain);

        let init = chain.init();
        chain.push(vec![transfer(&init, &alice, Asset::core(250))]).unwrap();
        assert_eq!(chain.account("alice").balance, 250);

        let popped = chain.db.pop_block().unwrap();
        assert_eq!(popped, before.0.head_block_number + 1);
        assert_eq!(snapshot(&chain), before);
        assert_eq!(chain.db.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_pop_block_is_bounded_by_history() {
        let mut chain = with_history(2);
        chain.produce_blocks(4);
        let head = chain.head();

        assert_eq!(chain.db.pop_block().unwrap(), head);
        assert_eq!(chain.db.pop_block().unwrap(), head - 1);
        assert_eq!(chain.head(), head - 2);

        let err = chain.db.pop_block().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
    }

    #[test]
    fn test_no_history_by_default() {
        let mut chain = TestChain::new();
        chain.produce_blocks(1);
        assert!(chain.db.pop_block().is_err());
        assert_eq!(chain.head(), 1);
    }

    #[test]
    fn test_abort_block_discards_everything() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let before = snapshot(&chain);

        let header = chain.next_header(BLOCK_INTERVAL);
        chain.db.begin_block_session(&header).unwrap();
        let init = chain.init();
        let tx = SignedTransaction::new(header.timestamp + 60, vec![transfer(&init, &alice, Asset::core(10))]);
        chain.db.push_transaction(&tx).unwrap();
        chain.db.abort_block().unwrap();

        assert_eq!(snapshot(&chain), before);
        assert_eq!(chain.db.phase(), SessionPhase::Idle);
        assert!(chain.db.abort_block().is_err());
    }

    #[test]
    fn test_rejected_transaction_keeps_block_open() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let init = chain.init();

        let header = chain.next_header(BLOCK_INTERVAL);
        chain.db.begin_block_session(&header).unwrap();
        let expiration = header.timestamp + 60;
        let overdraft = SignedTransaction::new(expiration, vec![transfer(&alice, &bob, Asset::core(1))]);
        let funding = SignedTransaction::new(expiration, vec![transfer(&init, &alice, Asset::core(5))]);

        let err = chain.db.push_transaction(&overdraft).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::PreconditionFailed);
        assert_eq!(chain.db.phase(), SessionPhase::Block);
        chain.db.push_transaction(&funding).unwrap();
        chain.db.commit_block().unwrap();

        assert_eq!(chain.account("alice").balance, 5);
        assert_eq!(chain.account("bob").balance, 0);
    }

    #[test]
    fn test_apply_block_is_all_or_nothing() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let bob = chain.create_account("bob");
        let init = chain.init();
        let before = snapshot(&chain);

        let header = chain.next_header(BLOCK_INTERVAL);
        let expiration = header.timestamp + 60;
        let block = Block {
            header,
            transactions: vec![
                SignedTransaction::new(expiration, vec![transfer(&init, &alice, Asset::core(5))]),
                SignedTransaction::new(expiration, vec![transfer(&alice, &bob, Asset::core(6))]),
            ],
        };

        assert!(chain.db.apply_block(&block).is_err());
        assert_eq!(snapshot(&chain), before);
    }

    #[test]
    fn test_observers_see_committed_operations() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let observer = Arc::new(RecordingObserver::new());
        chain.db.add_observer(observer.clone());

        let init = chain.init();
        chain.push(vec![transfer(&init, &alice, Asset::core(42))]).unwrap();

        let ops = observer.operations();
        let user: Vec<_> = ops.iter().filter(|n| !n.virtual_op).collect();
        assert_eq!(user.len(), 1);
        assert!(matches!(user[0].op, Operation::Transfer(_)));
        assert_eq!(user[0].trx_in_block, Some(0));
        assert_eq!(user[0].block_num, chain.head());

        let virtual_ops = observer.virtual_operations();
        assert!(virtual_ops
            .iter()
            .any(|n| matches!(n.op, Operation::ProducerReward(_)) && n.trx_in_block.is_none()));
        assert_eq!(observer.blocks().len(), 1);
        assert_eq!(observer.blocks()[0].block_num, chain.head());
    }

    #[test]
    fn test_aborted_block_notifies_nobody() {
        let mut chain = TestChain::new();
        let alice = chain.create_account("alice");
        let observer = Arc::new(RecordingObserver::new());
        chain.db.add_observer(observer.clone());

        let header = chain.next_header(BLOCK_INTERVAL);
        chain.db.begin_block_session(&header).unwrap();
        let init = chain.init();
        let tx = SignedTransaction::new(header.timestamp + 60, vec![transfer(&init, &alice, Asset::core(1))]);
        chain.db.push_transaction(&tx).unwrap();
        chain.db.abort_block().unwrap();

        assert!(observer.operations().is_empty());
        assert!(observer.blocks().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_aborted_block_leaves_no_trace(transfers in prop::collection::vec((any::<bool>(), 1i64..2_000), 1..12)) {
            let mut chain = TestChain::new();
            let alice = chain.create_account("alice");
            let bob = chain.create_account("bob");
            chain.fund(&alice, 1_000);
            let before = snapshot(&chain);

            let header = chain.next_header(BLOCK_INTERVAL);
            chain.db.begin_block_session(&header).unwrap();
            for (to_bob, amount) in transfers {
                let (from, to) = if to_bob { (&alice, &bob) } else { (&bob, &alice) };
                let tx = SignedTransaction::new(header.timestamp + 60, vec![transfer(from, to, Asset::core(amount))]);
                let _ = chain.db.push_transaction(&tx);
                prop_assert_eq!(chain.db.phase(), SessionPhase::Block);
            }
            chain.db.abort_block().unwrap();

            prop_assert_eq!(snapshot(&chain), before);
        }
    }
}
