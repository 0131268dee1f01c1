//! # Cadenza-Chain State Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | cz-02 Block sessions | blocks of transfers, commit included |
//! | cz-02 Invariants | full check over a populated chain |
//! | cz-02 Friend graph | confirming friendships in a dense cluster |
//! | cz-01 Object store | indexed lookups |

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use cz_02_chain_state::{check_all_invariants, Account, AccountByName};
use cz_tests::fixtures::{name, transfer, TestChain};
use shared_types::constants::BLOCK_INTERVAL;
use shared_types::{Asset, FriendshipOperation, Operation, SignedTransaction};
use std::time::Duration;

fn populated_chain(accounts: usize) -> TestChain {
    let mut chain = TestChain::new();
    for i in 0..accounts {
        let account = chain.create_account(&format!("user{i}"));
        chain.fund(&account, 10_000);
    }
    chain
}

// ============================================================================
// CZ-02: Block Sessions
// ============================================================================

fn bench_block_application(c: &mut Criterion) {
    let mut group = c.benchmark_group("cz-02-block-application");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("transfers_per_block", size), &size, |b, &size| {
            b.iter_batched(
                || populated_chain(8),
                |mut chain| {
                    let header = chain.next_header(BLOCK_INTERVAL);
                    chain.db.begin_block_session(&header).expect("open block");
                    for i in 0..size {
                        let from = name(&format!("user{}", i % 8));
                        let to = name(&format!("user{}", (i + 1) % 8));
                        let tx = SignedTransaction::new(header.timestamp + 60, vec![transfer(&from, &to, Asset::core(1))]);
                        chain.db.push_transaction(&tx).expect("transfer");
                    }
                    chain.db.commit_block().expect("commit");
                    black_box(chain.head())
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// CZ-02: Invariant Check
// ============================================================================

fn bench_invariant_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("cz-02-invariants");

    for accounts in [10usize, 50] {
        let chain = populated_chain(accounts);
        group.bench_with_input(BenchmarkId::new("check_all", accounts), &chain, |b, chain| {
            b.iter(|| black_box(check_all_invariants(&chain.db).is_valid()))
        });
    }

    group.finish();
}

// ============================================================================
// CZ-02: Friend Graph
// ============================================================================

fn bench_friend_cluster(c: &mut Criterion) {
    let mut group = c.benchmark_group("cz-02-friend-graph");
    group.sample_size(10);

    let size = 12usize;
    let requests: Vec<Operation> = (0..size)
        .flat_map(|i| (0..size).filter(move |j| *j != i).map(move |j| (i, j)))
        .map(|(i, j)| {
            FriendshipOperation {
                account: name(&format!("user{i}")),
                other: name(&format!("user{j}")),
            }
            .into()
        })
        .collect();

    group.bench_function("full_cluster", |b| {
        b.iter_batched(
            || populated_chain(size),
            |mut chain| {
                for op in &requests {
                    chain.push(vec![op.clone()]).expect("friend request");
                }
                black_box(chain.account("user0").score)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

// ============================================================================
// CZ-01: Object Store Lookups
// ============================================================================

fn bench_indexed_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cz-01-object-store");
    let chain = populated_chain(50);
    let target = name("user25");

    group.bench_function("find_by_name", |b| {
        b.iter(|| {
            black_box(
                chain
                    .db
                    .store()
                    .find_by::<Account, AccountByName>(black_box(&target))
                    .map(|a| a.balance),
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_block_application,
    bench_invariant_check,
    bench_friend_cluster,
    bench_indexed_lookup,
);

criterion_main!(benches);
