use super::define_evaluator;
use crate::chain_ensure;
use crate::database::{Database, ProxyDelta};
use crate::domain::*;
use shared_types::constants::{MAX_ACCOUNT_WITNESS_VOTES, MAX_FEED_AGE, MAX_PROXY_RECURSION_DEPTH};
use shared_types::{
    AccountWitnessProxyOperation, AccountWitnessVoteOperation, FeedPublishOperation, Price,
    WitnessUpdateOperation,
};

define_evaluator!(WitnessUpdateEvaluator, WitnessUpdate, WitnessUpdateOperation, witness_update);
define_evaluator!(AccountWitnessVoteEvaluator, AccountWitnessVote, AccountWitnessVoteOperation, account_witness_vote);
define_evaluator!(
    AccountWitnessProxyEvaluator,
    AccountWitnessProxy,
    AccountWitnessProxyOperation,
    account_witness_proxy
);
define_evaluator!(FeedPublishEvaluator, FeedPublish, FeedPublishOperation, feed_publish);

fn witness_update(db: &mut Database, op: &WitnessUpdateOperation) -> ChainResult<()> {
    db.get_account(&op.owner)?;
    if let Some(id) = db.find_witness(&op.owner).map(|w| w.id) {
        db.store_mut().modify(id, |w| {
            w.url = op.url.clone();
            w.signing_key = op.block_signing_key.clone();
        })?;
        return Ok(());
    }

    let now = db.head_block_time()?;
    db.pay_to_reward_fund(&op.owner, op.fee.amount)?;
    db.store_mut().create(|id| Witness {
        id,
        owner: op.owner.clone(),
        url: op.url.clone(),
        votes: 0,
        signing_key: op.block_signing_key.clone(),
        created: now,
        exchange_rate: None,
        last_feed_update: 0,
    })?;
    Ok(())
}

fn account_witness_vote(db: &mut Database, op: &AccountWitnessVoteOperation) -> ChainResult<()> {
    let voter = db.get_account(&op.account)?;
    if let Some(proxy) = &voter.proxy {
        return Err(ChainError::PreconditionFailed(format!(
            "{} votes through proxy {}; clear the proxy first",
            op.account, proxy
        )));
    }
    let (weight, voted_for) = (voter.witness_vote_weight(), voter.witnesses_voted_for);
    let witness_id = db.get_witness(&op.witness)?.id;
    let existing = db
        .store()
        .find_by::<WitnessVote, WitnessVoteByWitness>(&(op.witness.clone(), op.account.clone()))
        .map(|v| v.id);

    match (op.approve, existing) {
        (true, Some(_)) => Err(ChainError::PreconditionFailed(format!(
            "{} already votes for witness {}",
            op.account, op.witness
        ))),
        (true, None) => {
            chain_ensure!(
                voted_for < MAX_ACCOUNT_WITNESS_VOTES,
                "{} already votes for {} witnesses",
                op.account,
                MAX_ACCOUNT_WITNESS_VOTES
            );
            db.store_mut().create(|id| WitnessVote {
                id,
                witness: op.witness.clone(),
                account: op.account.clone(),
            })?;
            db.store_mut().modify(witness_id, |w| w.votes += weight)?;
            db.modify_account(&op.account, |a| a.witnesses_voted_for += 1)
        }
        (false, Some(vote_id)) => {
            db.store_mut().remove(vote_id)?;
            db.store_mut().modify(witness_id, |w| w.votes -= weight)?;
            db.modify_account(&op.account, |a| a.witnesses_voted_for -= 1)
        }
        (false, None) => Err(ChainError::PreconditionFailed(format!(
            "{} does not vote for witness {}",
            op.account, op.witness
        ))),
    }
}

fn account_witness_proxy(db: &mut Database, op: &AccountWitnessProxyOperation) -> ChainResult<()> {
    let account = db.get_account(&op.account)?;
    chain_ensure!(
        account.proxy != op.proxy,
        "proxy of {} is already {:?}",
        op.account,
        op.proxy
    );

    let mut delta: ProxyDelta = [0; MAX_PROXY_RECURSION_DEPTH + 1];
    delta[0] = -account.vesting_shares;
    for (i, proxied) in account.proxied_vsf_votes.iter().enumerate() {
        delta[i + 1] = -proxied;
    }

    if let Some(proxy) = &op.proxy {
        let mut cursor = db.get_account(proxy)?;
        loop {
            chain_ensure!(
                cursor.name != op.account,
                "proxying {} to {} would create a proxy loop",
                op.account,
                proxy
            );
            match &cursor.proxy {
                Some(next) => cursor = db.get_account(next)?,
                None => break,
            }
        }
    }

    db.adjust_proxied_witness_votes_layers(&op.account, &delta)?;
    match &op.proxy {
        Some(proxy) => {
            db.clear_witness_votes(&op.account)?;
            db.modify_account(&op.account, |a| a.proxy = Some(proxy.clone()))?;
            let added = delta.map(|d| -d);
            db.adjust_proxied_witness_votes_layers(&op.account, &added)
        }
        None => db.modify_account(&op.account, |a| a.proxy = None),
    }
}

fn feed_publish(db: &mut Database, op: &FeedPublishOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let id = db.get_witness(&op.publisher)?.id;
    db.store_mut().modify(id, |w| {
        w.exchange_rate = Some(op.exchange_rate);
        w.last_feed_update = now;
    })?;
    update_median_feed(db)
}

/// Median of the feeds published within `MAX_FEED_AGE`.
fn update_median_feed(db: &mut Database) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let mut feeds: Vec<Price> = db
        .store()
        .table::<Witness>()
        .iter()
        .filter(|w| now.saturating_sub(w.last_feed_update) <= MAX_FEED_AGE)
        .filter_map(|w| w.exchange_rate)
        .collect();
    feeds.sort_by_key(Price::ratio);
    let median = feeds.get(feeds.len() / 2).copied();
    db.modify_global(|g| g.current_median_price = median)
}
