use super::define_evaluator;
use crate::chain_ensure;
use crate::database::Database;
use crate::domain::*;
use shared_types::constants::{
    MIN_VOTE_INTERVAL_SEC, PERCENT_100, SECONDS_PER_DAY, VOTE_REGENERATION_SECONDS,
};
use shared_types::{
    ContentCreateOperation, ContentDisableOperation, ContentSide, ContentUpdateOperation,
    VoteOperation,
};

/// Full-weight votes an account can cast per day at full voting power.
const VOTES_PER_DAY: u64 = 10;

define_evaluator!(ContentCreateEvaluator, ContentCreate, ContentCreateOperation, content_create);
define_evaluator!(ContentUpdateEvaluator, ContentUpdate, ContentUpdateOperation, content_update);
define_evaluator!(ContentDisableEvaluator, ContentDisable, ContentDisableOperation, content_disable);
define_evaluator!(VoteEvaluator, Vote, VoteOperation, vote);

fn content_create(db: &mut Database, op: &ContentCreateOperation) -> ChainResult<()> {
    db.get_account(&op.uploader)?;
    chain_ensure!(
        db.find_content(&op.url).is_none(),
        "content {} already exists",
        op.url
    );
    for authority in std::iter::once(&op.manage_master).chain(&op.manage_comp) {
        for name in authority.account_auths.keys() {
            db.get_account(name)?;
        }
    }

    let now = db.head_block_time()?;
    db.store_mut().create(|id| Content {
        id,
        uploader: op.uploader.clone(),
        url: op.url.clone(),
        title: op.title.clone(),
        manage_master: op.manage_master.clone(),
        manage_comp: op.manage_comp.clone(),
        created: now,
        times_played: 0,
        times_played_24: 0,
        total_listening_time_24: 0,
        last_played: 0,
        net_votes: 0,
        accumulated_payout: 0,
        disabled: false,
    })?;
    Ok(())
}

fn content_update(db: &mut Database, op: &ContentUpdateOperation) -> ChainResult<()> {
    let content = db.get_content(&op.url)?;
    chain_ensure!(!content.disabled, "content {} is disabled", op.url);
    let id = content.id;
    if let Some(authority) = &op.new_management {
        for name in authority.account_auths.keys() {
            db.get_account(name)?;
        }
    }

    db.store_mut().modify(id, |c| {
        if let Some(title) = &op.new_title {
            c.title = title.clone();
        }
        if let Some(authority) = &op.new_management {
            match op.side {
                ContentSide::Master => c.manage_master = authority.clone(),
                ContentSide::Comp => c.manage_comp = Some(authority.clone()),
            }
        }
    })?;
    Ok(())
}

fn content_disable(db: &mut Database, op: &ContentDisableOperation) -> ChainResult<()> {
    let content = db.get_content(&op.url)?;
    chain_ensure!(!content.disabled, "content {} is already disabled", op.url);
    let id = content.id;
    db.store_mut().modify(id, |c| c.disabled = true)?;
    Ok(())
}

fn vote(db: &mut Database, op: &VoteOperation) -> ChainResult<()> {
    let now = db.head_block_time()?;
    let content = db.get_content(&op.url)?;
    chain_ensure!(!content.disabled, "content {} is disabled", op.url);
    let content_id = content.id;

    let voter = db.get_account(&op.voter)?;
    let elapsed = now.saturating_sub(voter.last_vote_time);
    chain_ensure!(
        elapsed >= MIN_VOTE_INTERVAL_SEC,
        "{} can only vote once every {} seconds",
        op.voter,
        MIN_VOTE_INTERVAL_SEC
    );
    let current_power = current_voting_power(voter.voting_power, elapsed);
    chain_ensure!(current_power > 0, "{} has no voting power left", op.voter);

    let existing = db
        .store()
        .find_by::<ContentVote, VoteByContentVoter>(&(content_id, op.voter.clone()))
        .map(|v| (v.id, v.weight));
    match existing {
        Some((_, weight)) => chain_ensure!(
            weight != op.weight,
            "{} already voted {} on {}",
            op.voter,
            weight,
            op.url
        ),
        None => chain_ensure!(op.weight != 0, "{} cannot cast an empty vote on {}", op.voter, op.url),
    }

    let used_power = used_voting_power(current_power, op.weight);
    chain_ensure!(
        used_power <= current_power,
        "{} does not have enough voting power",
        op.voter
    );
    db.modify_account(&op.voter, |a| {
        a.voting_power = current_power - used_power;
        a.last_vote_time = now;
    })?;

    let previous_sign = existing.map_or(0, |(_, w)| i32::from(w.signum()));
    let net_change = i32::from(op.weight.signum()) - previous_sign;
    db.store_mut().modify(content_id, |c| c.net_votes += net_change)?;

    match existing {
        Some((vote_id, _)) => db.store_mut().modify(vote_id, |v| {
            v.weight = op.weight;
            v.time = now;
        })?,
        None => {
            db.store_mut().create(|id| ContentVote {
                id,
                content: content_id,
                voter: op.voter.clone(),
                weight: op.weight,
                time: now,
            })?;
        }
    }
    Ok(())
}

/// Voting power after `elapsed` seconds of linear regeneration.
fn current_voting_power(stored: u16, elapsed: u64) -> u16 {
    let regenerated = u64::from(PERCENT_100) * elapsed / VOTE_REGENERATION_SECONDS;
    let power = (u64::from(stored) + regenerated).min(u64::from(PERCENT_100));
    u16::try_from(power).unwrap_or(PERCENT_100)
}

/// Power consumed by a vote of `weight` basis points, rounded up.
fn used_voting_power(current: u16, weight: i16) -> u16 {
    let scaled = u64::from(current) * u64::from(weight.unsigned_abs()) / u64::from(PERCENT_100);
    let denominator = VOTES_PER_DAY * VOTE_REGENERATION_SECONDS / SECONDS_PER_DAY;
    let used = scaled.div_ceil(denominator);
    u16::try_from(used).unwrap_or(u16::MAX)
}
