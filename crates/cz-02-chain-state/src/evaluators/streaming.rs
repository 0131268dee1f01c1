use super::define_evaluator;
use crate::database::Database;
use crate::domain::*;
use crate::{chain_ensure, structural_ensure};
use shared_types::constants::{MAX_STREAMING_PLATFORM_VOTES, PERCENT_100};
use shared_types::{
    AccountName, AccountStreamingPlatformVoteOperation, Asset, CancelStreamReportingOperation,
    RequestStreamReportingOperation, StreamingPlatformReportOperation,
    StreamingPlatformUpdateOperation,
};

define_evaluator!(
    StreamingPlatformUpdateEvaluator,
    StreamingPlatformUpdate,
    StreamingPlatformUpdateOperation,
    streaming_platform_update
);
define_evaluator!(
    AccountStreamingPlatformVoteEvaluator,
    AccountStreamingPlatformVote,
    AccountStreamingPlatformVoteOperation,
    account_streaming_platform_vote
);
define_evaluator!(
    RequestStreamReportingEvaluator,
    RequestStreamReporting,
    RequestStreamReportingOperation,
    request_stream_reporting
);
define_evaluator!(
    CancelStreamReportingEvaluator,
    CancelStreamReporting,
    CancelStreamReportingOperation,
    cancel_stream_reporting
);
define_evaluator!(
    StreamingPlatformReportEvaluator,
    StreamingPlatformReport,
    StreamingPlatformReportOperation,
    streaming_platform_report
);

fn streaming_platform_update(db: &mut Database, op: &StreamingPlatformUpdateOperation) -> ChainResult<()> {
    db.get_account(&op.owner)?;
    if db.find_streaming_platform(&op.owner).is_some() {
        return db.modify_streaming_platform(&op.owner, |p| p.url = op.url.clone());
    }

    let minimum = db.config().streaming_platform_creation_fee;
    chain_ensure!(
        op.fee.amount >= minimum,
        "streaming platform creation fee {} is below the minimum {}",
        op.fee,
        Asset::core(minimum)
    );
    let now = db.head_block_time()?;
    db.pay_to_reward_fund(&op.owner, op.fee.amount)?;
    db.store_mut().create(|id| StreamingPlatform {
        id,
        owner: op.owner.clone(),
        url: op.url.clone(),
        votes: 0,
        created: now,
        aggregates: ListeningAggregates::default(),
        anonymous_listening_time: 0,
    })?;
    Ok(())
}

fn account_streaming_platform_vote(
    db: &mut Database,
    op: &AccountStreamingPlatformVoteOperation,
) -> ChainResult<()> {
    let voter = db.get_account(&op.account)?;
    if let Some(proxy) = &voter.proxy {
        return Err(ChainError::PreconditionFailed(format!(
            "{} votes through proxy {}; clear the proxy first",
            op.account, proxy
        )));
    }
    let (weight, voted_for) = (voter.witness_vote_weight(), voter.streaming_platforms_voted_for);
    db.get_streaming_platform(&op.streaming_platform)?;
    let key = (op.streaming_platform.clone(), op.account.clone());
    let existing = db
        .store()
        .find_by::<StreamingPlatformVote, PlatformVoteByPlatform>(&key)
        .map(|v| v.id);

    match (op.approve, existing) {
        (true, Some(_)) => Err(ChainError::PreconditionFailed(format!(
            "{} already votes for streaming platform {}",
            op.account, op.streaming_platform
        ))),
        (true, None) => {
            chain_ensure!(
                voted_for < MAX_STREAMING_PLATFORM_VOTES,
                "{} already votes for {} streaming platforms",
                op.account,
                MAX_STREAMING_PLATFORM_VOTES
            );
            db.store_mut().create(|id| StreamingPlatformVote {
                id,
                streaming_platform: op.streaming_platform.clone(),
                account: op.account.clone(),
            })?;
            db.modify_streaming_platform(&op.streaming_platform, |p| p.votes += weight)?;
            db.modify_account(&op.account, |a| a.streaming_platforms_voted_for += 1)
        }
        (false, Some(vote_id)) => {
            db.store_mut().remove(vote_id)?;
            db.modify_streaming_platform(&op.streaming_platform, |p| p.votes -= weight)?;
            db.modify_account(&op.account, |a| a.streaming_platforms_voted_for -= 1)
        }
        (false, None) => Err(ChainError::PreconditionFailed(format!(
            "{} does not vote for streaming platform {}",
            op.account, op.streaming_platform
        ))),
    }
}

fn request_stream_reporting(db: &mut Database, op: &RequestStreamReportingOperation) -> ChainResult<()> {
    db.get_account(&op.reporter)?;
    redelegate(db, &op.requestor, &op.reporter, op.redelegate_pct)?;

    let existing = db
        .find_stream_report_request(&op.requestor, &op.reporter)
        .map(|r| r.id);
    match existing {
        Some(id) => db.store_mut().modify(id, |r| {
            r.reward_pct = op.reward_pct;
            r.redelegate_pct = op.redelegate_pct;
        })?,
        None => {
            db.store_mut().create(|id| StreamReportRequest {
                id,
                requestor: op.requestor.clone(),
                reporter: op.reporter.clone(),
                reward_pct: op.reward_pct,
                redelegate_pct: op.redelegate_pct,
            })?;
        }
    }
    Ok(())
}

fn cancel_stream_reporting(db: &mut Database, op: &CancelStreamReportingOperation) -> ChainResult<()> {
    let id = db
        .find_stream_report_request(&op.requestor, &op.reporter)
        .map(|r| r.id)
        .ok_or_else(|| {
            ChainError::not_found("stream report request", format!("{} -> {}", op.requestor, op.reporter))
        })?;
    redelegate(db, &op.requestor, &op.reporter, 0)?;
    db.store_mut().remove(id)?;
    Ok(())
}

/// Sets the share of `requestor`'s received vesting passed on to
/// `reporter`, applying only the change against the current entry.
fn redelegate(db: &mut Database, requestor: &AccountName, reporter: &AccountName, pct: u16) -> ChainResult<()> {
    let account = db.get_account(requestor)?;
    let previous = account.redelegations.get(reporter).copied().unwrap_or_default();
    let total_pct = account.total_redelegation_pct() - u32::from(previous.redelegate_pct) + u32::from(pct);
    chain_ensure!(
        total_pct <= u32::from(PERCENT_100),
        "{} would redelegate {} basis points of received vesting, above {}",
        requestor,
        total_pct,
        PERCENT_100
    );

    let wide = i128::from(account.received_vesting_shares) * i128::from(pct) / i128::from(PERCENT_100);
    let amount = i64::try_from(wide)
        .map_err(|_| ChainError::StructuralError(format!("redelegation of {requestor} overflows")))?;
    chain_ensure!(
        pct == 0 || amount > 0,
        "{} has {} received vesting; redelegating {} basis points passes on nothing",
        requestor,
        Asset::vests(account.received_vesting_shares),
        pct
    );
    let delta = amount - previous.redelegated;

    structural_ensure!(
        account.redelegated_vesting_shares >= previous.redelegated,
        "{} has {} redelegated in total but {} recorded for {}",
        requestor,
        account.redelegated_vesting_shares,
        previous.redelegated,
        reporter
    );
    let others: i64 = account
        .redelegations
        .iter()
        .filter(|(name, _)| *name != reporter)
        .map(|(_, r)| r.redelegated)
        .sum();
    structural_ensure!(
        account.redelegated_vesting_shares + delta == others + amount,
        "redelegations of {} would total {} against {} recorded",
        requestor,
        others + amount,
        account.redelegated_vesting_shares + delta
    );
    let rereceived = db.get_account(reporter)?.rereceived_vesting_shares;
    structural_ensure!(
        rereceived >= previous.redelegated,
        "{} re-received {} but {} is recorded from {}",
        reporter,
        rereceived,
        previous.redelegated,
        requestor
    );

    db.modify_account(requestor, |a| {
        a.redelegated_vesting_shares += delta;
        if pct == 0 {
            a.redelegations.remove(reporter);
        } else {
            a.redelegations.insert(
                reporter.clone(),
                Redelegation {
                    redelegate_pct: pct,
                    redelegated: amount,
                },
            );
        }
    })?;
    db.modify_account(reporter, |a| a.rereceived_vesting_shares += delta)
}

fn streaming_platform_report(db: &mut Database, op: &StreamingPlatformReportOperation) -> ChainResult<()> {
    db.record_report(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `sonic` holds 1000 received vesting and passes 30% on to `alice`.
    fn redelegated() -> (Database, AccountName, AccountName) {
        let mut db = Database::open(ChainConfig::default()).expect("genesis");
        let (sonic, alice) = (AccountName::from("sonic"), AccountName::from("alice"));
        db.create_account(sonic.clone(), |a| a.received_vesting_shares = 1_000)
            .unwrap();
        db.create_account(alice.clone(), |_| {}).unwrap();
        redelegate(&mut db, &sonic, &alice, 3_000).unwrap();
        (db, sonic, alice)
    }

    #[test]
    fn test_redelegate_and_cancel() {
        let (mut db, sonic, alice) = redelegated();
        assert_eq!(db.get_account(&sonic).unwrap().redelegated_vesting_shares, 300);
        assert_eq!(db.get_account(&alice).unwrap().rereceived_vesting_shares, 300);

        redelegate(&mut db, &sonic, &alice, 0).unwrap();
        let requestor = db.get_account(&sonic).unwrap();
        assert_eq!(requestor.redelegated_vesting_shares, 0);
        assert!(requestor.redelegations.is_empty());
        assert_eq!(db.get_account(&alice).unwrap().rereceived_vesting_shares, 0);
    }

    #[test]
    fn test_cancel_with_drifted_entry_is_structural() {
        let (mut db, sonic, alice) = redelegated();
        db.modify_account(&sonic, |a| {
            if let Some(entry) = a.redelegations.get_mut(&alice) {
                entry.redelegated = 999;
            }
        })
        .unwrap();

        let err = redelegate(&mut db, &sonic, &alice, 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralError);
        assert_eq!(db.get_account(&sonic).unwrap().redelegated_vesting_shares, 300);
        assert_eq!(db.get_account(&alice).unwrap().rereceived_vesting_shares, 300);
    }

    #[test]
    fn test_total_out_of_step_with_entries_is_structural() {
        let (mut db, sonic, alice) = redelegated();
        db.modify_account(&sonic, |a| a.redelegated_vesting_shares = 500)
            .unwrap();

        let err = redelegate(&mut db, &sonic, &alice, 1_000).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralError);
        assert_eq!(
            db.get_account(&sonic).unwrap().redelegations[&alice].redelegated,
            300
        );
    }

    #[test]
    fn test_short_rereceived_is_structural() {
        let (mut db, sonic, alice) = redelegated();
        db.modify_account(&alice, |a| a.rereceived_vesting_shares = 100)
            .unwrap();

        let err = redelegate(&mut db, &sonic, &alice, 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StructuralError);
    }
}
