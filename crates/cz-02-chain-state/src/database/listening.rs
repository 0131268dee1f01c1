//! Streaming report accounting.
//!
//! Every report adds its play time to one subject: a named account, a
//! pseudonymous listener of the platform, or the anonymous bucket of the
//! spinning platform (the reporting platform if none is given). Subject
//! totals drive the global and per-platform [`ListeningAggregates`]. Reports
//! expire after `LISTENING_WINDOW_SECONDS` and their seconds are taken back.

use super::Database;
use crate::chain_ensure;
use crate::domain::*;
use shared_types::constants::{LISTENING_WINDOW_SECONDS, MAX_LISTENING_TIME_PER_DAY};
use shared_types::{Consumer, StreamingPlatformReportOperation, Timestamp};

impl Database {
    pub(crate) fn record_report(&mut self, op: &StreamingPlatformReportOperation) -> ChainResult<()> {
        let now = self.head_block_time()?;
        let platform = op.streaming_platform.clone();
        self.get_streaming_platform(&platform)?;

        let reward_pct = match &op.reporter {
            Some(reporter) => Some(
                self.find_stream_report_request(&platform, reporter)
                    .ok_or_else(|| {
                        ChainError::not_found("stream report request", format!("{platform} -> {reporter}"))
                    })?
                    .reward_pct,
            ),
            None => None,
        };

        let content = self.get_content(&op.content)?;
        chain_ensure!(!content.disabled, "content {} is disabled", op.content);
        let content_id = content.id;

        if let Some(spinning) = &op.spinning_platform {
            self.get_streaming_platform(spinning)?;
        }
        if let Some(creator) = &op.playlist_creator {
            self.get_account(creator)?;
        }

        let play = u64::from(op.play_time);
        let (subject, prev_total, prev_on_platform, aggregate_platform) = match &op.consumer {
            Consumer::Account(name) => {
                let account = self.get_account(name)?;
                let total = account.total_listening_time;
                chain_ensure!(
                    u64::from(total) + play <= u64::from(MAX_LISTENING_TIME_PER_DAY),
                    "{} would exceed the daily listening limit: {} + {} > {} seconds",
                    name,
                    total,
                    op.play_time,
                    MAX_LISTENING_TIME_PER_DAY
                );
                let on_platform = account
                    .listening_time_by_platform
                    .get(&platform)
                    .copied()
                    .unwrap_or(0);
                self.modify_account(name, |a| {
                    a.total_listening_time += op.play_time;
                    *a.listening_time_by_platform
                        .entry(platform.clone())
                        .or_default() += op.play_time;
                })?;
                (
                    ReportSubject::Account(name.clone()),
                    u64::from(total),
                    u64::from(on_platform),
                    platform.clone(),
                )
            }
            Consumer::Pseudonymous(user) => {
                let key = (platform.clone(), *user);
                let existing = self
                    .store
                    .find_by::<PseudonymousListener, ListenerByPlatformUser>(&key)
                    .map(|l| (l.id, l.total_listening_time));
                let prev = match existing {
                    Some((id, prev)) => {
                        self.store.modify(id, |l| l.total_listening_time += play)?;
                        prev
                    }
                    None => {
                        self.store.create(|id| PseudonymousListener {
                            id,
                            streaming_platform: platform.clone(),
                            sp_user_id: *user,
                            total_listening_time: play,
                        })?;
                        0
                    }
                };
                (ReportSubject::Pseudonymous(*user), prev, prev, platform.clone())
            }
            Consumer::Anonymous => {
                let bucket = op
                    .spinning_platform
                    .clone()
                    .unwrap_or_else(|| platform.clone());
                let prev = self.get_streaming_platform(&bucket)?.anonymous_listening_time;
                self.modify_streaming_platform(&bucket, |p| p.anonymous_listening_time += play)?;
                (ReportSubject::Anonymous(bucket.clone()), prev, prev, bucket)
            }
        };

        self.modify_global(|g| g.aggregates.record(prev_total, play))?;
        self.modify_streaming_platform(&aggregate_platform, |p| {
            p.aggregates.record(prev_on_platform, play)
        })?;

        self.store.modify(content_id, |c| {
            c.times_played += 1;
            c.times_played_24 += 1;
            c.total_listening_time_24 += play;
            c.last_played = now;
        })?;

        self.store.create(|id| Report {
            id,
            streaming_platform: platform.clone(),
            reporter: op.reporter.clone(),
            subject,
            content: op.content.clone(),
            created: now,
            play_time: op.play_time,
            spinning_platform: op.spinning_platform.clone(),
            playlist_creator: op.playlist_creator.clone(),
            reward_pct,
        })?;
        Ok(())
    }

    /// Takes back every report created at or before `now - 24h`.
    pub(crate) fn expire_reports(&mut self, now: Timestamp) -> ChainResult<()> {
        let Some(cutoff) = now.checked_sub(LISTENING_WINDOW_SECONDS) else {
            return Ok(());
        };
        let expired: Vec<_> = self
            .store
            .range_by::<Report, ReportByCreated, _>(..=cutoff)
            .map(|r| r.id)
            .collect();
        for id in expired {
            let report = self.store.remove(id)?;
            self.revert_report(&report)?;
        }
        Ok(())
    }

    fn revert_report(&mut self, report: &Report) -> ChainResult<()> {
        let play = u64::from(report.play_time);
        let (current_total, current_on_platform, aggregate_platform) = match &report.subject {
            ReportSubject::Account(name) => {
                let account = self.get_account(name)?;
                let total = u64::from(account.total_listening_time);
                let on_platform = account
                    .listening_time_by_platform
                    .get(&report.streaming_platform)
                    .copied()
                    .map(u64::from)
                    .unwrap_or(0);
                let platform = report.streaming_platform.clone();
                self.modify_account(name, |a| {
                    a.total_listening_time = a.total_listening_time.saturating_sub(report.play_time);
                    let left = a
                        .listening_time_by_platform
                        .get(&platform)
                        .copied()
                        .unwrap_or(0)
                        .saturating_sub(report.play_time);
                    if left == 0 {
                        a.listening_time_by_platform.remove(&platform);
                    } else {
                        a.listening_time_by_platform.insert(platform.clone(), left);
                    }
                })?;
                (total, on_platform, report.streaming_platform.clone())
            }
            ReportSubject::Pseudonymous(user) => {
                let key = (report.streaming_platform.clone(), *user);
                let listener = self
                    .store
                    .find_by::<PseudonymousListener, ListenerByPlatformUser>(&key)
                    .map(|l| (l.id, l.total_listening_time))
                    .ok_or_else(|| {
                        ChainError::StructuralError(format!(
                            "report {} references missing listener {}/{}",
                            report.id, report.streaming_platform, user
                        ))
                    })?;
                let (id, current) = listener;
                if current <= play {
                    self.store.remove(id)?;
                } else {
                    self.store.modify(id, |l| l.total_listening_time -= play)?;
                }
                (current, current, report.streaming_platform.clone())
            }
            ReportSubject::Anonymous(bucket) => {
                let current = self.get_streaming_platform(bucket)?.anonymous_listening_time;
                self.modify_streaming_platform(bucket, |p| {
                    p.anonymous_listening_time = p.anonymous_listening_time.saturating_sub(play)
                })?;
                (current, current, bucket.clone())
            }
        };

        self.modify_global(|g| g.aggregates.revert(current_total, play))?;
        self.modify_streaming_platform(&aggregate_platform, |p| {
            p.aggregates.revert(current_on_platform, play)
        })?;

        if let Some(id) = self.find_content(&report.content).map(|c| c.id) {
            self.store.modify(id, |c| {
                c.times_played_24 = c.times_played_24.saturating_sub(1);
                c.total_listening_time_24 = c.total_listening_time_24.saturating_sub(play);
            })?;
        }
        Ok(())
    }
}
