use super::{type_ids, IMPLEMENTATION_SPACE, PROTOCOL_SPACE};
use cz_01_object_store::{Id, IndexSpec, Object, Table};
use serde::Serialize;
use shared_types::constants::FULL_TIME_LISTENING_THRESHOLD;
use shared_types::{AccountName, Timestamp};
use std::cmp::Reverse;

const THRESHOLD: u64 = FULL_TIME_LISTENING_THRESHOLD as u64;

/// Rolling-day listening statistics over a set of subjects.
///
/// Each subject (named account, pseudonymous user or anonymous bucket) is
/// counted as active once its total is nonzero and as full-time once it
/// reaches the threshold. Seconds below the threshold are active seconds,
/// seconds above it full-time seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ListeningAggregates {
    pub active_users: u32,
    pub full_time_users: u32,
    pub total_listening_time: u64,
    pub active_listening_time: u64,
    pub full_time_listening_time: u64,
}

impl ListeningAggregates {
    /// Adds `play` seconds to a subject whose total was `prev`.
    pub fn record(&mut self, prev: u64, play: u64) {
        let next = prev + play;
        if prev == 0 && next > 0 {
            self.active_users += 1;
        }
        if prev < THRESHOLD && next >= THRESHOLD {
            self.full_time_users += 1;
        }
        self.total_listening_time += play;
        self.active_listening_time += next.min(THRESHOLD) - prev.min(THRESHOLD);
        self.full_time_listening_time += next.max(THRESHOLD) - prev.max(THRESHOLD);
    }

    /// Removes `play` seconds from a subject whose total is `current`.
    pub fn revert(&mut self, current: u64, play: u64) {
        let prev = current.saturating_sub(play);
        if prev == 0 && current > 0 {
            self.active_users = self.active_users.saturating_sub(1);
        }
        if prev < THRESHOLD && current >= THRESHOLD {
            self.full_time_users = self.full_time_users.saturating_sub(1);
        }
        self.total_listening_time = self.total_listening_time.saturating_sub(current - prev);
        self.active_listening_time = self
            .active_listening_time
            .saturating_sub(current.min(THRESHOLD) - prev.min(THRESHOLD));
        self.full_time_listening_time = self
            .full_time_listening_time
            .saturating_sub(current.max(THRESHOLD) - prev.max(THRESHOLD));
    }

    /// Aggregates computed from scratch over subject totals.
    pub fn from_totals(totals: impl IntoIterator<Item = u64>) -> Self {
        let mut out = Self::default();
        for total in totals {
            out.record(0, total);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamingPlatform {
    pub id: Id<StreamingPlatform>,
    pub owner: AccountName,
    pub url: String,
    pub votes: i64,
    pub created: Timestamp,
    pub aggregates: ListeningAggregates,
    /// Same-day listening of consumers without any identity
    pub anonymous_listening_time: u64,
}

impl Object for StreamingPlatform {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::STREAMING_PLATFORM;
    const TYPE_NAME: &'static str = "streaming_platform";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<PlatformByOwner>();
        table.add_index::<PlatformByVote>();
    }
}

pub struct PlatformByOwner;

impl IndexSpec<StreamingPlatform> for PlatformByOwner {
    type Key = AccountName;
    const NAME: &'static str = "by_owner";
    const UNIQUE: bool = true;

    fn key(obj: &StreamingPlatform) -> AccountName {
        obj.owner.clone()
    }
}

pub struct PlatformByVote;

impl IndexSpec<StreamingPlatform> for PlatformByVote {
    type Key = Reverse<i64>;
    const NAME: &'static str = "by_vote";

    fn key(obj: &StreamingPlatform) -> Reverse<i64> {
        Reverse(obj.votes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingPlatformVote {
    pub id: Id<StreamingPlatformVote>,
    pub streaming_platform: AccountName,
    pub account: AccountName,
}

impl Object for StreamingPlatformVote {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::STREAMING_PLATFORM_VOTE;
    const TYPE_NAME: &'static str = "streaming_platform_vote";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<PlatformVoteByPlatform>();
        table.add_index::<PlatformVoteByAccount>();
    }
}

pub struct PlatformVoteByPlatform;

impl IndexSpec<StreamingPlatformVote> for PlatformVoteByPlatform {
    type Key = (AccountName, AccountName);
    const NAME: &'static str = "by_platform_account";
    const UNIQUE: bool = true;

    fn key(obj: &StreamingPlatformVote) -> Self::Key {
        (obj.streaming_platform.clone(), obj.account.clone())
    }
}

pub struct PlatformVoteByAccount;

impl IndexSpec<StreamingPlatformVote> for PlatformVoteByAccount {
    type Key = AccountName;
    const NAME: &'static str = "by_account";

    fn key(obj: &StreamingPlatformVote) -> AccountName {
        obj.account.clone()
    }
}

/// A platform user without a chain account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PseudonymousListener {
    pub id: Id<PseudonymousListener>,
    pub streaming_platform: AccountName,
    pub sp_user_id: u64,
    pub total_listening_time: u64,
}

impl Object for PseudonymousListener {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::PSEUDONYMOUS_LISTENER;
    const TYPE_NAME: &'static str = "pseudonymous_listener";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ListenerByPlatformUser>();
    }
}

pub struct ListenerByPlatformUser;

impl IndexSpec<PseudonymousListener> for ListenerByPlatformUser {
    type Key = (AccountName, u64);
    const NAME: &'static str = "by_platform_user";
    const UNIQUE: bool = true;

    fn key(obj: &PseudonymousListener) -> Self::Key {
        (obj.streaming_platform.clone(), obj.sp_user_id)
    }
}

/// Authorisation for `reporter` to file reports on behalf of `requestor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamReportRequest {
    pub id: Id<StreamReportRequest>,
    pub requestor: AccountName,
    pub reporter: AccountName,
    pub reward_pct: u16,
    pub redelegate_pct: u16,
}

impl Object for StreamReportRequest {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::STREAM_REPORT_REQUEST;
    const TYPE_NAME: &'static str = "stream_report_request";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<RequestByPair>();
    }
}

pub struct RequestByPair;

impl IndexSpec<StreamReportRequest> for RequestByPair {
    type Key = (AccountName, AccountName);
    const NAME: &'static str = "by_requestor_reporter";
    const UNIQUE: bool = true;

    fn key(obj: &StreamReportRequest) -> Self::Key {
        (obj.requestor.clone(), obj.reporter.clone())
    }
}

/// Whose listening a report counts toward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReportSubject {
    Account(AccountName),
    /// A [`PseudonymousListener`] of the reporting platform
    Pseudonymous(u64),
    /// The anonymous bucket of the named platform
    Anonymous(AccountName),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: Id<Report>,
    pub streaming_platform: AccountName,
    pub reporter: Option<AccountName>,
    pub subject: ReportSubject,
    pub content: String,
    pub created: Timestamp,
    pub play_time: u32,
    pub spinning_platform: Option<AccountName>,
    pub playlist_creator: Option<AccountName>,
    pub reward_pct: Option<u16>,
}

impl Object for Report {
    const SPACE_ID: u8 = PROTOCOL_SPACE;
    const TYPE_ID: u8 = type_ids::REPORT;
    const TYPE_NAME: &'static str = "report";

    fn id(&self) -> Id<Self> {
        self.id
    }

    fn register_indices(table: &mut Table<Self>) {
        table.add_index::<ReportByCreated>();
    }
}

pub struct ReportByCreated;

impl IndexSpec<Report> for ReportByCreated {
    type Key = Timestamp;
    const NAME: &'static str = "by_created";

    fn key(obj: &Report) -> Timestamp {
        obj.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_splits_at_threshold() {
        let mut agg = ListeningAggregates::default();
        agg.record(0, 3_000);
        assert_eq!(agg.active_users, 1);
        assert_eq!(agg.full_time_users, 0);

        agg.record(3_000, 1_000);
        assert_eq!(agg.active_users, 1);
        assert_eq!(agg.full_time_users, 1);
        assert_eq!(agg.total_listening_time, 4_000);
        assert_eq!(agg.active_listening_time, 3_600);
        assert_eq!(agg.full_time_listening_time, 400);
    }

    #[test]
    fn test_revert_is_inverse_of_record() {
        let mut agg = ListeningAggregates::default();
        agg.record(0, 2_000);
        let before = agg;
        agg.record(2_000, 5_000);
        agg.revert(7_000, 5_000);
        assert_eq!(agg, before);
        agg.revert(2_000, 2_000);
        assert_eq!(agg, ListeningAggregates::default());
    }

    #[test]
    fn test_incremental_matches_from_totals() {
        let mut agg = ListeningAggregates::default();
        agg.record(0, 100);
        agg.record(0, 3_500);
        agg.record(3_500, 200);
        agg.record(100, 50);
        assert_eq!(agg, ListeningAggregates::from_totals([150, 3_700]));
    }
}
