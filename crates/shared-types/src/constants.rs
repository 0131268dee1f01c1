//! Chain-wide protocol constants.

use crate::Timestamp;

pub const ADDRESS_PREFIX: &str = "CDZ";

/// Block production interval in seconds.
pub const BLOCK_INTERVAL: u64 = 3;
pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points.
pub const PERCENT_100: u16 = 10_000;
pub const PERCENT_1: u16 = PERCENT_100 / 100;

pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;
pub const MAX_URL_LENGTH: usize = 127;
pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_MEMO_SIZE: usize = 2_048;

// Voting
pub const MAX_PROXY_RECURSION_DEPTH: usize = 4;
pub const MAX_ACCOUNT_WITNESS_VOTES: u16 = 30;
pub const MAX_STREAMING_PLATFORM_VOTES: u16 = 10;
pub const VOTE_REGENERATION_SECONDS: u64 = 5 * SECONDS_PER_DAY;
pub const MIN_VOTE_INTERVAL_SEC: u64 = 3;

// Vesting
pub const VESTING_WITHDRAW_INTERVALS: u32 = 13;
pub const VESTING_WITHDRAW_INTERVAL_SECONDS: u64 = 7 * SECONDS_PER_DAY;
pub const DELEGATION_RETURN_PERIOD: u64 = 5 * SECONDS_PER_DAY;
/// Vesting shares minted per core unit while the vesting fund is empty.
pub const INITIAL_VESTS_PER_CORE: i64 = 1_000;

// Stable asset
pub const CONVERSION_DELAY: u64 = 302_400;
pub const SBD_INTEREST_COMPOUND_INTERVAL_SEC: u64 = 30 * SECONDS_PER_DAY;
pub const MAX_FEED_AGE: u64 = 7 * SECONDS_PER_DAY;

// Streaming
pub const MAX_LISTENING_TIME_PER_DAY: u32 = 86_400;
pub const FULL_TIME_LISTENING_THRESHOLD: u32 = 3_600;
/// How long a report contributes to the rolling aggregates.
pub const LISTENING_WINDOW_SECONDS: u64 = SECONDS_PER_DAY;
pub const CONTENT_PAYOUT_INTERVAL: u64 = SECONDS_PER_DAY;

// Proposals
pub const MAX_PROPOSAL_LIFETIME_SEC: u64 = 28 * SECONDS_PER_DAY;

pub const TIME_MAX: Timestamp = Timestamp::MAX;
