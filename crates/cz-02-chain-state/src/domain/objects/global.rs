use super::{type_ids, ListeningAggregates, IMPLEMENTATION_SPACE};
use cz_01_object_store::{Id, Object};
use serde::Serialize;
use shared_types::constants::INITIAL_VESTS_PER_CORE;
use shared_types::{AccountName, Price, Timestamp};

/// Chain-wide totals. Exactly one instance exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalProperties {
    pub id: Id<GlobalProperties>,
    pub head_block_number: u64,
    pub head_block_time: Timestamp,
    pub current_witness: AccountName,

    pub current_supply: i64,
    pub current_sbd_supply: i64,
    pub total_vesting_fund: i64,
    pub total_vesting_shares: i64,
    pub total_reward_fund: i64,
    pub sbd_interest_rate: u16,
    pub current_median_price: Option<Price>,

    pub aggregates: ListeningAggregates,
    pub last_content_payout: Timestamp,

    /// Bit `n` set if the slot `n` blocks ago was filled
    pub recent_slots_filled: u128,
    pub participation_count: u8,
}

impl GlobalProperties {
    pub const ID: Id<GlobalProperties> = Id::new(0);

    /// Vesting shares issued for `core` units of the liquid asset.
    pub fn core_to_vests(&self, core: i64) -> i64 {
        if self.total_vesting_fund == 0 || self.total_vesting_shares == 0 {
            return core.saturating_mul(INITIAL_VESTS_PER_CORE);
        }
        mul_div(core, self.total_vesting_shares, self.total_vesting_fund)
    }

    /// Liquid units paid out for `vests` vesting shares.
    pub fn vests_to_core(&self, vests: i64) -> i64 {
        if self.total_vesting_shares == 0 {
            return 0;
        }
        mul_div(vests, self.total_vesting_fund, self.total_vesting_shares)
    }
}

/// `a * b / c` in 128-bit arithmetic, rounded toward zero and clamped.
pub(crate) fn mul_div(a: i64, b: i64, c: i64) -> i64 {
    let wide = i128::from(a) * i128::from(b) / i128::from(c);
    i64::try_from(wide).unwrap_or(if wide < 0 { i64::MIN } else { i64::MAX })
}

impl Object for GlobalProperties {
    const SPACE_ID: u8 = IMPLEMENTATION_SPACE;
    const TYPE_ID: u8 = type_ids::GLOBAL_PROPERTIES;
    const TYPE_NAME: &'static str = "global_properties";

    fn id(&self) -> Id<Self> {
        self.id
    }
}
