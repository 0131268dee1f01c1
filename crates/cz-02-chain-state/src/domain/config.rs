//! Chain-state configuration.
//!
//! Defaults are usable as-is for a development chain. A TOML document or
//! `CZ_*` environment variables override individual fields.

use serde::Deserialize;
use shared_types::constants::{
    CONVERSION_DELAY, DELEGATION_RETURN_PERIOD, PERCENT_100, VESTING_WITHDRAW_INTERVALS,
    VESTING_WITHDRAW_INTERVAL_SECONDS,
};
use shared_types::{AccountName, Asset, AssetSymbol, PublicKey, Timestamp};
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Weights of the account score formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Per unit of `isqrt(vesting_shares / 1 VESTS)`
    pub vesting: i64,
    /// Per direct friend
    pub friend: i64,
    /// Per second-level friend
    pub second_level: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            vesting: 1,
            friend: 10,
            second_level: 1,
        }
    }
}

/// A balance claimable by whoever controls `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisBalance {
    pub owner: PublicKey,
    pub balance: Asset,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Committed blocks kept undoable for `pop_block`. 0 makes commits final.
    pub max_undo_history: usize,

    /// Run the full invariant check before every block commit
    pub validate_invariants_per_block: bool,

    pub init_account: AccountName,
    pub init_public_key: PublicKey,
    /// Liquid supply held by the init account at genesis (smallest units)
    pub init_supply: i64,
    pub genesis_time: Timestamp,
    pub genesis_balances: Vec<GenesisBalance>,

    pub account_creation_fee: i64,
    pub streaming_platform_creation_fee: i64,

    /// Minted per block and vested to the producing witness
    pub producer_reward_per_block: i64,
    /// Minted per block into the content reward fund
    pub content_reward_per_block: i64,

    /// Yearly stable interest, in basis points of 100%
    pub sbd_interest_rate: u16,

    pub score: ScoreWeights,

    pub vesting_withdraw_intervals: u32,
    pub vesting_withdraw_interval_seconds: u64,
    pub delegation_return_period: u64,
    pub conversion_delay: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_undo_history: 0,
            validate_invariants_per_block: true,
            init_account: AccountName::from("initminer"),
            init_public_key: PublicKey::from("CDZ6initminer1genesis"),
            init_supply: 1_000_000_000,
            genesis_time: 1_600_000_000,
            genesis_balances: Vec::new(),
            account_creation_fee: 1_000,
            streaming_platform_creation_fee: 10_000,
            producer_reward_per_block: 1_000,
            content_reward_per_block: 2_000,
            sbd_interest_rate: 10 * (PERCENT_100 / 100),
            score: ScoreWeights::default(),
            vesting_withdraw_intervals: VESTING_WITHDRAW_INTERVALS,
            vesting_withdraw_interval_seconds: VESTING_WITHDRAW_INTERVAL_SECONDS,
            delegation_return_period: DELEGATION_RETURN_PERIOD,
            conversion_delay: CONVERSION_DELAY,
        }
    }
}

impl ChainConfig {
    /// Parses a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CZ_MAX_UNDO_HISTORY`: retained block frames (default: 0)
    /// - `CZ_VALIDATE_INVARIANTS`: per-block invariant check (default: true)
    /// - `CZ_INIT_ACCOUNT`: genesis account name (default: initminer)
    /// - `CZ_INIT_SUPPLY`: genesis liquid supply
    /// - `CZ_PRODUCER_REWARD`: producer reward per block
    /// - `CZ_CONTENT_REWARD`: content reward per block
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup("CZ_MAX_UNDO_HISTORY") {
            config.max_undo_history = parse_var("CZ_MAX_UNDO_HISTORY", &v)?;
        }
        if let Some(v) = lookup("CZ_VALIDATE_INVARIANTS") {
            config.validate_invariants_per_block = v.to_lowercase() != "false" && v != "0";
        }
        if let Some(v) = lookup("CZ_INIT_ACCOUNT") {
            config.init_account = AccountName::new(v);
        }
        if let Some(v) = lookup("CZ_INIT_SUPPLY") {
            config.init_supply = parse_var("CZ_INIT_SUPPLY", &v)?;
        }
        if let Some(v) = lookup("CZ_PRODUCER_REWARD") {
            config.producer_reward_per_block = parse_var("CZ_PRODUCER_REWARD", &v)?;
        }
        if let Some(v) = lookup("CZ_CONTENT_REWARD") {
            config.content_reward_per_block = parse_var("CZ_CONTENT_REWARD", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.init_account
            .validate()
            .map_err(|e| invalid("init_account", e.to_string()))?;
        if !self.init_public_key.is_valid() {
            return Err(invalid("init_public_key", "malformed key"));
        }
        if self.init_supply < 0 {
            return Err(invalid("init_supply", "must not be negative"));
        }
        if self.account_creation_fee < 0 || self.streaming_platform_creation_fee < 0 {
            return Err(invalid("creation fee", "must not be negative"));
        }
        if self.producer_reward_per_block < 0 || self.content_reward_per_block < 0 {
            return Err(invalid("block reward", "must not be negative"));
        }
        if self.vesting_withdraw_intervals == 0 {
            return Err(invalid("vesting_withdraw_intervals", "must be positive"));
        }
        if self.vesting_withdraw_interval_seconds == 0 {
            return Err(invalid("vesting_withdraw_interval_seconds", "must be positive"));
        }
        if self.sbd_interest_rate > PERCENT_100 {
            return Err(invalid("sbd_interest_rate", "above 100%"));
        }
        for balance in &self.genesis_balances {
            if !balance.owner.is_valid() {
                return Err(invalid("genesis_balances", format!("malformed key {}", balance.owner.0)));
            }
            if balance.balance.amount <= 0 || balance.balance.symbol == AssetSymbol::Vests {
                return Err(invalid(
                    "genesis_balances",
                    format!("{} is not a positive liquid or stable amount", balance.balance),
                ));
            }
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| invalid(key, format!("{value:?}: {e}")))
}
