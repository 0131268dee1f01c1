//! # Assets and Prices
//!
//! Amounts are fixed-point integers in the asset's smallest unit. Every
//! multiplication between amounts is widened to `i128` before dividing.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetSymbol {
    /// Liquid core token.
    #[serde(rename = "CDZ")]
    Core,
    /// Stable (dollar-pegged) token.
    #[serde(rename = "CDD")]
    Stable,
    #[serde(rename = "VESTS")]
    Vests,
}

impl AssetSymbol {
    pub const fn precision(self) -> u32 {
        match self {
            AssetSymbol::Core | AssetSymbol::Stable => 3,
            AssetSymbol::Vests => 6,
        }
    }

    pub const fn ticker(self) -> &'static str {
        match self {
            AssetSymbol::Core => "CDZ",
            AssetSymbol::Stable => "CDD",
            AssetSymbol::Vests => "VESTS",
        }
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: AssetSymbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: AssetSymbol) -> Self {
        Self { amount, symbol }
    }

    pub const fn core(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Core)
    }

    pub const fn stable(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Stable)
    }

    pub const fn vests(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Vests)
    }

    pub fn expect_symbol(&self, field: &'static str, symbol: AssetSymbol) -> Result<(), ProtocolError> {
        if self.symbol != symbol {
            return Err(ProtocolError::WrongSymbol {
                field,
                expected: symbol.to_string(),
                actual: self.symbol.to_string(),
            });
        }
        Ok(())
    }

    pub fn expect_positive(&self, field: &'static str) -> Result<(), ProtocolError> {
        if self.amount <= 0 {
            return Err(ProtocolError::InvalidAmount {
                field,
                reason: format!("{} must be positive", self),
            });
        }
        Ok(())
    }

    pub fn expect_non_negative(&self, field: &'static str) -> Result<(), ProtocolError> {
        if self.amount < 0 {
            return Err(ProtocolError::InvalidAmount {
                field,
                reason: format!("{} must not be negative", self),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10i64.pow(self.symbol.precision());
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale as u64,
            abs % scale as u64,
            self.symbol,
            width = self.symbol.precision() as usize
        )
    }
}

/// Exchange rate `base / quote` between two different assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    pub const fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.base.amount <= 0 || self.quote.amount <= 0 {
            return Err(ProtocolError::InvalidPrice(format!(
                "{} / {} has a non-positive side",
                self.base, self.quote
            )));
        }
        if self.base.symbol == self.quote.symbol {
            return Err(ProtocolError::InvalidPrice(format!(
                "{} / {} quotes an asset against itself",
                self.base, self.quote
            )));
        }
        Ok(())
    }

    pub fn is_null(&self) -> bool {
        self.base.amount == 0 || self.quote.amount == 0
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.quote, self.base)
    }

    /// Converts `asset` across this price, rounding toward zero.
    pub fn convert(&self, asset: Asset) -> Result<Asset, ProtocolError> {
        let (from, to) = if asset.symbol == self.base.symbol {
            (self.base, self.quote)
        } else if asset.symbol == self.quote.symbol {
            (self.quote, self.base)
        } else {
            return Err(ProtocolError::InvalidPrice(format!(
                "cannot convert {} across {} / {}",
                asset, self.base, self.quote
            )));
        };
        if from.amount == 0 {
            return Err(ProtocolError::InvalidPrice("division by a zero side".to_string()));
        }
        let amount = i128::from(asset.amount) * i128::from(to.amount) / i128::from(from.amount);
        let amount = i64::try_from(amount).map_err(|_| ProtocolError::Overflow("price conversion"))?;
        Ok(Asset::new(amount, to.symbol))
    }

    pub fn ratio(&self) -> PriceRatio {
        PriceRatio::new(self.base.amount, self.quote.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.base, self.quote)
    }
}

/// Rational number `num / den` (den > 0) ordered by value.
///
/// Equal values with different representations compare equal, so order books
/// keyed by ratio fall back to the object id as tie-break.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRatio {
    pub num: i64,
    pub den: i64,
}

impl PriceRatio {
    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }
}

impl PartialEq for PriceRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriceRatio {}

impl PartialOrd for PriceRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.num) * i128::from(other.den);
        let rhs = i128::from(other.num) * i128::from(self.den);
        lhs.cmp(&rhs)
    }
}
