use super::BaseOperation;
use crate::{AccountName, Asset, AssetSymbol, Price, ProtocolError, RequiredAuthorities, Timestamp};
use serde::{Deserialize, Serialize};

/// Offers `amount_to_sell` for at least `min_to_receive` on the core/stable book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    pub owner: AccountName,
    pub orderid: u32,
    pub amount_to_sell: Asset,
    pub min_to_receive: Asset,
    #[serde(default)]
    pub fill_or_kill: bool,
    pub expiration: Timestamp,
}

impl LimitOrderCreateOperation {
    pub fn sell_price(&self) -> Price {
        Price::new(self.amount_to_sell, self.min_to_receive)
    }
}

impl BaseOperation for LimitOrderCreateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.owner.validate()?;
        self.amount_to_sell.expect_positive("amount_to_sell")?;
        self.min_to_receive.expect_positive("min_to_receive")?;
        let pair = (self.amount_to_sell.symbol, self.min_to_receive.symbol);
        if !matches!(
            pair,
            (AssetSymbol::Core, AssetSymbol::Stable) | (AssetSymbol::Stable, AssetSymbol::Core)
        ) {
            return Err(ProtocolError::InvalidPrice(format!(
                "market only trades CDZ against CDD, got {} for {}",
                self.amount_to_sell.symbol, self.min_to_receive.symbol
            )));
        }
        self.sell_price().validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    pub owner: AccountName,
    pub orderid: u32,
}

impl BaseOperation for LimitOrderCancelOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.owner.validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

/// Converts stable into core at the median feed price after a delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertOperation {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount: Asset,
}

impl BaseOperation for ConvertOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.owner.validate()?;
        self.amount.expect_symbol("amount", AssetSymbol::Stable)?;
        self.amount.expect_positive("amount")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}
