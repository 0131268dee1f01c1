//! Operations synthesized by the chain itself. They are reported to
//! observers alongside user operations but can never be submitted.

use super::BaseOperation;
use crate::{AccountName, Asset, ProtocolError};
use serde::{Deserialize, Serialize};

macro_rules! virtual_operation {
    ($ty:ident, $name:literal) => {
        impl BaseOperation for $ty {
            fn validate(&self) -> Result<(), ProtocolError> {
                Err(ProtocolError::VirtualOperation($name))
            }

            fn is_virtual(&self) -> bool {
                true
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillOrderOperation {
    pub current_owner: AccountName,
    pub current_orderid: u32,
    pub current_pays: Asset,
    pub open_owner: AccountName,
    pub open_orderid: u32,
    pub open_pays: Asset,
}
virtual_operation!(FillOrderOperation, "fill_order");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestOperation {
    pub owner: AccountName,
    pub interest: Asset,
}
virtual_operation!(InterestOperation, "interest");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillVestingWithdrawOperation {
    pub account: AccountName,
    pub withdrawn: Asset,
    pub deposited: Asset,
}
virtual_operation!(FillVestingWithdrawOperation, "fill_vesting_withdraw");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConvertRequestOperation {
    pub owner: AccountName,
    pub requestid: u32,
    pub amount_in: Asset,
    pub amount_out: Asset,
}
virtual_operation!(FillConvertRequestOperation, "fill_convert_request");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnVestingDelegationOperation {
    pub account: AccountName,
    pub vesting_shares: Asset,
}
virtual_operation!(ReturnVestingDelegationOperation, "return_vesting_delegation");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRewardOperation {
    pub producer: AccountName,
    pub vesting_shares: Asset,
}
virtual_operation!(ProducerRewardOperation, "producer_reward");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRewardOperation {
    pub uploader: AccountName,
    pub url: String,
    pub payout: Asset,
}
virtual_operation!(ContentRewardOperation, "content_reward");
