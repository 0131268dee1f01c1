use super::{validate_memo, BaseOperation};
use crate::{AccountName, Asset, AssetSymbol, Authority, ProtocolError, PublicKey, RequiredAuthorities};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountCreateOperation {
    pub fee: Asset,
    pub creator: AccountName,
    pub new_account_name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub basic: Authority,
    pub memo_key: PublicKey,
    #[serde(default)]
    pub json_metadata: String,
}

impl BaseOperation for AccountCreateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.creator.validate()?;
        self.new_account_name.validate()?;
        self.fee.expect_symbol("fee", AssetSymbol::Core)?;
        self.fee.expect_non_negative("fee")?;
        self.owner.validate()?;
        self.active.validate()?;
        self.basic.validate()?;
        if !self.memo_key.is_valid() {
            return Err(ProtocolError::field("memo_key", "malformed key"));
        }
        if !self.json_metadata.is_empty() {
            serde_json::from_str::<serde_json::Value>(&self.json_metadata)
                .map_err(|e| ProtocolError::field("json_metadata", e.to_string()))?;
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.creator.clone());
    }
}

/// Liquid or stable transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: AccountName,
    pub to: AccountName,
    pub amount: Asset,
    #[serde(default)]
    pub memo: String,
}

impl BaseOperation for TransferOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.from.validate()?;
        self.to.validate()?;
        if self.amount.symbol == AssetSymbol::Vests {
            return Err(ProtocolError::WrongSymbol {
                field: "amount",
                expected: "CDZ or CDD".into(),
                actual: self.amount.symbol.to_string(),
            });
        }
        self.amount.expect_positive("amount")?;
        validate_memo(&self.memo)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from.clone());
    }
}

/// Converts liquid core into vesting shares, credited to `to` or `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferToVestingOperation {
    pub from: AccountName,
    #[serde(default)]
    pub to: Option<AccountName>,
    pub amount: Asset,
}

impl BaseOperation for TransferToVestingOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.from.validate()?;
        if let Some(to) = &self.to {
            to.validate()?;
        }
        self.amount.expect_symbol("amount", AssetSymbol::Core)?;
        self.amount.expect_positive("amount")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.from.clone());
    }
}

/// Starts (or with zero shares, cancels) a vesting withdrawal schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawVestingOperation {
    pub account: AccountName,
    pub vesting_shares: Asset,
}

impl BaseOperation for WithdrawVestingOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.account.validate()?;
        self.vesting_shares.expect_symbol("vesting_shares", AssetSymbol::Vests)?;
        self.vesting_shares.expect_non_negative("vesting_shares")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

/// Sets the delegated amount from `delegator` to `delegatee`. Zero removes the
/// delegation; decreases are returned after the return period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateVestingSharesOperation {
    pub delegator: AccountName,
    pub delegatee: AccountName,
    pub vesting_shares: Asset,
}

impl BaseOperation for DelegateVestingSharesOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.delegator.validate()?;
        self.delegatee.validate()?;
        if self.delegator == self.delegatee {
            return Err(ProtocolError::field("delegatee", "cannot delegate to yourself"));
        }
        self.vesting_shares.expect_symbol("vesting_shares", AssetSymbol::Vests)?;
        self.vesting_shares.expect_non_negative("vesting_shares")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.delegator.clone());
    }
}

/// Claims an unclaimed genesis balance owned by `balance_owner_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceClaimOperation {
    pub deposit_to_account: AccountName,
    pub balance_owner_key: PublicKey,
    pub total_claimed: Asset,
}

impl BaseOperation for BalanceClaimOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.deposit_to_account.validate()?;
        if !self.balance_owner_key.is_valid() {
            return Err(ProtocolError::field("balance_owner_key", "malformed key"));
        }
        if self.total_claimed.symbol == AssetSymbol::Vests {
            return Err(ProtocolError::WrongSymbol {
                field: "total_claimed",
                expected: "CDZ or CDD".into(),
                actual: self.total_claimed.symbol.to_string(),
            });
        }
        self.total_claimed.expect_positive("total_claimed")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.deposit_to_account.clone());
    }
}
