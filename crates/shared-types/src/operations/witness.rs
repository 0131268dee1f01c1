use super::{validate_url, BaseOperation};
use crate::{AccountName, Asset, AssetSymbol, Price, ProtocolError, PublicKey, RequiredAuthorities};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WitnessUpdateOperation {
    pub owner: AccountName,
    pub url: String,
    pub block_signing_key: PublicKey,
    pub fee: Asset,
}

impl BaseOperation for WitnessUpdateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.owner.validate()?;
        validate_url("url", &self.url)?;
        if !self.block_signing_key.is_valid() {
            return Err(ProtocolError::field("block_signing_key", "malformed key"));
        }
        self.fee.expect_symbol("fee", AssetSymbol::Core)?;
        self.fee.expect_non_negative("fee")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: AccountName,
    pub witness: AccountName,
    pub approve: bool,
}

impl BaseOperation for AccountWitnessVoteOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.account.validate()?;
        self.witness.validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

/// Sets (`Some`) or clears (`None`) the account's voting proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWitnessProxyOperation {
    pub account: AccountName,
    #[serde(default)]
    pub proxy: Option<AccountName>,
}

impl BaseOperation for AccountWitnessProxyOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.account.validate()?;
        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
            if *proxy == self.account {
                return Err(ProtocolError::field("proxy", "cannot proxy to yourself"));
            }
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

/// Witness price feed: `exchange_rate` is stable per core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPublishOperation {
    pub publisher: AccountName,
    pub exchange_rate: Price,
}

impl BaseOperation for FeedPublishOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.publisher.validate()?;
        self.exchange_rate.validate()?;
        self.exchange_rate
            .base
            .expect_symbol("exchange_rate.base", AssetSymbol::Stable)?;
        self.exchange_rate
            .quote
            .expect_symbol("exchange_rate.quote", AssetSymbol::Core)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.publisher.clone());
    }
}
