use super::{validate_percent, validate_url, BaseOperation};
use crate::constants::MAX_LISTENING_TIME_PER_DAY;
use crate::{AccountName, Asset, AssetSymbol, ProtocolError, RequiredAuthorities};
use serde::{Deserialize, Serialize};

/// Registers or updates the streaming platform owned by `owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingPlatformUpdateOperation {
    pub owner: AccountName,
    pub url: String,
    pub fee: Asset,
}

impl BaseOperation for StreamingPlatformUpdateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.owner.validate()?;
        validate_url("url", &self.url)?;
        self.fee.expect_symbol("fee", AssetSymbol::Core)?;
        self.fee.expect_non_negative("fee")
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.owner.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStreamingPlatformVoteOperation {
    pub account: AccountName,
    pub streaming_platform: AccountName,
    pub approve: bool,
}

impl BaseOperation for AccountStreamingPlatformVoteOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.account.validate()?;
        self.streaming_platform.validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.account.clone());
    }
}

/// `requestor` asks `reporter` to report on its behalf, paying `reward_pct`
/// of report rewards and redelegating `redelegate_pct` of its received
/// vesting shares to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStreamReportingOperation {
    pub requestor: AccountName,
    pub reporter: AccountName,
    pub reward_pct: u16,
    pub redelegate_pct: u16,
}

impl BaseOperation for RequestStreamReportingOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.requestor.validate()?;
        self.reporter.validate()?;
        if self.requestor == self.reporter {
            return Err(ProtocolError::field("reporter", "cannot report for yourself"));
        }
        validate_percent("reward_pct", self.reward_pct)?;
        validate_percent("redelegate_pct", self.redelegate_pct)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.requestor.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelStreamReportingOperation {
    pub requestor: AccountName,
    pub reporter: AccountName,
}

impl BaseOperation for CancelStreamReportingOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.requestor.validate()?;
        self.reporter.validate()
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.requestor.clone());
    }
}

/// Who listened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    Account(AccountName),
    /// Platform-scoped user id with no chain account.
    Pseudonymous(u64),
    Anonymous,
}

/// One listening event, filed by the platform or by its designated reporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingPlatformReportOperation {
    pub streaming_platform: AccountName,
    #[serde(default)]
    pub reporter: Option<AccountName>,
    pub consumer: Consumer,
    pub content: String,
    pub play_time: u32,
    #[serde(default)]
    pub playlist_creator: Option<AccountName>,
    #[serde(default)]
    pub spinning_platform: Option<AccountName>,
}

impl BaseOperation for StreamingPlatformReportOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.streaming_platform.validate()?;
        if let Some(reporter) = &self.reporter {
            reporter.validate()?;
        }
        if let Consumer::Account(name) = &self.consumer {
            name.validate()?;
        }
        if let Some(creator) = &self.playlist_creator {
            creator.validate()?;
        }
        if let Some(spinning) = &self.spinning_platform {
            spinning.validate()?;
        }
        validate_url("content", &self.content)?;
        if self.play_time == 0 || self.play_time > MAX_LISTENING_TIME_PER_DAY {
            return Err(ProtocolError::field(
                "play_time",
                format!("must be within 1..={MAX_LISTENING_TIME_PER_DAY}"),
            ));
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        let signer = self.reporter.as_ref().unwrap_or(&self.streaming_platform);
        auths.active.insert(signer.clone());
    }
}
