use super::BaseOperation;
use crate::{AccountName, ProtocolError, RequiredAuthorities};
use serde::{Deserialize, Serialize};

/// Requests (or, if `other` already asked, confirms) a friendship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendshipOperation {
    pub account: AccountName,
    pub other: AccountName,
}

impl BaseOperation for FriendshipOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        validate_pair(&self.account, &self.other)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.account.clone());
    }
}

/// Ends a friendship or withdraws a pending request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfriendOperation {
    pub account: AccountName,
    pub other: AccountName,
}

impl BaseOperation for UnfriendOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        validate_pair(&self.account, &self.other)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.account.clone());
    }
}

fn validate_pair(account: &AccountName, other: &AccountName) -> Result<(), ProtocolError> {
    account.validate()?;
    other.validate()?;
    if account == other {
        return Err(ProtocolError::field("other", "cannot befriend yourself"));
    }
    Ok(())
}
