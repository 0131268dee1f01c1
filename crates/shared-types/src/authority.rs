use crate::constants::ADDRESS_PREFIX;
use crate::{AccountName, ProtocolError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Encoded public key (`CDZ...`). Signature checking happens before the
/// state core, so the key is only compared, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(pub String);

impl PublicKey {
    pub fn is_valid(&self) -> bool {
        self.0.len() > ADDRESS_PREFIX.len()
            && self.0.starts_with(ADDRESS_PREFIX)
            && self.0[ADDRESS_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_alphanumeric())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PublicKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Weighted threshold authority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    pub account_auths: BTreeMap<AccountName, u16>,
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    pub fn key(key: PublicKey) -> Self {
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::from([(key, 1)]),
        }
    }

    pub fn account(name: AccountName) -> Self {
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::from([(name, 1)]),
            key_auths: BTreeMap::new(),
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.account_auths
            .values()
            .chain(self.key_auths.values())
            .map(|w| u64::from(*w))
            .sum()
    }

    /// True if no combination of signers can reach the threshold.
    pub fn is_impossible(&self) -> bool {
        self.total_weight() < u64::from(self.weight_threshold)
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.weight_threshold == 0 {
            return Err(ProtocolError::InvalidAuthority("zero weight threshold".into()));
        }
        for name in self.account_auths.keys() {
            name.validate()?;
        }
        if let Some(key) = self.key_auths.keys().find(|k| !k.is_valid()) {
            return Err(ProtocolError::InvalidAuthority(format!("malformed key {key}")));
        }
        if self.is_impossible() {
            return Err(ProtocolError::InvalidAuthority(format!(
                "threshold {} exceeds total weight {}",
                self.weight_threshold,
                self.total_weight()
            )));
        }
        Ok(())
    }
}

/// Approvals an operation needs, per tier.
///
/// Content tiers name content urls; the chain resolves them to the accounts
/// of the content's management authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredAuthorities {
    pub owner: BTreeSet<AccountName>,
    pub active: BTreeSet<AccountName>,
    pub basic: BTreeSet<AccountName>,
    pub master_content: BTreeSet<String>,
    pub comp_content: BTreeSet<String>,
}

impl RequiredAuthorities {
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
            && self.active.is_empty()
            && self.basic.is_empty()
            && self.master_content.is_empty()
            && self.comp_content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impossible_authority_rejected() {
        let mut auth = Authority::key(PublicKey::from("CDZabc123"));
        auth.weight_threshold = 2;
        assert!(auth.validate().is_err());
        auth.account_auths.insert(AccountName::from("alice"), 1);
        assert!(auth.validate().is_ok());
    }

    #[test]
    fn test_key_prefix_checked() {
        assert!(PublicKey::from("CDZ6abc").is_valid());
        assert!(!PublicKey::from("STM6abc").is_valid());
        assert!(!PublicKey::from("CDZ").is_valid());
    }
}
