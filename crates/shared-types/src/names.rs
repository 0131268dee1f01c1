use crate::constants::{MAX_ACCOUNT_NAME_LENGTH, MIN_ACCOUNT_NAME_LENGTH};
use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Account name. Comparison is exact and case-sensitive.
///
/// Construction is unchecked so names can be deserialized and looked up
/// freely; operations call [`AccountName::validate`] on every name they carry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-separated labels, each starting with a lowercase letter, ending with
    /// a letter or digit, and containing only lowercase letters, digits and `-`.
    pub fn is_valid(&self) -> bool {
        let len = self.0.len();
        if !(MIN_ACCOUNT_NAME_LENGTH..=MAX_ACCOUNT_NAME_LENGTH).contains(&len) {
            return false;
        }
        self.0.split('.').all(|label| {
            let bytes = label.as_bytes();
            match (bytes.first(), bytes.last()) {
                (Some(first), Some(last)) => {
                    bytes.len() >= MIN_ACCOUNT_NAME_LENGTH
                        && first.is_ascii_lowercase()
                        && (last.is_ascii_lowercase() || last.is_ascii_digit())
                        && bytes
                            .iter()
                            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
                }
                _ => false,
            }
        })
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ProtocolError::InvalidAccountName(self.0.clone()))
        }
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AccountName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for AccountName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
