use super::{validate_url, BaseOperation};
use crate::constants::{MAX_TITLE_LENGTH, PERCENT_100};
use crate::{AccountName, Authority, ProtocolError, RequiredAuthorities};
use serde::{Deserialize, Serialize};

/// Which management authority of a content item an update acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSide {
    Master,
    Comp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCreateOperation {
    pub uploader: AccountName,
    pub url: String,
    pub title: String,
    pub manage_master: Authority,
    #[serde(default)]
    pub manage_comp: Option<Authority>,
}

impl BaseOperation for ContentCreateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.uploader.validate()?;
        validate_url("url", &self.url)?;
        validate_title(&self.title)?;
        validate_management("manage_master", &self.manage_master)?;
        if let Some(comp) = &self.manage_comp {
            validate_management("manage_comp", comp)?;
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.active.insert(self.uploader.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdateOperation {
    pub side: ContentSide,
    pub url: String,
    #[serde(default)]
    pub new_title: Option<String>,
    #[serde(default)]
    pub new_management: Option<Authority>,
}

impl BaseOperation for ContentUpdateOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        validate_url("url", &self.url)?;
        if self.new_title.is_none() && self.new_management.is_none() {
            return Err(ProtocolError::field("content_update", "nothing to update"));
        }
        if let Some(title) = &self.new_title {
            if self.side == ContentSide::Comp {
                return Err(ProtocolError::field("new_title", "only the master side may retitle"));
            }
            validate_title(title)?;
        }
        if let Some(auth) = &self.new_management {
            validate_management("new_management", auth)?;
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        match self.side {
            ContentSide::Master => auths.master_content.insert(self.url.clone()),
            ContentSide::Comp => auths.comp_content.insert(self.url.clone()),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDisableOperation {
    pub url: String,
}

impl BaseOperation for ContentDisableOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        validate_url("url", &self.url)
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.master_content.insert(self.url.clone());
    }
}

/// Content vote; `weight` in basis points, negative for a downvote, zero to
/// clear a previous vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: AccountName,
    pub url: String,
    pub weight: i16,
}

impl BaseOperation for VoteOperation {
    fn validate(&self) -> Result<(), ProtocolError> {
        self.voter.validate()?;
        validate_url("url", &self.url)?;
        if self.weight.unsigned_abs() > PERCENT_100 {
            return Err(ProtocolError::InvalidPercent {
                field: "weight",
                value: self.weight.unsigned_abs(),
            });
        }
        Ok(())
    }

    fn required_authorities(&self, auths: &mut RequiredAuthorities) {
        auths.basic.insert(self.voter.clone());
    }
}

fn validate_title(title: &str) -> Result<(), ProtocolError> {
    if title.is_empty() || title.len() > MAX_TITLE_LENGTH {
        return Err(ProtocolError::field(
            "title",
            format!("length must be within 1..={MAX_TITLE_LENGTH}"),
        ));
    }
    Ok(())
}

/// Content management must name at least one account so proposals can
/// resolve it to approvers.
fn validate_management(field: &'static str, auth: &Authority) -> Result<(), ProtocolError> {
    auth.validate()?;
    if auth.account_auths.is_empty() {
        return Err(ProtocolError::field(field, "must include at least one account"));
    }
    Ok(())
}
