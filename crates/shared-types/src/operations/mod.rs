//! # Operations
//!
//! Every state transition is an [`Operation`]. The enum, its [`OperationTag`]
//! discriminant and the `From` conversions are generated by `operations!` so
//! the list below is the single place an operation kind is declared.

mod account;
mod content;
mod market;
mod proposal;
mod social;
mod streaming;
mod virtual_ops;
mod witness;

pub use account::*;
pub use content::*;
pub use market::*;
pub use proposal::*;
pub use social::*;
pub use streaming::*;
pub use virtual_ops::*;
pub use witness::*;

use crate::constants::{MAX_MEMO_SIZE, MAX_URL_LENGTH, PERCENT_100};
use crate::{ProtocolError, RequiredAuthorities};
use serde::{Deserialize, Serialize};

/// Behaviour shared by every operation payload.
pub trait BaseOperation {
    /// Stateless checks. Must pass before the operation is applied.
    fn validate(&self) -> Result<(), ProtocolError>;

    fn required_authorities(&self, _auths: &mut RequiredAuthorities) {}

    fn is_virtual(&self) -> bool {
        false
    }
}

macro_rules! operations {
    ($($variant:ident($payload:ty) => $name:literal),* $(,)?) => {
        /// Any operation, user-submitted or virtual.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "value", rename_all = "snake_case")]
        pub enum Operation {
            $($variant($payload)),*
        }

        /// Discriminant of [`Operation`], used as the dispatch key.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum OperationTag {
            $($variant),*
        }

        impl OperationTag {
            pub const ALL: &'static [OperationTag] = &[$(OperationTag::$variant),*];

            pub const fn name(self) -> &'static str {
                match self {
                    $(OperationTag::$variant => $name),*
                }
            }
        }

        impl Operation {
            pub fn tag(&self) -> OperationTag {
                match self {
                    $(Operation::$variant(_) => OperationTag::$variant),*
                }
            }

            fn payload(&self) -> &dyn BaseOperation {
                match self {
                    $(Operation::$variant(op) => op),*
                }
            }
        }

        $(
            impl From<$payload> for Operation {
                fn from(op: $payload) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

operations! {
    AccountCreate(AccountCreateOperation) => "account_create",
    Transfer(TransferOperation) => "transfer",
    TransferToVesting(TransferToVestingOperation) => "transfer_to_vesting",
    WithdrawVesting(WithdrawVestingOperation) => "withdraw_vesting",
    DelegateVestingShares(DelegateVestingSharesOperation) => "delegate_vesting_shares",
    BalanceClaim(BalanceClaimOperation) => "balance_claim",
    WitnessUpdate(WitnessUpdateOperation) => "witness_update",
    AccountWitnessVote(AccountWitnessVoteOperation) => "account_witness_vote",
    AccountWitnessProxy(AccountWitnessProxyOperation) => "account_witness_proxy",
    FeedPublish(FeedPublishOperation) => "feed_publish",
    LimitOrderCreate(LimitOrderCreateOperation) => "limit_order_create",
    LimitOrderCancel(LimitOrderCancelOperation) => "limit_order_cancel",
    Convert(ConvertOperation) => "convert",
    StreamingPlatformUpdate(StreamingPlatformUpdateOperation) => "streaming_platform_update",
    AccountStreamingPlatformVote(AccountStreamingPlatformVoteOperation) => "account_streaming_platform_vote",
    RequestStreamReporting(RequestStreamReportingOperation) => "request_stream_reporting",
    CancelStreamReporting(CancelStreamReportingOperation) => "cancel_stream_reporting",
    StreamingPlatformReport(StreamingPlatformReportOperation) => "streaming_platform_report",
    Friendship(FriendshipOperation) => "friendship",
    Unfriend(UnfriendOperation) => "unfriend",
    ContentCreate(ContentCreateOperation) => "content_create",
    ContentUpdate(ContentUpdateOperation) => "content_update",
    ContentDisable(ContentDisableOperation) => "content_disable",
    Vote(VoteOperation) => "vote",
    ProposalCreate(ProposalCreateOperation) => "proposal_create",
    ProposalUpdate(ProposalUpdateOperation) => "proposal_update",
    ProposalDelete(ProposalDeleteOperation) => "proposal_delete",
    FillOrder(FillOrderOperation) => "fill_order",
    Interest(InterestOperation) => "interest",
    FillVestingWithdraw(FillVestingWithdrawOperation) => "fill_vesting_withdraw",
    FillConvertRequest(FillConvertRequestOperation) => "fill_convert_request",
    ReturnVestingDelegation(ReturnVestingDelegationOperation) => "return_vesting_delegation",
    ProducerReward(ProducerRewardOperation) => "producer_reward",
    ContentReward(ContentRewardOperation) => "content_reward",
}

impl Operation {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        self.payload().validate()
    }

    pub fn is_virtual(&self) -> bool {
        self.payload().is_virtual()
    }

    pub fn required_authorities(&self) -> RequiredAuthorities {
        let mut auths = RequiredAuthorities::default();
        self.payload().required_authorities(&mut auths);
        auths
    }

    /// Proposal management operations cannot themselves be proposed.
    pub fn is_proposal_management(&self) -> bool {
        matches!(
            self,
            Operation::ProposalCreate(_) | Operation::ProposalUpdate(_) | Operation::ProposalDelete(_)
        )
    }
}

pub(crate) fn validate_url(field: &'static str, url: &str) -> Result<(), ProtocolError> {
    if url.is_empty() {
        return Err(ProtocolError::field(field, "must not be empty"));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(ProtocolError::field(field, format!("longer than {MAX_URL_LENGTH} bytes")));
    }
    Ok(())
}

pub(crate) fn validate_memo(memo: &str) -> Result<(), ProtocolError> {
    if memo.len() > MAX_MEMO_SIZE {
        return Err(ProtocolError::field("memo", format!("longer than {MAX_MEMO_SIZE} bytes")));
    }
    Ok(())
}

pub(crate) fn validate_percent(field: &'static str, value: u16) -> Result<(), ProtocolError> {
    if value > PERCENT_100 {
        return Err(ProtocolError::InvalidPercent { field, value });
    }
    Ok(())
}
