//! # Chain Objects
//!
//! Every entity kind stored in the [`ObjectStore`](cz_01_object_store::ObjectStore),
//! with its secondary indices. Relationships are names or ids resolved through
//! the store, never references.

mod account;
mod content;
mod global;
mod market;
mod proposal;
mod streaming;
mod vesting;
mod witness;

pub use account::*;
pub use content::*;
pub use global::*;
pub use market::*;
pub use proposal::*;
pub use streaming::*;
pub use vesting::*;
pub use witness::*;

/// Objects referenced by operations.
pub const PROTOCOL_SPACE: u8 = 1;
/// Bookkeeping objects maintained by the chain itself.
pub const IMPLEMENTATION_SPACE: u8 = 2;

pub(crate) mod type_ids {
    pub const ACCOUNT: u8 = 1;
    pub const WITNESS: u8 = 2;
    pub const LIMIT_ORDER: u8 = 3;
    pub const PROPOSAL: u8 = 4;
    pub const STREAMING_PLATFORM: u8 = 5;
    pub const CONTENT: u8 = 6;
    pub const CONTENT_VOTE: u8 = 7;
    pub const REPORT: u8 = 8;
    pub const STREAM_REPORT_REQUEST: u8 = 9;
    pub const UNCLAIMED_BALANCE: u8 = 10;

    pub const GLOBAL_PROPERTIES: u8 = 0;
    pub const WITNESS_VOTE: u8 = 1;
    pub const STREAMING_PLATFORM_VOTE: u8 = 2;
    pub const VESTING_DELEGATION: u8 = 3;
    pub const VESTING_DELEGATION_EXPIRATION: u8 = 4;
    pub const CONVERT_REQUEST: u8 = 5;
    pub const PSEUDONYMOUS_LISTENER: u8 = 6;
}
