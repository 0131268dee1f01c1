//! # Cadenza-Chain Test Suite
//!
//! End-to-end tests that drive the chain the way a node does: blocks of
//! signed transactions through [`Database::apply_block`] or the session
//! calls, with the invariant check enabled on every commit.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # TestChain: genesis, block production, account setup
//! └── integration/
//!     ├── accounts.rs   # transfers, vesting, delegation, redelegation, proxies
//!     ├── social.rs     # friend requests, second level, score
//!     ├── streaming.rs  # reports, listening caps, expiry
//!     ├── markets.rs    # genesis claims, limit orders, conversions
//!     ├── proposals.rs  # approval tiers, review periods, expiry
//!     └── sessions.rs   # undo, pop_block, observers
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cz-tests
//! cargo test -p cz-tests integration::streaming::
//! cargo bench -p cz-tests
//! ```
//!
//! [`Database::apply_block`]: cz_02_chain_state::Database::apply_block

pub mod fixtures;
pub mod integration;
