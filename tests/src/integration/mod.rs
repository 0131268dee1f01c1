//! # Integration Flows
//!
//! Each module drives a [`TestChain`](crate::fixtures::TestChain) through
//! whole blocks. Every commit runs the full invariant check, so a passing
//! flow also shows the supply, vesting, vote, delegation, friend-graph and
//! listening invariants held after each block.

pub mod accounts;
pub mod markets;
pub mod proposals;
pub mod sessions;
pub mod social;
pub mod streaming;
