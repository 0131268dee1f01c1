//! Ports: the seams between the chain-state core and its surroundings.

pub mod outbound;

pub use outbound::*;
