//! Adapters layer: ready-made [`ChainObserver`](crate::ports::ChainObserver)
//! implementations.

pub mod observers;

pub use observers::{LoggingObserver, RecordingObserver};
