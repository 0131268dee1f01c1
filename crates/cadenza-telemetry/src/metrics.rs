//! Prometheus metrics for the chain-state core.
//!
//! All metrics follow the naming convention: `cz_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // OPERATION METRICS
    // =========================================================================

    /// Operations applied, by operation name (virtual operations included)
    pub static ref OPERATIONS_APPLIED: CounterVec = CounterVec::new(
        Opts::new("cz_chain_operations_applied_total", "Operations applied by type"),
        &["operation"]
    ).expect("metric creation failed");

    /// Operations rejected, by operation name and error category
    pub static ref OPERATIONS_REJECTED: CounterVec = CounterVec::new(
        Opts::new("cz_chain_operations_rejected_total", "Operations rejected by type and category"),
        &["operation", "category"]
    ).expect("metric creation failed");

    pub static ref TRANSACTIONS_REJECTED: Counter = Counter::new(
        "cz_chain_transactions_rejected_total",
        "Transactions rolled back"
    ).expect("metric creation failed");

    // =========================================================================
    // BLOCK METRICS
    // =========================================================================

    pub static ref BLOCKS_COMMITTED: Counter = Counter::new(
        "cz_chain_blocks_committed_total",
        "Blocks committed"
    ).expect("metric creation failed");

    pub static ref BLOCKS_ABORTED: Counter = Counter::new(
        "cz_chain_blocks_aborted_total",
        "Block sessions undone"
    ).expect("metric creation failed");

    /// Open undo frames after the last boundary call
    pub static ref UNDO_SESSION_DEPTH: Gauge = Gauge::new(
        "cz_store_undo_session_depth",
        "Open undo frames in the object store"
    ).expect("metric creation failed");

    pub static ref INVARIANT_FAILURES: Counter = Counter::new(
        "cz_chain_invariant_failures_total",
        "Post-block invariant checks that failed"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(OPERATIONS_APPLIED.clone()),
        Box::new(OPERATIONS_REJECTED.clone()),
        Box::new(TRANSACTIONS_REJECTED.clone()),
        Box::new(BLOCKS_COMMITTED.clone()),
        Box::new(BLOCKS_ABORTED.clone()),
        Box::new(UNDO_SESSION_DEPTH.clone()),
        Box::new(INVARIANT_FAILURES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
