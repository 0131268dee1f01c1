//! # Cadenza Telemetry
//!
//! Logging and metrics for the Cadenza chain-state core.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadenza_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CZ_SERVICE_NAME` | `cadenza-chain` | Service name on every log line |
//! | `CZ_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CZ_JSON_LOGS` | `false` | JSON output instead of pretty output |
//! | `CZ_CONSOLE_OUTPUT` | `true` | Emit log lines at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, BLOCKS_ABORTED, BLOCKS_COMMITTED, INVARIANT_FAILURES,
    OPERATIONS_APPLIED, OPERATIONS_REJECTED, TRANSACTIONS_REJECTED, UNDO_SESSION_DEPTH,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Registers metrics and installs the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for setting a gauge.
#[macro_export]
macro_rules! metric_set {
    ($metric:expr, $value:expr) => {
        $metric.set($value)
    };
}
