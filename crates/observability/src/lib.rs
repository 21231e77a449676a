//! Tracing/logging setup shared by every binary and test harness.

/// Initialize process-wide observability from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(&ObservabilityConfig::from_env());
}

pub use config::{LogFormat, ObservabilityConfig, ParseLogFormatError};
pub use tracing::init_with;

/// Environment-driven configuration.
pub mod config;

/// Tracing configuration (filters, layers).
pub mod tracing;
