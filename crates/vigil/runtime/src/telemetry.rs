//! Tracing initialization

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` controls the filter and
/// defaults to `info`. Safe to call more than once; later calls are
/// no-ops.
pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
