//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "prometheus_dispatch=info";

/// Install a default `fmt` subscriber unless one is already set.
///
/// Queue and pool lifecycle events are logged at `debug`, per-batch events at
/// `trace`; `RUST_LOG=prometheus_dispatch=debug` shows them. Without
/// `RUST_LOG`, [`DEFAULT_FILTER`] is used.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
