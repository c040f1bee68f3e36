//! Tests for utility functions

use prometheus_dispatch::util::init_tracing;
use prometheus_dispatch::util::telemetry::DEFAULT_FILTER;
use tracing_subscriber::EnvFilter;

#[test]
fn test_init_tracing_is_repeatable() {
    init_tracing();
    init_tracing();
    tracing::debug!("subscriber installed");
}

#[test]
fn test_default_filter_targets_crate() {
    assert!(DEFAULT_FILTER.starts_with("prometheus_dispatch="));
    let filter = EnvFilter::new(DEFAULT_FILTER);
    assert!(filter.to_string().contains("prometheus_dispatch"));
}
