//! Tests for error types

use prometheus_dispatch::core::DispatchError;

#[test]
fn test_queue_closed_error() {
    let err = DispatchError::QueueClosed;
    assert_eq!(format!("{}", err), "dispatch queue has been shut down");
}

#[test]
fn test_dispatch_rejected_error() {
    let err = DispatchError::DispatchRejected("thread pool queue is full".to_string());
    assert_eq!(format!("{}", err), "dispatch rejected: thread pool queue is full");
}

#[test]
fn test_invalid_config_error() {
    let err = DispatchError::InvalidConfig("worker_count must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: worker_count must be greater than 0"
    );
}

#[test]
fn test_spawn_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "no threads left");
    let err: DispatchError = io.into();
    assert!(matches!(err, DispatchError::Spawn(_)));
    assert_eq!(format!("{}", err), "failed to spawn worker thread: no threads left");
}
