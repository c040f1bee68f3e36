//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_dispatch::config::pool::{ENV_QUEUE_DEPTH, ENV_SHUTDOWN_TIMEOUT_MS, ENV_WORKERS};
use prometheus_dispatch::config::{DispatcherConfig, QueueConfig, ThreadPoolConfig};

#[test]
fn test_pool_config_defaults_validate() {
    let cfg = ThreadPoolConfig::default();
    assert!(cfg.worker_count >= 1);
    assert_eq!(cfg.max_queue_depth, 0);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_worker_count() {
    let invalid = ThreadPoolConfig::new().with_worker_count(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_stack_size() {
    let invalid = ThreadPoolConfig::new().with_thread_stack_size(1024);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_invalid_name_prefix() {
    let invalid = ThreadPoolConfig::new().with_thread_name_prefix("");
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_shutdown_timeout() {
    let cfg = ThreadPoolConfig::new().with_shutdown_timeout(Duration::from_millis(250));
    assert_eq!(cfg.shutdown_timeout_ms, 250);
    assert_eq!(cfg.shutdown_timeout(), Duration::from_millis(250));

    let invalid = ThreadPoolConfig::new().with_shutdown_timeout(Duration::ZERO);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_from_json() {
    let json = r#"{ "worker_count": 3, "max_queue_depth": 64 }"#;
    let cfg = ThreadPoolConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.max_queue_depth, 64);
    assert_eq!(cfg.thread_name_prefix, "dispatch-worker");
}

#[test]
fn test_pool_config_from_json_invalid() {
    assert!(ThreadPoolConfig::from_json_str(r#"{ "worker_count": 0 }"#).is_err());
    assert!(ThreadPoolConfig::from_json_str("not json").is_err());
}

#[test]
fn test_pool_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        (ENV_WORKERS, "5"),
        (ENV_QUEUE_DEPTH, " 16 "),
        (ENV_SHUTDOWN_TIMEOUT_MS, "500"),
    ]
    .into_iter()
    .collect();

    let cfg = ThreadPoolConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.worker_count, 5);
    assert_eq!(cfg.max_queue_depth, 16);
    assert_eq!(cfg.shutdown_timeout_ms, 500);
}

#[test]
fn test_pool_config_from_lookup_rejects_garbage() {
    let err = ThreadPoolConfig::from_lookup(|key| (key == ENV_WORKERS).then(|| "many".to_string()))
        .unwrap_err();
    assert!(err.to_string().contains(ENV_WORKERS));

    assert!(ThreadPoolConfig::from_lookup(|key| (key == ENV_WORKERS).then(|| "0".to_string())).is_err());
}

#[test]
fn test_queue_config_default_discards() {
    assert!(!QueueConfig::default().drain_remaining_on_shutdown);
    assert!(QueueConfig::new().with_drain_remaining_on_shutdown(true).drain_remaining_on_shutdown);
}

#[test]
fn test_queue_config_from_json() {
    let cfg = QueueConfig::from_json_str(r#"{ "drain_remaining_on_shutdown": true }"#).unwrap();
    assert!(cfg.drain_remaining_on_shutdown);
    assert_eq!(QueueConfig::from_json_str("{}").unwrap(), QueueConfig::default());
}

#[test]
fn test_dispatcher_config_from_json() {
    let cfg = DispatcherConfig::from_json_str(r#"{ "kind": "immediate" }"#).unwrap();
    assert_eq!(cfg, DispatcherConfig::Immediate);

    let cfg = DispatcherConfig::from_json_str(r#"{ "kind": "thread_pool", "worker_count": 2 }"#).unwrap();
    match cfg {
        DispatcherConfig::ThreadPool(pool) => assert_eq!(pool.worker_count, 2),
        other => panic!("unexpected config: {other:?}"),
    }

    let cfg = DispatcherConfig::from_json_str(r#"{ "kind": "tokio", "worker_threads": 4 }"#).unwrap();
    assert_eq!(cfg, DispatcherConfig::Tokio { worker_threads: 4 });
}

#[test]
fn test_dispatcher_config_invalid() {
    assert!(DispatcherConfig::from_json_str(r#"{ "kind": "tokio", "worker_threads": 0 }"#).is_err());
    assert!(DispatcherConfig::from_json_str(r#"{ "kind": "thread_pool", "worker_count": 0 }"#).is_err());
    assert!(DispatcherConfig::from_json_str(r#"{ "kind": "fibers" }"#).is_err());
}
