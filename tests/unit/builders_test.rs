//! Tests for dispatcher builders

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use prometheus_dispatch::builders::{build_action_queue, build_dispatcher};
use prometheus_dispatch::config::{DispatcherConfig, ThreadPoolConfig};
use prometheus_dispatch::core::DispatchError;

#[test]
fn test_build_immediate() {
    let queue = build_action_queue(&DispatcherConfig::Immediate).unwrap();
    let count = Arc::new(AtomicUsize::new(0));

    let inc = Arc::clone(&count);
    queue
        .enqueue(move || {
            inc.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_build_thread_pool() {
    let cfg = DispatcherConfig::ThreadPool(ThreadPoolConfig::new().with_worker_count(2));
    let count = Arc::new(AtomicUsize::new(0));
    {
        let queue = build_action_queue(&cfg).unwrap();
        for _ in 0..10 {
            let inc = Arc::clone(&count);
            queue
                .enqueue(move || {
                    inc.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
    }
    assert_eq!(count.load(Ordering::SeqCst), 10);
}

#[test]
fn test_build_rejects_invalid_config() {
    let cfg = DispatcherConfig::ThreadPool(ThreadPoolConfig::new().with_worker_count(0));
    let err = build_dispatcher(&cfg).err().unwrap();
    assert!(matches!(err, DispatchError::InvalidConfig(_)));

    let cfg = DispatcherConfig::Tokio { worker_threads: 0 };
    assert!(build_dispatcher(&cfg).is_err());
}
