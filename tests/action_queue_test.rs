//! Integration tests for ActionDispatchQueue
//!
//! Closure queues on the immediate dispatcher and the thread pool, drop-time
//! draining, and shutdown issued from inside a running action.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prometheus_dispatch::config::ThreadPoolConfig;
use prometheus_dispatch::core::{
    ActionDispatchQueue, AutoResetEvent, DispatchError, ImmediateDispatcher, ThreadPoolDispatcher,
};

fn pool(workers: usize) -> Arc<ThreadPoolDispatcher> {
    Arc::new(ThreadPoolDispatcher::new(ThreadPoolConfig::new().with_worker_count(workers)).unwrap())
}

#[test]
fn test_no_actions() {
    let pool = pool(2);
    let queue = ActionDispatchQueue::new(pool.clone());
    assert!(!queue.is_draining());
    drop(queue);
    pool.shutdown();
}

#[test]
fn test_immediate_flag_set_on_enqueue() {
    let queue = ActionDispatchQueue::new(Arc::new(ImmediateDispatcher));
    let flag = Arc::new(AtomicBool::new(false));

    let set = Arc::clone(&flag);
    queue.enqueue(move || set.store(true, Ordering::SeqCst)).unwrap();

    assert!(flag.load(Ordering::SeqCst));
}

#[test]
fn test_runs_on_pool_thread() {
    let pool = pool(2);
    let queue = ActionDispatchQueue::new(pool.clone());
    let event = Arc::new(AutoResetEvent::new());
    let flag = Arc::new(AtomicBool::new(false));
    let caller = thread::current().id();

    let signal = Arc::clone(&event);
    let set = Arc::clone(&flag);
    queue
        .enqueue(move || {
            set.store(thread::current().id() != caller, Ordering::SeqCst);
            signal.set();
        })
        .unwrap();

    assert!(event.wait_timeout(Duration::from_secs(5)));
    assert!(flag.load(Ordering::SeqCst));
    drop(queue);
    pool.shutdown();
}

#[test]
fn test_one_action_runs_before_drop_returns() {
    let count = Arc::new(AtomicUsize::new(0));
    let pool = pool(2);
    {
        let queue = ActionDispatchQueue::new(pool.clone());
        let count = Arc::clone(&count);
        queue
            .enqueue(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
    pool.shutdown();
}

#[test]
fn test_two_actions() {
    let count = Arc::new(AtomicUsize::new(0));
    let pool = pool(2);
    {
        let queue = ActionDispatchQueue::new(pool.clone());
        let first = Arc::clone(&count);
        queue
            .enqueue(move || {
                first.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let second = Arc::clone(&count);
        queue
            .enqueue(move || {
                second.fetch_add(2, Ordering::SeqCst);
            })
            .unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 3);
    pool.shutdown();
}

#[test]
fn test_thousand_actions_drained_on_drop() {
    let count = Arc::new(AtomicUsize::new(0));
    let pool = pool(4);
    {
        let queue = ActionDispatchQueue::new(pool.clone());
        for _ in 0..1000 {
            let count = Arc::clone(&count);
            queue
                .enqueue(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
    }
    assert_eq!(count.load(Ordering::SeqCst), 1000);
    pool.shutdown();
}

#[test]
fn test_try_enqueue_after_shutdown() {
    let count = Arc::new(AtomicUsize::new(0));
    let pool = pool(2);
    let queue = ActionDispatchQueue::new(pool.clone());

    let first = Arc::clone(&count);
    queue
        .enqueue(move || {
            first.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    queue.shutdown();

    let second = Arc::clone(&count);
    let enqueued = queue
        .try_enqueue(move || {
            second.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert!(!enqueued);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(matches!(queue.enqueue(|| {}), Err(DispatchError::QueueClosed)));
    pool.shutdown();
}

#[test]
fn test_pending_actions_run_on_shutdown() {
    let pool = pool(1);
    let queue = ActionDispatchQueue::new(pool.clone());
    let started = Arc::new(AutoResetEvent::new());
    let gate = Arc::new(AutoResetEvent::new());
    let count = Arc::new(AtomicUsize::new(0));

    let (signal, wait) = (Arc::clone(&started), Arc::clone(&gate));
    queue
        .enqueue(move || {
            signal.set();
            wait.wait();
        })
        .unwrap();
    started.wait();
    for _ in 0..10 {
        let count = Arc::clone(&count);
        queue
            .enqueue(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let opener = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        gate.set();
    });
    queue.shutdown();
    opener.join().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 10);
    pool.shutdown();
}

#[test]
fn test_shutdown_from_inside_action_immediate() {
    let queue = Arc::new(ActionDispatchQueue::new(Arc::new(ImmediateDispatcher)));

    let inner = Arc::clone(&queue);
    queue.enqueue(move || inner.shutdown()).unwrap();

    assert!(queue.is_shut_down());
    assert!(!queue.try_enqueue(|| {}).unwrap());
}

#[test]
fn test_shutdown_from_inside_action_on_pool() {
    let pool = pool(2);
    let queue = Arc::new(ActionDispatchQueue::new(pool.clone()));
    let done = Arc::new(AutoResetEvent::new());

    let inner = Arc::clone(&queue);
    let signal = Arc::clone(&done);
    queue
        .enqueue(move || {
            inner.shutdown();
            signal.set();
        })
        .unwrap();

    assert!(done.wait_timeout(Duration::from_secs(5)));
    assert!(queue.is_shut_down());
    pool.shutdown();
}

#[test]
fn test_panicking_action_isolated() {
    let count = Arc::new(AtomicUsize::new(0));
    let queue = ActionDispatchQueue::new(Arc::new(ImmediateDispatcher));

    queue.enqueue(|| panic!("action failed")).unwrap();
    let after = Arc::clone(&count);
    queue
        .enqueue(move || {
            after.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(queue.stats().failed, 1);
}
