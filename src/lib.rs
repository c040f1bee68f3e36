//! # Prometheus Dispatch
//!
//! Serial dispatch queues for handing work off a caller's thread while
//! keeping it strictly ordered.
//!
//! A [`DispatchQueue`](core::DispatchQueue) accepts items from any number of
//! producer threads and feeds them, one at a time and in FIFO order, to a
//! per-item processor. The queue never owns a thread: when work arrives on an
//! idle queue it submits a single drain task to a
//! [`TaskDispatcher`](core::TaskDispatcher), and that task runs until the
//! queue is empty again.
//!
//! ## Key Features
//!
//! - **Single active drain**: at most one drain task per queue, so items are
//!   never processed concurrently or out of order
//! - **Double-buffered**: producers push into one buffer while the drain task
//!   works through the other; the lock is held only to swap them
//! - **Clean shutdown**: `shutdown` blocks until the in-flight drain task has
//!   finished, then either runs or discards whatever is still pending
//! - **Pluggable dispatchers**: run drains inline, on a dedicated thread pool,
//!   or on a tokio blocking pool
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use prometheus_dispatch::config::ThreadPoolConfig;
//! use prometheus_dispatch::core::{ActionDispatchQueue, ThreadPoolDispatcher};
//!
//! let pool = Arc::new(ThreadPoolDispatcher::new(ThreadPoolConfig::new().with_worker_count(4))?);
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! {
//!     let queue = ActionDispatchQueue::new(pool.clone());
//!     for _ in 0..100 {
//!         let counter = Arc::clone(&counter);
//!         queue.enqueue(move || { counter.fetch_add(1, Ordering::SeqCst); })?;
//!     }
//! } // dropping the queue runs every accepted action
//!
//! assert_eq!(counter.load(Ordering::SeqCst), 100);
//! pool.shutdown();
//! # Ok::<(), prometheus_dispatch::core::DispatchError>(())
//! ```
//!
//! For complete examples, see:
//! - `tests/dispatch_queue_test.rs` - ordering, shutdown policy, concurrency
//! - `tests/action_queue_test.rs` - closure queues on each dispatcher

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Dispatch queue engine, dispatcher trait, and adapters.
pub mod core;
/// Configuration models for queues, thread pools, and dispatcher selection.
pub mod config;
/// Builders to construct dispatchers and queues from configuration.
pub mod builders;
/// Runtime adapters (tokio).
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    ActionDispatchQueue, DispatchError, DispatchQueue, ImmediateDispatcher, TaskDispatcher,
    ThreadPoolDispatcher, WorkProcessor,
};
