//! Serial dispatch queue with double-buffered FIFO draining.
//!
//! Producers on any thread call [`DispatchQueue::enqueue`]. The first enqueue
//! that finds the queue idle submits a single drain task to the bound
//! [`TaskDispatcher`]; that task keeps swapping the active buffer out and
//! handing its items to the [`WorkProcessor`] until the queue runs dry. At
//! most one drain task exists per queue, so items are processed one at a
//! time in submission order.
//!
//! The lock is only held long enough to push an item or swap two buffers.
//! It is never held while the processor runs on a pooled dispatcher.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use prometheus_dispatch::core::{DispatchQueue, ImmediateDispatcher};
//!
//! let total = Arc::new(AtomicUsize::new(0));
//! let sink = Arc::clone(&total);
//! let queue = DispatchQueue::new(Arc::new(ImmediateDispatcher), move |n: usize| {
//!     sink.fetch_add(n, Ordering::SeqCst);
//! });
//!
//! queue.enqueue(5).unwrap();
//! queue.enqueue(7).unwrap();
//! assert_eq!(total.load(Ordering::SeqCst), 12);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::config::QueueConfig;

use super::{AutoResetEvent, DispatchError, TaskDispatcher};

/// Per-item action run by a dispatch queue's drain task.
///
/// Any `Fn(T) + Send + Sync + 'static` closure is a processor. The processor
/// is owned by the queue's shared state, so it stays valid for as long as a
/// drain task can reach it.
pub trait WorkProcessor<T>: Send + Sync + 'static {
    /// Process one item.
    fn process(&self, item: T);
}

impl<T, F> WorkProcessor<T> for F
where
    F: Fn(T) + Send + Sync + 'static,
{
    fn process(&self, item: T) {
        self(item);
    }
}

/// Snapshot of a queue's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Items accepted by `enqueue`/`try_enqueue`.
    pub enqueued: u64,
    /// Items handed to the processor that returned normally.
    pub processed: u64,
    /// Items whose processor panicked.
    pub failed: u64,
    /// Items dropped by a non-draining shutdown.
    pub discarded: u64,
    /// Buffer swaps performed by drain tasks.
    pub batches: u64,
    /// Items currently waiting in the active buffer.
    pub pending: usize,
}

#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    batches: AtomicU64,
}

struct QueueState<T> {
    active: VecDeque<T>,
    standby: VecDeque<T>,
    thread_active: bool,
    stop_processing: bool,
    shut_down: bool,
    drain_remaining_on_shutdown: bool,
    drain_thread: Option<ThreadId>,
}

impl<T> QueueState<T> {
    const fn new(config: QueueConfig) -> Self {
        Self {
            active: VecDeque::new(),
            standby: VecDeque::new(),
            thread_active: false,
            stop_processing: false,
            shut_down: false,
            drain_remaining_on_shutdown: config.drain_remaining_on_shutdown,
            drain_thread: None,
        }
    }

    /// Make the standby buffer active and return the previously active one.
    fn swap_buffers(&mut self) -> VecDeque<T> {
        let mut captured = std::mem::take(&mut self.standby);
        std::mem::swap(&mut self.active, &mut captured);
        captured
    }
}

type StateLock<T> = ReentrantMutex<RefCell<QueueState<T>>>;
type StateGuard<'a, T> = ReentrantMutexGuard<'a, RefCell<QueueState<T>>>;

/// State reachable from both producers and the drain task.
struct Shared<T, P> {
    id: Uuid,
    state: StateLock<T>,
    processor: P,
    completion: AutoResetEvent,
    counters: QueueCounters,
}

impl<T, P> Shared<T, P>
where
    T: Send + 'static,
    P: WorkProcessor<T>,
{
    /// Body of the drain task.
    fn drain(&self) {
        let mut guard = self.state.lock();
        guard.borrow_mut().drain_thread = Some(thread::current().id());
        trace!(queue_id = %self.id, "drain task started");

        loop {
            let mut batch = {
                let mut state = guard.borrow_mut();
                if state.active.is_empty() || state.stop_processing {
                    break;
                }
                state.swap_buffers()
            };
            self.counters.batches.fetch_add(1, Ordering::Relaxed);
            trace!(queue_id = %self.id, batch_len = batch.len(), "processing batch");

            ReentrantMutexGuard::unlocked(&mut guard, || self.process_batch(&mut batch));

            guard.borrow_mut().standby = batch;
        }

        let remaining = {
            let mut state = guard.borrow_mut();
            state.thread_active = false;
            state.drain_thread = None;
            if !state.stop_processing {
                trace!(queue_id = %self.id, "drain task idle");
                return;
            }
            if state.drain_remaining_on_shutdown {
                Some(std::mem::take(&mut state.active))
            } else {
                self.discard(&mut state.active);
                None
            }
        };

        if let Some(mut remaining) = remaining {
            debug!(queue_id = %self.id, remaining = remaining.len(), "draining remaining items on shutdown");
            self.process_batch(&mut remaining);
        }

        debug!(queue_id = %self.id, "drain task signalling shutdown completion");
        self.completion.set();
    }

    /// Hand every item to the processor in order. The buffer is empty on return.
    fn process_batch(&self, batch: &mut VecDeque<T>) {
        for item in batch.drain(..) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.processor.process(item)));
            if outcome.is_ok() {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
            } else {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(queue_id = %self.id, "work item panicked; continuing with remaining items");
            }
        }
    }

    fn discard(&self, items: &mut VecDeque<T>) {
        if items.is_empty() {
            return;
        }
        let count = items.len() as u64;
        items.clear();
        self.counters.discarded.fetch_add(count, Ordering::Relaxed);
        debug!(queue_id = %self.id, discarded = count, "discarded pending items on shutdown");
    }
}

/// A FIFO work queue drained by at most one task at a time.
///
/// Dropping the queue shuts it down, blocking until an in-flight drain task
/// has finished.
pub struct DispatchQueue<T, P>
where
    T: Send + 'static,
    P: WorkProcessor<T>,
{
    shared: Arc<Shared<T, P>>,
    dispatcher: Arc<dyn TaskDispatcher>,
}

impl<T, P> DispatchQueue<T, P>
where
    T: Send + 'static,
    P: WorkProcessor<T>,
{
    /// Create a queue bound to `dispatcher` that discards pending items on shutdown.
    pub fn new(dispatcher: Arc<dyn TaskDispatcher>, processor: P) -> Self {
        Self::with_config(dispatcher, processor, QueueConfig::default())
    }

    /// Create a queue with explicit configuration.
    pub fn with_config(dispatcher: Arc<dyn TaskDispatcher>, processor: P, config: QueueConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(
            queue_id = %id,
            drain_remaining_on_shutdown = config.drain_remaining_on_shutdown,
            "dispatch queue created"
        );
        Self {
            shared: Arc::new(Shared {
                id,
                state: ReentrantMutex::new(RefCell::new(QueueState::new(config))),
                processor,
                completion: AutoResetEvent::new(),
                counters: QueueCounters::default(),
            }),
            dispatcher,
        }
    }

    /// Identifier used in this queue's log records.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Add an item to the queue.
    ///
    /// If no drain task is running one is submitted to the dispatcher before
    /// the lock is released. With an [`ImmediateDispatcher`](super::ImmediateDispatcher)
    /// the item has been processed by the time this returns.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::QueueClosed`] once shutdown has begun
    /// - [`DispatchError::DispatchRejected`] if the dispatcher refused the
    ///   drain task; the item is not kept
    pub fn enqueue(&self, item: T) -> Result<(), DispatchError> {
        let guard = self.shared.state.lock();
        if guard.borrow().shut_down {
            return Err(DispatchError::QueueClosed);
        }
        self.enqueue_locked(&guard, item)
    }

    /// Add an item unless the queue has been shut down.
    ///
    /// Returns `Ok(false)` instead of [`DispatchError::QueueClosed`].
    ///
    /// # Errors
    ///
    /// [`DispatchError::DispatchRejected`] if the dispatcher refused the drain task.
    pub fn try_enqueue(&self, item: T) -> Result<bool, DispatchError> {
        let guard = self.shared.state.lock();
        if guard.borrow().shut_down {
            return Ok(false);
        }
        self.enqueue_locked(&guard, item).map(|()| true)
    }

    fn enqueue_locked(&self, guard: &StateGuard<'_, T>, item: T) -> Result<(), DispatchError> {
        let needs_drain = {
            let mut state = guard.borrow_mut();
            state.active.push_back(item);
            !std::mem::replace(&mut state.thread_active, true)
        };
        self.shared.counters.enqueued.fetch_add(1, Ordering::Relaxed);

        if !needs_drain {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        if let Err(err) = self.dispatcher.submit(Box::new(move || shared.drain())) {
            let mut state = guard.borrow_mut();
            // The drain never ran, so the active buffer holds only this item.
            if state.thread_active {
                state.thread_active = false;
                if state.active.pop_back().is_some() {
                    self.shared.counters.enqueued.fetch_sub(1, Ordering::Relaxed);
                }
            }
            error!(queue_id = %self.shared.id, error = %err, "dispatcher rejected drain task");
            return Err(err);
        }
        Ok(())
    }

    /// Stop the queue.
    ///
    /// No enqueue succeeds after this is called. If a drain task is running,
    /// blocks until it has finished its current batch, applied the shutdown
    /// policy to anything still pending, and signalled completion. Calling it
    /// again is a no-op that never blocks.
    ///
    /// Called from inside the queue's own processor, it marks the queue shut
    /// down and returns without waiting; the drain task completes the
    /// shutdown after the current item.
    pub fn shutdown(&self) {
        let should_wait = {
            let guard = self.shared.state.lock();
            let mut state = guard.borrow_mut();
            if state.shut_down {
                return;
            }
            state.stop_processing = true;
            state.shut_down = true;

            if state.thread_active {
                let on_drain_thread = state.drain_thread == Some(thread::current().id());
                debug!(queue_id = %self.shared.id, on_drain_thread, "shutdown requested while draining");
                !on_drain_thread
            } else {
                // Every enqueue onto an idle queue either submits a drain or rolls back.
                debug_assert!(state.active.is_empty(), "idle queue holds pending items");
                false
            }
        };

        if should_wait {
            self.shared.completion.wait();
        }
        debug!(queue_id = %self.shared.id, "dispatch queue shut down");
    }

    /// Whether `shutdown` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().borrow().shut_down
    }

    /// Whether a drain task is currently in flight.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.shared.state.lock().borrow().thread_active
    }

    /// Number of items waiting in the active buffer.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.state.lock().borrow().active.len()
    }

    /// Current shutdown policy for pending items.
    #[must_use]
    pub fn drain_remaining_on_shutdown(&self) -> bool {
        self.shared.state.lock().borrow().drain_remaining_on_shutdown
    }

    /// Choose whether items pending at shutdown are processed (`true`) or
    /// discarded (`false`).
    pub fn set_drain_remaining_on_shutdown(&self, value: bool) {
        self.shared.state.lock().borrow_mut().drain_remaining_on_shutdown = value;
    }

    /// Snapshot of this queue's counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let pending = self.pending();
        let counters = &self.shared.counters;
        QueueStats {
            enqueued: counters.enqueued.load(Ordering::Relaxed),
            processed: counters.processed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            discarded: counters.discarded.load(Ordering::Relaxed),
            batches: counters.batches.load(Ordering::Relaxed),
            pending,
        }
    }
}

impl<T, P> fmt::Debug for DispatchQueue<T, P>
where
    T: Send + 'static,
    P: WorkProcessor<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("id", &self.shared.id)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<T, P> Drop for DispatchQueue<T, P>
where
    T: Send + 'static,
    P: WorkProcessor<T>,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
