//! Thread pool dispatcher backed by dedicated OS threads.
//!
//! Workers block on a `crossbeam-channel` receiver; there is no polling.
//! Shutdown drops the sender, which lets every worker finish the tasks already
//! accepted and then observe the disconnect and exit.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ThreadPoolConfig;

use super::{DispatchError, Task, TaskDispatcher};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Total tasks accepted by `submit`.
    pub submitted: u64,
    /// Tasks waiting for a worker.
    pub queued: u64,
    /// Tasks currently executing.
    pub running: u64,
    /// Tasks that returned normally.
    pub completed: u64,
    /// Tasks that panicked.
    pub panicked: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
struct PoolCounters {
    submitted: AtomicU64,
    queued: AtomicU64,
    running: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl PoolCounters {
    fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            submitted: self.submitted.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            running: self.running.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Dispatcher that runs tasks on a fixed set of worker threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use prometheus_dispatch::config::ThreadPoolConfig;
/// use prometheus_dispatch::core::{ActionDispatchQueue, ThreadPoolDispatcher};
///
/// let pool = Arc::new(ThreadPoolDispatcher::new(ThreadPoolConfig::new().with_worker_count(2))?);
/// let queue = ActionDispatchQueue::new(pool.clone());
/// queue.enqueue(|| println!("on a worker"))?;
/// queue.shutdown();
/// pool.shutdown();
/// # Ok::<(), prometheus_dispatch::core::DispatchError>(())
/// ```
pub struct ThreadPoolDispatcher {
    id: Uuid,
    config: ThreadPoolConfig,
    /// Task sender (to workers). `None` once shut down.
    task_tx: Mutex<Option<Sender<Task>>>,
    counters: Arc<PoolCounters>,
    shutdown: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolDispatcher {
    /// Start a pool with `config.worker_count` threads.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidConfig`] if the configuration is invalid
    /// - [`DispatchError::Spawn`] if a worker thread could not be started
    pub fn new(config: ThreadPoolConfig) -> Result<Self, DispatchError> {
        config.validate().map_err(DispatchError::InvalidConfig)?;

        let (task_tx, task_rx) = if config.max_queue_depth == 0 {
            unbounded::<Task>()
        } else {
            bounded::<Task>(config.max_queue_depth)
        };
        let id = Uuid::new_v4();
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                id,
                worker_id,
                &config,
                task_rx.clone(),
                Arc::clone(&counters),
            )?;
            workers.push(worker);
        }

        info!(
            pool_id = %id,
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "ThreadPoolDispatcher started"
        );

        Ok(Self {
            id,
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Start a pool with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_defaults() -> Result<Self, DispatchError> {
        Self::new(ThreadPoolConfig::default())
    }

    /// Identifier used in this pool's log records.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Pool configuration.
    #[must_use]
    pub const fn config(&self) -> &ThreadPoolConfig {
        &self.config
    }

    /// Tasks accepted but not yet finished (queued plus running).
    #[must_use]
    pub fn outstanding_work(&self) -> u64 {
        self.counters.queued.load(Ordering::Relaxed) + self.counters.running.load(Ordering::Relaxed)
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Whether `shutdown` has been called or the pool was dropped.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Stop accepting tasks and wait for workers to finish.
    ///
    /// Every task accepted before this call still runs. Each worker is given
    /// `config.shutdown_timeout()` to exit; a worker that takes longer is
    /// detached. Called from one of the pool's own workers, that worker is not
    /// joined.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!(pool_id = %self.id, "Shutting down thread pool");

        // Dropping the sender unblocks workers once the channel is empty.
        self.task_tx.lock().take();

        let current = thread::current().id();
        let timeout = self.config.shutdown_timeout();
        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.thread().id() == current {
                debug!(pool_id = %self.id, worker_id = idx, "not joining the calling worker");
                continue;
            }

            let (tx, rx) = mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(timeout) {
                Ok(true) => {
                    debug!(pool_id = %self.id, worker_id = idx, "Worker joined successfully");
                    let _ = join_thread.join();
                }
                Ok(false) => {
                    warn!(pool_id = %self.id, worker_id = idx, "Worker panicked");
                    let _ = join_thread.join();
                }
                Err(_) => {
                    warn!(pool_id = %self.id, worker_id = idx, "Worker did not exit within timeout - detaching");
                }
            }
        }

        info!(pool_id = %self.id, worker_count, "Thread pool shut down complete");
    }
}

impl TaskDispatcher for ThreadPoolDispatcher {
    fn submit(&self, task: Task) -> Result<(), DispatchError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(DispatchError::DispatchRejected("thread pool has been shut down".into()));
        }

        let task_tx = self.task_tx.lock();
        let Some(task_tx) = task_tx.as_ref() else {
            return Err(DispatchError::DispatchRejected("thread pool has been shut down".into()));
        };

        // Count before sending so a fast worker never decrements first.
        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        match task_tx.try_send(task) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.counters.queued.fetch_sub(1, Ordering::Relaxed);
                warn!(pool_id = %self.id, "Thread pool queue is full");
                Err(DispatchError::DispatchRejected("thread pool queue is full".into()))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.counters.queued.fetch_sub(1, Ordering::Relaxed);
                Err(DispatchError::DispatchRejected("thread pool workers have exited".into()))
            }
        }
    }
}

impl std::fmt::Debug for ThreadPoolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolDispatcher")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Drop for ThreadPoolDispatcher {
    fn drop(&mut self) {
        // Disconnect but don't join: the last reference may be held by a task
        // running on one of our own workers. Accepted tasks still run.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.task_tx.lock().take();
            debug!(pool_id = %self.id, "ThreadPoolDispatcher dropped without explicit shutdown - workers will be detached");
        }
    }
}

fn spawn_worker(
    pool_id: Uuid,
    worker_id: usize,
    config: &ThreadPoolConfig,
    task_rx: Receiver<Task>,
    counters: Arc<PoolCounters>,
) -> Result<JoinHandle<()>, DispatchError> {
    let handle = thread::Builder::new()
        .name(format!("{}-{worker_id}", config.thread_name_prefix))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            debug!(pool_id = %pool_id, worker_id, "Worker thread started");

            // Returns Err once the sender is dropped and the channel is empty.
            while let Ok(task) = task_rx.recv() {
                counters.queued.fetch_sub(1, Ordering::Relaxed);
                counters.running.fetch_add(1, Ordering::Relaxed);

                if panic::catch_unwind(AssertUnwindSafe(task)).is_ok() {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    warn!(pool_id = %pool_id, worker_id, "Task panicked on worker");
                }

                counters.running.fetch_sub(1, Ordering::Relaxed);
            }

            debug!(pool_id = %pool_id, worker_id, "Worker thread exiting");
        })?;
    Ok(handle)
}
