//! Auto-reset event used as the shutdown completion signal.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A one-shot, auto-resetting signal.
///
/// [`set`](Self::set) marks the event signalled and wakes one waiter. A
/// successful wait consumes the signal, returning the event to the
/// non-signalled state. Setting before anyone waits is not lost.
#[derive(Debug, Default)]
pub struct AutoResetEvent {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl AutoResetEvent {
    /// Create a non-signalled event.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            signalled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Signal the event, releasing one waiter.
    pub fn set(&self) {
        let mut signalled = self.signalled.lock();
        *signalled = true;
        self.condvar.notify_one();
    }

    /// Block until the event is signalled, then reset it.
    pub fn wait(&self) {
        let mut signalled = self.signalled.lock();
        while !*signalled {
            self.condvar.wait(&mut signalled);
        }
        *signalled = false;
    }

    /// Block until the event is signalled or `timeout` elapses.
    ///
    /// Returns `true` if the signal was consumed, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut signalled = self.signalled.lock();
        while !*signalled {
            if self.condvar.wait_until(&mut signalled, deadline).timed_out() {
                break;
            }
        }
        std::mem::replace(&mut *signalled, false)
    }

    /// Whether the event is currently signalled.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.signalled.lock()
    }
}
