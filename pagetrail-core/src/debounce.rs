//! Trailing-edge debounce
//!
//! A [`Debouncer`] owns at most one pending delayed task. Scheduling a new
//! task aborts the pending one, so a burst of signals results in a single run
//! once the signals stop for the quiet period.

use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Cancelable delayed task with a fixed quiet period
pub struct Debouncer {
    quiet_period: Duration,
    runtime: Handle,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet_period: Duration, runtime: Handle) -> Self {
        Self {
            quiet_period,
            runtime,
            pending: Mutex::new(None),
        }
    }

    /// Replace any pending task with `task`, run after the quiet period.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let quiet_period = self.quiet_period;
        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(quiet_period).await;
            task();
        }));
    }

    /// Abort the pending task, if any
    pub fn cancel(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(previous) = pending.take() {
                previous.abort();
            }
        }
    }

    /// Whether a scheduled task has not yet run
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.as_ref().map_or(false, |h| !h.is_finished()))
            .unwrap_or(false)
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
