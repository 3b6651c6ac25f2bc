//! Activation timers owned by one loader registry.
//!
//! Every armed timer is tracked until it fires or is cancelled, so tearing
//! the registry down leaves nothing behind that could fire later.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use tokio::runtime::Handle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ArmError {
    #[error("timer set is closed")]
    Closed,
    #[error("no async runtime available: {0}")]
    NoRuntime(String),
}

#[derive(Default)]
struct TimerSetInner {
    armed: HashMap<u64, AbortHandle>,
    next_id: u64,
    closed: bool,
}

#[derive(Clone, Default)]
pub(crate) struct TimerSet {
    inner: Arc<Mutex<TimerSetInner>>,
}

impl TimerSet {
    fn lock(&self) -> MutexGuard<'_, TimerSetInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `on_fire` once after `delay`, unless the set is cancelled first.
    ///
    /// The timer counts as fired the moment it is removed from the set;
    /// `on_fire` runs on the runtime's task.
    pub(crate) fn arm<F>(&self, delay: Duration, on_fire: F) -> Result<(), ArmError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|e| ArmError::NoRuntime(e.to_string()))?;

        let mut inner = self.lock();
        if inner.closed {
            return Err(ArmError::Closed);
        }
        let id = inner.next_id;
        inner.next_id += 1;

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let timers = self.clone();
        let sleep = Abortable::new(tokio::time::sleep(delay), abort_registration);
        runtime.spawn(async move {
            if sleep.await.is_ok() && timers.disarm(id) {
                on_fire();
            }
        });
        inner.armed.insert(id, abort_handle);
        Ok(())
    }

    /// Remove a timer that is about to fire. `false` if it was cancelled.
    fn disarm(&self, id: u64) -> bool {
        self.lock().armed.remove(&id).is_some()
    }

    /// Abort every armed timer and refuse new ones. Returns how many were aborted.
    pub(crate) fn cancel_all(&self) -> usize {
        let mut inner = self.lock();
        inner.closed = true;
        let cancelled = inner.armed.len();
        for (_, handle) in inner.armed.drain() {
            handle.abort();
        }
        cancelled
    }

    pub(crate) fn armed(&self) -> usize {
        self.lock().armed.len()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
