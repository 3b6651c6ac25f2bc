//! Loader registry: memoized, delayed component loading.
//!
//! `register` wraps a factory and an activation delay into a [`LoadHandle`].
//! The first activation request either invokes the factory (zero delay) or
//! arms exactly one timer that invokes it later. However many times a handle
//! is activated or awaited, its factory runs at most once; the outcome is
//! published through a watch channel and never reverts to pending.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};

use babybaby_types::SectionId;

use crate::component::{Component, ComponentFactory};
use crate::error::LoadError;
use crate::timers::{ArmError, TimerSet};

/// Observable state of a load handle.
#[derive(Clone)]
pub enum LoadStatus {
    /// Registered, never activated.
    Inactive,
    /// Activated; waiting for the timer or the factory.
    Pending,
    Resolved(Component),
    Failed(LoadError),
}

impl LoadStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStatus::Resolved(_) | LoadStatus::Failed(_))
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::Inactive => "inactive",
            LoadStatus::Pending => "pending",
            LoadStatus::Resolved(_) => "resolved",
            LoadStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Debug for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            other => f.write_str(other.label()),
        }
    }
}

struct HandleInner {
    section: SectionId,
    delay: Duration,
    /// Taken by the first activation; `None` afterwards.
    factory: Mutex<Option<Arc<dyn ComponentFactory>>>,
    state: watch::Sender<LoadStatus>,
    timers: TimerSet,
    notify: Arc<Notify>,
}

/// Memoized handle to a lazily loaded component.
#[derive(Clone)]
pub struct LoadHandle {
    inner: Arc<HandleInner>,
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle")
            .field("section", &self.inner.section)
            .field("delay", &self.inner.delay)
            .field("status", &*self.inner.state.borrow())
            .finish()
    }
}

impl LoadHandle {
    #[must_use]
    pub fn section(&self) -> &SectionId {
        &self.inner.section
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to status changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        self.inner.state.subscribe()
    }

    /// Request activation. Only the first request has any effect, and none
    /// once the registry has been torn down.
    pub fn activate(&self) {
        let factory = {
            let mut slot = self
                .inner
                .factory
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slot.take()
        };
        let Some(factory) = factory else {
            return;
        };
        if self.inner.timers.is_closed() {
            self.settle(LoadStatus::Failed(self.abandoned()));
            return;
        }

        self.inner.state.send_if_modified(|status| {
            if matches!(status, LoadStatus::Inactive) {
                *status = LoadStatus::Pending;
                true
            } else {
                false
            }
        });

        if self.inner.delay.is_zero() {
            match Handle::try_current() {
                Ok(runtime) => self.start(&factory, &runtime),
                Err(e) => self.fail_setup(e.to_string()),
            }
            return;
        }

        let handle = self.clone();
        let armed = self.inner.timers.arm(self.inner.delay, move || {
            match Handle::try_current() {
                Ok(runtime) => handle.start(&factory, &runtime),
                Err(e) => handle.fail_setup(e.to_string()),
            }
        });
        match armed {
            Ok(()) => tracing::debug!(
                section = %self.inner.section,
                delay_ms = self.inner.delay.as_millis() as u64,
                "Activation timer armed"
            ),
            Err(ArmError::Closed) => self.settle(LoadStatus::Failed(LoadError::Abandoned {
                section: self.inner.section.clone(),
            })),
            Err(ArmError::NoRuntime(reason)) => self.fail_setup(reason),
        }
    }

    /// Activate if needed and wait for the terminal outcome.
    pub async fn resolve(&self) -> Result<Component, LoadError> {
        self.activate();
        let mut rx = self.subscribe();
        let outcome = match rx.wait_for(LoadStatus::is_terminal).await {
            Ok(status) => status.clone(),
            Err(_) => LoadStatus::Failed(self.abandoned()),
        };
        match outcome {
            LoadStatus::Resolved(component) => Ok(component),
            LoadStatus::Failed(err) => Err(err),
            LoadStatus::Inactive | LoadStatus::Pending => Err(self.abandoned()),
        }
    }

    fn start(&self, factory: &Arc<dyn ComponentFactory>, runtime: &Handle) {
        tracing::debug!(section = %self.inner.section, "Invoking component factory");
        let future = match panic::catch_unwind(AssertUnwindSafe(|| factory.load())) {
            Ok(future) => future,
            Err(_) => {
                self.settle(LoadStatus::Failed(LoadError::Panicked {
                    section: self.inner.section.clone(),
                }));
                return;
            }
        };

        let handle = self.clone();
        runtime.spawn(async move {
            let status = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(Ok(component)) => LoadStatus::Resolved(component),
                Ok(Err(err)) => LoadStatus::Failed(LoadError::Rejected {
                    section: handle.inner.section.clone(),
                    reason: format!("{err:#}"),
                }),
                Err(_) => LoadStatus::Failed(LoadError::Panicked {
                    section: handle.inner.section.clone(),
                }),
            };
            handle.settle(status);
        });
    }

    fn fail_setup(&self, reason: String) {
        self.settle(LoadStatus::Failed(LoadError::Setup {
            section: self.inner.section.clone(),
            reason,
        }));
    }

    fn abandoned(&self) -> LoadError {
        LoadError::Abandoned {
            section: self.inner.section.clone(),
        }
    }

    /// Move to a terminal state. The first terminal state wins.
    ///
    /// Results arriving after the registry was torn down are discarded.
    fn settle(&self, status: LoadStatus) {
        let section = &self.inner.section;
        let status = if self.inner.timers.is_closed() && matches!(status, LoadStatus::Resolved(_))
        {
            tracing::debug!(section = %section, "Discarding component loaded after teardown");
            LoadStatus::Failed(self.abandoned())
        } else {
            status
        };

        let label = status.label();
        let changed = self.inner.state.send_if_modified(|current| {
            if current.is_terminal() {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::debug!(section = %section, status = label, "Load handle settled");
            self.inner.notify.notify_one();
        }
    }
}

/// Owns the load handles and activation timers of one page.
pub struct LoaderRegistry {
    timers: TimerSet,
    handles: Vec<LoadHandle>,
    notify: Arc<Notify>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(Notify::new()))
    }

    /// Use `notify` to signal every settled handle.
    #[must_use]
    pub fn with_notifier(notify: Arc<Notify>) -> Self {
        Self {
            timers: TimerSet::default(),
            handles: Vec::new(),
            notify,
        }
    }

    /// Wrap `factory` with an activation `delay`. Nothing runs until the
    /// handle is activated.
    pub fn register(
        &mut self,
        section: SectionId,
        factory: Arc<dyn ComponentFactory>,
        delay: Duration,
    ) -> LoadHandle {
        let (state, _) = watch::channel(LoadStatus::Inactive);
        let handle = LoadHandle {
            inner: Arc::new(HandleInner {
                section,
                delay,
                factory: Mutex::new(Some(factory)),
                state,
                timers: self.timers.clone(),
                notify: Arc::clone(&self.notify),
            }),
        };
        self.handles.push(handle.clone());
        handle
    }

    #[must_use]
    pub fn handles(&self) -> &[LoadHandle] {
        &self.handles
    }

    /// Timers armed and not yet fired.
    #[must_use]
    pub fn live_timers(&self) -> usize {
        self.timers.armed()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.timers.is_closed()
    }

    /// Cancel every pending timer and abandon handles that never settled.
    ///
    /// In-flight factory futures keep running; their results are discarded.
    /// Returns the number of cancelled timers.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        for handle in &self.handles {
            handle
                .inner
                .factory
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if !handle.status().is_terminal() {
                handle.settle(LoadStatus::Failed(handle.abandoned()));
            }
        }
        cancelled
    }

    /// Wait until any handle of this registry settles.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }
}
