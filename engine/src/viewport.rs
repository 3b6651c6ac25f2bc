//! One-shot visibility gates.
//!
//! A [`ViewportGate`] watches one element through an [`IntersectionHost`]
//! and flips to visible on the first intersecting entry. From then on the
//! observation is disconnected at the host, not merely ignored.
//!
//! Hosts without native intersection support can use [`PollingIntersection`],
//! which polls element geometry on a fixed interval.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use tokio::runtime::Handle;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;

use babybaby_types::{ElementId, Rect, VisibilityState};

use crate::error::ObserveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    pub is_intersecting: bool,
}

pub type IntersectionCallback = Arc<dyn Fn(IntersectionEntry) + Send + Sync>;

/// Host-issued token for one active observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObservationId(u64);

impl ObservationId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Intersection capability of the rendering host.
///
/// Hosts must not hold internal locks while invoking a callback: gates call
/// back into `unobserve` from inside it.
pub trait IntersectionHost: Send + Sync {
    /// Start reporting intersection changes of `element` against the
    /// viewport grown by `root_margin_px` on every side.
    fn observe(
        &self,
        element: ElementId,
        root_margin_px: f32,
        callback: IntersectionCallback,
    ) -> Result<ObservationId, ObserveError>;

    /// Stop an observation. Unknown ids are ignored.
    fn unobserve(&self, id: ObservationId);
}

/// Host with no intersection capability. Gates over it open immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIntersection;

impl IntersectionHost for NoIntersection {
    fn observe(
        &self,
        _element: ElementId,
        _root_margin_px: f32,
        _callback: IntersectionCallback,
    ) -> Result<ObservationId, ObserveError> {
        Err(ObserveError::Unsupported)
    }

    fn unobserve(&self, _id: ObservationId) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Observing,
    Visible,
    /// The element went away before it was ever visible.
    Detached,
    /// Observation could not be set up; the gate never opens.
    Failed,
}

struct GateShared {
    element: ElementId,
    phase: watch::Sender<GatePhase>,
    observation: Mutex<Option<ObservationId>>,
    notify: Arc<Notify>,
}

impl GateShared {
    fn observation(&self) -> MutexGuard<'_, Option<ObservationId>> {
        self.observation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave `Observing` for `next`. Returns the observation to disconnect
    /// if this call made the transition.
    fn leave_observing(&self, next: GatePhase) -> Option<Option<ObservationId>> {
        let changed = self.phase.send_if_modified(|phase| {
            if *phase == GatePhase::Observing {
                *phase = next;
                true
            } else {
                false
            }
        });
        if !changed {
            return None;
        }
        self.notify.notify_one();
        Some(self.observation().take())
    }
}

pub struct ViewportGate {
    shared: Arc<GateShared>,
    host: Arc<dyn IntersectionHost>,
}

impl fmt::Debug for ViewportGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportGate")
            .field("element", &self.shared.element)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl ViewportGate {
    /// Observe `element` through `host`.
    pub fn observe(
        element: ElementId,
        host: Arc<dyn IntersectionHost>,
        root_margin_px: f32,
    ) -> Self {
        Self::observe_with_notifier(element, host, root_margin_px, Arc::new(Notify::new()))
    }

    /// Like [`observe`](Self::observe), signalling `notify` when the gate
    /// opens.
    pub fn observe_with_notifier(
        element: ElementId,
        host: Arc<dyn IntersectionHost>,
        root_margin_px: f32,
        notify: Arc<Notify>,
    ) -> Self {
        let (phase, _) = watch::channel(GatePhase::Observing);
        let shared = Arc::new(GateShared {
            element,
            phase,
            observation: Mutex::new(None),
            notify,
        });

        let weak_shared = Arc::downgrade(&shared);
        let weak_host: Weak<dyn IntersectionHost> = Arc::downgrade(&host);
        let callback: IntersectionCallback = Arc::new(move |entry: IntersectionEntry| {
            if !entry.is_intersecting {
                return;
            }
            let Some(shared) = weak_shared.upgrade() else {
                return;
            };
            if let Some(observation) = shared.leave_observing(GatePhase::Visible) {
                tracing::debug!(element = %shared.element, "Element became visible");
                if let (Some(id), Some(host)) = (observation, weak_host.upgrade()) {
                    host.unobserve(id);
                }
            }
        });

        match host.observe(element, root_margin_px, callback) {
            Ok(id) => {
                let mut observation = shared.observation();
                if *shared.phase.borrow() == GatePhase::Observing {
                    *observation = Some(id);
                } else {
                    // Fired during `observe`, before the id was known.
                    drop(observation);
                    host.unobserve(id);
                }
            }
            Err(ObserveError::Unsupported) => {
                tracing::debug!(element = %element, "No intersection support, treating as visible");
                shared.leave_observing(GatePhase::Visible);
            }
            Err(err) => {
                tracing::warn!(element = %element, error = %err, "Visibility observation failed");
                shared.leave_observing(GatePhase::Failed);
            }
        }

        Self { shared, host }
    }

    #[must_use]
    pub fn element(&self) -> ElementId {
        self.shared.element
    }

    #[must_use]
    pub fn phase(&self) -> GatePhase {
        *self.shared.phase.borrow()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.phase() == GatePhase::Visible
    }

    #[must_use]
    pub fn state(&self) -> VisibilityState {
        if self.is_visible() {
            VisibilityState::fired(self.shared.element)
        } else {
            VisibilityState::hidden(self.shared.element)
        }
    }

    /// Whether an observation is still connected at the host.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.shared.observation().is_some()
    }

    /// Wait until the gate leaves `Observing`. `true` if it became visible.
    pub async fn visible(&self) -> bool {
        let mut rx = self.shared.phase.subscribe();
        match rx.wait_for(|phase| *phase != GatePhase::Observing).await {
            Ok(phase) => *phase == GatePhase::Visible,
            Err(_) => false,
        }
    }

    /// The element was removed before it became visible.
    ///
    /// Disconnects the observation; later entries are dropped. Returns
    /// `true` if an observation was disconnected.
    pub fn detach(&self) -> bool {
        let Some(observation) = self.shared.leave_observing(GatePhase::Detached) else {
            return false;
        };
        match observation {
            Some(id) => {
                self.host.unobserve(id);
                tracing::debug!(element = %self.shared.element, "Observation detached");
                true
            }
            None => false,
        }
    }
}

impl Drop for ViewportGate {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Geometry of the rendering host, for hosts without intersection support.
pub trait GeometryHost: Send + Sync {
    /// Current viewport in document coordinates.
    fn viewport(&self) -> Rect;

    /// Bounding box of `element`, `None` once it is no longer in the document.
    fn bounding_box(&self, element: ElementId) -> Option<Rect>;
}

/// [`IntersectionHost`] that polls a [`GeometryHost`].
///
/// Each observation is a task that compares the element's bounding box with
/// the margin-grown viewport once per interval and reports changes. A first
/// entry is always reported. An element that leaves the document ends its
/// poll without reporting.
pub struct PollingIntersection {
    geometry: Arc<dyn GeometryHost>,
    interval: Duration,
    polls: Arc<Mutex<HashMap<ObservationId, AbortHandle>>>,
    next_id: AtomicU64,
}

impl PollingIntersection {
    pub fn new(geometry: Arc<dyn GeometryHost>, interval: Duration) -> Self {
        Self {
            geometry,
            interval,
            polls: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of running polls.
    #[must_use]
    pub fn live(&self) -> usize {
        lock_polls(&self.polls).len()
    }
}

fn lock_polls(
    polls: &Mutex<HashMap<ObservationId, AbortHandle>>,
) -> MutexGuard<'_, HashMap<ObservationId, AbortHandle>> {
    polls.lock().unwrap_or_else(PoisonError::into_inner)
}

impl IntersectionHost for PollingIntersection {
    fn observe(
        &self,
        element: ElementId,
        root_margin_px: f32,
        callback: IntersectionCallback,
    ) -> Result<ObservationId, ObserveError> {
        let runtime = Handle::try_current().map_err(|e| ObserveError::Setup(e.to_string()))?;
        let id = ObservationId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let geometry = Arc::clone(&self.geometry);
        let polls = Arc::clone(&self.polls);
        let period = self.interval;
        let poll = async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<bool> = None;
            loop {
                ticks.tick().await;
                let Some(rect) = geometry.bounding_box(element) else {
                    tracing::debug!(element = %element, "Polled element left the document");
                    lock_polls(&polls).remove(&id);
                    return;
                };
                let is_intersecting = geometry.viewport().inflate(root_margin_px).intersects(&rect);
                if last != Some(is_intersecting) {
                    last = Some(is_intersecting);
                    callback(IntersectionEntry {
                        element,
                        is_intersecting,
                    });
                }
            }
        };

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let mut polls = lock_polls(&self.polls);
        runtime.spawn(Abortable::new(poll, abort_registration));
        polls.insert(id, abort_handle);
        Ok(id)
    }

    fn unobserve(&self, id: ObservationId) {
        if let Some(handle) = lock_polls(&self.polls).remove(&id) {
            handle.abort();
        }
    }
}
