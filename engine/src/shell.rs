//! Page shell: the composition root of a staged page.
//!
//! Mounting schedules every section, wraps each load handle in a suspense
//! boundary, opens viewport gates for sections whose heavy work waits for
//! visibility and activates every handle. Each section has its own error
//! boundary, so one failing section never takes down its siblings or the
//! shell. Unmounting (explicitly or by drop) cancels every pending timer and
//! disconnects every observation.

use std::fmt::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use babybaby_types::{FailureFallback, Node, SectionId, ShellSettings, Tier, VisibilityState};

use crate::boundary::{BoundaryView, SuspenseBoundary};
use crate::error::{LoadError, ScheduleError};
use crate::registry::LoaderRegistry;
use crate::scheduler::{PriorityScheduler, ScheduledSection, SectionDescriptor};
use crate::viewport::{GatePhase, IntersectionHost, NoIntersection, ViewportGate};

/// Dependencies injected into a page shell.
#[derive(Clone)]
pub struct ShellContext {
    pub settings: ShellSettings,
    pub intersection: Arc<dyn IntersectionHost>,
}

impl ShellContext {
    pub fn new(settings: ShellSettings, intersection: Arc<dyn IntersectionHost>) -> Self {
        Self {
            settings,
            intersection,
        }
    }

    /// Context for hosts without visibility observation; gated sections
    /// count as visible straight away.
    #[must_use]
    pub fn without_intersection(settings: ShellSettings) -> Self {
        Self::new(settings, Arc::new(NoIntersection))
    }
}

impl fmt::Debug for ShellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    Pending,
    Ready { heavy_work_started: bool },
    /// Held on its placeholder: the section could not be scheduled or its
    /// visibility cannot be observed.
    Stalled,
    Failed(LoadError),
}

impl SectionState {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            SectionState::Pending => "pending",
            SectionState::Ready {
                heavy_work_started: true,
            } => "ready",
            SectionState::Ready { .. } => "ready (heavy work deferred)",
            SectionState::Stalled => "stalled",
            SectionState::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionFrame {
    pub id: SectionId,
    pub tier: Tier,
    pub state: SectionState,
    pub node: Node,
}

/// One rendering of the whole page, sections in schedule order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageFrame {
    pub sections: Vec<SectionFrame>,
}

impl PageFrame {
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&SectionFrame> {
        self.sections.iter().find(|s| s.id.as_str() == id)
    }

    /// No section is still waiting for its component.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self
            .sections
            .iter()
            .any(|s| matches!(s.state, SectionState::Pending))
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(
                out,
                "{} [{}] {}",
                section.id,
                section.tier,
                section.state.label()
            );
            for line in section.node.to_text().lines() {
                let _ = writeln!(out, "  {line}");
            }
        }
        out
    }
}

/// What an unmount released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub timers_cancelled: usize,
    pub observers_disconnected: usize,
}

struct SectionSlot {
    id: SectionId,
    tier: Tier,
    delay: Duration,
    boundary: SuspenseBoundary,
    gate: Option<ViewportGate>,
    heavy_work_started: bool,
    failure_reported: bool,
}

impl SectionSlot {
    fn new(section: ScheduledSection, gate: Option<ViewportGate>) -> Self {
        let ScheduledSection {
            descriptor,
            delay,
            handle,
            ..
        } = section;
        Self {
            id: descriptor.id,
            tier: descriptor.tier,
            delay,
            boundary: SuspenseBoundary::new(handle, descriptor.placeholder),
            gate,
            heavy_work_started: false,
            failure_reported: false,
        }
    }

    fn gate_open(&self) -> bool {
        self.gate.as_ref().is_none_or(ViewportGate::is_visible)
    }

    fn gate_failed(&self) -> bool {
        self.gate
            .as_ref()
            .is_some_and(|gate| gate.phase() == GatePhase::Failed)
    }

    fn render(&mut self, on_failure: FailureFallback) -> SectionFrame {
        let placeholder = Node::Placeholder(self.boundary.placeholder());
        let (state, node) = match self.boundary.render() {
            Ok(BoundaryView::Placeholder(spec)) => {
                if self.boundary.error().is_some() {
                    (SectionState::Stalled, Node::Placeholder(spec))
                } else {
                    (SectionState::Pending, Node::Placeholder(spec))
                }
            }
            Ok(BoundaryView::Content(_)) if self.gate_failed() => {
                (SectionState::Stalled, placeholder)
            }
            Ok(BoundaryView::Content(node)) => {
                self.maybe_start_heavy_work();
                (
                    SectionState::Ready {
                        heavy_work_started: self.heavy_work_started,
                    },
                    node,
                )
            }
            Err(err) => {
                if !self.failure_reported {
                    self.failure_reported = true;
                    tracing::warn!(section = %self.id, error = %err, "Section failed");
                }
                let node = match on_failure {
                    FailureFallback::Collapse => Node::Empty,
                    FailureFallback::KeepPlaceholder => placeholder,
                };
                (SectionState::Failed(err), node)
            }
        };
        SectionFrame {
            id: self.id.clone(),
            tier: self.tier,
            state,
            node,
        }
    }

    fn maybe_start_heavy_work(&mut self) {
        if self.heavy_work_started || !self.gate_open() {
            return;
        }
        if let Some(component) = self.boundary.component() {
            self.heavy_work_started = true;
            tracing::debug!(section = %self.id, "Starting heavy work");
            component.start_heavy_work();
        }
    }
}

pub struct PageShell {
    settings: ShellSettings,
    registry: LoaderRegistry,
    slots: Vec<SectionSlot>,
    notify: Arc<Notify>,
    mounted: bool,
}

impl fmt::Debug for PageShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageShell")
            .field("sections", &self.slots.len())
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

impl PageShell {
    /// Schedule `sections` and start their activation waterfall.
    ///
    /// Must be called inside a tokio runtime for sections to load; without
    /// one, every section stalls on its placeholder.
    pub fn mount(
        ctx: &ShellContext,
        sections: Vec<SectionDescriptor>,
    ) -> Result<Self, ScheduleError> {
        let notify = Arc::new(Notify::new());
        let mut registry = LoaderRegistry::with_notifier(Arc::clone(&notify));
        let scheduler = PriorityScheduler::new(ctx.settings.schedule.clone());
        let scheduled = scheduler.schedule(sections, &mut registry)?;

        let root_margin_px = ctx.settings.viewport.root_margin_px();
        let slots: Vec<SectionSlot> = scheduled
            .into_iter()
            .map(|section| {
                let gate = section.descriptor.heavy_work.gate_element().map(|element| {
                    ViewportGate::observe_with_notifier(
                        element,
                        Arc::clone(&ctx.intersection),
                        root_margin_px,
                        Arc::clone(&notify),
                    )
                });
                SectionSlot::new(section, gate)
            })
            .collect();

        for handle in registry.handles() {
            handle.activate();
        }

        tracing::info!(
            sections = slots.len(),
            gated = slots.iter().filter(|s| s.gate.is_some()).count(),
            "Page shell mounted"
        );
        Ok(Self {
            settings: ctx.settings.clone(),
            registry,
            slots,
            notify,
            mounted: true,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Section ids with their activation delays, in schedule order.
    #[must_use]
    pub fn schedule(&self) -> Vec<(SectionId, Duration)> {
        self.slots.iter().map(|s| (s.id.clone(), s.delay)).collect()
    }

    /// Render every section. Starts heavy work for sections whose policy
    /// became satisfied since the last render.
    pub fn render(&mut self) -> PageFrame {
        let on_failure = self.settings.on_failure;
        PageFrame {
            sections: self
                .slots
                .iter_mut()
                .map(|slot| slot.render(on_failure))
                .collect(),
        }
    }

    /// Wait until a section settles or a gate opens.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }

    /// Every section has left `Pending` and no gate is still observing.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.slots.iter().all(|slot| {
            !slot.boundary.is_pending() && slot.gate.as_ref().is_none_or(|g| !g.is_observing())
        })
    }

    /// The element of section `id` was removed from the document.
    ///
    /// Returns `true` if an observation was disconnected.
    pub fn detach_section(&mut self, id: &SectionId) -> bool {
        self.slots
            .iter()
            .find(|slot| &slot.id == id)
            .and_then(|slot| slot.gate.as_ref())
            .is_some_and(ViewportGate::detach)
    }

    #[must_use]
    pub fn visibility(&self, id: &SectionId) -> Option<VisibilityState> {
        self.slots
            .iter()
            .find(|slot| &slot.id == id)
            .and_then(|slot| slot.gate.as_ref())
            .map(ViewportGate::state)
    }

    #[must_use]
    pub fn live_timers(&self) -> usize {
        self.registry.live_timers()
    }

    #[must_use]
    pub fn live_observers(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.gate.as_ref())
            .filter(|gate| gate.is_observing())
            .count()
    }

    /// Cancel pending timers and disconnect observations.
    pub fn unmount(mut self) -> TeardownReport {
        self.teardown()
    }

    fn teardown(&mut self) -> TeardownReport {
        if !self.mounted {
            return TeardownReport::default();
        }
        self.mounted = false;

        let timers_cancelled = self.registry.cancel_all();
        let observers_disconnected = self
            .slots
            .iter()
            .filter_map(|slot| slot.gate.as_ref())
            .filter(|gate| gate.detach())
            .count();

        tracing::info!(
            timers_cancelled,
            observers_disconnected,
            "Page shell unmounted"
        );
        TeardownReport {
            timers_cancelled,
            observers_disconnected,
        }
    }
}

impl Drop for PageShell {
    fn drop(&mut self) {
        self.teardown();
    }
}
