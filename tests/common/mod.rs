//! Shared test utilities and fixtures
//!
//! Fake intersection hosts and section factories for driving a page shell
//! under paused tokio time.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::Instant;

use babybaby_engine::{
    Component, IntersectionCallback, IntersectionEntry, IntersectionHost, ObservationId,
    ObserveError, Render, SectionDescriptor, StaticComponent,
};
use babybaby_types::{ElementId, Node, SectionId, Tier};

pub fn id(name: &str) -> SectionId {
    SectionId::new(name).unwrap()
}

/// Intersection host driven by the test: nothing is visible until
/// `scroll_to` reports it.
#[derive(Default)]
pub struct ManualHost {
    observations: Mutex<HashMap<ObservationId, (ElementId, IntersectionCallback)>>,
    next_id: AtomicU64,
}

impl ManualHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Observations still connected.
    pub fn active(&self) -> usize {
        self.observations.lock().unwrap().len()
    }

    pub fn scroll_to(&self, element: ElementId) {
        let callbacks: Vec<IntersectionCallback> = self
            .observations
            .lock()
            .unwrap()
            .values()
            .filter(|(observed, _)| *observed == element)
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(IntersectionEntry {
                element,
                is_intersecting: true,
            });
        }
    }
}

impl IntersectionHost for ManualHost {
    fn observe(
        &self,
        element: ElementId,
        _root_margin_px: f32,
        callback: IntersectionCallback,
    ) -> Result<ObservationId, ObserveError> {
        let id = ObservationId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.observations
            .lock()
            .unwrap()
            .insert(id, (element, callback));
        Ok(id)
    }

    fn unobserve(&self, id: ObservationId) {
        self.observations.lock().unwrap().remove(&id);
    }
}

/// Records when each factory was invoked, relative to `start`.
pub struct InvocationLog {
    start: Instant,
    entries: Mutex<Vec<(String, Duration)>>,
}

impl InvocationLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            entries: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, name: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((name.to_string(), self.start.elapsed()));
    }

    pub fn entries(&self) -> Vec<(String, Duration)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn invoked_at(&self, name: &str) -> Option<Duration> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, at)| *at)
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Section whose component renders `<section>` with its name, after `latency`.
pub fn section(name: &'static str, tier: Tier, latency: Duration) -> SectionDescriptor {
    logged_section(name, tier, latency, &InvocationLog::new())
}

pub fn logged_section(
    name: &'static str,
    tier: Tier,
    latency: Duration,
    log: &Arc<InvocationLog>,
) -> SectionDescriptor {
    let log = Arc::clone(log);
    SectionDescriptor::new(
        id(name),
        tier,
        Arc::new(move || {
            log.record(name);
            async move {
                tokio::time::sleep(latency).await;
                Ok::<Component, anyhow::Error>(
                    StaticComponent::new(Node::element("section", vec![Node::text(name)]))
                        .into_component(),
                )
            }
        }),
    )
}

/// Section whose factory rejects after `after`.
pub fn failing_section(name: &'static str, tier: Tier, after: Duration) -> SectionDescriptor {
    SectionDescriptor::new(
        id(name),
        tier,
        Arc::new(move || async move {
            tokio::time::sleep(after).await;
            Err::<Component, _>(anyhow!("{name} chunk failed to load"))
        }),
    )
}

/// Component counting how often its heavy work was started.
pub struct Animated {
    pub label: &'static str,
    pub heavy_starts: Arc<AtomicUsize>,
}

impl Render for Animated {
    fn render(&self) -> Node {
        Node::element("canvas", vec![Node::text(self.label)])
    }

    fn start_heavy_work(&self) {
        self.heavy_starts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Section with heavy work gated on `element` becoming visible.
pub fn animated_section(
    name: &'static str,
    tier: Tier,
    element: ElementId,
    heavy_starts: &Arc<AtomicUsize>,
) -> SectionDescriptor {
    let heavy_starts = Arc::clone(heavy_starts);
    SectionDescriptor::new(
        id(name),
        tier,
        Arc::new(move || {
            let heavy_starts = Arc::clone(&heavy_starts);
            async move {
                Ok::<Component, anyhow::Error>(Arc::new(Animated {
                    label: name,
                    heavy_starts,
                }))
            }
        }),
    )
    .gated_on(element)
}
