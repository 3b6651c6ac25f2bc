//! Priority scheduling of page sections.
//!
//! Sections are partitioned by tier, stably, and each one gets an activation
//! delay of `base(tier) + index_in_tier * step`. Planning is pure; `schedule`
//! then registers every section with a loader registry in tier-major order.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use babybaby_types::{ElementId, PlaceholderSpec, ScheduleSettings, SectionId, Tier, TierTable};

use crate::component::ComponentFactory;
use crate::error::ScheduleError;
use crate::registry::{LoadHandle, LoaderRegistry};

/// When a section may start its heavy work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeavyWorkPolicy {
    /// As soon as the component has resolved.
    #[default]
    OnResolve,
    /// Once resolved and once `element` has entered the viewport.
    OnResolveAndVisible(ElementId),
}

impl HeavyWorkPolicy {
    #[must_use]
    pub fn gate_element(self) -> Option<ElementId> {
        match self {
            HeavyWorkPolicy::OnResolve => None,
            HeavyWorkPolicy::OnResolveAndVisible(element) => Some(element),
        }
    }
}

/// One section of the page, as declared by the page.
#[derive(Clone)]
pub struct SectionDescriptor {
    pub id: SectionId,
    pub tier: Tier,
    pub factory: Arc<dyn ComponentFactory>,
    pub placeholder: PlaceholderSpec,
    pub heavy_work: HeavyWorkPolicy,
}

impl SectionDescriptor {
    pub fn new(id: SectionId, tier: Tier, factory: Arc<dyn ComponentFactory>) -> Self {
        Self {
            id,
            tier,
            factory,
            placeholder: PlaceholderSpec::default(),
            heavy_work: HeavyWorkPolicy::OnResolve,
        }
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: PlaceholderSpec) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Hold heavy work back until `element` is visible.
    #[must_use]
    pub fn gated_on(mut self, element: ElementId) -> Self {
        self.heavy_work = HeavyWorkPolicy::OnResolveAndVisible(element);
        self
    }
}

impl fmt::Debug for SectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionDescriptor")
            .field("id", &self.id)
            .field("tier", &self.tier)
            .field("placeholder", &self.placeholder)
            .field("heavy_work", &self.heavy_work)
            .finish_non_exhaustive()
    }
}

/// Planned slot for one input section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSection {
    /// Index of the section in the planning input.
    pub position: usize,
    pub tier: Tier,
    pub index_in_tier: usize,
    pub delay: Duration,
}

/// A section registered with the loader registry.
#[derive(Debug, Clone)]
pub struct ScheduledSection {
    pub descriptor: SectionDescriptor,
    pub position: usize,
    pub delay: Duration,
    pub handle: LoadHandle,
}

#[derive(Debug, Clone, Default)]
pub struct PriorityScheduler {
    settings: ScheduleSettings,
}

impl PriorityScheduler {
    #[must_use]
    pub fn new(settings: ScheduleSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Compute delays for sections with the given tiers, in input order.
    ///
    /// The result is tier-major and stable within a tier. Tiers with no
    /// sections take no offsets.
    #[must_use]
    pub fn plan(&self, tiers: &[Tier]) -> Vec<PlannedSection> {
        let mut counters: TierTable<usize> = TierTable::default();
        let mut planned: Vec<PlannedSection> = tiers
            .iter()
            .enumerate()
            .map(|(position, &tier)| {
                let index_in_tier = counters[tier];
                counters[tier] += 1;
                PlannedSection {
                    position,
                    tier,
                    index_in_tier,
                    delay: self.settings.delay_for(tier, index_in_tier),
                }
            })
            .collect();
        planned.sort_by_key(|p| p.tier);
        planned
    }

    /// Plan `sections` and register each with `registry`.
    ///
    /// Nothing is registered when the input has a duplicate id.
    pub fn schedule(
        &self,
        sections: Vec<SectionDescriptor>,
        registry: &mut LoaderRegistry,
    ) -> Result<Vec<ScheduledSection>, ScheduleError> {
        let mut seen = HashSet::with_capacity(sections.len());
        for section in &sections {
            if !seen.insert(section.id.clone()) {
                return Err(ScheduleError::DuplicateSection(section.id.clone()));
            }
        }

        let tiers: Vec<Tier> = sections.iter().map(|s| s.tier).collect();
        let plan = self.plan(&tiers);
        let mut slots: Vec<Option<SectionDescriptor>> = sections.into_iter().map(Some).collect();

        let mut scheduled = Vec::with_capacity(plan.len());
        for planned in plan {
            let Some(descriptor) = slots[planned.position].take() else {
                continue;
            };
            tracing::debug!(
                section = %descriptor.id,
                tier = %planned.tier,
                delay_ms = planned.delay.as_millis() as u64,
                "Section scheduled"
            );
            let handle = registry.register(
                descriptor.id.clone(),
                Arc::clone(&descriptor.factory),
                planned.delay,
            );
            scheduled.push(ScheduledSection {
                descriptor,
                position: planned.position,
                delay: planned.delay,
                handle,
            });
        }
        Ok(scheduled)
    }
}
