//! The BabyBaby landing page: section table, components and page layout.
//!
//! Factories simulate network latency with `tokio::time::sleep`; the
//! content itself is static.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};

use babybaby_engine::{Component, ComponentFactory, Render, SectionDescriptor};
use babybaby_types::{ElementId, Node, PlaceholderSpec, PulseStyle, Rect, SectionId, Tier};

/// Width of the simulated page, in CSS pixels.
pub const PAGE_WIDTH: f32 = 1280.0;

/// Heavy work a section starts once it is loaded and on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeavyWork {
    None,
    /// Gated on visibility.
    Visible(&'static str),
}

struct SectionSpec {
    id: &'static str,
    tier: Tier,
    latency_ms: u64,
    height: u32,
    pulse: PulseStyle,
    title: &'static str,
    body: &'static [&'static str],
    heavy: HeavyWork,
}

/// Page order, top to bottom.
static SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        id: "nav",
        tier: Tier::Critical,
        latency_ms: 40,
        height: 64,
        pulse: PulseStyle::Static,
        title: "BabyBaby",
        body: &["Growth", "Milestones", "Vaccines", "Articles", "Forum"],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "hero",
        tier: Tier::Critical,
        latency_ms: 120,
        height: 520,
        pulse: PulseStyle::Shimmer,
        title: "Every little step, in one place",
        body: &["Track growth, milestones and vaccinations from day one."],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "features",
        tier: Tier::Secondary,
        latency_ms: 150,
        height: 360,
        pulse: PulseStyle::Pulse,
        title: "What you get",
        body: &[
            "Growth charts against WHO percentiles",
            "Vaccination reminders",
            "Quizzes and tools for new parents",
        ],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "growth",
        tier: Tier::Secondary,
        latency_ms: 220,
        height: 420,
        pulse: PulseStyle::Pulse,
        title: "Growth tracker preview",
        body: &["Weight 7.4 kg (62nd percentile)", "Length 67 cm (55th percentile)"],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "milestones",
        tier: Tier::Secondary,
        latency_ms: 260,
        height: 440,
        pulse: PulseStyle::Shimmer,
        title: "Milestone timeline",
        body: &["First smile", "Rolling over", "First steps"],
        heavy: HeavyWork::Visible("timeline animation"),
    },
    SectionSpec {
        id: "articles",
        tier: Tier::Tertiary,
        latency_ms: 300,
        height: 480,
        pulse: PulseStyle::Pulse,
        title: "Latest articles",
        body: &["Sleep regressions explained", "Starting solids without stress"],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "podcasts",
        tier: Tier::Tertiary,
        latency_ms: 180,
        height: 300,
        pulse: PulseStyle::Pulse,
        title: "Podcasts",
        body: &["Ep. 41: The fourth trimester"],
        heavy: HeavyWork::Visible("audio preview decoding"),
    },
    SectionSpec {
        id: "testimonials",
        tier: Tier::Tertiary,
        latency_ms: 120,
        height: 280,
        pulse: PulseStyle::Static,
        title: "Parents say",
        body: &["\"Finally stopped losing the vaccination card.\""],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "newsletter",
        tier: Tier::LowPriority,
        latency_ms: 90,
        height: 200,
        pulse: PulseStyle::Static,
        title: "Weekly newsletter",
        body: &["One email a week, matched to your baby's age."],
        heavy: HeavyWork::None,
    },
    SectionSpec {
        id: "footer",
        tier: Tier::LowPriority,
        latency_ms: 30,
        height: 160,
        pulse: PulseStyle::Static,
        title: "BabyBaby",
        body: &["About", "Privacy", "Contact"],
        heavy: HeavyWork::None,
    },
];

struct LandingSection {
    spec: &'static SectionSpec,
    heavy_started: AtomicBool,
}

impl Render for LandingSection {
    fn render(&self) -> Node {
        let mut children = vec![Node::element("h2", vec![Node::text(self.spec.title)])];
        children.extend(self.spec.body.iter().map(|line| Node::text(*line)));
        Node::element("section", children)
    }

    fn start_heavy_work(&self) {
        if let HeavyWork::Visible(what) = self.spec.heavy
            && !self.heavy_started.swap(true, Ordering::SeqCst)
        {
            tracing::info!(section = self.spec.id, work = what, "Heavy work started");
        }
    }
}

fn element_id(index: usize) -> ElementId {
    ElementId::new(index as u64 + 1)
}

fn factory(spec: &'static SectionSpec, fail: bool) -> Arc<dyn ComponentFactory> {
    Arc::new(move || async move {
        tokio::time::sleep(Duration::from_millis(spec.latency_ms)).await;
        if fail {
            bail!("chunk for '{}' failed to load", spec.id);
        }
        Ok::<Component, anyhow::Error>(Arc::new(LandingSection {
            spec,
            heavy_started: AtomicBool::new(false),
        }))
    })
}

/// Section ids, in page order.
pub fn section_ids() -> impl Iterator<Item = &'static str> {
    SECTIONS.iter().map(|spec| spec.id)
}

/// Descriptors for every landing section. Sections named in `failing` get
/// a factory that rejects.
pub fn sections(failing: &[String]) -> Result<Vec<SectionDescriptor>> {
    for name in failing {
        if !section_ids().any(|id| id == name) {
            bail!(
                "unknown section '{name}' (expected one of: {})",
                section_ids().collect::<Vec<_>>().join(", ")
            );
        }
    }

    SECTIONS
        .iter()
        .enumerate()
        .map(|(index, spec)| -> Result<SectionDescriptor> {
            let fail = failing.iter().any(|name| name == spec.id);
            let placeholder = PlaceholderSpec::new(spec.height).with_pulse(spec.pulse);
            let descriptor =
                SectionDescriptor::new(SectionId::new(spec.id)?, spec.tier, factory(spec, fail))
                    .with_placeholder(placeholder);
            Ok(match spec.heavy {
                HeavyWork::None => descriptor,
                HeavyWork::Visible(_) => descriptor.gated_on(element_id(index)),
            })
        })
        .collect()
}

/// Bounding boxes of every section element, stacked in page order.
pub fn layout() -> Vec<(ElementId, Rect)> {
    let mut y = 0.0;
    SECTIONS
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let rect = Rect::new(0.0, y, PAGE_WIDTH, spec.height as f32);
            y += spec.height as f32;
            (element_id(index), rect)
        })
        .collect()
}
