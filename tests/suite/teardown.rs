//! Unmounting releases every timer and observation.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use babybaby_engine::{GeometryHost, PageShell, PollingIntersection, ShellContext, TeardownReport};
use babybaby_types::{ElementId, Rect, ShellSettings, Tier};

use crate::common::{InvocationLog, ManualHost, animated_section, logged_section};

const MILESTONES: ElementId = ElementId::new(5);
const PODCASTS: ElementId = ElementId::new(8);

/// Page whose gated elements sit far below the fold.
struct TallPage;

impl GeometryHost for TallPage {
    fn viewport(&self) -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 800.0)
    }

    fn bounding_box(&self, element: ElementId) -> Option<Rect> {
        Some(Rect::new(0.0, 3000.0 + element.value() as f32 * 500.0, 1280.0, 400.0))
    }
}

#[tokio::test(start_paused = true)]
async fn unmount_before_timers_fire_leaves_nothing_behind() {
    let log = InvocationLog::new();
    let host = ManualHost::new();
    let heavy = Arc::new(AtomicUsize::new(0));
    let ctx = ShellContext::new(ShellSettings::default(), host.clone());
    let shell = PageShell::mount(
        &ctx,
        vec![
            logged_section("articles", Tier::Tertiary, Duration::ZERO, &log),
            logged_section("newsletter", Tier::LowPriority, Duration::ZERO, &log),
            logged_section("footer", Tier::LowPriority, Duration::ZERO, &log),
            animated_section("milestones", Tier::Secondary, MILESTONES, &heavy),
        ],
    )
    .unwrap();
    assert_eq!(shell.live_timers(), 4);
    assert_eq!(shell.live_observers(), 1);
    assert_eq!(host.active(), 1);

    let report = shell.unmount();
    assert_eq!(
        report,
        TeardownReport {
            timers_cancelled: 4,
            observers_disconnected: 1,
        }
    );
    assert_eq!(host.active(), 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(log.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unmount_mid_waterfall_cancels_only_what_is_left() {
    let log = InvocationLog::new();
    let ctx = ShellContext::without_intersection(ShellSettings::default());
    let shell = PageShell::mount(
        &ctx,
        vec![
            logged_section("hero", Tier::Critical, Duration::from_millis(500), &log),
            logged_section("growth", Tier::Secondary, Duration::ZERO, &log),
            logged_section("articles", Tier::Tertiary, Duration::ZERO, &log),
            logged_section("footer", Tier::LowPriority, Duration::ZERO, &log),
        ],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(log.count(), 2);

    let report = shell.unmount();
    assert_eq!(report.timers_cancelled, 2);

    // Hero's factory was in flight; its late result is discarded quietly.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(log.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_shell_stops_polling() {
    let polling = Arc::new(PollingIntersection::new(
        Arc::new(TallPage),
        Duration::from_millis(100),
    ));
    let heavy = Arc::new(AtomicUsize::new(0));
    let ctx = ShellContext::new(ShellSettings::default(), polling.clone());
    {
        let shell = PageShell::mount(
            &ctx,
            vec![
                animated_section("milestones", Tier::Secondary, MILESTONES, &heavy),
                animated_section("podcasts", Tier::Tertiary, PODCASTS, &heavy),
            ],
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(polling.live(), 2);
        assert_eq!(shell.live_observers(), 2);
    }
    assert_eq!(polling.live(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(polling.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn detached_element_is_not_counted_at_teardown() {
    let host = ManualHost::new();
    let heavy = Arc::new(AtomicUsize::new(0));
    let ctx = ShellContext::new(ShellSettings::default(), host.clone());
    let mut shell = PageShell::mount(
        &ctx,
        vec![
            animated_section("milestones", Tier::Secondary, MILESTONES, &heavy),
            animated_section("podcasts", Tier::Tertiary, PODCASTS, &heavy),
        ],
    )
    .unwrap();

    assert!(shell.detach_section(&crate::common::id("podcasts")));
    host.scroll_to(PODCASTS);
    assert_eq!(host.active(), 1);

    let report = shell.unmount();
    assert_eq!(report.observers_disconnected, 1);
    assert_eq!(host.active(), 0);
}
