//! Rendered page frames, from first paint to a fully hydrated page.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use babybaby_engine::{PageShell, SectionDescriptor, ShellContext};
use babybaby_types::{ElementId, PlaceholderSpec, PulseStyle, ShellSettings, Tier};

use crate::common::{ManualHost, animated_section, failing_section, section};

const MILESTONES: ElementId = ElementId::new(3);

fn landing(heavy: &Arc<AtomicUsize>) -> Vec<SectionDescriptor> {
    vec![
        failing_section("footer", Tier::LowPriority, Duration::from_millis(20))
            .with_placeholder(PlaceholderSpec::new(160)),
        animated_section("milestones", Tier::Secondary, MILESTONES, heavy)
            .with_placeholder(PlaceholderSpec::new(400).with_width(960)),
        section("nav", Tier::Critical, Duration::from_millis(10))
            .with_placeholder(PlaceholderSpec::new(64).with_pulse(PulseStyle::Static)),
        section("hero", Tier::Critical, Duration::from_millis(80))
            .with_placeholder(PlaceholderSpec::new(480).with_pulse(PulseStyle::Shimmer)),
    ]
}

#[tokio::test(start_paused = true)]
async fn first_paint_is_all_placeholders() {
    let heavy = Arc::new(AtomicUsize::new(0));
    let ctx = ShellContext::new(ShellSettings::default(), ManualHost::new());
    let mut shell = PageShell::mount(&ctx, landing(&heavy)).unwrap();

    insta::assert_snapshot!(shell.render().to_text(), @r"
    nav [critical] pending
      [placeholder 64px static]
    hero [critical] pending
      [placeholder 480px shimmer]
    milestones [secondary] pending
      [placeholder 960x400 pulse]
    footer [low_priority] pending
      [placeholder 160px pulse]
    ");
}

#[tokio::test(start_paused = true)]
async fn hydrated_page_after_reader_scrolls() {
    let heavy = Arc::new(AtomicUsize::new(0));
    let host = ManualHost::new();
    let ctx = ShellContext::new(ShellSettings::default(), host.clone());
    let mut shell = PageShell::mount(&ctx, landing(&heavy)).unwrap();

    tokio::time::sleep(Duration::from_secs(2)).await;
    insta::assert_snapshot!(shell.render().to_text(), @r"
    nav [critical] ready
      <section>
        nav
    hero [critical] ready
      <section>
        hero
    milestones [secondary] ready (heavy work deferred)
      <canvas>
        milestones
    footer [low_priority] failed
    ");
    assert_eq!(heavy.load(Ordering::SeqCst), 0);

    host.scroll_to(MILESTONES);
    let frame = shell.render();
    assert_eq!(
        frame.section("milestones").unwrap().state.label(),
        "ready"
    );
    assert_eq!(heavy.load(Ordering::SeqCst), 1);
    assert!(shell.is_quiescent());
}
