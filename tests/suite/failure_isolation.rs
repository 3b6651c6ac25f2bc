//! One failing section never takes down its siblings.

use std::sync::Arc;
use std::time::Duration;

use babybaby_engine::{
    Component, LoadError, PageFrame, PageShell, SectionDescriptor, SectionState, ShellContext,
    StaticComponent,
};
use babybaby_types::{FailureFallback, Node, PlaceholderSpec, ShellSettings, Tier};

use crate::common::{failing_section, id, section};

const FRAME: Duration = Duration::from_millis(16);

fn failed(frame: &PageFrame, name: &str) -> bool {
    frame
        .section(name)
        .is_some_and(|s| matches!(s.state, SectionState::Failed(_)))
}

#[tokio::test(start_paused = true)]
async fn rejection_surfaces_within_a_frame_and_sibling_still_renders() {
    let ctx = ShellContext::without_intersection(ShellSettings::default());
    let mut shell = PageShell::mount(
        &ctx,
        vec![
            failing_section("ebooks", Tier::Critical, Duration::from_millis(50)),
            section("hero", Tier::Critical, Duration::from_millis(30)),
        ],
    )
    .unwrap();
    assert!(!failed(&shell.render(), "ebooks"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let frame = tokio::time::timeout(FRAME, async {
        loop {
            let frame = shell.render();
            if failed(&frame, "ebooks") {
                return frame;
            }
            shell.changed().await;
        }
    })
    .await
    .expect("failure should surface within one frame");

    let ebooks = frame.section("ebooks").unwrap();
    assert_eq!(
        ebooks.state,
        SectionState::Failed(LoadError::Rejected {
            section: id("ebooks"),
            reason: "ebooks chunk failed to load".to_string(),
        })
    );
    assert_eq!(ebooks.node, Node::Empty);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let frame = shell.render();
    let hero = frame.section("hero").unwrap();
    assert!(matches!(hero.state, SectionState::Ready { .. }));
    assert!(hero.node.to_text().contains("hero"));
    assert!(failed(&frame, "ebooks"));
}

#[tokio::test(start_paused = true)]
async fn panicking_factory_is_contained() {
    let settings = ShellSettings {
        on_failure: FailureFallback::KeepPlaceholder,
        ..ShellSettings::default()
    };
    let ctx = ShellContext::without_intersection(settings);
    let panicking = SectionDescriptor::new(
        id("quiz"),
        Tier::Secondary,
        Arc::new(|| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if true {
                panic!("quiz bundle is corrupt");
            }
            Ok::<Component, anyhow::Error>(StaticComponent::new(Node::Empty).into_component())
        }),
    )
    .with_placeholder(PlaceholderSpec::new(260));
    let mut shell = PageShell::mount(
        &ctx,
        vec![panicking, section("tools", Tier::Secondary, Duration::from_millis(5))],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    let frame = shell.render();
    let quiz = frame.section("quiz").unwrap();
    assert_eq!(
        quiz.state,
        SectionState::Failed(LoadError::Panicked { section: id("quiz") })
    );
    assert_eq!(quiz.node, Node::Placeholder(PlaceholderSpec::new(260)));
    assert!(matches!(
        frame.section("tools").unwrap().state,
        SectionState::Ready { .. }
    ));
    assert!(frame.is_settled());
}

#[tokio::test(start_paused = true)]
async fn failed_section_is_not_retried() {
    let ctx = ShellContext::without_intersection(ShellSettings::default());
    let mut shell = PageShell::mount(
        &ctx,
        vec![failing_section("forum", Tier::Tertiary, Duration::ZERO)],
    )
    .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    for _ in 0..3 {
        assert!(failed(&shell.render(), "forum"));
    }
    assert_eq!(shell.live_timers(), 0);
}
