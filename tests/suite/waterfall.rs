//! Activation timing of a mounted page under paused time.

use std::time::Duration;

use babybaby_engine::{PageShell, ShellContext};
use babybaby_types::{ScheduleSettings, ShellSettings, Tier, TierTable};

use crate::common::{InvocationLog, logged_section};

fn settings(bases: [u64; 4], step_ms: u64) -> ShellSettings {
    ShellSettings {
        schedule: ScheduleSettings::new(
            TierTable::new(bases[0], bases[1], bases[2], bases[3]),
            step_ms,
        )
        .unwrap(),
        ..ShellSettings::default()
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[tokio::test(start_paused = true)]
async fn two_critical_three_tertiary_follow_the_waterfall() {
    let log = InvocationLog::new();
    let ctx = ShellContext::without_intersection(settings([0, 300, 600, 900], 100));
    let shell = PageShell::mount(
        &ctx,
        vec![
            logged_section("articles", Tier::Tertiary, ms(10), &log),
            logged_section("hero", Tier::Critical, ms(10), &log),
            logged_section("podcasts", Tier::Tertiary, ms(10), &log),
            logged_section("nav", Tier::Critical, ms(10), &log),
            logged_section("testimonials", Tier::Tertiary, ms(10), &log),
        ],
    )
    .unwrap();

    let delays: Vec<(String, Duration)> = shell
        .schedule()
        .into_iter()
        .map(|(id, delay)| (id.as_str().to_string(), delay))
        .collect();
    assert_eq!(
        delays,
        vec![
            ("hero".to_string(), ms(0)),
            ("nav".to_string(), ms(100)),
            ("articles".to_string(), ms(600)),
            ("podcasts".to_string(), ms(700)),
            ("testimonials".to_string(), ms(800)),
        ]
    );

    // Zero delay: invoked during mount.
    assert_eq!(log.invoked_at("hero"), Some(ms(0)));
    assert_eq!(shell.live_timers(), 4);

    tokio::time::sleep(ms(1000)).await;
    assert_eq!(
        log.entries(),
        vec![
            ("hero".to_string(), ms(0)),
            ("nav".to_string(), ms(100)),
            ("articles".to_string(), ms(600)),
            ("podcasts".to_string(), ms(700)),
            ("testimonials".to_string(), ms(800)),
        ]
    );
    assert_eq!(shell.live_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn tier_start_times_never_decrease() {
    let log = InvocationLog::new();
    let ctx = ShellContext::without_intersection(settings([0, 150, 150, 400], 120));
    let _shell = PageShell::mount(
        &ctx,
        vec![
            logged_section("footer", Tier::LowPriority, ms(5), &log),
            logged_section("quiz", Tier::Tertiary, ms(5), &log),
            logged_section("growth", Tier::Secondary, ms(5), &log),
            logged_section("forum", Tier::Tertiary, ms(5), &log),
            logged_section("hero", Tier::Critical, ms(5), &log),
            logged_section("vaccines", Tier::Secondary, ms(5), &log),
        ],
    )
    .unwrap();

    tokio::time::sleep(ms(2000)).await;
    let at = |name: &str| log.invoked_at(name).unwrap();

    let critical = at("hero");
    let secondary = at("growth").min(at("vaccines"));
    let tertiary = at("quiz").min(at("forum"));
    let low = at("footer");
    assert!(critical <= secondary && secondary <= tertiary && tertiary <= low);

    // Within a tier, activation follows declaration order.
    assert!(at("growth") < at("vaccines"));
    assert!(at("quiz") < at("forum"));
    assert_eq!(log.count(), 6);
}

#[tokio::test(start_paused = true)]
async fn empty_tiers_do_not_delay_later_tiers() {
    let log = InvocationLog::new();
    let ctx = ShellContext::without_intersection(settings([0, 300, 600, 900], 100));
    let _shell = PageShell::mount(
        &ctx,
        vec![
            logged_section("newsletter", Tier::LowPriority, ms(0), &log),
            logged_section("footer", Tier::LowPriority, ms(0), &log),
        ],
    )
    .unwrap();

    tokio::time::sleep(ms(1500)).await;
    assert_eq!(log.invoked_at("newsletter"), Some(ms(900)));
    assert_eq!(log.invoked_at("footer"), Some(ms(1000)));
}
