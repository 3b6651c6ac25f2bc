//! Resolved configuration types shared across crates.
//!
//! These types represent fully-validated, resolved configuration state.
//! Raw deserialization structs stay private; validation happens at the
//! deserialization boundary via `#[serde(try_from)]`, so the existence of a
//! value is the proof of its validity.

use std::time::Duration;

use serde::Deserialize;

use crate::{Tier, TierTable};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleSettingsError {
    #[error(
        "base delay for {later} ({later_ms}ms) is below the base delay for {earlier} ({earlier_ms}ms)"
    )]
    BasesOutOfOrder {
        earlier: Tier,
        earlier_ms: u64,
        later: Tier,
        later_ms: u64,
    },
}

#[derive(Deserialize)]
struct RawScheduleSettings {
    #[serde(default = "default_base_ms")]
    base_ms: TierTable<u64>,
    #[serde(default = "default_step_ms")]
    step_ms: u64,
}

const fn default_base_ms() -> TierTable<u64> {
    TierTable::new(0, 300, 600, 900)
}

const fn default_step_ms() -> u64 {
    100
}

/// Waterfall configuration: per-tier base delay and within-tier step.
///
/// Invariant: base delays are non-decreasing from `Critical` to
/// `LowPriority`, so a lower-priority tier never starts before a
/// higher-priority one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawScheduleSettings")]
pub struct ScheduleSettings {
    base_ms: TierTable<u64>,
    step_ms: u64,
}

impl TryFrom<RawScheduleSettings> for ScheduleSettings {
    type Error = ScheduleSettingsError;

    fn try_from(raw: RawScheduleSettings) -> Result<Self, Self::Error> {
        Self::new(raw.base_ms, raw.step_ms)
    }
}

impl ScheduleSettings {
    pub fn new(base_ms: TierTable<u64>, step_ms: u64) -> Result<Self, ScheduleSettingsError> {
        for pair in Tier::ALL.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            if base_ms[later] < base_ms[earlier] {
                return Err(ScheduleSettingsError::BasesOutOfOrder {
                    earlier,
                    earlier_ms: base_ms[earlier],
                    later,
                    later_ms: base_ms[later],
                });
            }
        }
        Ok(Self { base_ms, step_ms })
    }

    #[must_use]
    pub fn base(&self, tier: Tier) -> Duration {
        Duration::from_millis(self.base_ms[tier])
    }

    #[must_use]
    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Activation delay of the `index`-th section (0-based) within `tier`.
    #[must_use]
    pub fn delay_for(&self, tier: Tier, index: usize) -> Duration {
        let offset = self.step_ms.saturating_mul(index as u64);
        Duration::from_millis(self.base_ms[tier].saturating_add(offset))
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            base_ms: default_base_ms(),
            step_ms: default_step_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportSettingsError {
    #[error("root margin must be a finite, non-negative pixel value (got {0})")]
    InvalidRootMargin(f32),
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

#[derive(Deserialize)]
struct RawViewportSettings {
    #[serde(default = "default_root_margin_px")]
    root_margin_px: f32,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
}

const fn default_root_margin_px() -> f32 {
    100.0
}

const fn default_poll_interval_ms() -> u64 {
    100
}

/// Visibility observation settings.
///
/// `root_margin_px` widens the viewport so sections count as visible shortly
/// before they scroll in. `poll_interval` only applies to the geometry
/// polling fallback.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawViewportSettings")]
pub struct ViewportSettings {
    root_margin_px: f32,
    poll_interval: Duration,
}

impl TryFrom<RawViewportSettings> for ViewportSettings {
    type Error = ViewportSettingsError;

    fn try_from(raw: RawViewportSettings) -> Result<Self, Self::Error> {
        Self::new(raw.root_margin_px, Duration::from_millis(raw.poll_interval_ms))
    }
}

impl ViewportSettings {
    pub fn new(
        root_margin_px: f32,
        poll_interval: Duration,
    ) -> Result<Self, ViewportSettingsError> {
        if !root_margin_px.is_finite() || root_margin_px < 0.0 {
            return Err(ViewportSettingsError::InvalidRootMargin(root_margin_px));
        }
        if poll_interval.is_zero() {
            return Err(ViewportSettingsError::ZeroPollInterval);
        }
        Ok(Self {
            root_margin_px,
            poll_interval,
        })
    }

    #[must_use]
    pub fn root_margin_px(&self) -> f32 {
        self.root_margin_px
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            root_margin_px: default_root_margin_px(),
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
        }
    }
}

/// What a failed section shows once its error boundary catches the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureFallback {
    /// The section collapses to nothing.
    #[default]
    Collapse,
    /// The placeholder stays in place.
    KeepPlaceholder,
}

/// Everything a page shell needs to know, resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShellSettings {
    pub schedule: ScheduleSettings,
    pub viewport: ViewportSettings,
    pub on_failure: FailureFallback,
}
