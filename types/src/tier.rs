//! Priority tiers controlling the activation waterfall.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Coarse priority bucket of a page section.
///
/// Declaration order is priority order: `Critical < Secondary < Tertiary < LowPriority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Critical,
    Secondary,
    Tertiary,
    LowPriority,
}

impl Tier {
    /// All tiers, highest priority first.
    pub const ALL: [Tier; 4] = [
        Tier::Critical,
        Tier::Secondary,
        Tier::Tertiary,
        Tier::LowPriority,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Tier::Critical => 0,
            Tier::Secondary => 1,
            Tier::Tertiary => 2,
            Tier::LowPriority => 3,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Secondary => "secondary",
            Tier::Tertiary => "tertiary",
            Tier::LowPriority => "low_priority",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One value per tier, indexable by [`Tier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierTable<T> {
    pub critical: T,
    pub secondary: T,
    pub tertiary: T,
    pub low_priority: T,
}

impl<T> TierTable<T> {
    pub const fn new(critical: T, secondary: T, tertiary: T, low_priority: T) -> Self {
        Self {
            critical,
            secondary,
            tertiary,
            low_priority,
        }
    }

    /// Values in tier priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &T)> {
        Tier::ALL.into_iter().map(move |tier| (tier, &self[tier]))
    }
}

impl<T> Index<Tier> for TierTable<T> {
    type Output = T;

    fn index(&self, tier: Tier) -> &T {
        match tier {
            Tier::Critical => &self.critical,
            Tier::Secondary => &self.secondary,
            Tier::Tertiary => &self.tertiary,
            Tier::LowPriority => &self.low_priority,
        }
    }
}

impl<T> IndexMut<Tier> for TierTable<T> {
    fn index_mut(&mut self, tier: Tier) -> &mut T {
        match tier {
            Tier::Critical => &mut self.critical,
            Tier::Secondary => &mut self.secondary,
            Tier::Tertiary => &mut self.tertiary,
            Tier::LowPriority => &mut self.low_priority,
        }
    }
}
