//! Core domain types for BabyBaby page hydration.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! The engine, the config loader and the CLI all speak in these types.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod geometry;
mod ids;
mod node;
mod settings;
mod tier;
mod visibility;

pub use geometry::Rect;
pub use ids::{ElementId, SectionId, SectionIdError};
pub use node::{Node, PlaceholderSpec, PulseStyle};
pub use settings::{
    FailureFallback, ScheduleSettings, ScheduleSettingsError, ShellSettings, ViewportSettings,
    ViewportSettingsError,
};
pub use tier::{Tier, TierTable};
pub use visibility::VisibilityState;
