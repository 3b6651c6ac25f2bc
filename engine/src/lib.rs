//! Staged hydration engine for the BabyBaby landing page.
//!
//! This crate decides when each page section loads and when it may start
//! expensive work. It knows nothing about what the sections render.
//!
//! - [`LoaderRegistry`] memoizes component factories behind delayed
//!   activation timers.
//! - [`SuspenseBoundary`] shows a placeholder until a handle settles.
//! - [`PriorityScheduler`] turns tiers into an activation waterfall.
//! - [`ViewportGate`] opens once when an element first becomes visible.
//! - [`PageShell`] wires them together and owns teardown.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod boundary;
mod component;
mod error;
mod registry;
mod scheduler;
mod shell;
mod timers;
mod viewport;

pub use babybaby_types as types;

// ============================================================================
// Loading
// ============================================================================

pub use component::{Component, ComponentFactory, ComponentFuture, Render, StaticComponent};
pub use error::{LoadError, ObserveError, ScheduleError};
pub use registry::{LoadHandle, LoadStatus, LoaderRegistry};

// ============================================================================
// Rendering and scheduling
// ============================================================================

pub use boundary::{BoundaryView, SuspenseBoundary};
pub use scheduler::{
    HeavyWorkPolicy, PlannedSection, PriorityScheduler, ScheduledSection, SectionDescriptor,
};

// ============================================================================
// Visibility
// ============================================================================

pub use viewport::{
    GatePhase, GeometryHost, IntersectionCallback, IntersectionEntry, IntersectionHost,
    NoIntersection, ObservationId, PollingIntersection, ViewportGate,
};

// ============================================================================
// Page shell
// ============================================================================

pub use shell::{PageFrame, PageShell, SectionFrame, SectionState, ShellContext, TeardownReport};
