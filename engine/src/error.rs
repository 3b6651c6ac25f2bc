use thiserror::Error;

use babybaby_types::SectionId;

/// Terminal failure of a section's load handle.
///
/// Failures are local to one section; nothing here takes down siblings or
/// the page shell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("section '{section}' failed to load: {reason}")]
    Rejected { section: SectionId, reason: String },
    #[error("section '{section}' factory panicked")]
    Panicked { section: SectionId },
    #[error("section '{section}' could not be scheduled: {reason}")]
    Setup { section: SectionId, reason: String },
    #[error("section '{section}' was torn down before it loaded")]
    Abandoned { section: SectionId },
}

impl LoadError {
    #[must_use]
    pub fn section(&self) -> &SectionId {
        match self {
            LoadError::Rejected { section, .. }
            | LoadError::Panicked { section }
            | LoadError::Setup { section, .. }
            | LoadError::Abandoned { section } => section,
        }
    }

    /// Setup failures keep the section on its placeholder instead of
    /// reaching an error boundary.
    #[must_use]
    pub fn is_setup(&self) -> bool {
        matches!(self, LoadError::Setup { .. })
    }
}

/// Failure reported by an intersection host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserveError {
    /// The host has no intersection capability at all.
    #[error("visibility observation is not supported by this host")]
    Unsupported,
    #[error("failed to set up visibility observation: {0}")]
    Setup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("section id '{0}' is registered more than once")]
    DuplicateSection(SectionId),
}
