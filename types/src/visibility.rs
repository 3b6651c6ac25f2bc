use crate::ElementId;

/// Snapshot of a viewport gate.
///
/// `has_fired_once` makes the gate sticky: once visible, a section stays
/// visible even if it later scrolls out of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityState {
    pub element: ElementId,
    pub is_visible: bool,
    pub has_fired_once: bool,
}

impl VisibilityState {
    #[must_use]
    pub const fn hidden(element: ElementId) -> Self {
        Self {
            element,
            is_visible: false,
            has_fired_once: false,
        }
    }

    #[must_use]
    pub const fn fired(element: ElementId) -> Self {
        Self {
            element,
            is_visible: true,
            has_fired_once: true,
        }
    }
}
