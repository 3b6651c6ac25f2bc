//! Suspense boundary: placeholder until a load handle settles.
//!
//! Phases move `Pending -> Resolved` or `Pending -> Failed` and never back.
//! A resolved component is rendered once; later renders reuse that subtree.

use tokio::sync::watch;

use babybaby_types::{Node, PlaceholderSpec, SectionId};

use crate::component::Component;
use crate::error::LoadError;
use crate::registry::{LoadHandle, LoadStatus};

/// What a boundary shows right now. Exactly one of the two, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryView {
    Placeholder(PlaceholderSpec),
    Content(Node),
}

impl BoundaryView {
    #[must_use]
    pub fn into_node(self) -> Node {
        match self {
            BoundaryView::Placeholder(spec) => Node::Placeholder(spec),
            BoundaryView::Content(node) => node,
        }
    }
}

enum Phase {
    Pending,
    Resolved { component: Component, node: Node },
    Failed(LoadError),
}

pub struct SuspenseBoundary {
    handle: LoadHandle,
    placeholder: PlaceholderSpec,
    status_rx: watch::Receiver<LoadStatus>,
    phase: Phase,
}

impl SuspenseBoundary {
    #[must_use]
    pub fn new(handle: LoadHandle, placeholder: PlaceholderSpec) -> Self {
        let status_rx = handle.subscribe();
        Self {
            handle,
            placeholder,
            status_rx,
            phase: Phase::Pending,
        }
    }

    #[must_use]
    pub fn section(&self) -> &SectionId {
        self.handle.section()
    }

    #[must_use]
    pub fn placeholder(&self) -> PlaceholderSpec {
        self.placeholder
    }

    /// Render the current view.
    ///
    /// Requests activation of the handle (a no-op after the first request).
    /// Failures other than setup failures are returned for the caller's
    /// error boundary; setup failures keep the placeholder.
    pub fn render(&mut self) -> Result<BoundaryView, LoadError> {
        self.handle.activate();
        self.sync();
        match &self.phase {
            Phase::Pending => Ok(BoundaryView::Placeholder(self.placeholder)),
            Phase::Resolved { node, .. } => Ok(BoundaryView::Content(node.clone())),
            Phase::Failed(err) if err.is_setup() => Ok(BoundaryView::Placeholder(self.placeholder)),
            Phase::Failed(err) => Err(err.clone()),
        }
    }

    /// Activate the handle and wait until it reaches a terminal state.
    pub async fn settled(&mut self) {
        self.handle.activate();
        if matches!(self.phase, Phase::Pending) {
            // The sender lives in the handle we own, so this only errors if
            // the handle is gone, in which case there is nothing to wait for.
            let _ = self.status_rx.wait_for(LoadStatus::is_terminal).await;
        }
        self.sync();
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Pending)
    }

    #[must_use]
    pub fn component(&self) -> Option<&Component> {
        match &self.phase {
            Phase::Resolved { component, .. } => Some(component),
            Phase::Pending | Phase::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&LoadError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            Phase::Pending | Phase::Resolved { .. } => None,
        }
    }

    fn sync(&mut self) {
        if !matches!(self.phase, Phase::Pending) {
            return;
        }
        let status = self.status_rx.borrow_and_update().clone();
        match status {
            LoadStatus::Inactive | LoadStatus::Pending => {}
            LoadStatus::Resolved(component) => {
                let node = component.render();
                tracing::debug!(section = %self.handle.section(), "Boundary resolved");
                self.phase = Phase::Resolved { component, node };
            }
            LoadStatus::Failed(err) => {
                if err.is_setup() {
                    tracing::warn!(
                        section = %self.handle.section(),
                        error = %err,
                        "Section stays on its placeholder"
                    );
                }
                self.phase = Phase::Failed(err);
            }
        }
    }
}
