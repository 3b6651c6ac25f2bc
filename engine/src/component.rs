//! Component and factory seams.
//!
//! The engine never knows what a section renders. Components are opaque
//! renderers; factories are opaque async producers supplied by the page.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use babybaby_types::Node;

/// A loaded section component.
pub trait Render: Send + Sync {
    /// Produce the section's subtree. Called once per mount.
    fn render(&self) -> Node;

    /// Start expensive follow-up work (animation loops, media decoding).
    ///
    /// Called at most once, after the section has resolved and, for gated
    /// sections, after it became visible.
    fn start_heavy_work(&self) {}
}

pub type Component = Arc<dyn Render>;

/// Future returned by a [`ComponentFactory`]. Rejection is an opaque error.
pub type ComponentFuture = BoxFuture<'static, anyhow::Result<Component>>;

/// Asynchronous producer of a section component.
///
/// Implemented for any `Fn() -> impl Future<Output = anyhow::Result<Component>>`.
pub trait ComponentFactory: Send + Sync {
    fn load(&self) -> ComponentFuture;
}

impl<F, Fut> ComponentFactory for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Component>> + Send + 'static,
{
    fn load(&self) -> ComponentFuture {
        (self)().boxed()
    }
}

/// Component that renders a fixed subtree. Handy for static sections.
#[derive(Debug, Clone)]
pub struct StaticComponent(Node);

impl StaticComponent {
    #[must_use]
    pub fn new(node: Node) -> Self {
        Self(node)
    }

    #[must_use]
    pub fn into_component(self) -> Component {
        Arc::new(self)
    }
}

impl Render for StaticComponent {
    fn render(&self) -> Node {
        self.0.clone()
    }
}
