//! Simulated reader scrolling down the landing page.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use babybaby_engine::GeometryHost;
use babybaby_types::{ElementId, Rect};

const SCROLL_TICK: Duration = Duration::from_millis(16);

pub struct ScrollingPage {
    viewport_width: f32,
    viewport_height: f32,
    scroll_y: Mutex<f32>,
    elements: HashMap<ElementId, Rect>,
}

impl ScrollingPage {
    pub fn new(viewport_width: f32, viewport_height: f32, layout: Vec<(ElementId, Rect)>) -> Self {
        Self {
            viewport_width,
            viewport_height,
            scroll_y: Mutex::new(0.0),
            elements: layout.into_iter().collect(),
        }
    }

    fn max_scroll(&self) -> f32 {
        let page_height = self
            .elements
            .values()
            .map(Rect::bottom)
            .fold(0.0_f32, f32::max);
        (page_height - self.viewport_height).max(0.0)
    }

    /// Scroll to the bottom at `pixels_per_second`.
    pub async fn scroll_to_bottom(&self, pixels_per_second: f32) {
        let step = pixels_per_second * SCROLL_TICK.as_secs_f32();
        let max = self.max_scroll();
        let mut ticks = tokio::time::interval(SCROLL_TICK);
        loop {
            ticks.tick().await;
            let mut scroll_y = self.scroll_y.lock().unwrap_or_else(PoisonError::into_inner);
            *scroll_y = (*scroll_y + step).min(max);
            if *scroll_y >= max {
                tracing::debug!(scroll_y = *scroll_y, "Reader reached the bottom");
                return;
            }
        }
    }
}

impl GeometryHost for ScrollingPage {
    fn viewport(&self) -> Rect {
        let scroll_y = *self.scroll_y.lock().unwrap_or_else(PoisonError::into_inner);
        Rect::new(0.0, scroll_y, self.viewport_width, self.viewport_height)
    }

    fn bounding_box(&self, element: ElementId) -> Option<Rect> {
        self.elements.get(&element).copied()
    }
}
