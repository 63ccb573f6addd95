//! Overlay surface: page view state and element interaction.
//!
//! The surface presents each stored element as an independently draggable,
//! independently resizable region aligned 1:1 with the rendered page
//! raster. It owns three pieces of state the store must not see:
//!
//! - the page view (loading / ready / failed) and its render generation,
//!   used to discard stale async render results after navigation;
//! - the in-flight drag or resize gesture, whose continuous updates stay
//!   local until release so the store only ever sees settled values;
//! - the display-only font size derived from an element's box, recomputed
//!   every render and never persisted.

use crate::elements::{ElementId, MAX_DIMENSION, MIN_DIMENSION};
use crate::geometry::{PageMetrics, Point, Size};
use crate::store::ElementStore;

/// Smallest font size used for text elements, in screen pixels.
pub const MIN_FONT_SIZE: f64 = 12.0;

/// Largest font size used for text elements, in screen pixels.
pub const MAX_FONT_SIZE: f64 = 72.0;

/// Box edge at or below which text renders at [`MIN_FONT_SIZE`].
pub const FONT_BASE_MIN: f64 = 40.0;

/// Box edge at or above which text renders at [`MAX_FONT_SIZE`].
pub const FONT_BASE_MAX: f64 = 300.0;

/// Derive the display font size for a text element from its box.
///
/// `base` is the smaller box dimension; the result interpolates linearly
/// between the font bounds so legibility tracks box size without storing
/// a separate font-size field. Recomputing from `size` on every render
/// keeps the element self-consistent after any resize, including ones
/// made by other code paths.
pub fn font_size_for_box(size: Size) -> f64 {
    let base = size.width.min(size.height);
    if base <= FONT_BASE_MIN {
        MIN_FONT_SIZE
    } else if base >= FONT_BASE_MAX {
        MAX_FONT_SIZE
    } else {
        MIN_FONT_SIZE
            + (base - FONT_BASE_MIN) / (FONT_BASE_MAX - FONT_BASE_MIN)
                * (MAX_FONT_SIZE - MIN_FONT_SIZE)
    }
}

/// Explicit configuration for the overlay's rendering engine.
///
/// Passed into the surface at construction instead of being read from
/// process-wide state, so two surfaces can use different engines and
/// tests can run without any ambient setup.
#[derive(Debug, Clone, Default)]
pub struct OverlayConfig {
    /// Endpoint of the page-rendering worker, if the engine needs one
    pub renderer_endpoint: Option<String>,
}

/// Token tying an async page-render request to the navigation state that
/// issued it.
///
/// A result arriving with a token minted before the latest navigation or
/// unmount is stale and must be discarded; applying it would paint the
/// wrong page under the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderToken(u64);

/// Current state of the page view under the overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView {
    /// Fetch or render in flight; show an empty state, never a stale page
    Loading,
    /// Page raster ready at the given metrics
    Ready(PageMetrics),
    /// Render failed; no overlay is shown
    Failed(String),
}

#[derive(Debug)]
struct DragState {
    id: ElementId,
    size: Size,
    local_position: Point,
}

#[derive(Debug)]
struct ResizeState {
    id: ElementId,
    local_size: Size,
}

/// Interactive surface layering store elements above a rendered page.
#[derive(Debug)]
pub struct OverlaySurface {
    config: OverlayConfig,
    page_count: usize,
    page_index: usize,
    generation: u64,
    view: PageView,
    drag: Option<DragState>,
    resize: Option<ResizeState>,
}

impl OverlaySurface {
    /// Create a surface for a document with `page_count` pages, positioned
    /// on page 1 with a render pending.
    pub fn new(config: OverlayConfig, page_count: usize) -> Self {
        Self {
            config,
            page_count: page_count.max(1),
            page_index: 1,
            generation: 0,
            view: PageView::Loading,
            drag: None,
            resize: None,
        }
    }

    /// Rendering-engine configuration, consumed when issuing a page
    /// render request.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Current 1-based page index.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Total number of pages in the source document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Current page view state.
    pub fn view(&self) -> &PageView {
        &self.view
    }

    /// Metrics of the ready page, if any.
    pub fn metrics(&self) -> Option<PageMetrics> {
        match self.view {
            PageView::Ready(m) => Some(m),
            _ => None,
        }
    }

    /// Token expected by the next render completion.
    pub fn render_token(&self) -> RenderToken {
        RenderToken(self.generation)
    }

    /// Navigate to a page, clamped to `[1, page_count]`.
    ///
    /// Re-rendering the page raster does not touch the element store;
    /// elements are not scoped per page. Returns the token the new render
    /// must complete with.
    pub fn go_to_page(&mut self, index: usize) -> RenderToken {
        self.page_index = index.clamp(1, self.page_count);
        self.invalidate();
        log::debug!("navigating to page {}/{}", self.page_index, self.page_count);
        self.render_token()
    }

    /// Navigate to the next page, saturating at the last page.
    pub fn next_page(&mut self) -> RenderToken {
        self.go_to_page(self.page_index.saturating_add(1))
    }

    /// Navigate to the previous page, saturating at page 1.
    pub fn prev_page(&mut self) -> RenderToken {
        self.go_to_page(self.page_index.saturating_sub(1).max(1))
    }

    /// Deliver a completed page render.
    ///
    /// Returns `false` and leaves the view untouched when the token is
    /// stale (a navigation or unmount happened while the render was in
    /// flight).
    pub fn complete_render(&mut self, token: RenderToken, metrics: PageMetrics) -> bool {
        if token != self.render_token() {
            log::debug!("discarding stale page render (token {:?})", token);
            return false;
        }
        self.view = PageView::Ready(metrics);
        true
    }

    /// Deliver a failed page render. Stale failures are discarded too.
    pub fn fail_render(&mut self, token: RenderToken, reason: impl Into<String>) -> bool {
        if token != self.render_token() {
            return false;
        }
        let reason = reason.into();
        log::warn!("page render failed: {}", reason);
        self.view = PageView::Failed(reason);
        true
    }

    /// Tear the surface down, invalidating any in-flight render and
    /// abandoning any active gesture without committing it.
    pub fn unmount(&mut self) {
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.view = PageView::Loading;
        self.drag = None;
        self.resize = None;
    }

    // --- drag gesture -----------------------------------------------------

    /// Begin dragging an element. Requires a ready page; the element's
    /// size is needed to keep the whole box inside the render area.
    pub fn begin_drag(&mut self, id: ElementId, position: Point, size: Size) -> bool {
        if self.metrics().is_none() || self.resize.is_some() {
            return false;
        }
        self.drag = Some(DragState {
            id,
            size,
            local_position: position,
        });
        true
    }

    /// Continuous drag update. Only local visual state changes; the store
    /// is untouched until [`release_drag`](Self::release_drag).
    pub fn drag_to(&mut self, position: Point) -> bool {
        let Some(metrics) = self.metrics() else {
            return false;
        };
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        drag.local_position = clamp_to_bounds(position, drag.size, metrics);
        true
    }

    /// Position the dragged element is currently shown at.
    pub fn drag_position(&self) -> Option<Point> {
        self.drag.as_ref().map(|d| d.local_position)
    }

    /// End the drag, committing the settled position to the store as a
    /// single mutation.
    pub fn release_drag(&mut self, store: &mut ElementStore) -> bool {
        match self.drag.take() {
            Some(drag) => store.update_position(drag.id, drag.local_position),
            None => false,
        }
    }

    // --- resize gesture ---------------------------------------------------

    /// Begin resizing an element.
    pub fn begin_resize(&mut self, id: ElementId, size: Size) -> bool {
        if self.metrics().is_none() || self.drag.is_some() {
            return false;
        }
        self.resize = Some(ResizeState {
            id,
            local_size: size,
        });
        true
    }

    /// Continuous resize update, clamped to the allowed dimension range.
    pub fn resize_to(&mut self, size: Size) -> bool {
        let Some(resize) = self.resize.as_mut() else {
            return false;
        };
        resize.local_size = size.clamp(MIN_DIMENSION, MAX_DIMENSION);
        true
    }

    /// Size the resized element is currently shown at.
    pub fn resize_size(&self) -> Option<Size> {
        self.resize.as_ref().map(|r| r.local_size)
    }

    /// End the resize, committing the settled size to the store as a
    /// single mutation.
    pub fn release_resize(&mut self, store: &mut ElementStore) -> bool {
        match self.resize.take() {
            Some(resize) => store.update_size(resize.id, resize.local_size),
            None => false,
        }
    }
}

/// Keep an element's box fully inside the rendered page area.
fn clamp_to_bounds(position: Point, size: Size, metrics: PageMetrics) -> Point {
    let rendered = metrics.rendered_size();
    Point {
        x: position.x.clamp(0.0, (rendered.width - size.width).max(0.0)),
        y: position.y.clamp(0.0, (rendered.height - size.height).max(0.0)),
    }
}
