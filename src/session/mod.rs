//! One signer's editing session over one document.
//!
//! [`SigningSession`] is the top-level facade: it fetches the source
//! document through a [`DocumentSource`], owns the element store and the
//! overlay surface, and drives export through the compositor. Transport
//! concerns stay behind the [`DocumentSource`] and [`OutputSink`] traits
//! so the session logic is testable with in-memory doubles.
//!
//! Failures split into two classes. Session-fatal errors (document not
//! found, signer not authorized) abort [`SigningSession::open`] and no
//! session exists. Everything after open is per-operation: a failed
//! export leaves the element store untouched, so the signer's work
//! survives and the export can be retried.

use serde::Serialize;

use crate::compositor::{ComposedDocument, Compositor, CompositionWarning};
use crate::elements::{AnnotationElement, ElementContent, ElementId, ElementKind};
use crate::error::Result;
use crate::geometry::{Point, Size};
use crate::overlay::{font_size_for_box, OverlayConfig, OverlaySurface};
use crate::pdf::PdfFile;
use crate::signature::CapturedSignature;
use crate::store::ElementStore;

/// Identity of the session: which document, and which signer.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Opaque identifier of the document being signed
    pub document_id: String,
    /// Display label of the signer, stamped onto every element they add
    pub signer_label: String,
}

/// A source document ready for annotation.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Complete PDF bytes
    pub bytes: Vec<u8>,
    /// Number of pages, used to bound overlay navigation
    pub page_count: usize,
    /// Per-page heights in PDF points, in page order
    pub page_heights: Vec<f64>,
}

impl FetchedDocument {
    /// Wrap raw PDF bytes, deriving the page count and per-page heights
    /// from the page tree's MediaBoxes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let file = PdfFile::load(&bytes)?;
        let pages = file.pages()?;
        let page_heights = pages
            .iter()
            .map(|&page| file.page_size(page).map(|(_, h)| h))
            .collect::<Result<Vec<f64>>>()?;
        Ok(Self {
            bytes,
            page_count: pages.len(),
            page_heights,
        })
    }
}

/// Where source documents come from.
///
/// Implementations map lookup and authorization failures to
/// [`Error::DocumentNotFound`](crate::error::Error::DocumentNotFound) and
/// [`Error::Unauthorized`](crate::error::Error::Unauthorized); both are
/// fatal to the session.
pub trait DocumentSource {
    /// Fetch the document named by the context, checking that the signer
    /// may open it.
    fn fetch(&self, context: &SessionContext) -> Result<FetchedDocument>;
}

/// Where finished documents go.
pub trait OutputSink {
    /// Deliver a composed document.
    fn submit(&mut self, context: &SessionContext, document: &[u8]) -> Result<()>;
}

/// Serializable per-element summary for display panels.
#[derive(Debug, Clone, Serialize)]
pub struct ElementSummary {
    /// Element identifier
    pub id: ElementId,
    /// Text or image
    pub kind: ElementKind,
    /// Top-left corner in screen pixels
    pub position: Point,
    /// Extent in screen pixels
    pub size: Size,
    /// Signer the element belongs to
    pub assigned_signer: String,
    /// Display font size derived from the box; text elements only
    pub font_size: Option<f64>,
}

impl ElementSummary {
    fn from_element(element: &AnnotationElement) -> Self {
        let kind = element.kind();
        Self {
            id: element.id,
            kind,
            position: element.position,
            size: element.size,
            assigned_signer: element.assigned_signer.clone(),
            font_size: (kind == ElementKind::Text).then(|| font_size_for_box(element.size)),
        }
    }
}

/// A live editing session for one signer on one document.
#[derive(Debug)]
pub struct SigningSession {
    context: SessionContext,
    document: FetchedDocument,
    store: ElementStore,
    surface: OverlaySurface,
}

impl SigningSession {
    /// Open a session, fetching the document through `source`.
    pub fn open(
        source: &dyn DocumentSource,
        context: SessionContext,
        config: OverlayConfig,
    ) -> Result<Self> {
        let document = source.fetch(&context)?;
        log::info!(
            "opened document {} ({} pages) for signer {}",
            context.document_id,
            document.page_count,
            context.signer_label
        );
        let surface = OverlaySurface::new(config, document.page_count);
        Ok(Self {
            context,
            document,
            store: ElementStore::new(),
            surface,
        })
    }

    /// The session's identity.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The source document.
    pub fn document(&self) -> &FetchedDocument {
        &self.document
    }

    /// The overlay surface, for navigation and render delivery.
    pub fn surface(&self) -> &OverlaySurface {
        &self.surface
    }

    /// Mutable overlay surface.
    pub fn surface_mut(&mut self) -> &mut OverlaySurface {
        &mut self.surface
    }

    // --- element operations -----------------------------------------------

    /// Add a text element, stamped with this session's signer.
    ///
    /// Empty or whitespace-only text is rejected before anything is
    /// stored.
    pub fn add_text(
        &mut self,
        text: impl Into<String>,
        position: Option<Point>,
        size: Option<Size>,
    ) -> Result<ElementId> {
        let content = ElementContent::text(text)?;
        Ok(self
            .store
            .create(content, position, size, self.context.signer_label.clone()))
    }

    /// Add a captured signature image, stamped with this session's signer.
    pub fn add_signature(
        &mut self,
        signature: CapturedSignature,
        position: Option<Point>,
        size: Option<Size>,
    ) -> Result<ElementId> {
        let content = signature.into_content()?;
        Ok(self
            .store
            .create(content, position, size, self.context.signer_label.clone()))
    }

    /// Replace a text element's content. No-op on an unknown id.
    pub fn update_text(&mut self, id: ElementId, text: impl Into<String>) -> Result<bool> {
        let content = ElementContent::text(text)?;
        Ok(self.store.update_content(id, content))
    }

    /// Move an element directly, without a drag gesture. No-op on an
    /// unknown id.
    pub fn move_element(&mut self, id: ElementId, position: Point) -> bool {
        self.store.update_position(id, position)
    }

    /// Resize an element directly, clamped to the allowed dimension
    /// range. No-op on an unknown id.
    pub fn resize_element(&mut self, id: ElementId, size: Size) -> bool {
        use crate::elements::{MAX_DIMENSION, MIN_DIMENSION};
        self.store.update_size(id, size.clamp(MIN_DIMENSION, MAX_DIMENSION))
    }

    /// Remove an element. No-op on an unknown id.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        self.store.delete(id)
    }

    /// Number of elements currently placed.
    pub fn element_count(&self) -> usize {
        self.store.len()
    }

    /// Ordered summaries of the current elements.
    pub fn elements(&self) -> Vec<ElementSummary> {
        self.store
            .snapshot()
            .iter()
            .map(ElementSummary::from_element)
            .collect()
    }

    // --- gestures ---------------------------------------------------------

    /// Begin dragging an element. Fails if the id is unknown, the page is
    /// not ready, or another gesture is active.
    pub fn begin_drag(&mut self, id: ElementId) -> bool {
        match self.store.get(id) {
            Some(el) => self.surface.begin_drag(id, el.position, el.size),
            None => false,
        }
    }

    /// Continuous drag update; the store is not touched.
    pub fn drag_to(&mut self, position: Point) -> bool {
        self.surface.drag_to(position)
    }

    /// End the drag, committing the settled position as one mutation.
    pub fn release_drag(&mut self) -> bool {
        self.surface.release_drag(&mut self.store)
    }

    /// Begin resizing an element.
    pub fn begin_resize(&mut self, id: ElementId) -> bool {
        match self.store.get(id) {
            Some(el) => self.surface.begin_resize(id, el.size),
            None => false,
        }
    }

    /// Continuous resize update; the store is not touched.
    pub fn resize_to(&mut self, size: Size) -> bool {
        self.surface.resize_to(size)
    }

    /// End the resize, committing the settled size as one mutation.
    pub fn release_resize(&mut self) -> bool {
        self.surface.release_resize(&mut self.store)
    }

    // --- export -----------------------------------------------------------

    /// Bake the current elements into a copy of the source document.
    ///
    /// Page metrics come from the ready overlay surface; before the first
    /// render completes, the page height falls back to the fetched
    /// document's first-page height at scale 1. The element store is
    /// never modified here, so a failed export can simply be retried.
    pub fn export(&self) -> Result<ComposedDocument> {
        let (page_height, render_scale) = match self.surface.metrics() {
            Some(m) => (m.page_height, m.render_scale),
            None => match self.document.page_heights.first() {
                Some(&height) => (height, 1.0),
                None => {
                    let file = PdfFile::load(&self.document.bytes)?;
                    let page = file.page(1)?;
                    let (_, height) = file.page_size(page)?;
                    (height, 1.0)
                },
            },
        };
        let compositor = Compositor::new(render_scale)?;
        compositor.compose(&self.document.bytes, page_height, self.store.snapshot())
    }

    /// Export and deliver the result through `sink`.
    ///
    /// Returns the composition warnings so callers can surface skipped
    /// elements to the signer.
    pub fn submit(&self, sink: &mut dyn OutputSink) -> Result<Vec<CompositionWarning>> {
        let composed = self.export()?;
        sink.submit(&self.context, &composed.bytes)?;
        log::info!(
            "submitted document {} ({} bytes, {} warnings)",
            self.context.document_id,
            composed.bytes.len(),
            composed.warnings.len()
        );
        Ok(composed.warnings)
    }
}
