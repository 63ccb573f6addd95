//! # paraph
//!
//! Annotation overlay and compositing for PDF signing flows.
//!
//! A signer opens a document, places text and signature-image elements on
//! a rendered page, moves and resizes them, and exports a new PDF with
//! those elements baked in. This crate is the whole of that pipeline
//! except the raster display itself:
//!
//! - [`elements`]: the element model, text or signature-image payloads
//!   with screen-space placement;
//! - [`store`]: the ordered, event-driven element store (insertion order
//!   is draw order);
//! - [`overlay`]: page view state, render staleness tokens, and the
//!   drag/resize gestures with their single-commit-on-release contract;
//! - [`signature`]: the three capture modes (freehand, typed cursive,
//!   upload) that all emit a [`signature::CapturedSignature`];
//! - [`geometry`]: the screen-to-page coordinate transform;
//! - [`pdf`]: a minimal PDF object model, parser, and deterministic
//!   writer;
//! - [`compositor`]: bakes the element list onto the first page of the
//!   source document;
//! - [`session`]: the [`session::SigningSession`] facade tying the
//!   above together for one signer and one document.
//!
//! ## Example
//!
//! ```no_run
//! use paraph::geometry::{Point, Size};
//! use paraph::overlay::OverlayConfig;
//! use paraph::session::{DocumentSource, SessionContext, SigningSession};
//!
//! fn sign(source: &dyn DocumentSource) -> paraph::Result<Vec<u8>> {
//!     let context = SessionContext {
//!         document_id: "doc-1".to_string(),
//!         signer_label: "Alice".to_string(),
//!     };
//!     let mut session = SigningSession::open(source, context, OverlayConfig::default())?;
//!     session.add_text("Approved", Some(Point::new(50.0, 50.0)), Some(Size::new(200.0, 60.0)))?;
//!     Ok(session.export()?.bytes)
//! }
//! ```

#![warn(missing_docs)]

pub mod compositor;
pub mod elements;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod pdf;
pub mod session;
pub mod signature;
pub mod store;

pub use compositor::{ComposedDocument, Compositor, CompositionWarning, WarningKind};
pub use elements::{AnnotationElement, ElementContent, ElementId, ElementKind, SignatureFormat};
pub use error::{Error, Result};
pub use geometry::{PageMetrics, Point, Rect, Size};
pub use overlay::{OverlayConfig, OverlaySurface, PageView, RenderToken};
pub use session::{DocumentSource, OutputSink, SessionContext, SigningSession};
pub use signature::CapturedSignature;
pub use store::{ElementEvent, ElementStore};

/// Library version from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
