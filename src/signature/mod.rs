//! Signature capture.
//!
//! Three mutually exclusive input modes produce a signature image:
//! freehand drawing ([`freehand::FreehandCanvas`]), typed cursive text
//! ([`typed::FontCatalog`]), and file upload ([`upload`]). All modes
//! terminate through the same emission contract, a [`CapturedSignature`],
//! which becomes the content of an image element in the store.
//!
//! A capture is owned state: dropping a canvas or an unrendered typed
//! entry cancels it without side effects, and starting a new capture
//! simply replaces the previous one. Nothing here touches elements that
//! were already committed to the store.

pub mod freehand;
pub mod typed;
pub mod upload;

pub use freehand::FreehandCanvas;
pub use typed::{FontCatalog, SignatureStyle};

use crate::elements::{ElementContent, SignatureFormat};
use crate::error::Result;

/// The product of a completed signature capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedSignature {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Format of `data`
    pub format: SignatureFormat,
}

impl CapturedSignature {
    /// Convert the capture into element content for the store.
    pub fn into_content(self) -> Result<ElementContent> {
        Ok(ElementContent::Image {
            data: self.data,
            format: self.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementKind;

    #[test]
    fn test_capture_becomes_image_content() {
        let capture = CapturedSignature {
            data: b"\x89PNG\r\n\x1a\n".to_vec(),
            format: SignatureFormat::Png,
        };
        let content = capture.into_content().unwrap();
        assert_eq!(content.kind(), ElementKind::Image);
    }
}
