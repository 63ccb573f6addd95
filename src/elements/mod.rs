//! The annotation element model.
//!
//! An [`AnnotationElement`] is one positionable box layered over the
//! rendered page: either free text or a captured signature image. Elements
//! live in screen space until export; the compositor converts them to page
//! space when baking the output document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::geometry::{Point, Size};

/// Smallest allowed element dimension in screen pixels.
pub const MIN_DIMENSION: f64 = 40.0;

/// Largest allowed element dimension in screen pixels.
pub const MAX_DIMENSION: f64 = 1000.0;

/// Position assigned to an element created without one.
pub const DEFAULT_POSITION: Point = Point { x: 50.0, y: 50.0 };

/// Size assigned to an element created without one.
pub const DEFAULT_SIZE: Size = Size {
    width: 200.0,
    height: 60.0,
};

/// Opaque unique identifier for an annotation element.
///
/// Generated at creation and immutable for the lifetime of the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raster formats accepted for signature images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureFormat {
    /// PNG (FlateDecode embedding)
    Png,
    /// JPEG (DCTDecode pass-through embedding)
    Jpeg,
}

impl SignatureFormat {
    /// Detect the format from leading magic bytes.
    ///
    /// Only PNG and JPEG are recognized; anything else is an
    /// [`Error::UnsupportedImageFormat`].
    pub fn detect(data: &[u8]) -> Result<Self> {
        if data.len() >= 8 && &data[0..8] == b"\x89PNG\r\n\x1a\n" {
            return Ok(SignatureFormat::Png);
        }
        if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
            return Ok(SignatureFormat::Jpeg);
        }
        Err(Error::UnsupportedImageFormat(sniff_label(data).to_string()))
    }

    /// Map a declared MIME type to a format.
    pub fn from_mime(mime: &str) -> Result<Self> {
        match mime {
            "image/png" => Ok(SignatureFormat::Png),
            "image/jpeg" | "image/jpg" => Ok(SignatureFormat::Jpeg),
            other => Err(Error::UnsupportedImageFormat(other.to_string())),
        }
    }

    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            SignatureFormat::Png => "image/png",
            SignatureFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Best-effort label for an unrecognized image payload, used in errors.
fn sniff_label(data: &[u8]) -> &'static str {
    if data.len() >= 6 && (&data[0..6] == b"GIF87a" || &data[0..6] == b"GIF89a") {
        "image/gif"
    } else if data.len() >= 2 && &data[0..2] == b"BM" {
        "image/bmp"
    } else if data.len() >= 12 && &data[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "unknown"
    }
}

/// Element kind discriminant, exposed for display panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Free text drawn directly onto the page
    Text,
    /// Signature image embedded as an XObject
    Image,
}

/// The payload of an annotation element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementContent {
    /// UTF-8 text
    Text(String),
    /// Raw image bytes with their detected format
    Image {
        /// Encoded image bytes (PNG or JPEG)
        data: Vec<u8>,
        /// Detected format tag
        format: SignatureFormat,
    },
}

impl ElementContent {
    /// Build text content, rejecting empty or whitespace-only strings.
    pub fn text(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }
        Ok(ElementContent::Text(content))
    }

    /// Build image content, detecting the format from magic bytes.
    pub fn image(data: Vec<u8>) -> Result<Self> {
        let format = SignatureFormat::detect(&data)?;
        Ok(ElementContent::Image { data, format })
    }

    /// The kind discriminant for this content.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementContent::Text(_) => ElementKind::Text,
            ElementContent::Image { .. } => ElementKind::Image,
        }
    }
}

/// One positionable annotation overlaid on the rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationElement {
    /// Unique identifier, immutable
    pub id: ElementId,
    /// Text or image payload
    pub content: ElementContent,
    /// Top-left corner in screen pixels
    pub position: Point,
    /// Extent in screen pixels
    pub size: Size,
    /// Display label of the signer this element belongs to, immutable
    pub assigned_signer: String,
}

impl AnnotationElement {
    /// Create an element with explicit placement.
    pub fn new(
        content: ElementContent,
        position: Point,
        size: Size,
        assigned_signer: impl Into<String>,
    ) -> Self {
        Self {
            id: ElementId::new(),
            content,
            position,
            size,
            assigned_signer: assigned_signer.into(),
        }
    }

    /// Create an element at the default position and size.
    pub fn at_default(content: ElementContent, assigned_signer: impl Into<String>) -> Self {
        Self::new(content, DEFAULT_POSITION, DEFAULT_SIZE, assigned_signer)
    }

    /// The kind discriminant for this element.
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Whether position and size are all finite numbers.
    ///
    /// Elements failing this check are skipped (with a warning) during
    /// composition rather than corrupting the output.
    pub fn has_finite_frame(&self) -> bool {
        self.position.is_finite() && self.size.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00";
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0];
    const GIF_MAGIC: &[u8] = b"GIF89a\x00";

    #[test]
    fn test_format_detection() {
        assert_eq!(SignatureFormat::detect(PNG_MAGIC).unwrap(), SignatureFormat::Png);
        assert_eq!(SignatureFormat::detect(JPEG_MAGIC).unwrap(), SignatureFormat::Jpeg);
    }

    #[test]
    fn test_gif_rejected_with_label() {
        match SignatureFormat::detect(GIF_MAGIC) {
            Err(Error::UnsupportedImageFormat(label)) => assert_eq!(label, "image/gif"),
            other => panic!("expected UnsupportedImageFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_mime_mapping() {
        assert_eq!(SignatureFormat::from_mime("image/png").unwrap(), SignatureFormat::Png);
        assert_eq!(SignatureFormat::from_mime("image/jpg").unwrap(), SignatureFormat::Jpeg);
        assert!(SignatureFormat::from_mime("image/webp").is_err());
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(matches!(ElementContent::text(""), Err(Error::EmptyContent)));
        assert!(matches!(ElementContent::text("   "), Err(Error::EmptyContent)));
        assert!(ElementContent::text("Approved").is_ok());
    }

    #[test]
    fn test_element_defaults() {
        let el = AnnotationElement::at_default(ElementContent::text("Approved").unwrap(), "Alice");
        assert_eq!(el.position, DEFAULT_POSITION);
        assert_eq!(el.size, DEFAULT_SIZE);
        assert_eq!(el.kind(), ElementKind::Text);
        assert_eq!(el.assigned_signer, "Alice");
    }

    #[test]
    fn test_finite_frame_check() {
        let mut el =
            AnnotationElement::at_default(ElementContent::text("Approved").unwrap(), "Alice");
        assert!(el.has_finite_frame());
        el.size.width = f64::NAN;
        assert!(!el.has_finite_frame());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ElementId::new();
        let b = ElementId::new();
        assert_ne!(a, b);
    }
}
