//! Error types for the signing overlay library.
//!
//! This module defines all error types that can occur while capturing
//! signatures, editing the overlay, and compositing the output document.

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during overlay editing and composition.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Text element created or updated with empty content
    #[error("Element content is empty")]
    EmptyContent,

    /// Uploaded or captured image bytes could not be decoded
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    /// Image format other than PNG or JPEG
    #[error("Unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    /// Referenced document does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Signer is not authorized for the referenced document
    #[error("Not authorized for document: {0}")]
    Unauthorized(String),

    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Total failure assembling the output document; the element store
    /// is untouched and the export can be retried
    #[error("Composition failed: {0}")]
    Composition(String),

    /// Font loading or glyph rasterization error
    #[error("Font error: {0}")]
    Font(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error aborts the whole editing session rather than a
    /// single operation.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(self, Error::DocumentNotFound(_) | Error::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = Error::ParseError {
            offset: 1234,
            reason: "invalid token".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1234"));
        assert!(msg.contains("invalid token"));
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = Error::UnsupportedImageFormat("image/gif".to_string());
        assert!(format!("{}", err).contains("image/gif"));
    }

    #[test]
    fn test_session_fatal_classification() {
        assert!(Error::DocumentNotFound("doc-1".into()).is_fatal_to_session());
        assert!(Error::Unauthorized("doc-1".into()).is_fatal_to_session());
        assert!(!Error::EmptyContent.is_fatal_to_session());
        assert!(!Error::Composition("broken".into()).is_fatal_to_session());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
