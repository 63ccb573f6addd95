//! Minimal PDF object model, parser, and writer.
//!
//! The compositor needs just enough PDF machinery to load a source
//! document, graft new objects onto its first page, and write a complete
//! document back out. That is what lives here:
//!
//! - [`object`]: the PDF object enum and typed accessors;
//! - [`parser`]: a recursive-descent parser for one object at a byte
//!   offset;
//! - [`document`]: scan-based object discovery (the whole file is
//!   scanned for `N G obj` markers, which also survives damaged or
//!   stream-based xref tables), page lookup, and a full-rewrite save with
//!   a classic xref table and trailer;
//! - [`serializer`]: deterministic object serialization (dictionary keys
//!   sorted), which is what makes re-exporting the same elements produce
//!   byte-identical output.
//!
//! Not supported: encrypted documents and objects packed inside object
//! streams. Both fail with [`crate::error::Error::InvalidPdf`] before any
//! output is produced.

pub mod document;
pub mod object;
pub mod parser;
pub mod serializer;

pub use document::PdfFile;
pub use object::{Object, ObjectRef};
pub use serializer::ObjectSerializer;
