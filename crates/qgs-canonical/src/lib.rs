//! XML document model and canonical serialization for QGIS project files.
//!
//! The crate parses UTF-8 XML into a small mutable tree ([`Document`]) and
//! writes it back as Canonical XML 1.0 (with comments), the byte form that
//! lxml's `write_c14n` produces. Two documents with the same logical content
//! always canonicalize to the same bytes.
//!
#![deny(missing_docs)]

/// Canonical XML serializer.
pub mod canonicalizer;
/// Digest of canonical bytes.
pub mod digest;
/// Mutable document tree.
pub mod document;
/// XML parser producing [`Document`] trees.
pub mod parser;

pub use canonicalizer::{CanonicalizationError, Canonicalizer};
pub use digest::{Digest, DigestAlg};
pub use document::{Attribute, Document, Element, Node};
pub use parser::{parse_bytes, parse_document, ParseError, MAX_DEPTH};
