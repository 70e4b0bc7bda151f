use std::path::PathBuf;

use qgs_canonical::{CanonicalizationError, ParseError};
use thiserror::Error;

/// Errors that can occur while normalizing a project.
///
/// Skip conditions (zipped or non-local projects) are not errors; they are
/// reported through [`Outcome::Skipped`](crate::Outcome::Skipped).
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The project file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The project document is not well-formed XML.
    #[error("project is not well-formed XML: {0}")]
    Parse(#[from] ParseError),
    /// An embedded symbol stored in an attribute is not well-formed XML.
    #[error("embedded symbol at {element} is not well-formed XML: {source}")]
    Fragment {
        /// Slash-separated path of the `Option` element holding the fragment.
        element: String,
        /// Parse failure inside the fragment.
        #[source]
        source: ParseError,
    },
    /// The normalized tree could not be serialized.
    #[error("canonicalization failed: {0}")]
    Canonicalize(#[from] CanonicalizationError),
}
