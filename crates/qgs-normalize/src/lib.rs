//! Canonical rewriting of QGIS project files.
//!
//! QGIS writes `.qgs` projects with unstable element order and with the
//! name of whoever saved last. This crate turns such a file into a
//! deterministic byte form after every save, so version control only shows
//! real edits.
//!
//! ## Quick Start
//!
//! ```rust
//! use qgs_normalize::normalize_str;
//!
//! let source = r#"<qgis saveUser="alice" saveUserFull="Alice A." version="3.34">
//!   <snapping-settings>
//!     <individual-layer-settings>
//!       <layer-setting id="layer2"/>
//!       <layer-setting id="layer1"/>
//!     </individual-layer-settings>
//!   </snapping-settings>
//! </qgis>"#;
//!
//! let normalized = normalize_str(source)?;
//! let text = String::from_utf8(normalized.bytes)?;
//! assert!(text.starts_with(r#"<qgis version="3.34">"#));
//! assert!(text.find("layer1") < text.find("layer2"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`normalize_project`] - Normalize a project file in place, honoring skip guards
//! - [`normalize_str`] - The in-memory pipeline
//! - [`start`] / [`stop`] - Hook the pipeline to a [`ProjectHost`]'s save signal

#![deny(missing_docs)]

/// Error types for normalization.
pub mod errors;
/// Host integration.
pub mod host;
/// Per-path locking.
pub mod locks;
/// Parse, rules, canonicalize.
pub mod normalizer;
/// Skip guards and file-level pipeline.
pub mod project;
/// Normalization reports and outcomes.
pub mod report;
/// Fixed schema rules.
pub mod rules;
/// Atomic file replacement.
pub mod writer;

pub use errors::NormalizeError;
pub use host::{on_document_saved, start, stop, ConnectionId, ProjectHost, SavedCallback, Subscription};
pub use locks::PathLocks;
pub use normalizer::{normalize_bytes, normalize_document, normalize_str, Normalized};
pub use project::{normalize_file, normalize_project, ProjectFile};
pub use report::{NormalizationReport, Outcome, SkipReason};
pub use rules::Profile;
pub use writer::{write_atomic, WriteOptions};
