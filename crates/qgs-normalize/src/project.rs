//! Skip guards and the file-level pipeline.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};

use crate::errors::NormalizeError;
use crate::normalizer::normalize_bytes;
use crate::report::{Outcome, SkipReason};
use crate::writer::{write_atomic, WriteOptions};

/// ZIP local file header signature.
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// A project as seen by the host: where it lives and how it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Project location as reported by the host.
    pub path: PathBuf,
    /// Whether the project is a zipped container (`.qgz`).
    pub zipped: bool,
    /// Whether the project is a plain file on the local filesystem.
    pub local: bool,
}

impl ProjectFile {
    /// A plain local `.qgs` file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            zipped: false,
            local: true,
        }
    }

    /// Derives the storage flags from the location itself.
    ///
    /// A location of the form `scheme:…` (scheme of two or more characters,
    /// so drive letters do not count) is a storage URI and not local. A
    /// `.qgz` extension or a ZIP signature at the start of the file marks a
    /// zipped container. Unreadable files are treated as plain; the read in
    /// [`normalize_project`] reports the error.
    pub fn detect(location: impl Into<PathBuf>) -> Self {
        let path = location.into();
        let local = !is_storage_uri(&path);
        let zipped = local && (has_qgz_extension(&path) || starts_with_zip_magic(&path));
        Self {
            path,
            zipped,
            local,
        }
    }

    /// The guard that keeps this project from being normalized, if any.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        if self.zipped {
            Some(SkipReason::Zipped)
        } else if !self.local {
            Some(SkipReason::NonLocalStorage)
        } else {
            None
        }
    }
}

fn is_storage_uri(path: &Path) -> bool {
    static STORAGE_URI: OnceLock<Regex> = OnceLock::new();
    let re = STORAGE_URI
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").expect("invalid regex"));
    path.to_str().is_some_and(|location| re.is_match(location))
}

fn has_qgz_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("qgz"))
}

fn starts_with_zip_magic(path: &Path) -> bool {
    let mut head = [0u8; 4];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut head))
        .is_ok()
        && &head == ZIP_MAGIC
}

/// Normalizes a project file in place.
///
/// Zipped and non-local projects are skipped without touching anything.
/// A project that is already canonical is not rewritten.
///
/// # Errors
///
/// - [`NormalizeError::Io`] if the file cannot be read or replaced
/// - [`NormalizeError::Parse`] / [`NormalizeError::Fragment`] if the project
///   or one of its embedded symbols is malformed; the file is left as is
pub fn normalize_project(
    project: &ProjectFile,
    options: &WriteOptions,
) -> Result<Outcome, NormalizeError> {
    if let Some(reason) = project.skip_reason() {
        debug!(path = %project.path.display(), %reason, "skipping project");
        return Ok(Outcome::Skipped { reason });
    }

    let source = fs::read(&project.path).map_err(|source| NormalizeError::Io {
        path: project.path.clone(),
        source,
    })?;
    let normalized = normalize_bytes(&source)?;
    let report = normalized.report;

    if !report.changed {
        debug!(path = %project.path.display(), "project already canonical");
        return Ok(Outcome::Unchanged { report });
    }

    write_atomic(&project.path, &normalized.bytes, options)?;
    info!(
        path = %project.path.display(),
        removed = report.removed_attributes.len(),
        reordered = report.collections_reordered,
        fragments = report.fragments_rewritten,
        "rewrote project in canonical form"
    );
    Ok(Outcome::Rewritten { report })
}

/// [`ProjectFile::detect`] followed by [`normalize_project`] with default
/// options.
pub fn normalize_file(path: impl AsRef<Path>) -> Result<Outcome, NormalizeError> {
    let project = ProjectFile::detect(path.as_ref());
    normalize_project(&project, &WriteOptions::default())
}
