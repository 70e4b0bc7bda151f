//! Atomic replacement of a project file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::errors::NormalizeError;

/// Options for rewriting a project file.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync the new contents before renaming (default: true).
    pub sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { sync: true }
    }
}

/// Replaces the contents of `path` with `bytes`.
///
/// The bytes go to a temporary file in the same directory, which is then
/// renamed over the target, so readers see either the old file or the new
/// one. The original permissions are carried over. Symlinks are followed and
/// the link target is replaced.
///
/// # Errors
///
/// Returns [`NormalizeError::Io`] if the temporary file cannot be created,
/// written or renamed. The original file is untouched in that case.
pub fn write_atomic(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<(), NormalizeError> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let io_error = |source: std::io::Error| NormalizeError::Io {
        path: target.clone(),
        source,
    };

    let mut file = NamedTempFile::new_in(parent_dir(&target)).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.flush().map_err(io_error)?;

    if let Ok(metadata) = fs::metadata(&target) {
        file.as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_error)?;
    }
    if options.sync {
        file.as_file().sync_all().map_err(io_error)?;
    }

    file.persist(&target).map_err(|err| io_error(err.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
