use qgs_canonical::Digest;
use serde::{Deserialize, Serialize};

/// What a normalization pass did to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Volatile root attributes that were present and removed.
    pub removed_attributes: Vec<String>,
    /// Unordered collections whose child order changed.
    pub collections_reordered: u64,
    /// Embedded symbol fragments that were re-serialized.
    pub fragments_rewritten: u64,
    /// Whether the canonical bytes differ from the input bytes.
    pub changed: bool,
    /// Digest of the canonical bytes.
    pub digest: Option<Digest>,
}

/// Why a save event did not lead to a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The project is a zipped `.qgz` container.
    Zipped,
    /// The project lives in a storage backend rather than a local file.
    NonLocalStorage,
    /// The host has no active project.
    NoProject,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SkipReason::Zipped => "zipped project",
            SkipReason::NonLocalStorage => "non-local storage",
            SkipReason::NoProject => "no active project",
        };
        f.write_str(text)
    }
}

/// Result of normalizing one project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing was read or written.
    Skipped {
        /// Guard that fired.
        reason: SkipReason,
    },
    /// The file was already canonical; nothing was written.
    Unchanged {
        /// Pass details.
        report: NormalizationReport,
    },
    /// The file was overwritten with its canonical form.
    Rewritten {
        /// Pass details.
        report: NormalizationReport,
    },
}

impl Outcome {
    /// The report, unless the project was skipped.
    pub fn report(&self) -> Option<&NormalizationReport> {
        match self {
            Outcome::Skipped { .. } => None,
            Outcome::Unchanged { report } | Outcome::Rewritten { report } => Some(report),
        }
    }
}
