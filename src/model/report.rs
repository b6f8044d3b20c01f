use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Ecosystem, VulnerablePackage};

/// A non-fatal condition encountered during a scan.
///
/// Warnings never decide success or failure on their own; only findings do.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    /// A manifest could not be parsed and was skipped.
    ManifestParse { path: PathBuf, message: String },
    /// A declaration whose constraint has no concrete version to look up.
    UnresolvedVersion {
        path: PathBuf,
        name: String,
        requirement: String,
    },
    /// The advisory lookup for this package failed after retries.
    LookupFailed {
        ecosystem: Ecosystem,
        name: String,
        version: String,
        reason: String,
    },
    /// A finding reported without being able to compare versions.
    Unverified {
        path: PathBuf,
        name: String,
        version: String,
        vuln_id: String,
    },
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanWarning::ManifestParse { path, message } => {
                write!(f, "could not parse {}: {}", path.display(), message)
            }
            ScanWarning::UnresolvedVersion {
                path,
                name,
                requirement,
            } => write!(
                f,
                "{} in {}: no concrete version for '{}', not checked",
                name,
                path.display(),
                requirement
            ),
            ScanWarning::LookupFailed {
                ecosystem,
                name,
                version,
                reason,
            } => write!(f, "lookup failed for {} {}@{}: {}", ecosystem, name, version, reason),
            ScanWarning::Unverified {
                path,
                name,
                version,
                vuln_id,
            } => write!(
                f,
                "{}@{} in {} reported for {} without version comparison",
                name,
                version,
                path.display(),
                vuln_id
            ),
        }
    }
}

/// Complete scan output: ordered findings plus side-channel warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub findings: Vec<VulnerablePackage>,
    pub warnings: Vec<ScanWarning>,
    pub manifests_scanned: usize,
    pub packages_checked: usize,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Rewrites paths under `root` as `display_root` joined with the
    /// remainder, so checkouts in temporary directories read naturally.
    pub fn rebase_paths(&mut self, root: &Path, display_root: &Path) {
        let rebase = |path: &mut PathBuf| {
            if let Ok(rest) = path.strip_prefix(root) {
                *path = display_root.join(rest);
            }
        };

        for finding in &mut self.findings {
            rebase(&mut finding.path);
        }
        for warning in &mut self.warnings {
            match warning {
                ScanWarning::ManifestParse { path, .. }
                | ScanWarning::UnresolvedVersion { path, .. }
                | ScanWarning::Unverified { path, .. } => rebase(path),
                ScanWarning::LookupFailed { .. } => {}
            }
        }
    }
}
