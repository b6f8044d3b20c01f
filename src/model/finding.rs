use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{Advisory, DeclaredPackage, Ecosystem, Severity};

/// Placeholder shown when an advisory has no applicable fix.
pub const NO_FIX_AVAILABLE: &str = "No fixed version available";

/// One reported match between a declared package occurrence and an advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerablePackage {
    pub pkg_name: String,
    pub vuln_version: String,
    pub ecosystem: Ecosystem,
    pub path: PathBuf,
    pub file_name: String,
    pub vuln_id: String,
    pub vuln_aliases: Vec<String>,
    /// Lowest fixed version above `vuln_version`; `None` when no fix applies.
    pub fixed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vuln_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    pub cwe_ids: Vec<String>,
    pub severity: Severity,
    /// The match was decided without being able to compare versions.
    pub unverified: bool,
}

impl VulnerablePackage {
    pub(crate) fn from_match(
        package: &DeclaredPackage,
        version: &str,
        advisory: &Advisory,
        fixed_version: Option<String>,
        unverified: bool,
    ) -> Self {
        Self {
            pkg_name: package.name.clone(),
            vuln_version: version.to_string(),
            ecosystem: package.ecosystem,
            path: package.source_path.clone(),
            file_name: package.file_name(),
            vuln_id: advisory.id.clone(),
            vuln_aliases: advisory.aliases.clone(),
            fixed_version,
            vuln_summary: advisory.summary.clone(),
            published: advisory.published,
            cwe_ids: advisory.cwe_ids.clone(),
            severity: advisory.severity,
            unverified,
        }
    }

    pub fn fixed_version_display(&self) -> &str {
        self.fixed_version.as_deref().unwrap_or(NO_FIX_AVAILABLE)
    }
}
