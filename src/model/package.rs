use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    #[serde(rename = "PyPI")]
    PyPI,
    #[serde(rename = "crates.io")]
    CratesIo,
    #[serde(rename = "npm")]
    Npm,
}

impl Ecosystem {
    /// The ecosystem name understood by OSV.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::PyPI => "PyPI",
            Ecosystem::CratesIo => "crates.io",
            Ecosystem::Npm => "npm",
        }
    }

    /// Canonical form of a package name used to decide package identity.
    ///
    /// PyPI names compare per PEP 503; the other registries are case-sensitive.
    pub fn normalize_name(&self, name: &str) -> String {
        match self {
            Ecosystem::PyPI => {
                let mut normalized = String::with_capacity(name.len());
                let mut last_was_sep = false;
                for c in name.trim().chars() {
                    if matches!(c, '-' | '_' | '.') {
                        if !last_was_sep {
                            normalized.push('-');
                        }
                        last_was_sep = true;
                    } else {
                        normalized.extend(c.to_lowercase());
                        last_was_sep = false;
                    }
                }
                normalized
            }
            Ecosystem::CratesIo | Ecosystem::Npm => name.trim().to_string(),
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One dependency declaration found in a manifest.
///
/// The same package may be declared by several manifests (or twice in one);
/// every occurrence is kept so findings can point at each location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredPackage {
    pub name: String,
    /// Concrete version used for lookup. `None` when the declared
    /// constraint could not be resolved to one.
    pub version: Option<String>,
    /// The constraint as written, when it was not an exact pin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    pub ecosystem: Ecosystem,
    pub source_path: PathBuf,
}

impl DeclaredPackage {
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        ecosystem: Ecosystem,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            requirement: None,
            ecosystem,
            source_path: source_path.into(),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirement = Some(requirement.into());
        self
    }

    /// The lookup identity of this declaration, if it has a concrete version.
    pub fn key(&self) -> Option<PackageKey> {
        let version = self.version.as_ref()?;
        Some(PackageKey {
            ecosystem: self.ecosystem,
            name: self.ecosystem.normalize_name(&self.name),
            version: version.clone(),
        })
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.source_path)
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A unique `(ecosystem, name, version)` tuple; one advisory lookup is made per key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

impl std::fmt::Display for PackageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.ecosystem, self.name, self.version)
    }
}
