//! Dependency manifest discovery and extraction.
//!
//! Every supported format is a variant of [`ManifestKind`]; supporting a new
//! format means adding a variant and its parser module.
//!
//! | Kind | File | Ecosystem | Lockfile |
//! |------|------|-----------|----------|
//! | [`ManifestKind::RequirementsTxt`] | `requirements*.txt` | PyPI | no |
//! | [`ManifestKind::PyprojectToml`] | `pyproject.toml` | PyPI | no |
//! | [`ManifestKind::PoetryLock`] | `poetry.lock` | PyPI | yes |
//! | [`ManifestKind::PipfileLock`] | `Pipfile.lock` | PyPI | yes |
//! | [`ManifestKind::CargoLock`] | `Cargo.lock` | crates.io | yes |
//! | [`ManifestKind::PackageLockJson`] | `package-lock.json` | npm | yes |
//!
//! # Example
//!
//! ```no_run
//! use depwatch::manifest::{extract, DiscoveryOptions};
//! use std::path::Path;
//!
//! let extraction = extract(Path::new("./my-project"), DiscoveryOptions::default()).unwrap();
//! for pkg in &extraction.packages {
//!     println!("{} {:?} ({})", pkg.name, pkg.version, pkg.source_path.display());
//! }
//! ```

mod cargo_lock;
mod npm_lock;
mod pipfile;
mod poetry;
mod pyproject;
mod requirements;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ManifestError, ScanError};
use crate::matcher::resolve_python_constraint;
use crate::model::{DeclaredPackage, Ecosystem, ScanWarning};

/// Directory names never descended into.
const SKIPPED_DIRS: [&str; 6] = [
    "node_modules",
    "target",
    "venv",
    "__pycache__",
    "site-packages",
    "dist-packages",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestKind {
    RequirementsTxt,
    PyprojectToml,
    PoetryLock,
    PipfileLock,
    CargoLock,
    PackageLockJson,
}

impl ManifestKind {
    /// Recognises a manifest by its file name alone.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "pyproject.toml" => Some(ManifestKind::PyprojectToml),
            "poetry.lock" => Some(ManifestKind::PoetryLock),
            "Pipfile.lock" => Some(ManifestKind::PipfileLock),
            "Cargo.lock" => Some(ManifestKind::CargoLock),
            "package-lock.json" | "npm-shrinkwrap.json" => Some(ManifestKind::PackageLockJson),
            n if n.ends_with("requirements.txt")
                || (n.starts_with("requirements") && n.ends_with(".txt")) =>
            {
                Some(ManifestKind::RequirementsTxt)
            }
            _ => None,
        }
    }

    /// Recognises a manifest from its content when the name says nothing.
    pub fn sniff(content: &str) -> Option<Self> {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(content) {
            if json.get("lockfileVersion").is_some() {
                return Some(ManifestKind::PackageLockJson);
            }
            if json.get("_meta").is_some() {
                return Some(ManifestKind::PipfileLock);
            }
            return None;
        }

        if let Ok(toml) = content.parse::<toml::Table>() {
            if toml.get("package").and_then(|p| p.as_array()).is_some() {
                let poetry_metadata = toml
                    .get("metadata")
                    .and_then(|m| m.as_table())
                    .map(|m| m.contains_key("lock-version") || m.contains_key("content-hash"))
                    .unwrap_or(false);
                return Some(if poetry_metadata {
                    ManifestKind::PoetryLock
                } else {
                    ManifestKind::CargoLock
                });
            }
            let has_poetry_tool = toml
                .get("tool")
                .and_then(|t| t.get("poetry"))
                .is_some();
            if toml.contains_key("project") || has_poetry_tool {
                return Some(ManifestKind::PyprojectToml);
            }
            return None;
        }

        None
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ManifestKind::RequirementsTxt
            | ManifestKind::PyprojectToml
            | ManifestKind::PoetryLock
            | ManifestKind::PipfileLock => Ecosystem::PyPI,
            ManifestKind::CargoLock => Ecosystem::CratesIo,
            ManifestKind::PackageLockJson => Ecosystem::Npm,
        }
    }

    /// Lockfiles pin the exact versions that get installed.
    pub fn is_lockfile(&self) -> bool {
        !matches!(
            self,
            ManifestKind::RequirementsTxt | ManifestKind::PyprojectToml
        )
    }

    /// Parses manifest content into declarations attributed to `path`.
    pub fn extract(&self, content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
        match self {
            ManifestKind::RequirementsTxt => requirements::parse(content, path),
            ManifestKind::PyprojectToml => pyproject::parse(content, path),
            ManifestKind::PoetryLock => poetry::parse(content, path),
            ManifestKind::PipfileLock => pipfile::parse(content, path),
            ManifestKind::CargoLock => cargo_lock::parse(content, path),
            ManifestKind::PackageLockJson => npm_lock::parse(content, path),
        }
    }
}

/// Discovery knobs supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// The tree was fetched from a remote repository; prefer lockfiles over
    /// loose constraint files that sit beside them.
    pub prefer_lockfiles: bool,
}

/// Declarations found under a root plus per-manifest warnings.
#[derive(Debug, Default)]
pub struct Extraction {
    pub manifests: Vec<PathBuf>,
    pub packages: Vec<DeclaredPackage>,
    pub warnings: Vec<ScanWarning>,
}

/// Extracts every declaration under `root`, which may be a file or a directory.
///
/// A single file that no parser recognises is an error; in a directory only
/// recognised file names are considered. A manifest that fails to parse never
/// aborts extraction; it becomes a [`ScanWarning::ManifestParse`].
pub fn extract(root: &Path, options: DiscoveryOptions) -> Result<Extraction, ScanError> {
    let metadata = fs::metadata(root).map_err(|e| ScanError::InvalidInput {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut extraction = Extraction::default();

    if metadata.is_file() {
        let content = fs::read_to_string(root);
        let kind = file_name(root)
            .as_deref()
            .and_then(ManifestKind::from_file_name)
            .or_else(|| content.as_deref().ok().and_then(ManifestKind::sniff))
            .ok_or_else(|| ScanError::UnsupportedManifest(root.to_path_buf()))?;
        extraction.manifests.push(root.to_path_buf());
        extract_one(kind, root, content.map_err(ManifestError::from), &mut extraction);
        return Ok(extraction);
    }

    if !metadata.is_dir() {
        return Err(ScanError::InvalidInput {
            path: root.to_path_buf(),
            reason: "is neither a file nor a directory".to_string(),
        });
    }

    for (path, kind) in discover(root, options) {
        let content = fs::read_to_string(&path).map_err(ManifestError::from);
        extraction.manifests.push(path.clone());
        extract_one(kind, &path, content, &mut extraction);
    }

    Ok(extraction)
}

fn extract_one(
    kind: ManifestKind,
    path: &Path,
    content: Result<String, ManifestError>,
    extraction: &mut Extraction,
) {
    match content.and_then(|c| kind.extract(&c, path)) {
        Ok(packages) => {
            debug!(path = %path.display(), ?kind, count = packages.len(), "extracted manifest");
            extraction.packages.extend(packages);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unparsable manifest");
            extraction.warnings.push(ScanWarning::ManifestParse {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    }
}

/// Finds recognised manifests under `root`, ordered by path.
pub fn discover(root: &Path, options: DiscoveryOptions) -> Vec<(PathBuf, ManifestKind)> {
    let mut found: Vec<(PathBuf, ManifestKind)> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let kind = ManifestKind::from_file_name(&e.file_name().to_string_lossy())?;
            Some((e.into_path(), kind))
        })
        .collect();

    found.sort();

    if options.prefer_lockfiles {
        found = drop_shadowed_by_lockfiles(found);
    }

    found
}

fn is_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|skipped| *skipped == name)
}

fn drop_shadowed_by_lockfiles(found: Vec<(PathBuf, ManifestKind)>) -> Vec<(PathBuf, ManifestKind)> {
    let mut locked: BTreeMap<PathBuf, BTreeSet<Ecosystem>> = BTreeMap::new();
    for (path, kind) in &found {
        if kind.is_lockfile() {
            locked
                .entry(parent_of(path))
                .or_default()
                .insert(kind.ecosystem());
        }
    }

    found
        .into_iter()
        .filter(|(path, kind)| {
            let shadowed = !kind.is_lockfile()
                && locked
                    .get(&parent_of(path))
                    .is_some_and(|ecosystems| ecosystems.contains(&kind.ecosystem()));
            if shadowed {
                debug!(path = %path.display(), "lockfile present, skipping constraint file");
            }
            !shadowed
        })
        .collect()
}

fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Builds a PyPI declaration from a name and its (possibly empty) constraint.
fn python_declaration(name: &str, constraint: &str, path: &Path) -> DeclaredPackage {
    let constraint = constraint.trim();
    let version = resolve_python_constraint(constraint);
    let package = DeclaredPackage::new(name.trim(), version.clone(), Ecosystem::PyPI, path);

    let is_exact_pin = version
        .as_deref()
        .map(|v| {
            constraint == v
                || constraint.trim_start_matches('=').trim() == v && !constraint.contains(',')
        })
        .unwrap_or(false);

    if is_exact_pin {
        package
    } else if constraint.is_empty() {
        package.with_requirement("*")
    } else {
        package.with_requirement(constraint)
    }
}
