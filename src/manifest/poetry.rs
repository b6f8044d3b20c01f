use serde::Deserialize;
use std::path::Path;

use crate::error::ManifestError;
use crate::model::{DeclaredPackage, Ecosystem};

#[derive(Deserialize)]
struct PoetryLock {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Parse `poetry.lock`. Every `[[package]]` entry is an exact, installed version.
pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let lock: PoetryLock = toml::from_str(content)?;

    Ok(lock
        .package
        .into_iter()
        .map(|pkg| DeclaredPackage::new(pkg.name, Some(pkg.version), Ecosystem::PyPI, path))
        .collect())
}
