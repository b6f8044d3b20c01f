use serde::Deserialize;
use std::path::Path;

use crate::error::ManifestError;
use crate::model::{DeclaredPackage, Ecosystem};

#[derive(Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<LockedCrate>,
}

#[derive(Deserialize)]
struct LockedCrate {
    name: String,
    version: String,
    source: Option<String>,
}

/// Parse `Cargo.lock`. Crates without a `source` are workspace members and
/// are not published, so they are skipped.
pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let lock: CargoLock = toml::from_str(content)?;

    Ok(lock
        .package
        .into_iter()
        .filter(|krate| {
            krate
                .source
                .as_deref()
                .is_some_and(|s| s.starts_with("registry+") || s.starts_with("sparse+"))
        })
        .map(|krate| DeclaredPackage::new(krate.name, Some(krate.version), Ecosystem::CratesIo, path))
        .collect())
}
