use std::path::Path;

use crate::error::ManifestError;
use crate::model::DeclaredPackage;

use super::python_declaration;

/// Parse `Pipfile.lock`: JSON with `default` and `develop` sections.
pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let json: serde_json::Value = serde_json::from_str(content)?;
    if !json.is_object() {
        return Err(ManifestError::Malformed(
            "expected a JSON object at the top level".to_string(),
        ));
    }

    let mut packages = Vec::new();

    for section in ["default", "develop"] {
        let Some(entries) = json.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for (name, info) in entries {
            // VCS and path entries have no version; they are not registry packages.
            let Some(version) = info.get("version").and_then(|v| v.as_str()) else {
                continue;
            };
            packages.push(python_declaration(name, version, path));
        }
    }

    Ok(packages)
}
