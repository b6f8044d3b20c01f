use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ManifestError;
use crate::model::{DeclaredPackage, Ecosystem};

const NODE_MODULES: &str = "node_modules/";

/// Parse `package-lock.json` (lockfile v1, v2 and v3).
///
/// v2+ lockfiles list every installed package under `packages`, keyed by
/// install path; v1 nests them under `dependencies`.
pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let json: Value = serde_json::from_str(content)?;
    let Some(root) = json.as_object() else {
        return Err(ManifestError::Malformed(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    let mut packages = Vec::new();

    if let Some(installed) = root.get("packages").and_then(Value::as_object) {
        for (install_path, info) in installed {
            let Some(name) = package_name(install_path, info) else {
                continue;
            };
            if info.get("link").and_then(Value::as_bool).unwrap_or(false) {
                continue;
            }
            if let Some(version) = info.get("version").and_then(Value::as_str) {
                packages.push(DeclaredPackage::new(name, Some(version.to_string()), Ecosystem::Npm, path));
            }
        }
    } else if let Some(deps) = root.get("dependencies").and_then(Value::as_object) {
        collect_v1(deps, path, &mut packages);
    }

    Ok(packages)
}

/// Package name from an install path such as `node_modules/a/node_modules/@scope/b`.
fn package_name(install_path: &str, info: &Value) -> Option<String> {
    let idx = install_path.rfind(NODE_MODULES)?;
    let name = &install_path[idx + NODE_MODULES.len()..];
    if name.is_empty() {
        return info.get("name").and_then(Value::as_str).map(String::from);
    }
    Some(name.to_string())
}

fn collect_v1(deps: &Map<String, Value>, path: &Path, packages: &mut Vec<DeclaredPackage>) {
    for (name, info) in deps {
        if let Some(version) = info.get("version").and_then(Value::as_str) {
            // `file:` and git references are not registry versions.
            if !version.contains(':') {
                packages.push(DeclaredPackage::new(
                    name.clone(),
                    Some(version.to_string()),
                    Ecosystem::Npm,
                    path,
                ));
            }
        }
        if let Some(nested) = info.get("dependencies").and_then(Value::as_object) {
            collect_v1(nested, path, packages);
        }
    }
}
