use std::path::Path;
use toml::{Table, Value};
use tracing::debug;

use crate::error::ManifestError;
use crate::model::DeclaredPackage;

use super::python_declaration;
use super::requirements::parse_requirement;

/// Parse `pyproject.toml`.
///
/// Reads PEP 621 `[project]` dependency lists and Poetry's
/// `[tool.poetry.*dependencies]` tables.
pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let doc: Table = toml::from_str(content)?;
    let mut packages = Vec::new();

    if let Some(project) = doc.get("project").and_then(Value::as_table) {
        if let Some(deps) = project.get("dependencies") {
            pep508_list(deps, path, &mut packages)?;
        }
        if let Some(optional) = project.get("optional-dependencies").and_then(Value::as_table) {
            for deps in optional.values() {
                pep508_list(deps, path, &mut packages)?;
            }
        }
    }

    if let Some(poetry) = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(Value::as_table)
    {
        for key in ["dependencies", "dev-dependencies"] {
            if let Some(table) = poetry.get(key).and_then(Value::as_table) {
                poetry_table(table, path, &mut packages);
            }
        }
        if let Some(groups) = poetry.get("group").and_then(Value::as_table) {
            for group in groups.values() {
                if let Some(table) = group.get("dependencies").and_then(Value::as_table) {
                    poetry_table(table, path, &mut packages);
                }
            }
        }
    }

    Ok(packages)
}

fn pep508_list(
    deps: &Value,
    path: &Path,
    packages: &mut Vec<DeclaredPackage>,
) -> Result<(), ManifestError> {
    let list = deps
        .as_array()
        .ok_or_else(|| ManifestError::Malformed("dependencies must be an array".to_string()))?;

    for entry in list {
        let Some(requirement) = entry.as_str() else {
            return Err(ManifestError::Malformed(format!(
                "dependency entry is not a string: {}",
                entry
            )));
        };
        match parse_requirement(requirement, path) {
            Some(package) => packages.push(package),
            None => debug!(path = %path.display(), requirement, "ignoring requirement"),
        }
    }

    Ok(())
}

fn poetry_table(table: &Table, path: &Path, packages: &mut Vec<DeclaredPackage>) {
    for (name, spec) in table {
        if name.eq_ignore_ascii_case("python") {
            continue;
        }
        let constraint = match spec {
            Value::String(s) => s.as_str(),
            Value::Table(t) => match t.get("version").and_then(Value::as_str) {
                Some(v) => v,
                // git/path/url dependencies
                None => continue,
            },
            // Multiple-constraint arrays; the first entry is representative.
            Value::Array(items) => match items
                .first()
                .and_then(|i| i.get("version"))
                .and_then(Value::as_str)
            {
                Some(v) => v,
                None => continue,
            },
            _ => continue,
        };
        packages.push(python_declaration(name, constraint, path));
    }
}
