use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::ManifestError;
use crate::model::DeclaredPackage;

use super::python_declaration;

static REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[[^\]]*\])?\s*(?P<spec>.*)$")
        .expect("requirement pattern is valid")
});

pub(super) fn parse(content: &str, path: &Path) -> Result<Vec<DeclaredPackage>, ManifestError> {
    let mut packages = Vec::new();

    for line in logical_lines(content) {
        if let Some(package) = parse_requirement(&line, path) {
            packages.push(package);
        } else {
            debug!(path = %path.display(), line = %line, "ignoring requirement line");
        }
    }

    Ok(packages)
}

/// Parses one PEP 508 requirement string (`name[extras] specifiers ; marker`).
///
/// Direct references (`name @ url`) and VCS/URL lines have no registry version
/// and yield `None`.
pub(super) fn parse_requirement(line: &str, path: &Path) -> Option<DeclaredPackage> {
    let line = line.split(';').next().unwrap_or("");
    // Per-requirement pip options such as `--hash` follow the specifiers.
    let line = match line.find(" --") {
        Some(idx) => &line[..idx],
        None => line,
    }
    .trim();
    if line.is_empty() || line.contains("://") || line.contains('@') {
        return None;
    }

    let caps = REQUIREMENT.captures(line)?;
    let spec = caps["spec"].trim();
    let spec = spec
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(spec);

    if !spec.is_empty() && !spec.starts_with(['=', '<', '>', '~', '!']) {
        return None;
    }

    Some(python_declaration(&caps["name"], spec, path))
}

/// Joins `\` continuations and drops comments, blank lines, and pip options.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();

    for raw in content.lines() {
        let without_comment = strip_comment(raw);
        if let Some(continued) = without_comment.trim_end().strip_suffix('\\') {
            pending.push_str(continued);
            pending.push(' ');
            continue;
        }
        pending.push_str(without_comment);

        let line = pending.trim().to_string();
        pending.clear();

        if line.is_empty() || line.starts_with('-') {
            continue;
        }
        lines.push(line);
    }

    let tail = pending.trim();
    if !tail.is_empty() && !tail.starts_with('-') {
        lines.push(tail.to_string());
    }

    lines
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(idx) => &line[..idx],
        None => line,
    }
}
