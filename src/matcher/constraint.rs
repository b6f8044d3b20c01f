//! Resolution of declared version constraints to a concrete lookup version.
//!
//! An exact pin always wins. Otherwise the highest lower bound is used, since
//! a dependency satisfying the constraint can be installed at that version and
//! anything vulnerable there must be reported. Constraints with only an upper
//! bound (or none at all) stay unresolved.

use crate::model::Ecosystem;

use super::version::parse_version;

const OPERATORS: [&str; 8] = ["===", "==", "~=", "!=", "<=", ">=", "<", ">"];

/// Resolves a PEP 440 specifier set or a Poetry constraint.
///
/// Both syntaxes are accepted by the same routine: the Poetry-only forms
/// (`^1.2`, `~1.2`, a bare `1.2.3`) do not collide with PEP 440 operators.
pub fn resolve_python_constraint(constraint: &str) -> Option<String> {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return None;
    }

    // Poetry alternatives: any branch may be installed, so the lowest one is used.
    if constraint.contains("||") {
        let mut branches: Vec<String> = constraint
            .split("||")
            .filter_map(resolve_python_constraint)
            .collect();
        branches.sort_by(|a, b| {
            parse_version(Ecosystem::PyPI, a).cmp(&parse_version(Ecosystem::PyPI, b))
        });
        return branches.into_iter().next();
    }

    let mut lower_bounds: Vec<String> = Vec::new();

    for clause in constraint
        .split(',')
        .flat_map(split_poetry_clauses)
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        let (operator, version) = split_operator(clause);
        let version = version.trim();
        if version.is_empty() {
            continue;
        }

        match operator {
            "===" => return Some(version.to_string()),
            "==" | "" => {
                if version == "*" {
                    continue;
                }
                if let Some(prefix) = version.strip_suffix(".*") {
                    lower_bounds.push(prefix.to_string());
                } else {
                    return Some(version.to_string());
                }
            }
            ">=" | ">" | "~=" | "^" | "~" => {
                lower_bounds.push(version.trim_end_matches(".*").to_string());
            }
            _ => {}
        }
    }

    lower_bounds.sort_by(|a, b| {
        parse_version(Ecosystem::PyPI, a).cmp(&parse_version(Ecosystem::PyPI, b))
    });
    lower_bounds.pop()
}

/// Poetry permits space-separated clauses (`>= 1.2 < 2.0`); operators stay
/// attached to the version that follows them.
fn split_poetry_clauses(clause: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = clause.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            let before = clause[start..i].trim();
            let rest = clause[i..].trim_start();
            let before_is_bare_operator = OPERATORS
                .iter()
                .chain(["^", "~"].iter())
                .any(|op| before == *op);
            let rest_starts_with_operator = rest.starts_with(['<', '>', '=', '!', '~', '^']);
            if !before.is_empty() && !before_is_bare_operator && rest_starts_with_operator {
                out.push(&clause[start..i]);
                start = i;
            }
        }
        i += 1;
    }
    out.push(&clause[start..]);
    out
}

fn split_operator(clause: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = clause.strip_prefix(op) {
            return (op, rest);
        }
    }
    if let Some(rest) = clause.strip_prefix('^') {
        return ("^", rest);
    }
    if let Some(rest) = clause.strip_prefix('~') {
        return ("~", rest);
    }
    if clause.starts_with(|c: char| c.is_ascii_digit()) || clause == "*" {
        return ("", clause);
    }
    ("?", clause)
}
