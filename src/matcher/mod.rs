//! Version membership checks against advisory ranges.
//!
//! The matcher answers two questions for one declared version and one
//! [`Advisory`]: is the version inside any affected range, and which fixed
//! version is the smallest upgrade that resolves it.
//!
//! Versions that cannot be ordered under the ecosystem's rules are treated as
//! affected, and the match is flagged as unverified.
//!
//! # Example
//!
//! ```
//! use depwatch::matcher::evaluate;
//! use depwatch::model::{Advisory, AffectedRange, Ecosystem, RangeEnd};
//!
//! let advisory = Advisory::new("GHSA-xxxx").with_range(AffectedRange::new(
//!     Some("1.0.0".into()),
//!     RangeEnd::Fixed("2.0.0".into()),
//! ));
//!
//! let hit = evaluate(Ecosystem::PyPI, "1.4.0", &advisory).unwrap();
//! assert_eq!(hit.fixed_version.as_deref(), Some("2.0.0"));
//! assert!(!hit.unverified);
//!
//! assert!(evaluate(Ecosystem::PyPI, "2.0.0", &advisory).is_none());
//! ```

mod constraint;
mod version;

pub use constraint::resolve_python_constraint;
pub use version::{parse_version, EcosystemVersion};

use crate::model::{Advisory, AffectedRange, Ecosystem, RangeEnd};

/// Outcome of checking one version against one advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    NotAffected,
    Affected,
    /// Some comparison needed to decide could not be made.
    Unverified,
}

/// A positive match and its remediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub fixed_version: Option<String>,
    pub unverified: bool,
}

/// Decides whether `version` is affected by `advisory` and, if so, which
/// fixed version resolves it.
pub fn evaluate(ecosystem: Ecosystem, version: &str, advisory: &Advisory) -> Option<Match> {
    let unverified = match membership(ecosystem, version, &advisory.affected_ranges) {
        Membership::NotAffected => return None,
        Membership::Affected => false,
        Membership::Unverified => true,
    };

    Some(Match {
        fixed_version: select_fixed_version(ecosystem, version, &advisory.fixed_versions),
        unverified,
    })
}

pub fn membership(ecosystem: Ecosystem, version: &str, ranges: &[AffectedRange]) -> Membership {
    if ranges.is_empty() {
        return Membership::NotAffected;
    }

    let Some(parsed) = parse_version(ecosystem, version) else {
        return Membership::Unverified;
    };

    let mut undecided = false;
    for range in ranges {
        match range_contains(ecosystem, range, &parsed) {
            Some(true) => return Membership::Affected,
            Some(false) => {}
            None => undecided = true,
        }
    }

    if undecided {
        Membership::Unverified
    } else {
        Membership::NotAffected
    }
}

/// `None` when a bound needed for the decision does not parse.
fn range_contains(
    ecosystem: Ecosystem,
    range: &AffectedRange,
    version: &EcosystemVersion,
) -> Option<bool> {
    let above_lower = match range.introduced.as_deref() {
        None | Some("0") => Some(true),
        Some(introduced) => parse_version(ecosystem, introduced).map(|lower| *version >= lower),
    };
    if above_lower == Some(false) {
        return Some(false);
    }

    let below_upper = match &range.end {
        RangeEnd::Unbounded => Some(true),
        RangeEnd::Fixed(fixed) => parse_version(ecosystem, fixed).map(|upper| *version < upper),
        RangeEnd::LastAffected(last) => {
            parse_version(ecosystem, last).map(|upper| *version <= upper)
        }
    };
    if below_upper == Some(false) {
        return Some(false);
    }

    match (above_lower, below_upper) {
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Smallest fixed version strictly greater than `version`.
///
/// When `version` itself cannot be ordered, the greatest known fix is the
/// only one guaranteed to clear every range.
pub fn select_fixed_version(ecosystem: Ecosystem, version: &str, fixed: &[String]) -> Option<String> {
    let mut candidates: Vec<(EcosystemVersion, &String)> = fixed
        .iter()
        .filter_map(|f| parse_version(ecosystem, f).map(|parsed| (parsed, f)))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    match parse_version(ecosystem, version) {
        Some(current) => candidates
            .into_iter()
            .find(|(candidate, _)| *candidate > current)
            .map(|(_, raw)| raw.clone()),
        None => candidates.pop().map(|(_, raw)| raw.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_range(introduced: Option<&str>, fixed: &str) -> AffectedRange {
        AffectedRange::new(introduced.map(String::from), RangeEnd::Fixed(fixed.to_string()))
    }

    #[test]
    fn test_half_open_interval() {
        let ranges = vec![fixed_range(Some("1.0.0"), "2.0.0")];
        assert_eq!(membership(Ecosystem::PyPI, "0.9", &ranges), Membership::NotAffected);
        assert_eq!(membership(Ecosystem::PyPI, "1.0.0", &ranges), Membership::Affected);
        assert_eq!(membership(Ecosystem::PyPI, "1.9.9", &ranges), Membership::Affected);
        assert_eq!(membership(Ecosystem::PyPI, "2.0.0", &ranges), Membership::NotAffected);
    }

    #[test]
    fn test_last_affected_is_inclusive() {
        let ranges = vec![AffectedRange::new(
            Some("0".into()),
            RangeEnd::LastAffected("1.5.0".into()),
        )];
        assert_eq!(membership(Ecosystem::Npm, "1.5.0", &ranges), Membership::Affected);
        assert_eq!(membership(Ecosystem::Npm, "1.5.1", &ranges), Membership::NotAffected);
    }

    #[test]
    fn test_unbounded_and_exact_ranges() {
        let ranges = vec![
            AffectedRange::new(Some("3.0.0".into()), RangeEnd::Unbounded),
            AffectedRange::exact("1.2.3"),
        ];
        assert_eq!(membership(Ecosystem::CratesIo, "1.2.3", &ranges), Membership::Affected);
        assert_eq!(membership(Ecosystem::CratesIo, "1.2.4", &ranges), Membership::NotAffected);
        assert_eq!(membership(Ecosystem::CratesIo, "9.0.0", &ranges), Membership::Affected);
    }

    #[test]
    fn test_prerelease_precedence() {
        let ranges = vec![fixed_range(None, "2.0.0")];
        assert_eq!(membership(Ecosystem::PyPI, "2.0.0rc1", &ranges), Membership::Affected);
        assert_eq!(membership(Ecosystem::Npm, "2.0.0-beta.2", &ranges), Membership::Affected);
    }

    #[test]
    fn test_pep440_post_and_dev_releases_inside_ranges() {
        let below_fourth_segment = vec![fixed_range(Some("0"), "1.2.3.4")];
        assert_eq!(
            membership(Ecosystem::PyPI, "1.2.3.post1", &below_fourth_segment),
            Membership::Affected
        );

        let patch_window = vec![fixed_range(Some("1.0"), "1.0.1")];
        assert_eq!(
            membership(Ecosystem::PyPI, "1.0.post1.dev1", &patch_window),
            Membership::Affected
        );
        assert_eq!(
            membership(Ecosystem::PyPI, "1.0a1.dev1", &patch_window),
            Membership::NotAffected
        );
    }

    #[test]
    fn test_no_ranges_never_matches() {
        assert_eq!(membership(Ecosystem::PyPI, "garbage", &[]), Membership::NotAffected);
        assert!(evaluate(Ecosystem::PyPI, "1.0", &Advisory::new("X")).is_none());
    }

    #[test]
    fn test_unparsable_versions_are_conservative() {
        let ranges = vec![fixed_range(Some("1.0"), "2.0")];
        assert_eq!(membership(Ecosystem::PyPI, "not-a-version", &ranges), Membership::Unverified);

        let odd_bound = vec![fixed_range(Some("1.0"), "2.0-final-final")];
        assert_eq!(membership(Ecosystem::PyPI, "1.5", &odd_bound), Membership::Unverified);
        // A parsable bound that excludes the version still decides.
        assert_eq!(membership(Ecosystem::PyPI, "0.5", &odd_bound), Membership::NotAffected);
    }

    #[test]
    fn test_select_smallest_fix_above_version() {
        let fixed = vec!["3.0.0".to_string(), "1.2.5".to_string(), "2.1.0".to_string()];
        assert_eq!(
            select_fixed_version(Ecosystem::PyPI, "1.3.0", &fixed),
            Some("2.1.0".to_string())
        );
        assert_eq!(
            select_fixed_version(Ecosystem::PyPI, "1.0", &fixed),
            Some("1.2.5".to_string())
        );
        assert_eq!(select_fixed_version(Ecosystem::PyPI, "3.0.0", &fixed), None);
        assert_eq!(select_fixed_version(Ecosystem::PyPI, "1.0", &[]), None);
    }

    #[test]
    fn test_select_fix_for_unparsable_version() {
        let fixed = vec!["1.2.5".to_string(), "2.1.0".to_string()];
        assert_eq!(
            select_fixed_version(Ecosystem::PyPI, "dev-build", &fixed),
            Some("2.1.0".to_string())
        );
    }

    #[test]
    fn test_evaluate_reports_unverified() {
        let advisory = Advisory::new("PYSEC-1").with_range(fixed_range(Some("1.0"), "1.1"));
        let hit = evaluate(Ecosystem::PyPI, "weird", &advisory).unwrap();
        assert!(hit.unverified);
        assert_eq!(hit.fixed_version.as_deref(), Some("1.1"));
    }
}
