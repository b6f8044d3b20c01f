use std::str::FromStr;

use crate::model::Ecosystem;

/// A version ordered under the rules of the ecosystem it came from.
///
/// Values from different ecosystems are never compared with each other; the
/// variant order only exists so the type can be `Ord`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EcosystemVersion {
    /// PEP 440: epoch, release (trailing zeros insignificant), pre, post, dev, local.
    Pep440(pep440_rs::Version),
    SemVer(semver::Version),
}

/// Parses a version string under the ordering rules of `ecosystem`.
///
/// Returns `None` for strings the ecosystem cannot order.
pub fn parse_version(ecosystem: Ecosystem, raw: &str) -> Option<EcosystemVersion> {
    let raw = raw.trim();
    match ecosystem {
        Ecosystem::PyPI => {
            let raw = raw.strip_prefix(['v', 'V']).unwrap_or(raw);
            pep440_rs::Version::from_str(raw)
                .ok()
                .map(EcosystemVersion::Pep440)
        }
        Ecosystem::CratesIo | Ecosystem::Npm => {
            semver::Version::parse(raw.trim_start_matches('=').trim_start_matches('v'))
                .ok()
                .map(EcosystemVersion::SemVer)
        }
    }
}
