use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upper end of an affected interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "version")]
pub enum RangeEnd {
    /// Exclusive: the named version is no longer affected.
    Fixed(String),
    /// Inclusive: the named version is the last one affected.
    LastAffected(String),
    Unbounded,
}

/// One interval of affected versions for a single package.
///
/// `introduced: None` means every version below the end is affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRange {
    pub introduced: Option<String>,
    pub end: RangeEnd,
}

impl AffectedRange {
    pub fn new(introduced: Option<String>, end: RangeEnd) -> Self {
        Self { introduced, end }
    }

    /// A range covering exactly one version.
    pub fn exact(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            introduced: Some(version.clone()),
            end: RangeEnd::LastAffected(version),
        }
    }
}

/// A vulnerability record scoped to the ecosystem+package it was looked up for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub id: String,
    pub aliases: Vec<String>,
    pub affected_ranges: Vec<AffectedRange>,
    pub fixed_versions: Vec<String>,
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub cwe_ids: Vec<String>,
    pub severity: Severity,
}

impl Advisory {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            aliases: Vec::new(),
            affected_ranges: Vec::new(),
            fixed_versions: Vec::new(),
            summary: None,
            published: None,
            cwe_ids: Vec::new(),
            severity: Severity::Unknown,
        }
    }

    pub fn with_range(mut self, range: AffectedRange) -> Self {
        if let RangeEnd::Fixed(fixed) = &range.end {
            if !self.fixed_versions.contains(fixed) {
                self.fixed_versions.push(fixed.clone());
            }
        }
        self.affected_ranges.push(range);
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// True if `id` names this advisory directly or through one of its aliases.
    pub fn is_known_as(&self, id: &str) -> bool {
        self.id == id || self.aliases.iter().any(|a| a == id)
    }
}
