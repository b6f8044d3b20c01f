use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AdvisorySource, LookupError};
use crate::matcher::parse_version;
use crate::model::{Advisory, AffectedRange, PackageKey, RangeEnd, Severity};

pub const DEFAULT_OSV_URL: &str = "https://api.osv.dev";

/// Concurrent `GET /v1/vulns/{id}` requests made while hydrating one batch.
const HYDRATE_CONCURRENCY: usize = 8;

/// Advisory source backed by the OSV.dev API.
///
/// `querybatch` only returns vulnerability ids, so every distinct id in a
/// batch is then fetched in full. A record the service refuses to return is
/// skipped; a transient failure fails the whole batch so it can be retried.
/// The underlying HTTP client is shared by concurrent batches.
pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsvClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OSV_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Performs a batch query, following per-query pagination.
    /// Returns the vulnerability ids for each query, in query order.
    async fn query_ids(&self, batch: &[PackageKey]) -> Result<Vec<Vec<String>>, LookupError> {
        let mut ids: Vec<Vec<String>> = vec![Vec::new(); batch.len()];
        let mut pending: Vec<(usize, Option<String>)> = (0..batch.len()).map(|i| (i, None)).collect();

        while !pending.is_empty() {
            let queries = pending
                .iter()
                .map(|(idx, page_token)| {
                    let key = &batch[*idx];
                    OsvBatchQueryItem {
                        package: OsvPackage {
                            name: key.name.clone(),
                            ecosystem: key.ecosystem.as_str().to_string(),
                        },
                        version: key.version.clone(),
                        page_token: page_token.clone(),
                    }
                })
                .collect();

            let response = self
                .client
                .post(format!("{}/v1/querybatch", self.base_url))
                .json(&OsvBatchQuery { queries })
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(classify)?;

            let batch_response: OsvBatchResponse = response.json().await.map_err(classify)?;
            if batch_response.results.len() != pending.len() {
                return Err(LookupError::Permanent(format!(
                    "expected {} results, got {}",
                    pending.len(),
                    batch_response.results.len()
                )));
            }

            let mut next = Vec::new();
            for ((idx, _), result) in pending.iter().zip(batch_response.results) {
                ids[*idx].extend(result.vulns.unwrap_or_default().into_iter().map(|v| v.id));
                if let Some(token) = result.next_page_token {
                    next.push((*idx, Some(token)));
                }
            }
            pending = next;
        }

        Ok(ids)
    }

    async fn fetch_vuln(&self, id: &str) -> Result<OsvVuln, LookupError> {
        let response = self
            .client
            .get(format!("{}/v1/vulns/{}", self.base_url, id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(classify)?;

        response.json().await.map_err(classify)
    }
}

impl Default for OsvClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts a reqwest failure into retryable and non-retryable buckets.
fn classify(error: reqwest::Error) -> LookupError {
    if let Some(status) = error.status() {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return LookupError::Transient(format!("HTTP {}", status.as_u16()));
        }
        return LookupError::Permanent(format!("HTTP {}", status.as_u16()));
    }
    if error.is_decode() {
        return LookupError::Permanent(format!("invalid response: {}", error));
    }
    // Connection errors, timeouts, interrupted bodies.
    LookupError::Transient(error.to_string())
}

#[derive(Serialize, Clone)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

#[derive(Serialize)]
struct OsvBatchQuery {
    queries: Vec<OsvBatchQueryItem>,
}

#[derive(Serialize)]
struct OsvBatchQueryItem {
    package: OsvPackage,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Deserialize)]
struct OsvBatchResponse {
    #[serde(default)]
    results: Vec<OsvBatchResult>,
}

#[derive(Deserialize)]
struct OsvBatchResult {
    vulns: Option<Vec<OsvVulnRef>>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct OsvVulnRef {
    id: String,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    aliases: Vec<String>,
    summary: Option<String>,
    details: Option<String>,
    published: Option<DateTime<Utc>>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    database_specific: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    score: Option<String>,
}

#[derive(Deserialize)]
struct OsvAffected {
    package: Option<OsvAffectedPackage>,
    #[serde(default)]
    ranges: Vec<OsvRange>,
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Deserialize)]
struct OsvAffectedPackage {
    name: String,
    ecosystem: String,
}

#[derive(Deserialize)]
struct OsvRange {
    #[serde(rename = "type")]
    range_type: String,
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Deserialize)]
struct OsvEvent {
    introduced: Option<String>,
    fixed: Option<String>,
    last_affected: Option<String>,
    limit: Option<String>,
}

#[async_trait]
impl AdvisorySource for OsvClient {
    fn name(&self) -> &'static str {
        "OSV.dev"
    }

    async fn query_batch(&self, batch: &[PackageKey]) -> Result<Vec<Vec<Advisory>>, LookupError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.query_ids(batch).await?;
        let unique: BTreeSet<String> = ids.iter().flatten().cloned().collect();
        debug!(queries = batch.len(), vulns = unique.len(), "hydrating advisories");

        let fetched: Vec<(String, Result<OsvVuln, LookupError>)> = stream::iter(unique)
            .map(|id| async move {
                let result = self.fetch_vuln(&id).await;
                (id, result)
            })
            .buffer_unordered(HYDRATE_CONCURRENCY)
            .collect()
            .await;

        let mut by_id: HashMap<String, OsvVuln> = HashMap::with_capacity(fetched.len());
        for (id, result) in fetched {
            match result {
                Ok(vuln) => {
                    by_id.insert(id, vuln);
                }
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => warn!(vuln = %id, error = %e, "skipping advisory that could not be fetched"),
            }
        }

        Ok(batch
            .iter()
            .zip(&ids)
            .map(|(key, vuln_ids)| {
                vuln_ids
                    .iter()
                    .filter_map(|id| by_id.get(id.as_str()))
                    .map(|vuln| to_advisory(vuln, key))
                    .collect()
            })
            .collect())
    }
}

/// Narrows an OSV record to the ranges that concern `key`.
fn to_advisory(vuln: &OsvVuln, key: &PackageKey) -> Advisory {
    let mut advisory = Advisory::new(vuln.id.clone()).with_aliases(vuln.aliases.iter().cloned());
    advisory.summary = vuln
        .summary
        .clone()
        .or_else(|| vuln.details.as_ref().and_then(|d| d.lines().next().map(String::from)));
    advisory.published = vuln.published;
    advisory.severity = parse_severity(vuln);
    advisory.cwe_ids = vuln
        .database_specific
        .as_ref()
        .and_then(|db| db.get("cwe_ids"))
        .and_then(|ids| ids.as_array())
        .map(|ids| ids.iter().filter_map(|id| id.as_str().map(String::from)).collect())
        .unwrap_or_default();

    for affected in &vuln.affected {
        let Some(package) = &affected.package else {
            continue;
        };
        if package.ecosystem != key.ecosystem.as_str()
            || key.ecosystem.normalize_name(&package.name) != key.name
        {
            continue;
        }

        let mut has_ranges = false;
        for range in &affected.ranges {
            if range.range_type != "ECOSYSTEM" && range.range_type != "SEMVER" {
                continue;
            }
            has_ranges = true;
            for (affected_range, fixed) in ranges_from_events(&range.events) {
                advisory.affected_ranges.push(affected_range);
                if let Some(fixed) = fixed {
                    if !advisory.fixed_versions.contains(&fixed) {
                        advisory.fixed_versions.push(fixed);
                    }
                }
            }
        }

        // Enumerated versions only matter when no orderable ranges exist.
        if !has_ranges {
            advisory.affected_ranges.extend(
                affected
                    .versions
                    .iter()
                    .filter(|v| parse_version(key.ecosystem, v).is_some())
                    .map(AffectedRange::exact),
            );
        }
    }

    advisory
}

/// Turns an ordered OSV event list into intervals. The second element of each
/// pair is the fix that closes the interval, if it is closed by one.
/// Closing events with no open interval are dropped.
fn ranges_from_events(events: &[OsvEvent]) -> Vec<(AffectedRange, Option<String>)> {
    let mut ranges = Vec::new();
    let mut open: Option<Option<String>> = None;

    for event in events {
        if let Some(introduced) = &event.introduced {
            if let Some(lower) = open.take() {
                ranges.push((AffectedRange::new(lower, RangeEnd::Unbounded), None));
            }
            open = Some(if introduced == "0" {
                None
            } else {
                Some(introduced.clone())
            });
        } else if let Some(fixed) = &event.fixed {
            let Some(lower) = open.take() else {
                continue;
            };
            ranges.push((
                AffectedRange::new(lower, RangeEnd::Fixed(fixed.clone())),
                Some(fixed.clone()),
            ));
        } else if let Some(last) = &event.last_affected {
            let Some(lower) = open.take() else {
                continue;
            };
            ranges.push((
                AffectedRange::new(lower, RangeEnd::LastAffected(last.clone())),
                None,
            ));
        } else if let Some(limit) = &event.limit {
            if limit == "*" {
                continue;
            }
            let Some(lower) = open.take() else {
                continue;
            };
            ranges.push((AffectedRange::new(lower, RangeEnd::Fixed(limit.clone())), None));
        }
    }

    if let Some(lower) = open {
        ranges.push((AffectedRange::new(lower, RangeEnd::Unbounded), None));
    }

    ranges
}

/// Parses CVSS score into a severity level.
///
/// Supports both numeric scores and CVSS vector strings.
pub fn parse_cvss_score(score: &str) -> Severity {
    if let Ok(cvss) = score.parse::<f32>() {
        return match cvss {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Medium,
            s if s > 0.0 => Severity::Low,
            _ => Severity::Unknown,
        };
    }

    // Vector strings carry no base score; approximate from the impact metrics.
    if score.starts_with("CVSS:") {
        if score.contains("/C:H") || score.contains("/I:H") || score.contains("/A:H") {
            return Severity::High;
        }
        if score.contains("/C:L") || score.contains("/I:L") || score.contains("/A:L") {
            return Severity::Medium;
        }
        return Severity::Low;
    }

    Severity::Unknown
}

fn parse_severity(vuln: &OsvVuln) -> Severity {
    let from_scores = vuln
        .severity
        .iter()
        .filter_map(|s| s.score.as_deref())
        .map(parse_cvss_score)
        .find(|s| *s != Severity::Unknown);
    if let Some(severity) = from_scores {
        return severity;
    }

    // GitHub advisories label severity in database_specific.
    match vuln
        .database_specific
        .as_ref()
        .and_then(|db| db.get("severity"))
        .and_then(|s| s.as_str())
        .map(str::to_ascii_uppercase)
        .as_deref()
    {
        Some("CRITICAL") => Severity::Critical,
        Some("HIGH") => Severity::High,
        Some("MODERATE") | Some("MEDIUM") => Severity::Medium,
        Some("LOW") => Severity::Low,
        _ => Severity::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ecosystem;

    fn key(name: &str, version: &str) -> PackageKey {
        PackageKey {
            ecosystem: Ecosystem::PyPI,
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    fn event(kind: &str, version: &str) -> OsvEvent {
        let v = Some(version.to_string());
        OsvEvent {
            introduced: if kind == "introduced" { v.clone() } else { None },
            fixed: if kind == "fixed" { v.clone() } else { None },
            last_affected: if kind == "last_affected" { v.clone() } else { None },
            limit: if kind == "limit" { v } else { None },
        }
    }

    const REQUESTS_VULN: &str = r#"{
        "id": "GHSA-x84v-xcm2-53pg",
        "aliases": ["CVE-2018-18074", "PYSEC-2018-28"],
        "summary": "Insufficiently Protected Credentials in Requests",
        "published": "2018-10-29T19:06:46Z",
        "severity": [{"type": "CVSS_V3", "score": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N"}],
        "affected": [{
            "package": {"name": "requests", "ecosystem": "PyPI"},
            "ranges": [
                {"type": "GIT", "events": [{"introduced": "0"}, {"fixed": "c45d7c49ea75133e52ab22a8e9e13173938e36ff"}]},
                {"type": "ECOSYSTEM", "events": [{"introduced": "0"}, {"fixed": "2.20.0"}]}
            ],
            "versions": ["2.19.0", "2.19.1"]
        }, {
            "package": {"name": "other", "ecosystem": "PyPI"},
            "ranges": [{"type": "ECOSYSTEM", "events": [{"introduced": "1.0"}]}]
        }],
        "database_specific": {"cwe_ids": ["CWE-522"]}
    }"#;

    #[test]
    fn test_parse_cvss_score_numeric() {
        assert_eq!(parse_cvss_score("9.8"), Severity::Critical);
        assert_eq!(parse_cvss_score("7.0"), Severity::High);
        assert_eq!(parse_cvss_score("5.5"), Severity::Medium);
        assert_eq!(parse_cvss_score("0.1"), Severity::Low);
        assert_eq!(parse_cvss_score("0.0"), Severity::Unknown);
        assert_eq!(parse_cvss_score("n/a"), Severity::Unknown);
    }

    #[test]
    fn test_parse_cvss_vector() {
        assert_eq!(
            parse_cvss_score("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:N/I:H/A:N"),
            Severity::High
        );
        assert_eq!(
            parse_cvss_score("CVSS:3.1/AV:L/AC:H/PR:L/UI:R/S:U/C:L/I:N/A:N"),
            Severity::Medium
        );
        assert_eq!(
            parse_cvss_score("CVSS:3.1/AV:L/AC:H/PR:H/UI:R/S:U/C:N/I:N/A:N"),
            Severity::Low
        );
    }

    #[test]
    fn test_ranges_from_events() {
        let events = vec![
            event("introduced", "0"),
            event("fixed", "1.2.0"),
            event("introduced", "2.0.0"),
            event("last_affected", "2.3.0"),
            event("introduced", "3.0.0"),
        ];
        let ranges = ranges_from_events(&events);
        assert_eq!(
            ranges,
            vec![
                (
                    AffectedRange::new(None, RangeEnd::Fixed("1.2.0".into())),
                    Some("1.2.0".to_string())
                ),
                (
                    AffectedRange::new(Some("2.0.0".into()), RangeEnd::LastAffected("2.3.0".into())),
                    None
                ),
                (AffectedRange::new(Some("3.0.0".into()), RangeEnd::Unbounded), None),
            ]
        );
    }

    #[test]
    fn test_limit_closes_range_without_fix() {
        let ranges = ranges_from_events(&[event("introduced", "1.0"), event("limit", "1.5")]);
        assert_eq!(
            ranges,
            vec![(AffectedRange::new(Some("1.0".into()), RangeEnd::Fixed("1.5".into())), None)]
        );
    }

    #[test]
    fn test_closing_events_without_open_range_are_dropped() {
        let events = vec![
            event("introduced", "1.0"),
            event("fixed", "1.2"),
            event("fixed", "1.3"),
            event("last_affected", "1.4"),
            event("limit", "1.5"),
        ];
        assert_eq!(
            ranges_from_events(&events),
            vec![(
                AffectedRange::new(Some("1.0".into()), RangeEnd::Fixed("1.2".into())),
                Some("1.2".to_string())
            )]
        );
        assert!(ranges_from_events(&[event("fixed", "2.0")]).is_empty());
    }

    #[test]
    fn test_to_advisory_scopes_to_package() {
        let vuln: OsvVuln = serde_json::from_str(REQUESTS_VULN).unwrap();
        let advisory = to_advisory(&vuln, &key("requests", "2.19.0"));

        assert_eq!(advisory.id, "GHSA-x84v-xcm2-53pg");
        assert_eq!(advisory.aliases, vec!["CVE-2018-18074", "PYSEC-2018-28"]);
        assert_eq!(advisory.affected_ranges.len(), 1);
        assert_eq!(advisory.fixed_versions, vec!["2.20.0"]);
        assert_eq!(advisory.cwe_ids, vec!["CWE-522"]);
        assert_eq!(advisory.severity, Severity::High);
        assert!(advisory.published.is_some());

        let unrelated = to_advisory(&vuln, &key("flask", "1.0"));
        assert!(unrelated.affected_ranges.is_empty());
    }

    #[test]
    fn test_to_advisory_falls_back_to_versions() {
        let vuln: OsvVuln = serde_json::from_str(
            r#"{"id": "X-1", "affected": [{"package": {"name": "Zope.Interface", "ecosystem": "PyPI"},
                 "versions": ["1.0", "1.1", "not a version"]}],
                 "database_specific": {"severity": "MODERATE"}}"#,
        )
        .unwrap();
        let advisory = to_advisory(&vuln, &key("zope-interface", "1.0"));
        assert_eq!(
            advisory.affected_ranges,
            vec![AffectedRange::exact("1.0"), AffectedRange::exact("1.1")]
        );
        assert!(advisory.fixed_versions.is_empty());
        assert_eq!(advisory.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_query_batch_hydrates_vulns() {
        let mut server = mockito::Server::new_async().await;
        let _batch = server
            .mock("POST", "/v1/querybatch")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"vulns": [{"id": "GHSA-x84v-xcm2-53pg", "modified": "2024-01-01T00:00:00Z"}]},
                    {}
                ]}"#,
            )
            .create_async()
            .await;
        let _vuln = server
            .mock("GET", "/v1/vulns/GHSA-x84v-xcm2-53pg")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REQUESTS_VULN)
            .expect(1)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let results = client
            .query_batch(&[key("requests", "2.19.0"), key("six", "1.16.0")])
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].fixed_versions, vec!["2.20.0"]);
        assert!(results[1].is_empty());
        _vuln.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_batch_follows_next_page_token() {
        let mut server = mockito::Server::new_async().await;
        let _first = server
            .mock("POST", "/v1/querybatch")
            .match_body(mockito::Matcher::Regex(r#"^\{"queries":\[\{[^\]]*\},\{"#.to_string()))
            .with_status(200)
            .with_body(
                r#"{"results": [
                    {"vulns": [{"id": "A"}], "next_page_token": "page-2"},
                    {}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let _second = server
            .mock("POST", "/v1/querybatch")
            .match_body(mockito::Matcher::Regex(r#""page_token":"page-2""#.to_string()))
            .with_status(200)
            .with_body(r#"{"results": [{"vulns": [{"id": "B"}]}]}"#)
            .expect(1)
            .create_async()
            .await;
        let mut vuln_mocks = Vec::new();
        for id in ["A", "B"] {
            let mock = server
                .mock("GET", format!("/v1/vulns/{}", id).as_str())
                .with_status(200)
                .with_body(format!(
                    r#"{{"id": "{}", "affected": [{{"package": {{"name": "requests", "ecosystem": "PyPI"}},
                        "ranges": [{{"type": "ECOSYSTEM", "events": [{{"introduced": "0"}}, {{"fixed": "3.0"}}]}}]}}]}}"#,
                    id
                ))
                .create_async()
                .await;
            vuln_mocks.push(mock);
        }

        let client = OsvClient::with_base_url(server.url());
        let results = client
            .query_batch(&[key("requests", "2.19.0"), key("six", "1.16.0")])
            .await
            .unwrap();

        let ids: Vec<&str> = results[0].iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert!(results[1].is_empty());
        _first.assert_async().await;
        _second.assert_async().await;
    }

    #[tokio::test]
    async fn test_unfetchable_advisory_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let _batch = server
            .mock("POST", "/v1/querybatch")
            .with_status(200)
            .with_body(
                r#"{"results": [{"vulns": [{"id": "GHSA-x84v-xcm2-53pg"}, {"id": "WITHDRAWN-1"}]}]}"#,
            )
            .create_async()
            .await;
        let _ok = server
            .mock("GET", "/v1/vulns/GHSA-x84v-xcm2-53pg")
            .with_status(200)
            .with_body(REQUESTS_VULN)
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/v1/vulns/WITHDRAWN-1")
            .with_status(404)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let results = client.query_batch(&[key("requests", "2.19.0")]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].id, "GHSA-x84v-xcm2-53pg");
    }

    #[tokio::test]
    async fn test_transient_hydration_failure_fails_batch() {
        let mut server = mockito::Server::new_async().await;
        let _batch = server
            .mock("POST", "/v1/querybatch")
            .with_status(200)
            .with_body(r#"{"results": [{"vulns": [{"id": "GHSA-x84v-xcm2-53pg"}]}]}"#)
            .create_async()
            .await;
        let _vuln = server
            .mock("GET", "/v1/vulns/GHSA-x84v-xcm2-53pg")
            .with_status(502)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let err = client.query_batch(&[key("requests", "2.19.0")]).await.unwrap_err();
        assert_eq!(err, LookupError::Transient("HTTP 502".into()));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/querybatch")
            .with_status(503)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let err = client.query_batch(&[key("requests", "2.19.0")]).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_client_error_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/querybatch")
            .with_status(400)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let err = client.query_batch(&[key("requests", "2.19.0")]).await.unwrap_err();
        assert_eq!(err, LookupError::Permanent("HTTP 400".into()));
    }

    #[tokio::test]
    async fn test_mismatched_result_count_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/v1/querybatch")
            .with_status(200)
            .with_body(r#"{"results": []}"#)
            .create_async()
            .await;

        let client = OsvClient::with_base_url(server.url());
        let err = client.query_batch(&[key("requests", "2.19.0")]).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_osv_client_default() {
        let client = OsvClient::default();
        assert_eq!(client.name(), "OSV.dev");
        assert_eq!(client.base_url, DEFAULT_OSV_URL);
    }
}
