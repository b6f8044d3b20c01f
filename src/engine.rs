//! Scan orchestration.
//!
//! [`ScanEngine::scan`] runs the whole pipeline for one input location:
//! manifest extraction, de-duplicated advisory lookups fanned out in bounded
//! batches, version matching, and deterministic aggregation into a
//! [`ScanReport`].

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::advisory::{with_retry, AdvisorySource, LookupError, OsvClient, RetryPolicy};
use crate::config::{Config, IgnoreConfig};
use crate::error::ScanError;
use crate::manifest::{self, DiscoveryOptions};
use crate::matcher;
use crate::model::{Advisory, DeclaredPackage, PackageKey, ScanReport, ScanWarning, VulnerablePackage};

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub path: PathBuf,
    pub is_directory: bool,
    /// The path is a checkout of a remote repository. Only changes which
    /// manifests are read, never how versions are matched.
    pub is_remote_origin: bool,
}

impl ScanRequest {
    pub fn new(path: impl Into<PathBuf>, is_directory: bool, is_remote_origin: bool) -> Self {
        Self {
            path: path.into(),
            is_directory,
            is_remote_origin,
        }
    }
}

/// Drives a scan against an [`AdvisorySource`].
///
/// The engine holds no per-scan state and can run several scans at once.
pub struct ScanEngine {
    source: Arc<dyn AdvisorySource>,
    batch_size: usize,
    max_in_flight: usize,
    request_timeout: Duration,
    scan_timeout: Option<Duration>,
    retry: RetryPolicy,
    ignore: IgnoreConfig,
}

type BatchOutcome = (usize, Result<Vec<Vec<Advisory>>, LookupError>);

impl ScanEngine {
    /// An engine backed by OSV.dev at `config.osv_url`.
    pub fn new(config: &Config) -> Self {
        Self::with_source(config, Arc::new(OsvClient::with_base_url(&config.osv_url)))
    }

    pub fn with_source(config: &Config, source: Arc<dyn AdvisorySource>) -> Self {
        Self {
            source,
            batch_size: config.batch_size.max(1),
            max_in_flight: config.max_in_flight.max(1),
            request_timeout: config.request_timeout(),
            scan_timeout: config.scan_timeout(),
            retry: config.retry_policy(),
            ignore: config.ignore.clone(),
        }
    }

    /// Scans one file or directory tree.
    ///
    /// Returns [`ScanError::Cancelled`] if `cancel` fires or the configured
    /// scan timeout elapses first; findings gathered up to that point are
    /// discarded.
    pub async fn scan(
        &self,
        request: ScanRequest,
        cancel: CancellationToken,
    ) -> Result<ScanReport, ScanError> {
        let work = async {
            match self.scan_timeout {
                Some(limit) => tokio::time::timeout(limit, self.run(request))
                    .await
                    .unwrap_or_else(|_| {
                        warn!(timeout_secs = limit.as_secs(), "scan timed out");
                        Err(ScanError::Cancelled)
                    }),
                None => self.run(request).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("scan cancelled");
                Err(ScanError::Cancelled)
            }
            result = work => result,
        }
    }

    async fn run(&self, request: ScanRequest) -> Result<ScanReport, ScanError> {
        let options = DiscoveryOptions {
            prefer_lockfiles: request.is_remote_origin,
        };
        let ScanRequest {
            path, is_directory, ..
        } = request;

        let extraction = tokio::task::spawn_blocking(move || {
            if path.exists() && path.is_dir() != is_directory {
                return Err(ScanError::InvalidInput {
                    reason: if is_directory {
                        "expected a directory".to_string()
                    } else {
                        "expected a file".to_string()
                    },
                    path,
                });
            }
            manifest::extract(&path, options)
        })
        .await
        .map_err(|e| ScanError::Io(io::Error::other(e)))??;

        let packages = extraction.packages;
        let mut warnings = extraction.warnings;

        let mut occurrences: BTreeMap<PackageKey, Vec<usize>> = BTreeMap::new();
        for (idx, package) in packages.iter().enumerate() {
            if self.ignore.should_ignore_package(&package.name) {
                debug!(package = %package.name, "ignored by configuration");
                continue;
            }
            match package.key() {
                Some(key) => occurrences.entry(key).or_default().push(idx),
                None => warnings.push(ScanWarning::UnresolvedVersion {
                    path: package.source_path.clone(),
                    name: package.name.clone(),
                    requirement: package.requirement.clone().unwrap_or_else(|| "*".to_string()),
                }),
            }
        }

        let keys: Vec<PackageKey> = occurrences.keys().cloned().collect();
        debug!(
            manifests = extraction.manifests.len(),
            declarations = packages.len(),
            unique = keys.len(),
            "extraction complete"
        );

        let batches: Vec<Vec<PackageKey>> = keys.chunks(self.batch_size).map(<[_]>::to_vec).collect();
        let outcomes = self.lookup(&batches).await?;

        let mut findings = Vec::new();
        for (batch, outcome) in batches.iter().zip(outcomes) {
            let advisories = match outcome {
                Ok(advisories) => advisories,
                Err(e) => {
                    warn!(source = self.source.name(), size = batch.len(), error = %e, "batch lookup failed");
                    warnings.extend(batch.iter().map(|key| ScanWarning::LookupFailed {
                        ecosystem: key.ecosystem,
                        name: key.name.clone(),
                        version: key.version.clone(),
                        reason: e.to_string(),
                    }));
                    continue;
                }
            };

            for (key, advisories) in batch.iter().zip(advisories) {
                let advisories: Vec<Advisory> = advisories
                    .into_iter()
                    .filter(|advisory| {
                        let ignored = self.ignore.should_ignore_advisory(advisory);
                        if ignored {
                            debug!(package = %key.name, vuln = %advisory.id, "advisory ignored by configuration");
                        }
                        !ignored
                    })
                    .collect();
                let declared = occurrences.get(key).map(Vec::as_slice).unwrap_or_default();
                findings.extend(match_key(key, &advisories, declared, &packages, &mut warnings));
            }
        }

        findings.sort_by(|a, b| {
            (&a.pkg_name, &a.path, &a.vuln_id, &a.vuln_version)
                .cmp(&(&b.pkg_name, &b.path, &b.vuln_id, &b.vuln_version))
        });
        warnings.sort();
        warnings.dedup();

        info!(
            manifests = extraction.manifests.len(),
            packages = keys.len(),
            findings = findings.len(),
            warnings = warnings.len(),
            "scan complete"
        );

        Ok(ScanReport {
            findings,
            warnings,
            manifests_scanned: extraction.manifests.len(),
            packages_checked: keys.len(),
        })
    }

    /// Queries every batch with at most `max_in_flight` requests outstanding.
    ///
    /// Results come back in batch order regardless of completion order.
    async fn lookup(
        &self,
        batches: &[Vec<PackageKey>],
    ) -> Result<Vec<Result<Vec<Vec<Advisory>>, LookupError>>, ScanError> {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut tasks: JoinSet<BatchOutcome> = JoinSet::new();

        for (index, batch) in batches.iter().enumerate() {
            // Blocks submission until a slot frees up.
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| ScanError::Cancelled)?;
            let source = Arc::clone(&self.source);
            let batch = batch.clone();
            let policy = self.retry;
            let timeout = self.request_timeout;

            tasks.spawn(async move {
                let _permit = permit;
                debug!(batch = index, size = batch.len(), "querying advisories");
                let operation = format!("{} batch {}", source.name(), index);
                let result = with_retry(&policy, Some(timeout), &operation, || {
                    source.query_batch(&batch)
                })
                .await
                .and_then(|advisories| {
                    if advisories.len() == batch.len() {
                        Ok(advisories)
                    } else {
                        Err(LookupError::Permanent(format!(
                            "expected {} results, got {}",
                            batch.len(),
                            advisories.len()
                        )))
                    }
                });
                (index, result)
            });
        }

        let mut outcomes: Vec<Option<Result<Vec<Vec<Advisory>>, LookupError>>> =
            (0..batches.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| ScanError::Io(io::Error::other(e)))?;
            outcomes[index] = Some(result);
        }

        Ok(outcomes
            .into_iter()
            .map(|o| o.unwrap_or_else(|| Err(LookupError::Permanent("lookup did not run".to_string()))))
            .collect())
    }
}

/// Matches one looked-up key against its advisories, producing a finding for
/// every occurrence that declared it.
fn match_key(
    key: &PackageKey,
    advisories: &[Advisory],
    declared: &[usize],
    packages: &[DeclaredPackage],
    warnings: &mut Vec<ScanWarning>,
) -> Vec<VulnerablePackage> {
    let mut findings = Vec::new();
    let mut seen = HashSet::new();

    for advisory in advisories {
        if !seen.insert(advisory.id.as_str()) {
            continue;
        }
        let Some(hit) = matcher::evaluate(key.ecosystem, &key.version, advisory) else {
            continue;
        };

        for &idx in declared {
            let package = &packages[idx];
            if hit.unverified {
                warnings.push(ScanWarning::Unverified {
                    path: package.source_path.clone(),
                    name: package.name.clone(),
                    version: key.version.clone(),
                    vuln_id: advisory.id.clone(),
                });
            }
            findings.push(VulnerablePackage::from_match(
                package,
                &key.version,
                advisory,
                hit.fixed_version.clone(),
                hit.unverified,
            ));
        }
    }

    findings
}
