//! Advisory lookups.
//!
//! [`AdvisorySource`] is the seam between the scan engine and the service
//! that knows about vulnerabilities. [`OsvClient`] talks to OSV.dev; tests
//! substitute their own implementation.

mod osv;
mod retry;

pub use osv::{parse_cvss_score, OsvClient, DEFAULT_OSV_URL};
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Advisory, PackageKey};

/// Why a batch lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Network trouble, server errors, rate limiting, timeouts. Worth retrying.
    #[error("transient lookup failure: {0}")]
    Transient(String),
    /// The request itself is wrong; retrying cannot help.
    #[error("lookup rejected: {0}")]
    Permanent(String),
}

impl LookupError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Transient(_))
    }
}

#[async_trait]
pub trait AdvisorySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Looks up every package in `batch`.
    ///
    /// Returns exactly one entry per query, in query order; an empty entry
    /// means no advisories are known for that package version.
    async fn query_batch(&self, batch: &[PackageKey]) -> Result<Vec<Vec<Advisory>>, LookupError>;
}
