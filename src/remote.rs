//! Fetching a remote repository onto local disk before a scan.
//!
//! Only `github.com` and `gitlab.com` URLs are recognised. The checkout is a
//! shallow clone into a temporary directory that is removed when the returned
//! [`Checkout`] is dropped.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https://|http://|www\.|git@)(github|gitlab)\.com(/[\w.-]+){2,}$")
        .expect("repository URL pattern is valid")
});

/// True if `input` looks like a GitHub or GitLab repository URL.
pub fn is_remote_url(input: &str) -> bool {
    REPO_URL.is_match(input)
}

/// Repository name: the last URL segment without a `.git` suffix.
pub fn repo_name(url: &str) -> &str {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last)
}

/// Something `git clone` accepts for a URL that [`is_remote_url`] matched.
fn clone_url(url: &str) -> String {
    if url.starts_with("www.") {
        return format!("https://{}", url);
    }
    if let Some(rest) = url.strip_prefix("git@") {
        // git@github.com/owner/repo -> git@github.com:owner/repo
        if let Some((host, path)) = rest.split_once('/') {
            return format!("git@{}:{}", host, path);
        }
    }
    url.to_string()
}

/// A shallow clone living in a temporary directory.
pub struct Checkout {
    dir: TempDir,
    name: String,
}

impl Checkout {
    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Clones `url` with `git clone --depth 1`.
///
/// # Errors
///
/// Fails if git is not installed or the clone does not succeed.
pub async fn clone_repository(url: &str) -> Result<Checkout> {
    let dir = tempfile::Builder::new()
        .prefix("depwatch-")
        .tempdir()
        .context("Failed to create a temporary directory")?;
    let source = clone_url(url);
    debug!(url = %source, dest = %dir.path().display(), "cloning repository");

    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet"])
        .arg(&source)
        .arg(dir.path())
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await
        .context("Failed to execute git. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone of {} failed: {}", url, stderr.trim());
    }

    Ok(Checkout {
        dir,
        name: repo_name(url).to_string(),
    })
}
