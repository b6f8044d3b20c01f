//! Configuration file handling.
//!
//! This module provides loading and saving of depwatch configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/depwatch/config.toml`
//! - macOS: `~/Library/Application Support/depwatch/config.toml`
//! - Windows: `%APPDATA%\depwatch\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! osv_url = "https://api.osv.dev"
//! batch_size = 100
//! max_in_flight = 4
//! request_timeout_secs = 30
//! scan_timeout_secs = 300
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 500
//! max_delay_ms = 8000
//! jitter = true
//!
//! [ignore]
//! packages = ["lodash", "@types/*"]
//! vulnerabilities = ["CVE-2021-12345"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::advisory::{RetryPolicy, DEFAULT_OSV_URL};
use crate::error::ScanError;
use crate::model::Advisory;

/// Application configuration.
///
/// Every field has a default, so a partial file (or none at all) is valid.
///
/// # Example
///
/// ```no_run
/// use depwatch::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Batch size: {}", config.batch_size);
/// println!("In flight: {}", config.max_in_flight);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the OSV API.
    ///
    /// Default: `https://api.osv.dev`
    pub osv_url: String,

    /// Package versions sent per advisory query.
    ///
    /// Default: 100
    pub batch_size: usize,

    /// Advisory queries allowed in flight at once.
    ///
    /// Default: 4
    pub max_in_flight: usize,

    /// Timeout for a single advisory query, in seconds.
    ///
    /// Default: 30
    pub request_timeout_secs: u64,

    /// Wall-clock limit for a whole scan, in seconds. Unlimited when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_timeout_secs: Option<u64>,

    /// Backoff for transient lookup failures.
    pub retry: RetryConfig,

    /// Ignore list configuration for suppressing known issues.
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
            jitter: true,
        }
    }
}

/// Configuration for ignoring specific packages or vulnerabilities.
///
/// Use this to suppress known false positives or accepted risks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to drop from findings.
    ///
    /// Supports glob patterns (e.g., "lodash*", "@types/*").
    pub packages: Vec<String>,

    /// Vulnerability IDs to ignore (e.g., "CVE-2021-12345", "GHSA-xxxx").
    ///
    /// An advisory is ignored when its id or any of its aliases is listed.
    pub vulnerabilities: Vec<String>,
}

impl IgnoreConfig {
    /// Check if a package should be ignored.
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    /// Check if an advisory should be ignored, by its id or any alias.
    pub fn should_ignore_advisory(&self, advisory: &Advisory) -> bool {
        self.vulnerabilities.iter().any(|id| advisory.is_known_as(id))
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            osv_url: DEFAULT_OSV_URL.to_string(),
            batch_size: 100,
            max_in_flight: 4,
            request_timeout_secs: 30,
            scan_timeout_secs: None,
            retry: RetryConfig::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.batch_size == 0 {
            return Err(ScanError::Config("batch_size must be at least 1".to_string()));
        }
        if self.max_in_flight == 0 {
            return Err(ScanError::Config("max_in_flight must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ScanError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.scan_timeout_secs == Some(0) {
            return Err(ScanError::Config("scan_timeout_secs must be at least 1".to_string()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ScanError::Config(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        if !self.osv_url.starts_with("http://") && !self.osv_url.starts_with("https://") {
            return Err(ScanError::Config(format!(
                "osv_url must be an http(s) URL, got '{}'",
                self.osv_url
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry.max_retries,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            jitter: self.retry.jitter,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs.map(Duration::from_secs)
    }

    /// Saves the configuration to the default config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use depwatch::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("depwatch/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depwatch")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
