use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a whole scan.
///
/// Everything else degrades to a [`ScanWarning`](crate::model::ScanWarning)
/// attached to an otherwise successful report.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid input: {} {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("unsupported manifest: {}", .0.display())]
    UnsupportedManifest(PathBuf),

    #[error("scan cancelled before completion")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single manifest could not be extracted.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Malformed(String),
}
