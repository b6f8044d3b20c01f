//! Core data types for declared packages, advisories, and scan results.
//!
//! This module contains the fundamental types used throughout depwatch:
//!
//! - [`DeclaredPackage`] - A dependency declaration found in a manifest
//! - [`Ecosystem`] - The package registry a name/version pair belongs to
//! - [`Advisory`] - A vulnerability record from the advisory source
//! - [`VulnerablePackage`] - A single finding
//! - [`ScanReport`] - Findings plus non-fatal warnings
//!
//! # Example
//!
//! ```
//! use depwatch::{DeclaredPackage, Ecosystem, ScanReport};
//!
//! let package = DeclaredPackage::new("requests", Some("2.19.0".into()), Ecosystem::PyPI, "requirements.txt");
//! let report = ScanReport::default();
//!
//! assert_eq!(package.key().unwrap().name, "requests");
//! assert!(report.is_clean());
//! ```

mod advisory;
mod finding;
mod package;
mod report;

pub use advisory::*;
pub use finding::*;
pub use package::*;
pub use report::*;
