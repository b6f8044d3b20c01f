pub mod advisory;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod model;
pub mod output;
pub mod remote;

pub use advisory::{AdvisorySource, OsvClient};
pub use config::Config;
pub use engine::{ScanEngine, ScanRequest};
pub use error::ScanError;
pub use model::{Advisory, DeclaredPackage, Ecosystem, ScanReport, ScanWarning, VulnerablePackage};
