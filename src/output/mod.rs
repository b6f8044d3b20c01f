mod cli;
mod json;

pub use cli::{print_cli_table, render_table};
pub use json::{print_json, render_json};

use crate::model::ScanReport;
use anyhow::Result;

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

pub fn print_report(report: &ScanReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print_cli_table(report),
        OutputFormat::Json => print_json(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("TABLE"), Ok(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("json"), Ok(OutputFormat::Json));
        assert!(OutputFormat::from_str("sarif").is_err());
    }
}
