use crate::model::ScanReport;
use anyhow::Result;

pub fn print_json(report: &ScanReport) -> Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

pub fn render_json(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
