use crate::model::{ScanReport, ScanWarning, Severity};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Fixed In")]
    fixed_in: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Aliases")]
    aliases: String,
    #[tabled(rename = "Location")]
    location: String,
}

#[derive(Tabled)]
struct WarningRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!("{}", render_table(report, true));
    Ok(())
}

/// Renders findings, warnings and a summary. `color` adds ANSI severity colors.
pub fn render_table(report: &ScanReport, color: bool) -> String {
    let mut out = String::new();

    if report.findings.is_empty() {
        out.push_str("No vulnerable packages found.\n");
    } else {
        out.push_str(&format!(
            "Found {} vulnerable package{}:\n\n",
            report.findings.len(),
            if report.findings.len() == 1 { "" } else { "s" }
        ));

        let rows: Vec<FindingRow> = report
            .findings
            .iter()
            .map(|f| FindingRow {
                severity: format_severity(&f.severity, color),
                package: truncate(&f.pkg_name, 40),
                version: if f.unverified {
                    format!("{} (unverified)", f.vuln_version)
                } else {
                    f.vuln_version.clone()
                },
                fixed_in: f.fixed_version_display().to_string(),
                id: f.vuln_id.clone(),
                aliases: if f.vuln_aliases.is_empty() {
                    "-".to_string()
                } else {
                    truncate(&f.vuln_aliases.join(", "), 40)
                },
                location: f.path.display().to_string(),
            })
            .collect();

        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    if !report.warnings.is_empty() {
        out.push_str(&format!("\n{} warning(s):\n\n", report.warnings.len()));
        let rows: Vec<WarningRow> = report
            .warnings
            .iter()
            .map(|w| WarningRow {
                kind: warning_kind(w),
                detail: w.to_string(),
            })
            .collect();
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&summary(report));
    out
}

fn summary(report: &ScanReport) -> String {
    let count = |severity: Severity| report.findings.iter().filter(|f| f.severity == severity).count();

    let mut out = String::from("Summary:\n");
    out.push_str(&format!("  Manifests scanned: {}\n", report.manifests_scanned));
    out.push_str(&format!("  Packages checked: {}\n", report.packages_checked));
    if !report.findings.is_empty() {
        out.push_str(&format!(
            "  Vulnerabilities: {} critical, {} high, {} medium, {} low, {} unknown\n",
            count(Severity::Critical),
            count(Severity::High),
            count(Severity::Medium),
            count(Severity::Low),
            count(Severity::Unknown),
        ));
    }
    out
}

fn warning_kind(warning: &ScanWarning) -> &'static str {
    match warning {
        ScanWarning::ManifestParse { .. } => "parse",
        ScanWarning::UnresolvedVersion { .. } => "unresolved",
        ScanWarning::LookupFailed { .. } => "lookup",
        ScanWarning::Unverified { .. } => "unverified",
    }
}

fn format_severity(severity: &Severity, color: bool) -> String {
    if !color {
        return severity.as_str().to_uppercase();
    }
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Unknown => "UNKNOWN".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
