//! Plain text formatter.

use crate::analyzer::catalog::CheckSpec;
use crate::analyzer::types::{Report, Severity};
use colored::Colorize;

fn severity_label(severity: Severity, color: bool) -> String {
    let label = format!("[{}]", severity);
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.blue().to_string(),
    }
}

/// Format a report as plain text.
pub fn format(report: &Report, color: bool) -> String {
    let mut output = String::new();

    output.push_str("kube-audit\n");
    output.push_str(&format!("API Server: {}\n", report.cluster.api_server));
    if let Some(version) = &report.cluster.server_version {
        output.push_str(&format!("Kubernetes: {}\n", version));
    }
    output.push_str(&format!(
        "Generated: {}\n\n",
        report
            .generated_at
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    ));

    let counts: Vec<String> = Severity::ALL
        .iter()
        .map(|s| format!("{}={}", s, report.summary.get(s).copied().unwrap_or(0)))
        .collect();
    output.push_str(&format!("Summary: {}\n\n", counts.join(" ")));

    for finding in &report.findings {
        output.push_str(&format!(
            "{} {} {}\n",
            severity_label(finding.severity, color),
            finding.check_id,
            finding.title
        ));
        output.push_str(&format!("  Resource: {}\n", finding.resource));
        output.push_str(&format!("  Evidence: {}\n", finding.evidence));
        if !finding.recommendation.is_empty() {
            output.push_str(&format!("  Fix: {}\n", finding.recommendation));
        }
        output.push('\n');
    }

    if report.findings.is_empty() {
        output.push_str("No findings.\n\n");
    }

    if !report.notes.is_empty() {
        output.push_str("Notes:\n");
        // BTreeMap iterates in key order
        for (kind, note) in &report.notes {
            output.push_str(&format!("- {}: {}\n", kind, note));
        }
    }

    output
}

/// Format the check catalog as a table.
pub fn format_catalog(catalog: &[CheckSpec], color: bool) -> String {
    let id_width = catalog.iter().map(|c| c.id.len()).max().unwrap_or(0);
    let mut output = String::new();
    for spec in catalog {
        output.push_str(&format!(
            "{:<id_width$}  {:<10}  {}\n",
            spec.id,
            severity_label(spec.severity, false),
            spec.title,
            id_width = id_width,
        ));
        if color {
            output.push_str(&format!(
                "{}  {}\n",
                " ".repeat(id_width),
                spec.recommendation.dimmed()
            ));
        } else {
            output.push_str(&format!("{}  {}\n", " ".repeat(id_width), spec.recommendation));
        }
    }
    output
}
