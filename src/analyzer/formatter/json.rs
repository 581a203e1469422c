//! JSON formatter.

use crate::analyzer::types::Report;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Format a report as pretty-printed JSON.
pub fn format(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Format any serializable value (e.g. the check catalog) as JSON.
pub fn format_value<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Write the JSON report to `path`, creating parent directories.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut content = format(report)?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}
