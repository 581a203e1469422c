//! Output formatters for audit reports.

pub mod json;
pub mod plain;

use crate::analyzer::types::Report;
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON report.
    Json,
}

impl OutputFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| AuditError::UnknownFormat(s.to_string()))
    }
}

/// Format a report to a string.
pub fn format_report(report: &Report, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(plain::format(report, color)),
        OutputFormat::Json => json::format(report),
    }
}
