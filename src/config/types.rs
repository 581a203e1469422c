use crate::analyzer::formatter::OutputFormat;
use crate::analyzer::types::Severity;
use crate::cluster::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// What to collect and evaluate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// kubeconfig context to use instead of the current one
    pub context: Option<String>,
    pub include_kube_system: bool,
    /// Run the active metadata-service probe
    pub probe_imds: bool,
    /// Check ids whose findings are suppressed
    pub exclude_checks: Vec<String>,
    /// Items requested per list call
    pub page_size: u32,
}

/// How results are reported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Exit with status 2 when a finding reaches this severity
    pub fail_on: Severity,
    pub color: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            context: None,
            include_kube_system: false,
            probe_imds: false,
            exclude_checks: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            fail_on: Severity::High,
            color: true,
        }
    }
}
