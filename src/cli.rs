use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analyzer::formatter;
use crate::analyzer::types::Severity;

#[derive(Parser)]
#[command(name = "kube-audit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit the security posture of a Kubernetes cluster")]
#[command(long_about = "Collects workloads, RBAC, network policies and namespace settings from a Kubernetes cluster (or an offline snapshot) and reports risky configurations as findings with stable check ids.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Audit a live cluster or a snapshot and report findings
    Scan(ScanArgs),

    /// List every check with its id, severity and remediation
    Checks {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Read objects from a YAML/JSON snapshot instead of a live cluster ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// kubeconfig context to use
    #[arg(long, value_name = "NAME", conflicts_with = "input")]
    pub context: Option<String>,

    /// Only audit this namespace
    #[arg(short, long, value_name = "NS")]
    pub namespace: Option<String>,

    /// Include the kube-system namespace
    #[arg(long)]
    pub include_kube_system: bool,

    /// Actively probe the instance metadata service (169.254.169.254) from this host
    #[arg(long)]
    pub probe_imds: bool,

    /// Output format
    #[arg(short, long, value_enum, ignore_case = true)]
    pub format: Option<OutputFormat>,

    /// Write the JSON report to this file
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Exit with status 2 when any finding has at least this severity
    #[arg(long, value_enum, ignore_case = true)]
    pub fail_on: Option<SeverityThreshold>,

    /// Suppress findings of these check ids
    #[arg(long, value_delimiter = ',', value_name = "ID")]
    pub exclude_check: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for formatter::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => formatter::OutputFormat::Text,
            OutputFormat::Json => formatter::OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum SeverityThreshold {
    Low,
    Medium,
    High,
    Critical,
}

impl From<SeverityThreshold> for Severity {
    fn from(threshold: SeverityThreshold) -> Self {
        match threshold {
            SeverityThreshold::Low => Severity::Low,
            SeverityThreshold::Medium => Severity::Medium,
            SeverityThreshold::High => Severity::High,
            SeverityThreshold::Critical => Severity::Critical,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::parse_from([
            "kube-audit",
            "-vv",
            "scan",
            "--input",
            "cluster.yaml",
            "--namespace",
            "shop",
            "--fail-on",
            "medium",
            "--exclude-check",
            "K8S-NET-005,K8S-NET-006",
            "--format",
            "json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.namespace.as_deref(), Some("shop"));
        assert_eq!(args.fail_on, Some(SeverityThreshold::Medium));
        assert_eq!(args.exclude_check, vec!["K8S-NET-005", "K8S-NET-006"]);
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_fail_on_accepts_upper_case() {
        let cli = Cli::parse_from(["kube-audit", "scan", "--fail-on", "CRITICAL"]);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.fail_on.map(Severity::from), Some(Severity::Critical));
    }

    #[test]
    fn test_context_conflicts_with_input() {
        let result = Cli::try_parse_from([
            "kube-audit",
            "scan",
            "--input",
            "x.yaml",
            "--context",
            "prod",
        ]);
        assert!(result.is_err());
    }
}
