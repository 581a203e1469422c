//! # kube-audit
//!
//! A command-line auditor for the security posture of a Kubernetes cluster.
//! It reads namespaces, workloads, RBAC objects, network policies, services
//! and ingresses, either live through the Kubernetes API or from an offline
//! snapshot, and reports risky configurations as findings.
//!
//! ## Features
//!
//! - **Workload checks**: privileged containers, host namespaces, hostPath
//!   volumes, root users, seccomp, capabilities, secrets in env
//! - **RBAC analysis**: effective permissions per ServiceAccount through
//!   RoleBindings and ClusterRoleBindings
//! - **Network checks**: missing default-deny policies, exposed services
//! - **Stable check ids**: `K8S-POD-001`, `K8S-RBAC-002`, ... for CI gating
//!
//! ## Example
//!
//! ```rust,no_run
//! use kube_audit::analyzer::{audit, parser::parse_snapshot, AuditOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inventory = parse_snapshot(&std::fs::read_to_string("cluster.yaml")?)?;
//! let findings = audit(&inventory, &AuditOptions::default());
//! for finding in &findings {
//!     println!("[{}] {} {}", finding.severity, finding.check_id, finding.resource);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod error;
pub mod handlers;

// Re-export commonly used types and functions
pub use analyzer::{AuditOptions, Finding, Inventory, Report, Severity, audit};
pub use error::{AuditError, Result};
pub use handlers::*;
use cli::Commands;
use config::types::Config;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Process exit status when a finding reaches the fail threshold.
pub const EXIT_THRESHOLD: i32 = 2;

/// Run a command. Returns `true` when the scan reached its fail threshold.
pub async fn run_command(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Scan(args) => handlers::handle_scan(ScanOptions::resolve(args, config)).await,
        Commands::Checks { format } => handlers::handle_checks(format.into()).map(|_| false),
    }
}
