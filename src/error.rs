//! Error types for kube-audit.
//!
//! The evaluation engine itself cannot fail; these cover the outer layers:
//! configuration, cluster access, snapshot loading and report output.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Kubernetes API request failed
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// No usable kubeconfig or in-cluster environment
    #[error("Failed to infer Kubernetes config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    /// The kubeconfig file could not be read or the context is invalid
    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// A required resource kind could not be listed
    #[error("cannot list {kind}: {message}")]
    Collection { kind: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Explicitly requested config file is invalid
    #[error("Invalid config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// A snapshot document could not be parsed
    #[error("Snapshot parse error at line {line}: {message}")]
    Snapshot { line: usize, message: String },

    #[error("Invalid severity {0:?} (expected LOW, MEDIUM, HIGH or CRITICAL)")]
    InvalidSeverity(String),

    #[error("Unknown output format {0:?} (expected text or json)")]
    UnknownFormat(String),
}

/// Result type alias for kube-audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
