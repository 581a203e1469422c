//! Core types for the audit engine.
//!
//! - `Severity` - finding severity levels, totally ordered
//! - `ResourceRef` - the object a finding is attributed to
//! - `Finding` - a single policy violation
//! - `Report` - the machine-readable result of one run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Severity levels for findings.
///
/// Ordered from least to most severe: `Low < Medium < High < Critical`.
/// Consumers compare against a threshold through this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All levels, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a severity from a string (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::error::AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::error::AuditError::InvalidSeverity(s.to_string()))
    }
}

/// The Kubernetes object a finding is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceRef {
    /// Reference to a cluster-scoped object.
    pub fn cluster(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: None,
            name: name.into(),
        }
    }

    /// Reference to a namespaced object. An empty namespace is treated as
    /// cluster-scoped.
    pub fn namespaced(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        Self {
            kind: kind.into(),
            namespace: (!namespace.is_empty()).then_some(namespace),
            name: name.into(),
        }
    }

    /// `namespace/name`, with an empty namespace for cluster-scoped objects.
    pub fn sort_key(&self) -> String {
        format!("{}/{}", self.namespace.as_deref().unwrap_or(""), self.name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// A single check result.
///
/// Findings are plain values: two findings with the same content are equal
/// and both are kept, since several containers or bindings can trigger the
/// same check independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub check_id: String,
    pub severity: Severity,
    pub resource: ResourceRef,
    pub title: String,
    pub evidence: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub risk: String,
    pub recommendation: String,
}

/// Conventional report ordering: severity descending, then check id, then
/// `namespace/name`.
pub fn compare_findings(a: &Finding, b: &Finding) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| a.check_id.cmp(&b.check_id))
        .then_with(|| a.resource.sort_key().cmp(&b.resource.sort_key()))
}

/// Sort findings in place using [`compare_findings`].
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(compare_findings);
}

/// Cluster the report was produced against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMeta {
    #[serde(
        default,
        rename = "kubernetesVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub server_version: Option<String>,
    pub api_server: String,
}

/// Machine-readable output of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub cluster: ClusterMeta,
    pub generated_at: DateTime<Utc>,
    pub summary: BTreeMap<Severity, usize>,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

impl Report {
    /// Build a report, sorting the findings and computing the summary.
    pub fn new(
        cluster: ClusterMeta,
        mut findings: Vec<Finding>,
        notes: BTreeMap<String, String>,
    ) -> Self {
        sort_findings(&mut findings);
        Self {
            cluster,
            generated_at: Utc::now(),
            summary: summarize(&findings),
            findings,
            notes,
        }
    }

    /// Highest severity present, if any findings exist.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }

    /// Whether any finding is at or above `threshold`.
    pub fn should_fail(&self, threshold: Severity) -> bool {
        self.max_severity().is_some_and(|max| max >= threshold)
    }
}

/// Count findings per severity. Every level is present, zero or not.
pub fn summarize(findings: &[Finding]) -> BTreeMap<Severity, usize> {
    let mut summary: BTreeMap<Severity, usize> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();
    for finding in findings {
        *summary.entry(finding.severity).or_insert(0) += 1;
    }
    summary
}
