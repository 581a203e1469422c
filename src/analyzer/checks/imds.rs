//! Interpretation of the instance-metadata probe.
//!
//! The probe itself lives in `cluster::probe`; this only maps its outcome to a
//! finding so the mapping stays free of I/O.

use crate::analyzer::catalog;
use crate::analyzer::types::{Finding, ResourceRef};

/// Link-local address of the cloud instance metadata service.
pub const IMDS_URL: &str = "http://169.254.169.254/";

/// Result of a single request to the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered with an HTTP status.
    Reachable { status: u16 },
    /// The request failed (timeout, connection refused, ...).
    Unreachable { error: String },
}

/// Exactly one finding per probe.
pub fn evaluate(outcome: &ProbeOutcome) -> Finding {
    let resource = ResourceRef::cluster("Cluster", "(probe)");
    match outcome {
        ProbeOutcome::Reachable { status } => {
            let spec = if *status >= 400 {
                &catalog::NET_IMDS_REACHABLE_ERROR
            } else {
                &catalog::NET_IMDS_REACHABLE
            };
            spec.finding(resource, format!("HTTP GET {}: status={}", IMDS_URL, status))
        }
        ProbeOutcome::Unreachable { error } => catalog::NET_IMDS_UNREACHABLE.finding(
            resource,
            format!("HTTP GET {}: unreachable ({})", IMDS_URL, error),
        ),
    }
}
