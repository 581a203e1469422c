//! Namespace admission-control checks.

use crate::analyzer::catalog::{PSA_ENFORCE_MISSING, PSA_ENFORCE_PRIVILEGED};
use crate::analyzer::resources::Namespace;
use crate::analyzer::types::{Finding, ResourceRef};

/// Label carrying the Pod Security Admission enforce level.
pub const PSA_ENFORCE_LABEL: &str = "pod-security.kubernetes.io/enforce";

/// At most one finding per namespace: missing enforce label (MEDIUM) or an
/// enforce level of `privileged` in any case (HIGH).
pub fn evaluate(namespaces: &[Namespace]) -> Vec<Finding> {
    namespaces.iter().filter_map(check_namespace).collect()
}

fn check_namespace(ns: &Namespace) -> Option<Finding> {
    let resource = ResourceRef::cluster("Namespace", ns.metadata.name.as_str());

    match ns.metadata.label(PSA_ENFORCE_LABEL).filter(|v| !v.is_empty()) {
        None => Some(PSA_ENFORCE_MISSING.finding(
            resource,
            format!("label {} is missing", PSA_ENFORCE_LABEL),
        )),
        Some(level) if level.eq_ignore_ascii_case("privileged") => Some(
            PSA_ENFORCE_PRIVILEGED.finding(resource, format!("{}={}", PSA_ENFORCE_LABEL, level)),
        ),
        Some(_) => None,
    }
}
