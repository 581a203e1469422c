//! # Analyzer Module
//!
//! The policy evaluation engine. Given a fully materialized [`Inventory`] it
//! produces the list of security findings for the cluster:
//! - Namespace admission-control labels
//! - Pod and container security settings
//! - Network segmentation and exposure
//! - Effective ServiceAccount permissions and latent wildcard ClusterRoles
//!
//! Everything here is synchronous and free of I/O. Collecting resources and
//! probing the network happen in [`crate::cluster`].
//!
//! # Example
//!
//! ```rust,ignore
//! use kube_audit::analyzer::{audit, parser::parse_snapshot, AuditOptions};
//!
//! let inventory = parse_snapshot(&std::fs::read_to_string("cluster.yaml")?)?;
//! for finding in audit(&inventory, &AuditOptions::default()) {
//!     println!("[{}] {} {}", finding.severity, finding.check_id, finding.resource);
//! }
//! ```

pub mod catalog;
pub mod checks;
pub mod formatter;
pub mod inventory;
pub mod parser;
pub mod rbac_graph;
pub mod resources;
pub mod types;

pub use catalog::{CATALOG, CheckSpec};
pub use checks::ProbeOutcome;
pub use formatter::OutputFormat;
pub use inventory::{Inventory, NamespaceScope};
pub use rbac_graph::EffectiveRbac;
pub use types::{ClusterMeta, Finding, Report, ResourceRef, Severity, sort_findings};

use checks::{NetworkInputs, namespace, network, rbac, workload};

/// Options applied on top of rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Check ids whose findings are dropped from the result.
    pub exclude_checks: Vec<String>,
}

impl AuditOptions {
    pub fn is_excluded(&self, check_id: &str) -> bool {
        self.exclude_checks
            .iter()
            .any(|id| id.trim().eq_ignore_ascii_case(check_id))
    }

    /// Excluded ids that match no check in the catalog.
    pub fn unknown_checks(&self) -> Vec<&str> {
        self.exclude_checks
            .iter()
            .map(String::as_str)
            .filter(|id| !catalog::is_known_check(id))
            .collect()
    }
}

/// Run every rule group against the inventory and concatenate the results.
///
/// Findings come back in evaluation order; use [`sort_findings`] (or build a
/// [`Report`]) for the conventional ordering.
pub fn audit(inventory: &Inventory, options: &AuditOptions) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(namespaces) = &inventory.namespaces {
        let group = namespace::evaluate(namespaces);
        log::debug!("namespace checks: {} findings", group.len());
        findings.extend(group);
    }

    if let Some(pods) = &inventory.pods {
        let sa_index = inventory.service_account_index();
        let group = workload::evaluate(pods, &sa_index);
        log::debug!("workload checks: {} findings over {} pods", group.len(), pods.len());
        findings.extend(group);
    }

    let group = network::evaluate(NetworkInputs {
        namespaces: inventory.namespaces.as_deref(),
        network_policies: inventory.network_policies.as_deref(),
        services: inventory.services.as_deref(),
        ingresses: inventory.ingresses.as_deref(),
    });
    log::debug!("network checks: {} findings", group.len());
    findings.extend(group);

    let graph = effective_rbac(inventory);
    let group = rbac::evaluate(&graph);
    log::debug!(
        "rbac checks: {} findings over {} service accounts",
        group.len(),
        graph.len()
    );
    findings.extend(group);

    if let Some(cluster_roles) = &inventory.cluster_roles {
        let group = rbac::evaluate_cluster_roles(cluster_roles);
        log::debug!("cluster role checks: {} findings", group.len());
        findings.extend(group);
    }

    if !options.exclude_checks.is_empty() {
        let before = findings.len();
        findings.retain(|f| !options.is_excluded(&f.check_id));
        log::debug!("excluded {} findings", before - findings.len());
    }

    findings
}

/// Build the permission graph from the inventory's RBAC collections.
pub fn effective_rbac(inventory: &Inventory) -> EffectiveRbac {
    rbac_graph::build(
        inventory.service_accounts.as_deref(),
        inventory.roles.as_deref(),
        inventory.cluster_roles.as_deref(),
        inventory.role_bindings.as_deref(),
        inventory.cluster_role_bindings.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn inventory() -> Inventory {
        let mut inv = Inventory::empty();
        inv.namespaces = serde_yaml::from_str(
            r#"
- metadata:
    name: shop
    labels:
      pod-security.kubernetes.io/enforce: privileged
"#,
        )
        .unwrap();
        inv.pods = serde_yaml::from_str(
            r#"
- metadata: {name: web, namespace: shop}
  spec:
    automountServiceAccountToken: false
    containers:
    - name: web
      securityContext:
        privileged: true
        runAsNonRoot: true
        readOnlyRootFilesystem: true
        allowPrivilegeEscalation: false
        seccompProfile: {type: RuntimeDefault}
        capabilities: {drop: [ALL]}
"#,
        )
        .unwrap();
        inv
    }

    #[test]
    fn test_audit_runs_every_group() {
        let findings = audit(&inventory(), &AuditOptions::default());
        let ids: HashSet<&str> = findings.iter().map(|f| f.check_id.as_str()).collect();
        assert!(ids.contains("K8S-PSA-002"));
        assert!(ids.contains("K8S-POD-001"));
        assert!(ids.contains("K8S-NET-001"));
        assert_eq!(findings.len(), 3);
    }

    #[test]
    fn test_excluded_checks_are_dropped() {
        let options = AuditOptions {
            exclude_checks: vec!["k8s-net-001".into(), " K8S-PSA-002 ".into()],
        };
        let findings = audit(&inventory(), &options);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].check_id, "K8S-POD-001");
    }

    #[test]
    fn test_unknown_excluded_checks() {
        let options = AuditOptions {
            exclude_checks: vec!["k8s-pod-001".into(), "K8S-POD-999".into(), "NET-001".into()],
        };
        assert_eq!(options.unknown_checks(), vec!["K8S-POD-999", "NET-001"]);
        assert!(AuditOptions::default().unknown_checks().is_empty());
    }

    #[test]
    fn test_unavailable_inventory_yields_nothing() {
        assert!(audit(&Inventory::default(), &AuditOptions::default()).is_empty());
    }

    #[test]
    fn test_empty_inventory_yields_nothing() {
        assert!(audit(&Inventory::empty(), &AuditOptions::default()).is_empty());
    }
}
