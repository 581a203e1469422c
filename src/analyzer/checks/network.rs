//! Network exposure and segmentation checks.

use crate::analyzer::catalog;
use crate::analyzer::resources::{Ingress, Namespace, NetworkPolicy, Service};
use crate::analyzer::types::{Finding, ResourceRef};
use std::collections::HashMap;

/// Direction a network policy can restrict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyType {
    Ingress,
    Egress,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::Egress => "Egress",
        }
    }
}

/// Inputs for the network checks. Any collection may be missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkInputs<'a> {
    pub namespaces: Option<&'a [Namespace]>,
    pub network_policies: Option<&'a [NetworkPolicy]>,
    pub services: Option<&'a [Service]>,
    pub ingresses: Option<&'a [Ingress]>,
}

pub fn evaluate(inputs: NetworkInputs<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    // Segmentation needs both the namespaces and their policies; without the
    // policy list every namespace would look unprotected.
    if let (Some(namespaces), Some(policies)) = (inputs.namespaces, inputs.network_policies) {
        findings.extend(segmentation(namespaces, policies));
    }
    if let Some(services) = inputs.services {
        findings.extend(services.iter().filter_map(exposed_service));
    }
    if let Some(ingresses) = inputs.ingresses {
        findings.extend(ingresses.iter().map(ingress_present));
    }

    findings
}

fn segmentation(namespaces: &[Namespace], policies: &[NetworkPolicy]) -> Vec<Finding> {
    let mut by_namespace: HashMap<&str, Vec<&NetworkPolicy>> = HashMap::new();
    for np in policies {
        by_namespace
            .entry(np.metadata.namespace_or_empty())
            .or_default()
            .push(np);
    }

    let mut findings = Vec::new();
    for ns in namespaces {
        let name = ns.metadata.name.as_str();
        let resource = ResourceRef::cluster("Namespace", name);
        let pols = by_namespace.get(name).map(Vec::as_slice).unwrap_or_default();

        if pols.is_empty() {
            findings.push(catalog::NET_NO_POLICIES.finding(resource, "networkpolicies=0"));
            continue;
        }

        if !pols.iter().any(|np| denies_all(np, PolicyType::Ingress)) {
            findings.push(catalog::NET_NO_DEFAULT_DENY_INGRESS.finding(
                resource.clone(),
                "no NetworkPolicy with podSelector: {} and ingress: []",
            ));
        }
        if !pols.iter().any(|np| denies_all(np, PolicyType::Egress)) {
            findings.push(catalog::NET_NO_DEFAULT_DENY_EGRESS.finding(
                resource,
                "no NetworkPolicy with podSelector: {} and egress: []",
            ));
        }
    }
    findings
}

/// Effective policy types: the explicit `policyTypes` list when it has any
/// non-blank entry, otherwise inferred from which rule sections are present.
/// Unrecognised explicit entries are ignored but still suppress inference.
pub fn effective_policy_types(np: &NetworkPolicy) -> Vec<PolicyType> {
    let spec = &np.spec;
    let declared: Vec<&str> = spec
        .policy_types
        .iter()
        .flatten()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !declared.is_empty() {
        return [("Ingress", PolicyType::Ingress), ("Egress", PolicyType::Egress)]
            .into_iter()
            .filter(|(name, _)| declared.contains(name))
            .map(|(_, policy_type)| policy_type)
            .collect();
    }

    let mut inferred = Vec::new();
    if spec.ingress.is_some() {
        inferred.push(PolicyType::Ingress);
    }
    if spec.egress.is_some() {
        inferred.push(PolicyType::Egress);
    }
    inferred
}

/// Whether the policy selects every pod and denies all traffic in
/// `direction`: the rule list must be present and empty.
pub fn denies_all(np: &NetworkPolicy, direction: PolicyType) -> bool {
    if !np.spec.pod_selector.is_empty() {
        return false;
    }
    if !effective_policy_types(np).contains(&direction) {
        return false;
    }
    let rules = match direction {
        PolicyType::Ingress => np.spec.ingress.as_ref(),
        PolicyType::Egress => np.spec.egress.as_ref(),
    };
    rules.is_some_and(|r| r.is_empty())
}

fn exposed_service(svc: &Service) -> Option<Finding> {
    let resource = ResourceRef::namespaced(
        "Service",
        svc.metadata.namespace_or_empty(),
        svc.metadata.name.as_str(),
    );

    if svc.spec.is_type("NodePort") {
        let ports: Vec<String> = svc
            .spec
            .ports
            .iter()
            .map(|p| {
                format!(
                    "{}->{}/{}",
                    p.port,
                    p.node_port.unwrap_or(0),
                    p.protocol.as_deref().unwrap_or("TCP").to_uppercase()
                )
            })
            .collect();
        return Some(catalog::NET_NODE_PORT.finding(
            resource,
            format!("type=NodePort ports=[{}]", ports.join(" ")),
        ));
    }
    if svc.spec.is_type("LoadBalancer") {
        return Some(catalog::NET_LOAD_BALANCER.finding(resource, "type=LoadBalancer"));
    }
    None
}

fn ingress_present(ing: &Ingress) -> Finding {
    catalog::NET_INGRESS_PRESENT.finding(
        ResourceRef::namespaced(
            "Ingress",
            ing.metadata.namespace_or_empty(),
            ing.metadata.name.as_str(),
        ),
        "networking.k8s.io/v1 Ingress",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::types::Severity;

    fn yaml<T: serde::de::DeserializeOwned>(s: &str) -> Vec<T> {
        serde_yaml::from_str(s).unwrap()
    }

    fn namespaces() -> Vec<Namespace> {
        yaml(
            r#"
- metadata: {name: open}
- metadata: {name: half}
- metadata: {name: sealed}
"#,
        )
    }

    fn policies() -> Vec<NetworkPolicy> {
        yaml(
            r#"
- metadata: {name: deny-in, namespace: half}
  spec:
    podSelector: {}
    policyTypes: [Ingress]
    ingress: []
- metadata: {name: deny-all, namespace: sealed}
  spec:
    podSelector: {}
    ingress: []
    egress: []
"#,
        )
    }

    fn codes_for(findings: &[Finding], ns: &str) -> Vec<String> {
        findings
            .iter()
            .filter(|f| f.resource.name == ns)
            .map(|f| f.check_id.clone())
            .collect()
    }

    #[test]
    fn test_segmentation() {
        let ns = namespaces();
        let np = policies();
        let findings = evaluate(NetworkInputs {
            namespaces: Some(&ns),
            network_policies: Some(&np),
            ..Default::default()
        });

        assert_eq!(codes_for(&findings, "open"), vec!["K8S-NET-001"]);
        assert_eq!(codes_for(&findings, "half"), vec!["K8S-NET-003"]);
        assert!(codes_for(&findings, "sealed").is_empty());

        let open = findings.iter().find(|f| f.resource.name == "open").unwrap();
        assert_eq!(open.severity, Severity::High);
    }

    #[test]
    fn test_missing_policy_list_suppresses_segmentation() {
        let ns = namespaces();
        let findings = evaluate(NetworkInputs {
            namespaces: Some(&ns),
            network_policies: None,
            ..Default::default()
        });
        assert!(findings.is_empty());
    }

    #[test]
    fn test_absent_rules_do_not_deny() {
        let np: Vec<NetworkPolicy> = yaml(
            r#"
- metadata: {name: typed-only, namespace: x}
  spec:
    podSelector: {}
    policyTypes: [Ingress, Egress]
- metadata: {name: null-rules, namespace: x}
  spec:
    podSelector: {}
    ingress: null
"#,
        );
        assert!(!denies_all(&np[0], PolicyType::Ingress));
        assert!(!denies_all(&np[0], PolicyType::Egress));
        assert!(!denies_all(&np[1], PolicyType::Ingress));
        assert!(effective_policy_types(&np[1]).is_empty());
    }

    #[test]
    fn test_selector_must_be_empty() {
        let np: Vec<NetworkPolicy> = yaml(
            r#"
- metadata: {name: labelled, namespace: x}
  spec:
    podSelector:
      matchLabels: {app: web}
    ingress: []
- metadata: {name: expr, namespace: x}
  spec:
    podSelector:
      matchExpressions:
      - {key: tier, operator: Exists}
    ingress: []
"#,
        );
        assert!(!denies_all(&np[0], PolicyType::Ingress));
        assert!(!denies_all(&np[1], PolicyType::Ingress));
    }

    #[test]
    fn test_explicit_types_exclude_inferred() {
        // egress: [] is present, but policyTypes only lists Ingress
        let np: Vec<NetworkPolicy> = yaml(
            r#"
- metadata: {name: p, namespace: x}
  spec:
    podSelector: {}
    policyTypes: [Ingress]
    ingress: []
    egress: []
"#,
        );
        assert!(denies_all(&np[0], PolicyType::Ingress));
        assert!(!denies_all(&np[0], PolicyType::Egress));
    }

    #[test]
    fn test_unrecognised_types_disable_inference() {
        let np: Vec<NetworkPolicy> = yaml(
            r#"
- metadata: {name: lower, namespace: x}
  spec:
    podSelector: {}
    policyTypes: [ingress]
    ingress: []
- metadata: {name: blank, namespace: x}
  spec:
    podSelector: {}
    policyTypes: [" "]
    ingress: []
"#,
        );
        assert!(effective_policy_types(&np[0]).is_empty());
        assert!(!denies_all(&np[0], PolicyType::Ingress));
        assert_eq!(effective_policy_types(&np[1]), vec![PolicyType::Ingress]);
        assert!(denies_all(&np[1], PolicyType::Ingress));
    }

    #[test]
    fn test_exposed_services_and_ingresses() {
        let services: Vec<Service> = yaml(
            r#"
- metadata: {name: web, namespace: shop}
  spec:
    type: NodePort
    ports:
    - {port: 80, nodePort: 30080, protocol: TCP}
    - {port: 53, nodePort: 30053, protocol: udp}
- metadata: {name: lb, namespace: shop}
  spec: {type: LoadBalancer}
- metadata: {name: internal, namespace: shop}
  spec: {type: ClusterIP}
"#,
        );
        let ingresses: Vec<Ingress> = yaml("- metadata: {name: front, namespace: shop}");
        let findings = evaluate(NetworkInputs {
            services: Some(&services),
            ingresses: Some(&ingresses),
            ..Default::default()
        });

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].check_id, "K8S-NET-004");
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(
            findings[0].evidence,
            "type=NodePort ports=[80->30080/TCP 53->30053/UDP]"
        );
        assert_eq!(findings[1].check_id, "K8S-NET-006");
        assert_eq!(findings[2].check_id, "K8S-NET-005");
        assert_eq!(findings[2].resource.to_string(), "Ingress/shop/front");
    }
}
