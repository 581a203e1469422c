//! The rule catalog.
//!
//! Each check condition is described once here: its stable identifier,
//! severity, title, risk and remediation text. Rule evaluators only decide
//! *whether* a condition holds and supply the evidence; everything else comes
//! from the catalog entry. Check ids are the external contract consumers key
//! off, so entries must not be renumbered.
//!
//! A few ids are shared by more than one entry (`K8S-POD-004` has a
//! root-UID and a runAsNonRoot variant, `K8S-NET-IMDS-001` has one entry per
//! probe outcome); they differ in title or severity but report the same
//! underlying issue.

use crate::analyzer::types::{Finding, ResourceRef, Severity};
use serde::Serialize;

/// Description of a single check condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSpec {
    pub id: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub risk: &'static str,
    pub recommendation: &'static str,
}

impl CheckSpec {
    /// Create a finding for this check.
    pub fn finding(&self, resource: ResourceRef, evidence: impl Into<String>) -> Finding {
        Finding {
            check_id: self.id.to_string(),
            severity: self.severity,
            resource,
            title: self.title.to_string(),
            evidence: evidence.into(),
            risk: self.risk.to_string(),
            recommendation: self.recommendation.to_string(),
        }
    }
}

// ============================================================================
// Namespace admission control
// ============================================================================

pub const PSA_ENFORCE_MISSING: CheckSpec = CheckSpec {
    id: "K8S-PSA-001",
    severity: Severity::Medium,
    title: "Pod Security Admission (enforce) is not configured",
    risk: "The namespace accepts unsafe pods without any baseline restrictions",
    recommendation: "Set pod-security.kubernetes.io/enforce=baseline or restricted",
};

pub const PSA_ENFORCE_PRIVILEGED: CheckSpec = CheckSpec {
    id: "K8S-PSA-002",
    severity: Severity::High,
    title: "Pod Security Admission enforce level is privileged",
    risk: "Dangerous pods are admitted without restriction",
    recommendation: "Lower to baseline or restricted and grant exemptions narrowly",
};

// ============================================================================
// Workloads
// ============================================================================

pub const POD_PRIVILEGED: CheckSpec = CheckSpec {
    id: "K8S-POD-001",
    severity: Severity::Critical,
    title: "Privileged container",
    risk: "A privileged container has extended access to the node kernel and devices",
    recommendation: "Remove privileged; grant only the capabilities the workload needs and enforce PSA",
};

pub const POD_HOST_PATH: CheckSpec = CheckSpec {
    id: "K8S-POD-002",
    severity: Severity::Critical,
    title: "hostPath volume mounted",
    risk: "Access to the node filesystem can lead to privilege escalation and data leaks",
    recommendation: "Avoid hostPath; use PVC/CSI volumes, or the narrowest path mounted readOnly",
};

pub const POD_HOST_NAMESPACES: CheckSpec = CheckSpec {
    id: "K8S-POD-003",
    severity: Severity::High,
    title: "Host namespaces shared (hostNetwork/hostPID/hostIPC)",
    risk: "Sharing host namespaces weakens container isolation and exposes the node",
    recommendation: "Disable hostNetwork/hostPID/hostIPC unless strictly required",
};

pub const POD_RUNS_AS_ROOT: CheckSpec = CheckSpec {
    id: "K8S-POD-004",
    severity: Severity::High,
    title: "Container runs as root",
    risk: "Root inside the container increases the impact of remote code execution",
    recommendation: "Set runAsNonRoot: true and runAsUser to an unprivileged UID",
};

pub const POD_RUN_AS_NON_ROOT_DISABLED: CheckSpec = CheckSpec {
    id: "K8S-POD-004",
    severity: Severity::High,
    title: "runAsNonRoot is disabled",
    risk: "The container is allowed to start as root",
    recommendation: "Set runAsNonRoot: true and runAsUser to an unprivileged UID",
};

pub const POD_SECCOMP: CheckSpec = CheckSpec {
    id: "K8S-POD-005",
    severity: Severity::Medium,
    title: "Seccomp profile not applied",
    risk: "Without seccomp the full syscall surface of the kernel is reachable",
    recommendation: "Use the RuntimeDefault or a Localhost seccomp profile",
};

pub const POD_PRIVILEGE_ESCALATION: CheckSpec = CheckSpec {
    id: "K8S-POD-006",
    severity: Severity::High,
    title: "allowPrivilegeEscalation=true",
    risk: "Processes can gain privileges through setuid/setgid binaries",
    recommendation: "Set allowPrivilegeEscalation: false",
};

pub const POD_WRITABLE_ROOT_FS: CheckSpec = CheckSpec {
    id: "K8S-POD-007",
    severity: Severity::Medium,
    title: "readOnlyRootFilesystem is disabled",
    risk: "A writable root filesystem makes it easier to persist malicious code",
    recommendation: "Set readOnlyRootFilesystem: true and mount writable volumes explicitly",
};

pub const POD_SA_TOKEN_AUTOMOUNT: CheckSpec = CheckSpec {
    id: "K8S-POD-008",
    severity: Severity::Medium,
    title: "ServiceAccount token automount enabled",
    risk: "A compromised pod exposes a token usable against the Kubernetes API",
    recommendation: "Set automountServiceAccountToken: false when the pod does not call the API",
};

pub const POD_SECRET_ENV_FROM: CheckSpec = CheckSpec {
    id: "K8S-POD-009",
    severity: Severity::Medium,
    title: "Whole secret imported with envFrom",
    risk: "Every key of the secret ends up in the process environment",
    recommendation: "Import only the keys needed, or mount the secret as a volume",
};

pub const POD_CAPABILITIES_ADDED: CheckSpec = CheckSpec {
    id: "K8S-POD-010",
    severity: Severity::Medium,
    title: "Linux capabilities added",
    risk: "Extra capabilities raise the privileges of the container",
    recommendation: "Avoid capabilities.add; allow-list only what is required",
};

pub const POD_CAPABILITIES_NOT_DROPPED: CheckSpec = CheckSpec {
    id: "K8S-POD-011",
    severity: Severity::Low,
    title: "capabilities.drop not set",
    risk: "The container keeps the runtime's default capability set",
    recommendation: "Drop all capabilities (drop: [\"ALL\"]) and add back only what is needed",
};

pub const POD_SECRET_ENV: CheckSpec = CheckSpec {
    id: "K8S-POD-012",
    severity: Severity::Low,
    title: "Secret exposed through an environment variable",
    risk: "Environment variables leak into logs, crash dumps and child processes",
    recommendation: "Minimise secrets in env and never log the environment",
};

// ============================================================================
// Network exposure and segmentation
// ============================================================================

pub const NET_NO_POLICIES: CheckSpec = CheckSpec {
    id: "K8S-NET-001",
    severity: Severity::High,
    title: "Namespace has no NetworkPolicy (implicit allow-all)",
    risk: "Without segmentation lateral movement between workloads is unrestricted",
    recommendation: "Add default-deny ingress/egress policies and allow only required traffic",
};

pub const NET_NO_DEFAULT_DENY_INGRESS: CheckSpec = CheckSpec {
    id: "K8S-NET-002",
    severity: Severity::Medium,
    title: "No default-deny Ingress policy for all pods",
    risk: "Inbound traffic to pods may be broader than required",
    recommendation: "Add a default-deny ingress policy (podSelector: {}, ingress: [])",
};

pub const NET_NO_DEFAULT_DENY_EGRESS: CheckSpec = CheckSpec {
    id: "K8S-NET-003",
    severity: Severity::Medium,
    title: "No default-deny Egress policy for all pods",
    risk: "Unrestricted outbound traffic enables exfiltration and access to external services",
    recommendation: "Add a default-deny egress policy and allow only required destinations",
};

pub const NET_NODE_PORT: CheckSpec = CheckSpec {
    id: "K8S-NET-004",
    severity: Severity::High,
    title: "Service of type NodePort",
    risk: "NodePort opens a port on every node, widening the attack surface",
    recommendation: "Avoid NodePort; prefer Ingress or LoadBalancer with explicit access control",
};

pub const NET_INGRESS_PRESENT: CheckSpec = CheckSpec {
    id: "K8S-NET-005",
    severity: Severity::Medium,
    title: "Ingress object present",
    risk: "Ingress exposes workloads to inbound traffic",
    recommendation: "Review TLS, authentication, source allow-lists and routing rules",
};

pub const NET_LOAD_BALANCER: CheckSpec = CheckSpec {
    id: "K8S-NET-006",
    severity: Severity::Medium,
    title: "Service of type LoadBalancer",
    risk: "The service may be reachable from outside the cluster",
    recommendation: "Confirm external access is needed, restrict source ranges and enable TLS",
};

pub const NET_IMDS_REACHABLE: CheckSpec = CheckSpec {
    id: "K8S-NET-IMDS-001",
    severity: Severity::High,
    title: "Instance metadata service (169.254.169.254) reachable from pod",
    risk: "In cloud environments IMDS can hand out temporary node credentials",
    recommendation: "Block egress to 169.254.169.254/32 and enforce IMDSv2 where applicable",
};

pub const NET_IMDS_REACHABLE_ERROR: CheckSpec = CheckSpec {
    severity: Severity::Medium,
    ..NET_IMDS_REACHABLE
};

pub const NET_IMDS_UNREACHABLE: CheckSpec = CheckSpec {
    id: "K8S-NET-IMDS-001",
    severity: Severity::Low,
    title: "Instance metadata service (169.254.169.254) access check",
    risk: "An unreachable IMDS lowers the risk of cloud credential theft",
    recommendation: "On cloud clusters, keep egress to IMDS blocked explicitly",
};

// ============================================================================
// RBAC
// ============================================================================

pub const RBAC_CLUSTER_ADMIN: CheckSpec = CheckSpec {
    id: "K8S-RBAC-000",
    severity: Severity::Critical,
    title: "ServiceAccount bound to cluster-admin",
    risk: "A stolen token of this ServiceAccount gives full control of the cluster",
    recommendation: "Remove the cluster-admin binding and grant least-privilege rights",
};

pub const RBAC_WILDCARD: CheckSpec = CheckSpec {
    id: "K8S-RBAC-001",
    severity: Severity::High,
    title: "Excessive RBAC rights (wildcard)",
    risk: "Wildcard rules usually allow dangerous operations against the API",
    recommendation: "Replace '*' with explicit resources and verbs and scope to a namespace",
};

pub const RBAC_SECRETS_READ: CheckSpec = CheckSpec {
    id: "K8S-RBAC-002",
    severity: Severity::High,
    title: "RBAC: read access to secrets",
    risk: "Reading secrets lets an attacker widen a compromise",
    recommendation: "Remove secrets access from application ServiceAccounts",
};

pub const RBAC_PODS_EXEC: CheckSpec = CheckSpec {
    id: "K8S-RBAC-003",
    severity: Severity::High,
    title: "RBAC: access to pods/exec",
    risk: "Allows running arbitrary commands inside containers",
    recommendation: "Restrict pods/exec to operators who need it",
};

pub const RBAC_NODES: CheckSpec = CheckSpec {
    id: "K8S-RBAC-004",
    severity: Severity::High,
    title: "RBAC: access to nodes",
    risk: "Node access helps gather sensitive information about the cluster",
    recommendation: "Remove nodes access from application ServiceAccounts",
};

pub const RBAC_BINDING_ESCALATION: CheckSpec = CheckSpec {
    id: "K8S-RBAC-005",
    severity: Severity::Critical,
    title: "RBAC: can modify role bindings",
    risk: "Creating or changing bindings lets the identity grant itself more rights",
    recommendation: "Do not allow workloads to create, patch or update (cluster)rolebindings",
};

pub const RBAC_CLUSTER_ROLE_WILDCARD: CheckSpec = CheckSpec {
    id: "K8S-RBAC-101",
    severity: Severity::Medium,
    title: "ClusterRole contains wildcard rules",
    risk: "Binding a wildcard role later grants excessive rights",
    recommendation: "Narrow the rules to the resources and verbs actually needed",
};

/// Every catalog entry, in id order.
pub const CATALOG: &[CheckSpec] = &[
    NET_NO_POLICIES,
    NET_NO_DEFAULT_DENY_INGRESS,
    NET_NO_DEFAULT_DENY_EGRESS,
    NET_NODE_PORT,
    NET_INGRESS_PRESENT,
    NET_LOAD_BALANCER,
    NET_IMDS_REACHABLE,
    NET_IMDS_REACHABLE_ERROR,
    NET_IMDS_UNREACHABLE,
    POD_PRIVILEGED,
    POD_HOST_PATH,
    POD_HOST_NAMESPACES,
    POD_RUNS_AS_ROOT,
    POD_RUN_AS_NON_ROOT_DISABLED,
    POD_SECCOMP,
    POD_PRIVILEGE_ESCALATION,
    POD_WRITABLE_ROOT_FS,
    POD_SA_TOKEN_AUTOMOUNT,
    POD_SECRET_ENV_FROM,
    POD_CAPABILITIES_ADDED,
    POD_CAPABILITIES_NOT_DROPPED,
    POD_SECRET_ENV,
    PSA_ENFORCE_MISSING,
    PSA_ENFORCE_PRIVILEGED,
    RBAC_CLUSTER_ADMIN,
    RBAC_WILDCARD,
    RBAC_SECRETS_READ,
    RBAC_PODS_EXEC,
    RBAC_NODES,
    RBAC_BINDING_ESCALATION,
    RBAC_CLUSTER_ROLE_WILDCARD,
];

/// Whether `id` names a known check, ignoring case and surrounding blanks.
pub fn is_known_check(id: &str) -> bool {
    let id = id.trim();
    CATALOG.iter().any(|spec| spec.id.eq_ignore_ascii_case(id))
}
