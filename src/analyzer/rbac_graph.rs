//! Effective RBAC resolution.
//!
//! Builds, for every ServiceAccount, the list of roles bound to it through
//! RoleBindings and ClusterRoleBindings, with each role's rules resolved.
//! The graph is an adjacency map keyed by `namespace/name` and is rebuilt
//! from scratch on every run. No findings are produced here.

use crate::analyzer::resources::{
    ClusterRole, ClusterRoleBinding, ObjectKey, PolicyRule, Role, RoleBinding, ServiceAccount,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Kind of role a binding points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Role,
    ClusterRole,
    /// Any other `roleRef.kind`; never resolves.
    Other(String),
}

impl RoleKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "Role" => Self::Role,
            "ClusterRole" => Self::ClusterRole,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Role => "Role",
            Self::ClusterRole => "ClusterRole",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a binding lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingScope {
    Namespace(String),
    /// ClusterRoleBindings have no namespace.
    Cluster,
}

impl fmt::Display for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespace(ns) => write!(f, "{}", ns),
            Self::Cluster => write!(f, "(cluster)"),
        }
    }
}

/// A ServiceAccount's binding to one role.
///
/// `rules` is empty exactly when the referenced role could not be resolved
/// (listing failed or the reference dangles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRole {
    pub role_kind: RoleKind,
    /// Namespace of a namespaced `Role`; `None` for cluster roles.
    pub role_namespace: Option<String>,
    pub role_name: String,
    pub binding: String,
    pub binding_scope: BindingScope,
    pub rules: Vec<PolicyRule>,
}

impl BoundRole {
    pub fn is_resolved(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Whether this is the built-in `cluster-admin` ClusterRole.
    pub fn is_cluster_admin(&self) -> bool {
        self.role_kind == RoleKind::ClusterRole && self.role_name == "cluster-admin"
    }
}

/// ServiceAccount → bound roles.
///
/// Every known ServiceAccount has an entry, possibly empty, so "no bindings"
/// is distinguishable from "unknown ServiceAccount".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveRbac {
    pub by_service_account: BTreeMap<ObjectKey, Vec<BoundRole>>,
}

impl EffectiveRbac {
    /// Bound roles of a ServiceAccount, or `None` if it is unknown.
    pub fn bound_roles(&self, namespace: &str, name: &str) -> Option<&[BoundRole]> {
        self.by_service_account
            .get(&ObjectKey::new(namespace, name))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &[BoundRole])> {
        self.by_service_account
            .iter()
            .map(|(key, roles)| (key, roles.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.by_service_account.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_service_account.is_empty()
    }

    fn add(&mut self, key: ObjectKey, bound: BoundRole) {
        self.by_service_account.entry(key).or_default().push(bound);
    }
}

/// Resolve effective RBAC for every ServiceAccount.
///
/// A `None` collection means the kind could not be listed; it contributes no
/// facts. Bindings to roles that cannot be resolved are kept with empty rules.
pub fn build(
    service_accounts: Option<&[ServiceAccount]>,
    roles: Option<&[Role]>,
    cluster_roles: Option<&[ClusterRole]>,
    role_bindings: Option<&[RoleBinding]>,
    cluster_role_bindings: Option<&[ClusterRoleBinding]>,
) -> EffectiveRbac {
    let role_index: HashMap<ObjectKey, &Role> = roles
        .unwrap_or_default()
        .iter()
        .map(|r| (ObjectKey::of(&r.metadata), r))
        .collect();
    let cluster_role_index: HashMap<&str, &ClusterRole> = cluster_roles
        .unwrap_or_default()
        .iter()
        .map(|r| (r.metadata.name.as_str(), r))
        .collect();

    let resolve_cluster_role = |name: &str| -> Vec<PolicyRule> {
        cluster_role_index
            .get(name)
            .map(|cr| cr.rules.clone())
            .unwrap_or_default()
    };

    let mut rbac = EffectiveRbac::default();

    for rb in role_bindings.unwrap_or_default() {
        let binding_ns = rb.metadata.namespace_or_empty();
        let role_kind = RoleKind::parse(&rb.role_ref.kind);

        for subject in rb.subjects.iter().filter(|s| s.is_service_account()) {
            // A RoleBinding may only reach into another namespace when the
            // subject names it explicitly.
            let sa_ns = subject.explicit_namespace().unwrap_or(binding_ns);

            let (role_namespace, rules) = match role_kind {
                RoleKind::Role => {
                    let rules = role_index
                        .get(&ObjectKey::new(binding_ns, rb.role_ref.name.as_str()))
                        .map(|r| r.rules.clone())
                        .unwrap_or_default();
                    (Some(binding_ns.to_string()), rules)
                }
                RoleKind::ClusterRole => (None, resolve_cluster_role(&rb.role_ref.name)),
                RoleKind::Other(_) => (None, Vec::new()),
            };

            rbac.add(
                ObjectKey::new(sa_ns, subject.name.as_str()),
                BoundRole {
                    role_kind: role_kind.clone(),
                    role_namespace,
                    role_name: rb.role_ref.name.clone(),
                    binding: rb.metadata.name.clone(),
                    binding_scope: BindingScope::Namespace(binding_ns.to_string()),
                    rules,
                },
            );
        }
    }

    for crb in cluster_role_bindings.unwrap_or_default() {
        let role_kind = RoleKind::parse(&crb.role_ref.kind);

        for subject in crb.subjects.iter().filter(|s| s.is_service_account()) {
            // Subjects without a namespace are ambiguous on a cluster-scoped
            // binding and are dropped.
            let Some(sa_ns) = subject.explicit_namespace() else {
                log::debug!(
                    "Skipping ClusterRoleBinding {} subject {} without namespace",
                    crb.metadata.name,
                    subject.name
                );
                continue;
            };

            let rules = match role_kind {
                RoleKind::ClusterRole => resolve_cluster_role(&crb.role_ref.name),
                _ => Vec::new(),
            };

            rbac.add(
                ObjectKey::new(sa_ns, subject.name.as_str()),
                BoundRole {
                    role_kind: role_kind.clone(),
                    role_namespace: None,
                    role_name: crb.role_ref.name.clone(),
                    binding: crb.metadata.name.clone(),
                    binding_scope: BindingScope::Cluster,
                    rules,
                },
            );
        }
    }

    for sa in service_accounts.unwrap_or_default() {
        rbac.by_service_account
            .entry(ObjectKey::of(&sa.metadata))
            .or_default();
    }

    rbac
}
