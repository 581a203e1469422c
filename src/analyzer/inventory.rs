//! The set of resource collections one audit runs against.

use crate::analyzer::checks::workload::{self, ServiceAccountIndex};
use crate::analyzer::resources::{
    ClusterRole, ClusterRoleBinding, Ingress, Namespace, NetworkPolicy, ObjectMeta, Pod, Role,
    RoleBinding, Service, ServiceAccount,
};

/// Namespace excluded from audits unless explicitly requested.
pub const KUBE_SYSTEM: &str = "kube-system";

/// All resource collections, one per kind.
///
/// `None` means the kind could not be listed; `Some(vec![])` means it was
/// listed and nothing was found. Rules treat the two differently.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub namespaces: Option<Vec<Namespace>>,
    pub service_accounts: Option<Vec<ServiceAccount>>,
    pub pods: Option<Vec<Pod>>,
    pub roles: Option<Vec<Role>>,
    pub cluster_roles: Option<Vec<ClusterRole>>,
    pub role_bindings: Option<Vec<RoleBinding>>,
    pub cluster_role_bindings: Option<Vec<ClusterRoleBinding>>,
    pub network_policies: Option<Vec<NetworkPolicy>>,
    pub services: Option<Vec<Service>>,
    pub ingresses: Option<Vec<Ingress>>,
}

impl Inventory {
    /// An inventory where every kind was listed and is empty.
    pub fn empty() -> Self {
        Self {
            namespaces: Some(Vec::new()),
            service_accounts: Some(Vec::new()),
            pods: Some(Vec::new()),
            roles: Some(Vec::new()),
            cluster_roles: Some(Vec::new()),
            role_bindings: Some(Vec::new()),
            cluster_role_bindings: Some(Vec::new()),
            network_policies: Some(Vec::new()),
            services: Some(Vec::new()),
            ingresses: Some(Vec::new()),
        }
    }

    /// `namespace/name` index over the listed ServiceAccounts.
    pub fn service_account_index(&self) -> ServiceAccountIndex<'_> {
        workload::index_service_accounts(self.service_accounts.as_deref().unwrap_or_default())
    }

    /// Restrict every namespaced collection to the namespaces in `scope`.
    ///
    /// Roles, ClusterRoles and both kinds of binding are kept whole, since a
    /// binding can grant a ServiceAccount in another namespace. Bindings
    /// instead lose ServiceAccount subjects whose namespace is out of scope.
    pub fn retain_scope(&mut self, scope: &NamespaceScope) {
        fn retain<T>(
            items: &mut Option<Vec<T>>,
            scope: &NamespaceScope,
            meta: fn(&T) -> &ObjectMeta,
        ) {
            if let Some(items) = items {
                items.retain(|item| scope.contains(meta(item).namespace_or_empty()));
            }
        }

        if let Some(namespaces) = &mut self.namespaces {
            namespaces.retain(|ns| scope.contains(&ns.metadata.name));
        }
        retain(&mut self.service_accounts, scope, |o| &o.metadata);
        retain(&mut self.pods, scope, |o| &o.metadata);
        retain(&mut self.network_policies, scope, |o| &o.metadata);
        retain(&mut self.services, scope, |o| &o.metadata);
        retain(&mut self.ingresses, scope, |o| &o.metadata);

        if let Some(bindings) = &mut self.role_bindings {
            for rb in bindings.iter_mut() {
                let binding_ns = rb.metadata.namespace_or_empty();
                rb.subjects.retain(|s| {
                    !s.is_service_account()
                        || scope.contains(s.explicit_namespace().unwrap_or(binding_ns))
                });
            }
        }
        if let Some(bindings) = &mut self.cluster_role_bindings {
            for crb in bindings.iter_mut() {
                crb.subjects.retain(|s| match s.explicit_namespace() {
                    Some(ns) => scope.contains(ns),
                    None => true,
                });
            }
        }
    }

    /// Number of objects per listed kind, for logging.
    pub fn counts(&self) -> Vec<(&'static str, Option<usize>)> {
        vec![
            ("namespaces", self.namespaces.as_ref().map(Vec::len)),
            ("serviceaccounts", self.service_accounts.as_ref().map(Vec::len)),
            ("pods", self.pods.as_ref().map(Vec::len)),
            ("roles", self.roles.as_ref().map(Vec::len)),
            ("clusterroles", self.cluster_roles.as_ref().map(Vec::len)),
            ("rolebindings", self.role_bindings.as_ref().map(Vec::len)),
            (
                "clusterrolebindings",
                self.cluster_role_bindings.as_ref().map(Vec::len),
            ),
            ("networkpolicies", self.network_policies.as_ref().map(Vec::len)),
            ("services", self.services.as_ref().map(Vec::len)),
            ("ingresses", self.ingresses.as_ref().map(Vec::len)),
        ]
    }
}

/// Which namespaces an audit covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    /// Only this namespace, when set.
    pub only: Option<String>,
    pub include_kube_system: bool,
}

impl NamespaceScope {
    pub fn contains(&self, namespace: &str) -> bool {
        if let Some(only) = &self.only {
            if only != namespace {
                return false;
            }
        }
        self.include_kube_system || namespace != KUBE_SYSTEM
    }
}
