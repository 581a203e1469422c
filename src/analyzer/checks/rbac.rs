//! Permission checks over the effective RBAC graph, plus a direct scan of
//! ClusterRoles for latent wildcard rules.

use crate::analyzer::catalog::{self, CheckSpec};
use crate::analyzer::rbac_graph::{BoundRole, EffectiveRbac};
use crate::analyzer::resources::{ClusterRole, ObjectKey, PolicyRule};
use crate::analyzer::types::{Finding, ResourceRef};
use std::collections::BTreeSet;

/// Evaluate every resolved binding in the graph.
///
/// Unresolved bindings (empty rules) never produce findings.
pub fn evaluate(rbac: &EffectiveRbac) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (sa, bound_roles) in rbac.iter() {
        let resource =
            ResourceRef::namespaced("ServiceAccount", sa.namespace.as_str(), sa.name.as_str());
        for bound in bound_roles.iter().filter(|b| b.is_resolved()) {
            findings.extend(check_bound_role(sa, bound, &resource));
        }
    }
    findings
}

fn check_bound_role(sa: &ObjectKey, bound: &BoundRole, resource: &ResourceRef) -> Vec<Finding> {
    let mut findings = Vec::new();

    if bound.is_cluster_admin() {
        log::debug!("{} is bound to cluster-admin via {}", sa, bound.binding);
        findings.push(catalog::RBAC_CLUSTER_ADMIN.finding(
            resource.clone(),
            format!(
                "binding {:?} ({}) -> clusterrole {:?}",
                bound.binding, bound.binding_scope, bound.role_name
            ),
        ));
    }

    for rule in &bound.rules {
        let ctx = RuleContext::new(rule);
        for check in RULE_CHECKS {
            if let Some(evidence) = (check.matches)(&ctx) {
                findings.push(check.spec.finding(
                    resource.clone(),
                    format!(
                        "binding {:?} -> {} {:?}: {}",
                        bound.binding,
                        bound.role_kind.as_str().to_lowercase(),
                        bound.role_name,
                        evidence
                    ),
                ));
            }
        }
    }

    findings
}

/// A policy rule with its resources and verbs normalised (trimmed,
/// de-duplicated, sorted).
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub rule: &'a PolicyRule,
    pub resources: BTreeSet<&'a str>,
    pub verbs: BTreeSet<&'a str>,
}

impl<'a> RuleContext<'a> {
    pub fn new(rule: &'a PolicyRule) -> Self {
        Self {
            rule,
            resources: normalise(&rule.resources),
            verbs: normalise(&rule.verbs),
        }
    }

    fn has_resource(&self, any_of: &[&str]) -> bool {
        any_of.iter().any(|r| self.resources.contains(r))
    }

    fn has_verb(&self, any_of: &[&str]) -> bool {
        any_of.iter().any(|v| self.verbs.contains(v))
    }

    fn verbs_evidence(&self) -> String {
        format!("{:?}", self.verbs.iter().collect::<Vec<_>>())
    }
}

fn normalise(values: &[String]) -> BTreeSet<&str> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Whether any field of the rule contains the `*` wildcard.
pub fn has_wildcard(rule: &PolicyRule) -> bool {
    [&rule.verbs, &rule.resources, &rule.api_groups]
        .iter()
        .any(|list| list.iter().any(|v| v == "*"))
}

fn raw_rule_evidence(rule: &PolicyRule) -> String {
    format!(
        "apiGroups={:?} resources={:?} verbs={:?}",
        rule.api_groups, rule.resources, rule.verbs
    )
}

/// One row of the per-rule check table.
struct RuleCheck {
    spec: &'static CheckSpec,
    matches: fn(&RuleContext<'_>) -> Option<String>,
}

/// Evaluated independently; a single rule can trigger several rows.
const RULE_CHECKS: &[RuleCheck] = &[
    RuleCheck {
        spec: &catalog::RBAC_WILDCARD,
        matches: |ctx| has_wildcard(ctx.rule).then(|| raw_rule_evidence(ctx.rule)),
    },
    RuleCheck {
        spec: &catalog::RBAC_SECRETS_READ,
        matches: |ctx| {
            (ctx.has_resource(&["secrets"]) && ctx.has_verb(&["get", "list", "watch"])).then(
                || format!("resources include secrets, verbs={}", ctx.verbs_evidence()),
            )
        },
    },
    RuleCheck {
        spec: &catalog::RBAC_PODS_EXEC,
        matches: |ctx| {
            (ctx.has_resource(&["pods/exec"]) && ctx.has_verb(&["create", "get"])).then(|| {
                format!("resources include pods/exec, verbs={}", ctx.verbs_evidence())
            })
        },
    },
    RuleCheck {
        spec: &catalog::RBAC_NODES,
        matches: |ctx| {
            ctx.has_resource(&["nodes"])
                .then(|| format!("resources include nodes, verbs={}", ctx.verbs_evidence()))
        },
    },
    RuleCheck {
        spec: &catalog::RBAC_BINDING_ESCALATION,
        matches: |ctx| {
            (ctx.has_resource(&["rolebindings", "clusterrolebindings"])
                && ctx.has_verb(&["create", "patch", "update"]))
            .then(|| {
                format!(
                    "resources include rolebindings/clusterrolebindings, verbs={}",
                    ctx.verbs_evidence()
                )
            })
        },
    },
];

/// Flag every wildcard rule of every ClusterRole, bound or not.
pub fn evaluate_cluster_roles(cluster_roles: &[ClusterRole]) -> Vec<Finding> {
    cluster_roles
        .iter()
        .flat_map(|cr| {
            cr.rules.iter().filter(|r| has_wildcard(r)).map(|rule| {
                catalog::RBAC_CLUSTER_ROLE_WILDCARD.finding(
                    ResourceRef::cluster("ClusterRole", cr.metadata.name.as_str()),
                    raw_rule_evidence(rule),
                )
            })
        })
        .collect()
}
