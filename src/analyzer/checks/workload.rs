//! Pod and container configuration checks.
//!
//! Pod-level checks run once per pod. Container checks run over init
//! containers followed by regular containers and are expressed as a table of
//! check functions over a [`ContainerContext`], which carries the effective
//! security settings after pod-level defaults and container overrides are
//! resolved.

use crate::analyzer::catalog::{self, CheckSpec};
use crate::analyzer::resources::{
    Container, ObjectKey, Pod, PodSecurityContext, SeccompProfile, SecurityContext, ServiceAccount,
};
use crate::analyzer::types::{Finding, ResourceRef};
use std::collections::HashMap;

/// ServiceAccounts indexed by `namespace/name`.
pub type ServiceAccountIndex<'a> = HashMap<ObjectKey, &'a ServiceAccount>;

/// ServiceAccount used when a pod does not name one.
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Build the ServiceAccount index used for automount resolution.
pub fn index_service_accounts(service_accounts: &[ServiceAccount]) -> ServiceAccountIndex<'_> {
    service_accounts
        .iter()
        .map(|sa| (ObjectKey::of(&sa.metadata), sa))
        .collect()
}

/// Evaluate every pod.
pub fn evaluate(pods: &[Pod], service_accounts: &ServiceAccountIndex<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for pod in pods {
        findings.extend(check_pod(pod, service_accounts));
    }
    findings
}

/// A check condition that held, with the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub spec: &'static CheckSpec,
    pub evidence: String,
}

impl Hit {
    fn new(spec: &'static CheckSpec, evidence: impl Into<String>) -> Self {
        Self {
            spec,
            evidence: evidence.into(),
        }
    }
}

fn check_pod(pod: &Pod, service_accounts: &ServiceAccountIndex<'_>) -> Vec<Finding> {
    let resource = ResourceRef::namespaced(
        "Pod",
        pod.metadata.namespace_or_empty(),
        pod.metadata.name.as_str(),
    );

    let mut hits = Vec::new();
    hits.extend(host_namespaces(pod));
    hits.extend(host_path_volumes(pod));
    hits.extend(token_automount(pod, service_accounts));

    let pod_sc = pod.spec.security_context.as_ref();
    for container in pod.spec.all_containers() {
        let ctx = ContainerContext::new(container, pod_sc);
        for check in CONTAINER_CHECKS {
            hits.extend(check(&ctx));
        }
    }

    hits.into_iter()
        .map(|hit| hit.spec.finding(resource.clone(), hit.evidence))
        .collect()
}

// ============================================================================
// Pod-level checks
// ============================================================================

fn host_namespaces(pod: &Pod) -> Option<Hit> {
    let spec = &pod.spec;
    let modes: Vec<&str> = [
        (spec.host_network, "hostNetwork"),
        (spec.host_pid, "hostPID"),
        (spec.host_ipc, "hostIPC"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if modes.is_empty() {
        return None;
    }
    Some(Hit::new(
        &catalog::POD_HOST_NAMESPACES,
        format!("spec.{}=true", modes.join(", ")),
    ))
}

fn host_path_volumes(pod: &Pod) -> Vec<Hit> {
    pod.spec
        .volumes
        .iter()
        .filter_map(|volume| {
            let host_path = volume.host_path.as_ref()?;
            Some(Hit::new(
                &catalog::POD_HOST_PATH,
                format!("volume {:?}: hostPath={:?}", volume.name, host_path.path),
            ))
        })
        .collect()
}

/// Effective automount setting: pod spec, then the pod's ServiceAccount,
/// then the Kubernetes default of `true`.
pub fn effective_automount(pod: &Pod, service_accounts: &ServiceAccountIndex<'_>) -> bool {
    if let Some(explicit) = pod.spec.automount_service_account_token {
        return explicit;
    }
    let sa_name = pod
        .spec
        .service_account_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_SERVICE_ACCOUNT);
    service_accounts
        .get(&ObjectKey::new(pod.metadata.namespace_or_empty(), sa_name))
        .and_then(|sa| sa.automount_service_account_token)
        .unwrap_or(true)
}

fn token_automount(pod: &Pod, service_accounts: &ServiceAccountIndex<'_>) -> Option<Hit> {
    effective_automount(pod, service_accounts).then(|| {
        Hit::new(
            &catalog::POD_SA_TOKEN_AUTOMOUNT,
            "automountServiceAccountToken=true (explicit or default)",
        )
    })
}

// ============================================================================
// Container-level checks
// ============================================================================

/// A container together with its effective security settings.
#[derive(Debug, Clone)]
pub struct ContainerContext<'a> {
    pub container: &'a Container,
    pub security_context: Option<&'a SecurityContext>,
    pub run_as_user: Option<i64>,
    pub run_as_non_root: Option<bool>,
    pub seccomp_profile: Option<&'a SeccompProfile>,
}

impl<'a> ContainerContext<'a> {
    /// Resolve container overrides against pod-level defaults.
    pub fn new(container: &'a Container, pod_sc: Option<&'a PodSecurityContext>) -> Self {
        let sc = container.security_context.as_ref();
        Self {
            container,
            security_context: sc,
            run_as_user: sc
                .and_then(|c| c.run_as_user)
                .or_else(|| pod_sc.and_then(|p| p.run_as_user)),
            run_as_non_root: sc
                .and_then(|c| c.run_as_non_root)
                .or_else(|| pod_sc.and_then(|p| p.run_as_non_root)),
            seccomp_profile: sc
                .and_then(|c| c.seccomp_profile.as_ref())
                .or_else(|| pod_sc.and_then(|p| p.seccomp_profile.as_ref())),
        }
    }

    fn name(&self) -> &str {
        &self.container.name
    }

    fn flag(&self, field: impl Fn(&SecurityContext) -> Option<bool>) -> Option<bool> {
        self.security_context.and_then(field)
    }

    fn evidence(&self, detail: impl std::fmt::Display) -> String {
        format!("container {:?}: {}", self.name(), detail)
    }
}

type ContainerCheck = fn(&ContainerContext<'_>) -> Vec<Hit>;

/// Container checks, each yielding at most one hit per condition, except the
/// secret checks which yield one hit per offending variable or source.
const CONTAINER_CHECKS: &[ContainerCheck] = &[
    privileged,
    root_user,
    seccomp,
    privilege_escalation,
    writable_root_fs,
    added_capabilities,
    dropped_capabilities,
    secret_env,
    secret_env_from,
];

fn privileged(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    if ctx.flag(|sc| sc.privileged) == Some(true) {
        vec![Hit::new(
            &catalog::POD_PRIVILEGED,
            ctx.evidence("securityContext.privileged=true"),
        )]
    } else {
        Vec::new()
    }
}

/// Root UID takes precedence over a disabled runAsNonRoot.
fn root_user(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    if ctx.run_as_user == Some(0) {
        vec![Hit::new(&catalog::POD_RUNS_AS_ROOT, ctx.evidence("runAsUser=0"))]
    } else if ctx.run_as_non_root == Some(false) {
        vec![Hit::new(
            &catalog::POD_RUN_AS_NON_ROOT_DISABLED,
            ctx.evidence("runAsNonRoot=false"),
        )]
    } else {
        Vec::new()
    }
}

fn seccomp(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    let detail = match ctx.seccomp_profile {
        None => "seccompProfile not set",
        Some(profile) if profile.is_unconfined() => "seccompProfile.type=Unconfined",
        Some(_) => return Vec::new(),
    };
    vec![Hit::new(&catalog::POD_SECCOMP, ctx.evidence(detail))]
}

fn privilege_escalation(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    if ctx.flag(|sc| sc.allow_privilege_escalation) == Some(true) {
        vec![Hit::new(
            &catalog::POD_PRIVILEGE_ESCALATION,
            ctx.evidence("allowPrivilegeEscalation=true"),
        )]
    } else {
        Vec::new()
    }
}

/// Only an explicit `false` is flagged.
fn writable_root_fs(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    if ctx.flag(|sc| sc.read_only_root_filesystem) == Some(false) {
        vec![Hit::new(
            &catalog::POD_WRITABLE_ROOT_FS,
            ctx.evidence("readOnlyRootFilesystem=false"),
        )]
    } else {
        Vec::new()
    }
}

fn capabilities<'a>(ctx: &ContainerContext<'a>) -> (&'a [String], &'a [String]) {
    ctx.security_context
        .and_then(|sc| sc.capabilities.as_ref())
        .map(|caps| (caps.add.as_slice(), caps.drop.as_slice()))
        .unwrap_or_default()
}

fn added_capabilities(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    let (add, _) = capabilities(ctx);
    if add.is_empty() {
        return Vec::new();
    }
    vec![Hit::new(
        &catalog::POD_CAPABILITIES_ADDED,
        ctx.evidence(format!("capabilities.add={:?}", add)),
    )]
}

fn dropped_capabilities(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    let (_, drop) = capabilities(ctx);
    if !drop.is_empty() {
        return Vec::new();
    }
    vec![Hit::new(
        &catalog::POD_CAPABILITIES_NOT_DROPPED,
        ctx.evidence("capabilities.drop not set"),
    )]
}

fn secret_env(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    ctx.container
        .env
        .iter()
        .filter_map(|var| {
            let secret = var.secret_name()?;
            Some(Hit::new(
                &catalog::POD_SECRET_ENV,
                ctx.evidence(format!("env {:?} from secret {:?}", var.name, secret)),
            ))
        })
        .collect()
}

fn secret_env_from(ctx: &ContainerContext<'_>) -> Vec<Hit> {
    ctx.container
        .env_from
        .iter()
        .filter_map(|source| {
            let secret = source.secret_ref.as_ref()?;
            Some(Hit::new(
                &catalog::POD_SECRET_ENV_FROM,
                ctx.evidence(format!("envFrom secretRef={:?}", secret.name)),
            ))
        })
        .collect()
}
