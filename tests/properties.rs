use kube_audit::analyzer::resources::{Namespace, Pod};
use kube_audit::analyzer::{AuditOptions, Inventory, Severity, audit};
use proptest::prelude::*;
use serde_json::{Value, json};

fn optional_bool() -> impl Strategy<Value = Option<bool>> {
    prop_oneof![Just(None), Just(Some(true)), Just(Some(false))]
}

fn security_context() -> impl Strategy<Value = Value> {
    (
        optional_bool(),
        optional_bool(),
        optional_bool(),
        prop::option::of(0i64..3),
        prop::option::of(prop::sample::select(vec!["RuntimeDefault", "Unconfined"])),
        prop::bool::ANY,
    )
        .prop_map(|(privileged, escalation, read_only, uid, seccomp, drop_all)| {
            let mut sc = serde_json::Map::new();
            if let Some(v) = privileged {
                sc.insert("privileged".into(), json!(v));
            }
            if let Some(v) = escalation {
                sc.insert("allowPrivilegeEscalation".into(), json!(v));
            }
            if let Some(v) = read_only {
                sc.insert("readOnlyRootFilesystem".into(), json!(v));
            }
            if let Some(v) = uid {
                sc.insert("runAsUser".into(), json!(v));
            }
            if let Some(v) = seccomp {
                sc.insert("seccompProfile".into(), json!({ "type": v }));
            }
            if drop_all {
                sc.insert("capabilities".into(), json!({ "drop": ["ALL"] }));
            }
            Value::Object(sc)
        })
}

fn pod() -> impl Strategy<Value = Pod> {
    (
        prop::bool::ANY,
        prop::bool::ANY,
        prop::bool::ANY,
        optional_bool(),
        prop::collection::vec(security_context(), 1..4),
    )
        .prop_map(|(host_network, host_pid, host_ipc, automount, contexts)| {
            let containers: Vec<Value> = contexts
                .into_iter()
                .enumerate()
                .map(|(i, sc)| json!({ "name": format!("c{}", i), "securityContext": sc }))
                .collect();
            let mut spec = json!({
                "hostNetwork": host_network,
                "hostPID": host_pid,
                "hostIPC": host_ipc,
                "containers": containers,
            });
            if let Some(v) = automount {
                spec["automountServiceAccountToken"] = json!(v);
            }
            serde_json::from_value(json!({
                "metadata": { "name": "p", "namespace": "ns" },
                "spec": spec,
            }))
            .unwrap()
        })
}

fn namespace() -> impl Strategy<Value = Namespace> {
    prop::option::of(prop::sample::select(vec![
        "", "privileged", "Privileged", "baseline", "restricted",
    ]))
    .prop_map(|level| {
        let labels = match level {
            Some(level) => json!({ "pod-security.kubernetes.io/enforce": level }),
            None => json!({}),
        };
        serde_json::from_value(json!({ "metadata": { "name": "ns", "labels": labels } }))
            .unwrap()
    })
}

fn pod_inventory(pods: Vec<Pod>) -> Inventory {
    Inventory {
        pods: Some(pods),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn audit_is_deterministic(pods in prop::collection::vec(pod(), 0..4)) {
        let inventory = pod_inventory(pods);
        let first = audit(&inventory, &AuditOptions::default());
        let second = audit(&inventory, &AuditOptions::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn privileged_containers_are_critical(p in pod()) {
        let privileged = p
            .spec
            .containers
            .iter()
            .filter(|c| c.security_context.as_ref().and_then(|sc| sc.privileged) == Some(true))
            .count();
        let findings = audit(&pod_inventory(vec![p]), &AuditOptions::default());
        let flagged: Vec<_> = findings.iter().filter(|f| f.check_id == "K8S-POD-001").collect();

        prop_assert_eq!(flagged.len(), privileged);
        prop_assert!(flagged.iter().all(|f| f.severity == Severity::Critical));
    }

    #[test]
    fn host_namespaces_yield_one_finding(p in pod()) {
        let set = [p.spec.host_network, p.spec.host_pid, p.spec.host_ipc];
        let findings = audit(&pod_inventory(vec![p]), &AuditOptions::default());
        let host: Vec<_> = findings.iter().filter(|f| f.check_id == "K8S-POD-003").collect();

        prop_assert_eq!(host.len(), usize::from(set.iter().any(|s| *s)));
        if let Some(finding) = host.first() {
            prop_assert_eq!(finding.evidence.contains("hostNetwork"), set[0]);
            prop_assert_eq!(finding.evidence.contains("hostPID"), set[1]);
            prop_assert_eq!(finding.evidence.contains("hostIPC"), set[2]);
        }
    }

    #[test]
    fn namespace_admission_findings_are_exclusive(ns in namespace()) {
        let inventory = Inventory {
            namespaces: Some(vec![ns]),
            ..Default::default()
        };
        let findings = audit(&inventory, &AuditOptions::default());
        let psa = findings.iter().filter(|f| f.check_id.starts_with("K8S-PSA-")).count();
        prop_assert!(psa <= 1);
    }

    #[test]
    fn exclusions_only_remove(pods in prop::collection::vec(pod(), 1..3)) {
        let inventory = pod_inventory(pods);
        let all = audit(&inventory, &AuditOptions::default());
        let options = AuditOptions { exclude_checks: vec!["K8S-POD-005".to_string()] };
        let kept = audit(&inventory, &options);

        prop_assert!(kept.iter().all(|f| f.check_id != "K8S-POD-005"));
        prop_assert_eq!(
            kept.len(),
            all.iter().filter(|f| f.check_id != "K8S-POD-005").count()
        );
    }
}

#[test]
fn host_network_and_ipc_evidence() {
    let p: Pod = serde_json::from_value(json!({
        "metadata": { "name": "p", "namespace": "ns" },
        "spec": {
            "hostNetwork": true,
            "hostIPC": true,
            "automountServiceAccountToken": false,
            "containers": [{ "name": "c" }],
        },
    }))
    .unwrap();
    let findings = audit(&pod_inventory(vec![p]), &AuditOptions::default());
    let host = findings
        .iter()
        .find(|f| f.check_id == "K8S-POD-003")
        .unwrap();
    assert_eq!(host.evidence, "spec.hostNetwork, hostIPC=true");
}
