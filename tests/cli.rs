use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/snapshots")
        .join(name)
}

/// A command isolated from any config file in the user's home or cwd.
fn kube_audit(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kube-audit").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_scan_snapshot_reaches_default_threshold() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--input"])
        .arg(fixture("cluster.yaml"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "Summary: CRITICAL=1 HIGH=3 MEDIUM=2 LOW=1",
        ))
        .stdout(predicate::str::contains("[CRITICAL] K8S-POD-001"))
        .stdout(predicate::str::contains("Resource: ServiceAccount/shop/sa1"))
        .stdout(predicate::str::contains("coredns").not());
}

#[test]
fn test_clean_snapshot_exits_zero() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--fail-on", "low", "--input"])
        .arg(fixture("clean.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No findings."));
}

#[test]
fn test_json_report_on_stdout() {
    let home = TempDir::new().unwrap();
    let output = kube_audit(&home)
        .args(["scan", "--format", "json", "--input"])
        .arg(fixture("cluster.yaml"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let findings = report["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 7);
    assert_eq!(findings[0]["checkId"], "K8S-POD-001");
    assert_eq!(findings[0]["severity"], "CRITICAL");
    assert!(
        report["cluster"]["apiServer"]
            .as_str()
            .unwrap()
            .starts_with("snapshot:")
    );
}

#[test]
fn test_fail_on_critical() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--fail-on", "CRITICAL", "--input"])
        .arg(fixture("cluster.yaml"))
        .assert()
        .code(2);

    kube_audit(&home)
        .args([
            "scan",
            "--fail-on",
            "CRITICAL",
            "--exclude-check",
            "K8S-POD-001",
            "--input",
        ])
        .arg(fixture("cluster.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("K8S-POD-001").not());
}

#[test]
fn test_namespace_filter() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--namespace", "shop", "--input"])
        .arg(fixture("cluster.yaml"))
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Summary: CRITICAL=0 HIGH=1 MEDIUM=0 LOW=0"))
        .stdout(predicate::str::contains("K8S-RBAC-002"));
}

#[test]
fn test_out_writes_json_file() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("reports/audit.json");

    kube_audit(&home)
        .args(["scan", "--fail-on", "critical", "--exclude-check", "K8S-POD-001"])
        .arg("--input")
        .arg(fixture("cluster.yaml"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary:"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["findings"].as_array().unwrap().len(), 6);
}

#[test]
fn test_snapshot_from_stdin() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--input", "-"])
        .write_stdin(std::fs::read_to_string(fixture("clean.yaml")).unwrap())
        .assert()
        .success();
}

#[test]
fn test_local_config_applies() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(".kube-audit.toml"),
        "[scan]\nexclude_checks = [\"K8S-POD-001\"]\n\n[output]\nfail_on = \"CRITICAL\"\n",
    )
    .unwrap();

    kube_audit(&home)
        .args(["scan", "--input"])
        .arg(fixture("cluster.yaml"))
        .assert()
        .success();
}

#[test]
fn test_bad_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    std::fs::write(&config, "[scan\nthis is not toml").unwrap();

    kube_audit(&home)
        .arg("--config")
        .arg(&config)
        .args(["scan", "--input"])
        .arg(fixture("clean.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_malformed_snapshot_fails() {
    let home = TempDir::new().unwrap();
    let snapshot = home.path().join("bad.yaml");
    std::fs::write(&snapshot, "kind: Pod\nmetadata: [unclosed\n").unwrap();

    kube_audit(&home)
        .args(["scan", "--input"])
        .arg(&snapshot)
        .assert()
        .code(1);
}

#[test]
fn test_context_conflicts_with_input() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .args(["scan", "--context", "prod", "--input"])
        .arg(fixture("clean.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_checks_lists_catalog() {
    let home = TempDir::new().unwrap();
    kube_audit(&home)
        .arg("checks")
        .assert()
        .success()
        .stdout(predicate::str::contains("K8S-RBAC-000"))
        .stdout(predicate::str::contains("K8S-NET-IMDS-001"));

    let output = kube_audit(&home)
        .args(["checks", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let catalog: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(
        catalog
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["id"] == "K8S-POD-001")
    );
}
