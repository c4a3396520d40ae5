// file: tests/cli_test.rs
// version: 1.0.0
// guid: 9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d

//! End-to-end checks of the kmachine binary that need no remote host

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn kmachine(storage: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kmachine").unwrap();
    cmd.env("KMACHINE_STORAGE_PATH", storage.path())
        .env_remove("KMACHINE_LOG")
        .env_remove("no_proxy")
        .env_remove("NO_PROXY");
    cmd
}

fn write_machine(storage: &TempDir, name: &str, extra: &str) {
    let dir = storage.path().join("machines").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("config.yaml"),
        format!(
            "name: {name}\nip: 10.0.0.5\nauth:\n  ca_cert_path: /tmp/ca.pem\n  ca_key_path: /tmp/ca-key.pem\n{extra}"
        ),
    )
    .unwrap();
}

#[test]
fn test_missing_arguments_fail() {
    let storage = TempDir::new().unwrap();
    kmachine(&storage).arg("provision").assert().failure();
    kmachine(&storage).arg("env").assert().failure();
    kmachine(&storage).args(["deploy", "node1"]).assert().failure();
}

#[test]
fn test_unknown_addon_kind_fails() {
    let storage = TempDir::new().unwrap();
    kmachine(&storage)
        .args(["deploy", "node1", "ingress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ingress"));
}

#[test]
fn test_unknown_machine_fails() {
    let storage = TempDir::new().unwrap();
    kmachine(&storage)
        .args(["env", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_env_prints_fish_directives() {
    let storage = TempDir::new().unwrap();
    write_machine(&storage, "node1", "");

    kmachine(&storage)
        .args(["env", "node1", "--shell", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "set -x DOCKER_HOST \"tcp://10.0.0.5:2376\";\n",
        ))
        .stdout(predicate::str::contains("set -x DOCKER_MACHINE_NAME \"node1\";\n"))
        .stdout(predicate::str::contains("kubectl").not());
}

#[test]
fn test_env_with_token_and_no_proxy() {
    let storage = TempDir::new().unwrap();
    write_machine(&storage, "node1", "kubernetes:\n  token: s3cr3t\n");

    kmachine(&storage)
        .args(["env", "node1", "--shell", "bash", "--no-proxy"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "kubectl config set-credentials kuser --token=s3cr3t\n",
        ))
        .stdout(predicate::str::contains("export NO_PROXY=\"10.0.0.5\"\n"));
}

#[test]
fn test_env_unset_for_cmd() {
    let storage = TempDir::new().unwrap();
    write_machine(&storage, "node1", "");

    kmachine(&storage)
        .args(["env", "node1", "--shell", "cmd", "--unset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SET DOCKER_HOST=\n"))
        .stdout(predicate::str::contains("REM Run this command"));
}

#[test]
fn test_env_uses_token_saved_by_provision() {
    let storage = TempDir::new().unwrap();
    write_machine(&storage, "node1", "");
    fs::write(storage.path().join("machines/node1/token"), "g3n3rated\n").unwrap();

    kmachine(&storage)
        .args(["env", "node1", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "kubectl config set-credentials kuser --token=g3n3rated\n",
        ))
        .stderr(predicate::str::contains("g3n3rated").not());
}

#[test]
fn test_unsafe_cert_dir_is_rejected() {
    let storage = TempDir::new().unwrap();
    write_machine(
        &storage,
        "node1",
        "kubernetes:\n  cert_dir: \"/srv/k8s; rm -rf /tmp/x\"\n",
    );

    kmachine(&storage)
        .args(["env", "node1", "--shell", "bash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Remote certificate directory"));
}
