//! CLI smoke tests for ota.
//!
//! These tests verify that the commands run end to end against a real
//! on-disk store and return appropriate exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ota_cmd() -> Command {
    Command::cargo_bin("ota").unwrap()
}

/// Create a temp directory with a config file pointing at a store inside
/// it, plus an embedded bundle file the fallback can resolve to.
fn temp_host() -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let embedded = temp.path().join("embedded.js");
    std::fs::write(&embedded, "// embedded bundle").unwrap();

    let config_path = temp.path().join("otakit.json");
    let config = serde_json::json!({
        "store_dir": temp.path().join("manifests"),
        "runtime_versions": ["45.0.0"],
        "embedded_bundle": { "bundle_path": embedded }
    });
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    (temp, config_path)
}

const MANIFEST_JSON: &str = r#"{
    "id": "00000000-0000-0000-0000-000000000001",
    "commit_time": "2024-01-01T00:00:00Z",
    "runtime_version": "45.0.0",
    "launch_asset": { "key": "bundle.js", "content_hash": "aa11" },
    "metadata": { "channel": "stable" }
}"#;

#[test]
fn help_flag_works() {
    ota_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
    ota_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn subcommand_help_works() {
    for cmd in &["resolve", "list", "verify", "import", "status"] {
        ota_cmd()
            .arg(cmd)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage"));
    }
}

#[test]
fn resolve_missing_config_fails() {
    let temp = TempDir::new().unwrap();
    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(temp.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn resolve_empty_store_uses_embedded_bundle() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("embedded.js"))
        .stderr(predicate::str::contains("embedded bundle"));
}

#[test]
fn resolve_accepts_filters() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(&config)
        .arg("--filter")
        .arg("channel=beta")
        .arg("--filter")
        .arg("rollout=true")
        .assert()
        .success();
}

#[test]
fn resolve_rejects_malformed_filter() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(&config)
        .arg("--filter")
        .arg("channel")
        .assert()
        .failure();
}

#[test]
fn resolve_json_emits_a_plan() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"is_using_embedded_assets\": true"));
}

#[test]
fn list_empty_store() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("list")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn import_then_list_shows_manifest() {
    let (temp, config) = temp_host();
    let manifest_path = temp.path().join("update.json");
    std::fs::write(&manifest_path, MANIFEST_JSON).unwrap();

    ota_cmd()
        .arg("import")
        .arg("--config")
        .arg(&config)
        .arg(&manifest_path)
        .assert()
        .success();

    ota_cmd()
        .arg("list")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("00000000-0000-0000-0000-000000000001"));
}

#[test]
fn verify_flags_undownloaded_assets() {
    let (temp, config) = temp_host();
    let manifest_path = temp.path().join("update.json");
    std::fs::write(&manifest_path, MANIFEST_JSON).unwrap();

    ota_cmd()
        .arg("import")
        .arg("--config")
        .arg(&config)
        .arg(&manifest_path)
        .assert()
        .success();

    ota_cmd()
        .arg("verify")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bundle.js"));
}

#[test]
fn verify_empty_store_succeeds() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("verify")
        .arg("--config")
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn status_reports_store_and_policy() {
    let (_temp, config) = temp_host();
    ota_cmd()
        .arg("status")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("newest-filter-aware"))
        .stderr(predicate::str::contains("Embedded:  configured"));
}

#[test]
fn resolve_launches_imported_update_when_assets_present() {
    let (temp, config) = temp_host();

    // Import a manifest whose bundle is already on disk with a matching
    // recorded path.
    let bundle = temp.path().join("downloaded-bundle.js");
    std::fs::write(&bundle, "// update bundle").unwrap();
    let manifest = serde_json::json!({
        "id": "00000000-0000-0000-0000-000000000002",
        "commit_time": "2024-02-01T00:00:00Z",
        "runtime_version": "45.0.0",
        "launch_asset": {
            "key": "bundle.js",
            "content_hash": "aa11",
            "local_path": bundle
        }
    });
    let manifest_path = temp.path().join("update.json");
    std::fs::write(&manifest_path, serde_json::to_string(&manifest).unwrap()).unwrap();

    ota_cmd()
        .arg("import")
        .arg("--config")
        .arg(&config)
        .arg(&manifest_path)
        .assert()
        .success();

    ota_cmd()
        .arg("resolve")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("downloaded-bundle.js"))
        .stderr(predicate::str::contains("00000000-0000-0000-0000-000000000002"));
}
