//! End-to-end tests for the `wikifarm` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn farm() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::write(
        root.join("databases.json"),
        r#"{"domains": {"https://wiki.example.org/": "examplewiki"}, "databases": ["examplewiki", "alphawiki"]}"#,
    )
    .unwrap();
    std::fs::write(root.join("deleted.json"), r#"{"databases": ["gonewiki"]}"#).unwrap();
    std::fs::write(
        root.join("examplewiki.json"),
        r#"{"core": {"wgSitename": "Example", "wgLanguageCode": "en"}, "states": {"private": true}}"#,
    )
    .unwrap();
    std::fs::write(
        root.join("farm.toml"),
        format!(
            "cache_dir = {:?}\n\n[[suffix_rules]]\nfamily = \"example.net\"\nsuffix = \"wiki\"\n",
            root.display().to_string()
        ),
    )
    .unwrap();

    dir
}

fn wikifarm(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wikifarm").unwrap();
    cmd.current_dir(root)
        .env_remove("WIKIFARM_DB")
        .env_remove("WIKIFARM_CACHE_DIR")
        .env_remove("WIKIFARM_MODE")
        .env_remove("WIKIFARM_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(root.join("farm.toml"));
    cmd
}

#[test]
fn test_resolve_by_suffix() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["resolve", "alpha.example.net"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alphawiki"))
        .stdout(predicate::str::contains("suffix-match"));
}

#[test]
fn test_resolve_by_domain() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["resolve", "wiki.example.org"])
        .assert()
        .success()
        .stdout(predicate::str::contains("examplewiki"))
        .stdout(predicate::str::contains("domain-map"));
}

#[test]
fn test_resolve_unknown_host_fails() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["resolve", "nowhere.invalid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nowhere.invalid"));
}

#[test]
fn test_show_single_setting() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["show", "--db", "examplewiki", "--setting", "wgSitename"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Example\""));
}

#[test]
fn test_show_all_settings() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["show", "wiki.example.org"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cwPrivate\": true"))
        .stdout(predicate::str::contains("gonewiki"));
}

#[test]
fn test_deleted_wiki_reachable_from_cli() {
    let dir = farm();
    wikifarm(dir.path())
        .args(["resolve", "--db", "gonewiki"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gonewiki"));
}

#[test]
fn test_tenants_json() {
    let dir = farm();
    let output = wikifarm(dir.path())
        .args(["tenants", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["databases"], serde_json::json!(["examplewiki", "alphawiki"]));
    assert_eq!(listing["deleted"], serde_json::json!(["gonewiki"]));
}

#[test]
fn test_check_healthy_and_corrupt() {
    let dir = farm();
    wikifarm(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("alphawiki"));

    std::fs::write(dir.path().join("alphawiki.json"), "{").unwrap();
    wikifarm(dir.path()).arg("check").assert().code(2);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    wikifarm(dir.path())
        .arg("tenants")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
