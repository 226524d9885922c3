//! Integration tests for config commands under an isolated KHETSETU_HOME.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::tempdir;

/// Test: config path resolves inside KHETSETU_HOME.
#[test]
fn test_config_path_uses_home_override() {
    let temp = tempdir().unwrap();

    Command::cargo_bin("khetsetu")
        .unwrap()
        .env("KHETSETU_HOME", temp.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(temp.path().to_str().unwrap()))
        .stdout(predicate::str::contains("config.toml"));
}

/// Test: config init creates the file once and refuses a second time.
#[test]
fn test_config_init_once() {
    let temp = tempdir().unwrap();

    Command::cargo_bin("khetsetu")
        .unwrap()
        .env("KHETSETU_HOME", temp.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config"));

    assert!(temp.path().join("config.toml").exists());

    Command::cargo_bin("khetsetu")
        .unwrap()
        .env("KHETSETU_HOME", temp.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

/// Test: config set-url persists into config.toml.
#[test]
fn test_config_set_url() {
    let temp = tempdir().unwrap();

    Command::cargo_bin("khetsetu")
        .unwrap()
        .env("KHETSETU_HOME", temp.path())
        .args(["config", "set-url", "https://api.khetsetu.example/api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API URL set"));

    let contents = fs::read_to_string(temp.path().join("config.toml")).unwrap();
    assert!(contents.contains("https://api.khetsetu.example/api"));
}

/// Test: config set-url rejects a malformed URL.
#[test]
fn test_config_set_url_rejects_invalid() {
    let temp = tempdir().unwrap();

    Command::cargo_bin("khetsetu")
        .unwrap()
        .env("KHETSETU_HOME", temp.path())
        .args(["config", "set-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid KhetSetu API URL"));
}
