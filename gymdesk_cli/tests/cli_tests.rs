//! Integration tests for the gymdesk binary.
//!
//! These run without a live document store: an unroutable base URL makes
//! every read fall back to its empty value, which is exactly the
//! propagation policy the store client promises.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Base URL nothing is listening on
const DEAD_STORE: &str = "http://127.0.0.1:1";

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gymdesk"))
}

fn setup_data_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Gym class booking and subscription ledger",
        ));
}

#[test]
fn test_schedule_against_dead_store_is_empty_not_an_error() {
    let data_dir = setup_data_dir();

    cli()
        .args(["schedule", "--base-url", DEAD_STORE])
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions match"));
}

#[test]
fn test_book_requires_sign_in() {
    let data_dir = setup_data_dir();

    cli()
        .args(["book", "1", "--base-url", DEAD_STORE])
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("PermissionDenied"));
}

#[test]
fn test_login_rejected_when_store_unreachable() {
    let data_dir = setup_data_dir();

    cli()
        .args(["login", "anna", "secret", "--base-url", DEAD_STORE])
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("PermissionDenied"));
}

#[test]
fn test_logout_is_idempotent() {
    let data_dir = setup_data_dir();

    cli()
        .arg("logout")
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out"));

    // no stored login to remove, still fine
    cli()
        .arg("logout")
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .success();
}

#[test]
fn test_schedule_rejects_bad_level() {
    let data_dir = setup_data_dir();

    cli()
        .args(["schedule", "--level", "expert", "--base-url", DEAD_STORE])
        .arg("--data-dir")
        .arg(data_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown level"));
}
