//! End-to-end tests for the flightload-ingest binary
//!
//! Every failure, including a broken logging setup, ends up in the error log
//! and the process still exits cleanly.

mod common;

use assert_cmd::Command;
use common::{write_file, COUNTRIES};
use predicates::prelude::*;
use std::path::Path;

fn ingest(data_dir: &Path, error_log: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flightload-ingest").unwrap();
    cmd.env_clear()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--error-log")
        .arg(error_log);
    cmd
}

fn read_log(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_dry_run_load_writes_no_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "countries.dat", COUNTRIES);
    let log = dir.path().join("errors.log");

    ingest(dir.path(), &log)
        .args(["--dry-run", "load", "country"])
        .assert()
        .success();

    assert!(read_log(&log).is_empty());
}

#[test]
fn test_invalid_log_level_is_recorded_and_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "countries.dat", COUNTRIES);
    let log = dir.path().join("errors.log");

    ingest(dir.path(), &log)
        .env("LOG_LEVEL", "loud")
        .args(["--dry-run", "load", "country"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entity summary"));

    let lines = read_log(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("General error: Invalid logging configuration"));
    assert!(lines[0].contains("Invalid log level: loud"));
}

#[test]
fn test_uncreatable_log_dir_falls_back_to_console() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "countries.dat", COUNTRIES);
    let blocker = write_file(dir.path(), "not-a-dir", "");
    let log = dir.path().join("errors.log");

    ingest(dir.path(), &log)
        .env("LOG_OUTPUT", "file")
        .env("LOG_DIR", blocker.join("logs"))
        .args(["--dry-run", "load", "country"])
        .assert()
        .success();

    let lines = read_log(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("General error: Failed to initialize logging"));
}

#[test]
fn test_missing_store_url_is_a_general_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("errors.log");

    ingest(dir.path(), &log).arg("all").assert().success();

    let lines = read_log(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("General error: FLIGHTLOAD_STORE_URL or --store-url is required"));
}
