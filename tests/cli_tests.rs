//! Command-line behaviour that does not need a live THREDDS server.
//!
//! Configuration errors must fail before any request is made, and an unreachable root
//! still produces a (empty) report.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("thredds-crawler").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("crawl"))
        .stdout(predicate::str::contains("resolve"));
}

#[test]
fn test_crawl_help_lists_filters() {
    cli()
        .args(["crawl", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--select"))
        .stdout(predicate::str::contains("--extra-skip"))
        .stdout(predicate::str::contains("--dap-size"));
}

#[test]
fn test_invalid_after_is_fatal() {
    cli()
        .args(["crawl", "http://192.0.2.1/thredds/catalog.xml", "--after", "next tuesday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("after"));
}

#[test]
fn test_invalid_select_pattern_is_fatal() {
    cli()
        .args(["crawl", "http://192.0.2.1/thredds/catalog.xml", "--select", "MODIS(("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MODIS(("));
}

#[test]
fn test_zero_workers_is_fatal() {
    cli()
        .args(["crawl", "http://192.0.2.1/thredds/catalog.xml", "-w", "0"])
        .assert()
        .failure();
}

#[test]
fn test_password_requires_user() {
    cli()
        .args(["crawl", "http://192.0.2.1/thredds/catalog.xml", "--password", "secret"])
        .assert()
        .failure();
}

#[test]
fn test_invalid_root_url_is_fatal() {
    cli()
        .args(["crawl", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a url"));
}

#[test]
fn test_unreachable_root_writes_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("datasets.json");

    cli()
        .args(["--format", "json", "crawl", "file:///nonexistent/catalog.xml", "-o"])
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    let json: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(json, serde_json::json!([]));
}

#[test]
fn test_unreachable_root_tsv_has_only_header() {
    cli()
        .args(["--format", "tsv", "crawl", "file:///nonexistent/catalog.html"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id\tname\tcatalog_url"))
        .stdout(predicate::function(|out: &str| out.lines().count() == 1));
}

#[test]
fn test_resolve_rejects_unsupported_scheme() {
    cli()
        .args(["resolve", "file:///nonexistent/catalog.xml?dataset=X"])
        .assert()
        .failure();
}
