use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn invq() -> Command {
    let mut cmd = Command::cargo_bin("invq").unwrap();
    cmd.env_remove("GEMINI_API_KEY");
    cmd
}

#[test]
fn test_merge_writes_combined_output() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages.json");
    let output = dir.path().join("out").join("combined_output.json");
    fs::write(
        &pages,
        r#"{
            "1": {"invoice_number": "INV-1", "cgst": null, "items": [{"S.N.": 1}]},
            "2": [{"S.N.": 2}],
            "3": "garbled",
            "4": {"cgst": 45, "total_amount_after_gst": 590, "items": [{"S.N.": 3}]}
        }"#,
    )
    .unwrap();

    invq()
        .arg("merge")
        .arg(&pages)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("page 3: skipped"));

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("\n    \"invoice_number\": \"INV-1\""));

    let merged: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(merged["cgst"], 45);
    assert_eq!(merged["total_amount_after_gst"], 590);
    assert_eq!(merged["items"].as_array().unwrap().len(), 3);
    assert_eq!(merged["items"][2]["S.N."], 3);
}

#[test]
fn test_merge_without_anchor_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages.json");
    let output = dir.path().join("combined_output.json");
    fs::write(&pages, r#"{"2": [{"S.N.": 2}]}"#).unwrap();

    invq()
        .arg("merge")
        .arg(&pages)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("anchor page 1 is missing"));

    assert!(!output.exists());
}

#[test]
fn test_merge_list_anchor_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pages = dir.path().join("pages.json");
    let output = dir.path().join("combined_output.json");
    fs::write(&pages, r#"{"1": [{"S.N.": 1}]}"#).unwrap();

    invq()
        .arg("merge")
        .arg(&pages)
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("anchor page must be a mapping"));

    assert!(!output.exists());
}

#[test]
fn test_config_path_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    invq()
        .args(["--config", config.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file:"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn test_config_init_then_get() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    let config = config.to_str().unwrap();

    invq().args(["--config", config, "config", "init"]).assert().success();
    invq()
        .args(["--config", config, "config", "set", "retry.max_attempts", "4"])
        .assert()
        .success();
    invq()
        .args(["--config", config, "config", "get", "retry.max_attempts"])
        .assert()
        .success()
        .stdout(predicate::str::diff("4\n"));
}

#[test]
fn test_ask_requires_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let invoice = dir.path().join("combined_output.json");
    fs::write(&invoice, r#"{"invoice_number": "INV-1", "items": []}"#).unwrap();

    invq()
        .arg("ask")
        .arg(&invoice)
        .arg("What is the invoice number?")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_process_missing_input_fails() {
    invq()
        .args(["process", "does/not/exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input not found"));
}
