mod common;

use assert_cmd::Command;
use common::corpus_with_corrupt_file;
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn writes_json_report_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    corpus_with_corrupt_file(dir.path(), 2.0);

    let output = Command::cargo_bin("acoustic-featurizer")
        .unwrap()
        .arg(dir.path())
        .args(["--workers", "2", "--fit-duration"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["columns"].as_array().unwrap().len(), 72);
    assert_eq!(report["rows"].as_array().unwrap().len(), 4);
    assert_eq!(report["failures"][0]["id"], 2);
    assert!(report["skipped"].as_array().unwrap().is_empty());
    // NaN padding for the missing long windows serializes as null
    assert!(report["rows"][0]["values"][71].is_null());
}

#[test]
fn writes_report_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    corpus_with_corrupt_file(dir.path(), 2.0);
    let out = tempfile::tempdir().unwrap();
    let report_path = out.path().join("features.json");

    Command::cargo_bin("acoustic-featurizer")
        .unwrap()
        .arg(dir.path())
        .args(["--config-json", r#"{"distributed": {"clip_seconds": 2}}"#])
        .arg("--output")
        .arg(&report_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("feature extraction finished"));

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["columns"].as_array().unwrap().len(), 1 + 44 + 1 + 3 + 3);
    assert_eq!(report["rows"][0]["metadata"]["machine_type"], "Fan");
}

#[test]
fn missing_root_fails() {
    Command::cargo_bin("acoustic-featurizer")
        .unwrap()
        .arg("/no/such/directory")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Root directory does not exist"));
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("acoustic-featurizer")
        .unwrap()
        .arg(dir.path())
        .args(["--config-json", r#"{"n_fft": 0}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load extraction config"));
}
