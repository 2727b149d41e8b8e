mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestWorkspace;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn analyze_prints_report_json() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(120));
    let output = cargo_bin_cmd!("table-insight")
        .args(["analyze", "-i", path.to_str().unwrap()])
        .output()
        .expect("run analyze");
    assert!(output.status.success());

    let report = stdout_json(&output.stdout);
    assert_eq!(report["filename"], "sales.csv");
    assert_eq!(report["total_rows"], 120);
    assert_eq!(report["data"].as_array().map(Vec::len), Some(100));
    assert_eq!(report["data_types"]["amount"], "numeric");
    assert_eq!(report["charts"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["stats"][1]["type"], "categorical");
}

#[test]
fn types_preserve_column_order() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(20));
    cargo_bin_cmd!("table-insight")
        .args(["types", "-i", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains(r#""date": "datetime""#))
        .stdout(contains(r#""dept": "categorical""#));
}

#[test]
fn stats_prints_console_table() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(10));
    cargo_bin_cmd!("table-insight")
        .args(["stats", "-i", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("most_common"))
        .stdout(contains("amount"))
        .stdout(contains("550"));
}

#[test]
fn page_past_end_returns_empty_window() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(5));
    let output = cargo_bin_cmd!("table-insight")
        .args(["page", "-i", path.to_str().unwrap(), "--offset", "9"])
        .output()
        .expect("run page");
    assert!(output.status.success());
    let window = stdout_json(&output.stdout);
    assert_eq!(window["rows"].as_array().map(Vec::len), Some(0));
    assert_eq!(window["has_more"], false);
}

#[test]
fn charts_accept_category_override() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "staff.csv",
        "dept,site,salary\nIT,north,10\nHR,south,20\nIT,north,30\nIT,south,40\nHR,north,50\n",
    );
    let output = cargo_bin_cmd!("table-insight")
        .args(["charts", "-i", path.to_str().unwrap(), "--category", "site"])
        .output()
        .expect("run charts");
    assert!(output.status.success());
    let charts = stdout_json(&output.stdout);
    assert_eq!(charts[0]["category"], "site");
    assert_eq!(charts[0]["title"], "salary by site");
}

#[test]
fn preview_renders_rows() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(30));
    cargo_bin_cmd!("table-insight")
        .args(["preview", "-i", path.to_str().unwrap(), "--rows", "2"])
        .assert()
        .success()
        .stdout(contains("person1"))
        .stdout(predicate::str::contains("person2").not());
}

#[test]
fn config_file_overrides_preview_rows() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("sales.csv", &common::sales_csv(30));
    let config = workspace.write("settings.yml", "preview_rows: 5\n");
    let output = cargo_bin_cmd!("table-insight")
        .args([
            "--config",
            config.to_str().unwrap(),
            "analyze",
            "-i",
            path.to_str().unwrap(),
        ])
        .output()
        .expect("run analyze");
    assert!(output.status.success());
    let report = stdout_json(&output.stdout);
    assert_eq!(report["data"].as_array().map(Vec::len), Some(5));
}

#[test]
fn unsupported_file_fails_with_message() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("notes.docx", "hello");
    cargo_bin_cmd!("table-insight")
        .args(["analyze", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Unsupported file format"));
}

#[test]
fn empty_csv_fails_with_empty_result() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("empty.csv", "");
    cargo_bin_cmd!("table-insight")
        .args(["stats", "-i", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("No usable data"));
}
