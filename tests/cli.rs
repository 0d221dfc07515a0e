use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn fixtures() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let prod = write_file(
        dir.path(),
        "prod.csv",
        "Id,Name,Qty\n1,Bob,10\n2,Sue,5\n3,Ann,7\n",
    );
    let test = write_file(
        dir.path(),
        "test.csv",
        "Id,Name,Qty\n1,Bob,10\n2,Susan,5\n4,Tom,1\n",
    );
    (dir, prod, test)
}

fn datacompare() -> Command {
    Command::cargo_bin("datacompare").unwrap()
}

#[test]
fn identical_files_exit_zero() {
    let (_dir, prod, _) = fixtures();

    datacompare()
        .arg(&prod)
        .arg(&prod)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No differences found."));
}

#[test]
fn terminal_summary_reports_differences() {
    let (_dir, prod, test) = fixtures();

    datacompare()
        .args(["--label1", "Prod", "--label2", "Test"])
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Only in Prod: 1"))
        .stdout(predicate::str::contains("Only in Test: 1"))
        .stdout(predicate::str::contains("Differences: 1"))
        .stdout(predicate::str::contains("Susan"));
}

#[test]
fn ignored_column_hides_difference() {
    let (dir, prod, _) = fixtures();
    let renamed = write_file(
        dir.path(),
        "renamed.csv",
        "Id,Name,Qty\n1,Bob,10\n2,Susan,5\n3,Ann,7\n",
    );

    datacompare()
        .args(["--ignore-column", "Name"])
        .arg(&prod)
        .arg(&renamed)
        .assert()
        .code(0);
}

#[test]
fn xml_report_written_to_file() {
    let (dir, prod, test) = fixtures();
    let report = dir.path().join("track.xml");

    datacompare()
        .args(["-f", "xml", "-k", "Id", "--record-name", "Item"])
        .arg("-o")
        .arg(&report)
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());

    let xml = fs::read_to_string(&report).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\r\n"));
    assert!(xml.contains("<Comparison>"));
    assert!(xml.contains("<Item Id=\"2\">"));
    assert!(xml.contains("OldValue=\"Susan\""));
}

#[test]
fn html_report_uses_builtin_template() {
    let (_dir, prod, test) = fixtures();

    datacompare()
        .args(["-f", "html", "--label1", "Prod"])
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("Only Found in: Prod"))
        .stdout(predicate::str::contains("{TABLE_ROWS}").not());
}

#[test]
fn missing_template_is_an_error() {
    let (dir, prod, test) = fixtures();

    datacompare()
        .args(["-f", "html", "--template"])
        .arg(dir.path().join("nope.html"))
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope.html"));
}

#[test]
fn final_table_csv_export() {
    let (dir, prod, test) = fixtures();
    let out = dir.path().join("final.csv");

    datacompare()
        .args(["--label1", "Prod", "--stats-only", "--final-table"])
        .arg(&out)
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cells changed: 1"));

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("Id,Name,Qty,ComparisonPK,ComparisonComment\n"));
    assert!(csv.contains("3,Ann,7,3,Only Found in: Prod\n"));
    assert!(csv.contains("2,Sue,5,2,Differences Found\n"));
}

#[test]
fn profile_tolerance_applies() {
    let (dir, prod, _) = fixtures();
    let close = write_file(
        dir.path(),
        "close.csv",
        "Id,Name,Qty\n1,Bob,11\n2,Sue,4\n3,Ann,7\n",
    );
    let profile = write_file(
        dir.path(),
        "profile.json",
        r#"{"columns": [{"name": "Qty", "type": "int", "tolerance": 1}]}"#,
    );

    datacompare()
        .arg("--profile")
        .arg(&profile)
        .arg(&prod)
        .arg(&close)
        .assert()
        .code(0);
}

#[test]
fn named_key_matches_reordered_columns() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_file(dir.path(), "a.csv", "Id,Name\n1,Bob\n2,Sue\n");
    let b = write_file(dir.path(), "b.csv", "Name,Id\nBob,1\nSue,2\n");

    datacompare()
        .args(["-k", "Id"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Exact matches: 2"))
        .stdout(predicate::str::contains("Only in Table1: 0"));
}

#[test]
fn large_ids_are_not_merged() {
    let dir = tempfile::tempdir().unwrap();
    let data = "Id,Name\n12345678901234567890,Bob\n12345678901234567891,Sue\n";
    let a = write_file(dir.path(), "a.csv", data);
    let b = write_file(dir.path(), "b.csv", data);
    let out = dir.path().join("final.csv");

    datacompare()
        .arg("--final-table")
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Exact matches: 2"));

    let csv = fs::read_to_string(&out).unwrap();
    assert!(csv.contains("12345678901234567891,Sue,12345678901234567891,Exact Match\n"));
}

#[test]
fn unknown_key_column_is_an_error() {
    let (_dir, prod, test) = fixtures();

    datacompare()
        .args(["-k", "Missing"])
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Missing"));
}

#[test]
fn malformed_ignore_when_is_an_error() {
    let (_dir, prod, test) = fixtures();

    datacompare()
        .args(["--ignore-when", "Name", "--ignore-target", "Qty"])
        .arg(&prod)
        .arg(&test)
        .assert()
        .code(2);
}
