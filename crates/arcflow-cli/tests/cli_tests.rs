//! End-to-end CLI tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn arcflow() -> Command {
    Command::cargo_bin("arcflow").expect("binary built")
}

fn make_source_tree(temp: &TempDir) -> std::path::PathBuf {
    let source = temp.path().join("source");
    std::fs::create_dir_all(source.join("nested")).unwrap();
    std::fs::write(source.join("hello.txt"), b"hello cli").unwrap();
    std::fs::write(source.join("nested/data.bin"), vec![1u8; 2048]).unwrap();
    source
}

#[test]
fn test_create_extract_roundtrip() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("bundle.tar.gz");
    let out = temp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();

    arcflow()
        .args(["create", archive.to_str().unwrap(), source.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));
    assert!(archive.is_file());

    arcflow()
        .args([
            "extract",
            archive.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("extracted"));

    assert_eq!(
        std::fs::read_to_string(out.join("source/hello.txt")).unwrap(),
        "hello cli"
    );
    assert_eq!(
        std::fs::read(out.join("source/nested/data.bin")).unwrap(),
        vec![1u8; 2048]
    );
}

#[test]
fn test_list_shows_entries() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("bundle.zip");

    arcflow()
        .args(["create", archive.to_str().unwrap(), source.to_str().unwrap()])
        .assert()
        .success();

    arcflow()
        .args(["list", archive.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("source/hello.txt"))
        .stdout(predicate::str::contains("RegularFile"));
}

#[test]
fn test_list_json_output() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("bundle.zip");

    arcflow()
        .args(["create", "--quiet", archive.to_str().unwrap(), source.to_str().unwrap()])
        .assert()
        .success();

    let output = arcflow()
        .args(["list", "--json", archive.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(parsed.get("source/hello.txt").is_some());
    assert_eq!(
        parsed["source/hello.txt"]["FileType"],
        serde_json::json!("RegularFile")
    );
}

#[test]
fn test_extract_with_exclude_pattern() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("bundle.tar");
    let out = temp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();

    arcflow()
        .args(["create", "--quiet", archive.to_str().unwrap(), source.to_str().unwrap()])
        .assert()
        .success();

    arcflow()
        .args([
            "extract",
            "--quiet",
            "-x",
            "*.bin",
            archive.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out.join("source/hello.txt").exists());
    assert!(!out.join("source/nested/data.bin").exists());
}

#[test]
fn test_extract_missing_archive_fails() {
    let temp = TempDir::new().unwrap();
    arcflow()
        .args([
            "extract",
            "/no/such/archive.tar.gz",
            temp.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_create_refuses_overwrite() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("bundle.zip");
    std::fs::write(&archive, b"existing").unwrap();

    arcflow()
        .args(["create", archive.to_str().unwrap(), source.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_encrypted_zip_requires_password() {
    let temp = TempDir::new().unwrap();
    let source = make_source_tree(&temp);
    let archive = temp.path().join("locked.zip");
    let out = temp.path().join("out");
    std::fs::create_dir_all(&out).unwrap();

    arcflow()
        .args([
            "create",
            "--quiet",
            "--password",
            "hunter2",
            archive.to_str().unwrap(),
            source.to_str().unwrap(),
        ])
        .assert()
        .success();

    arcflow()
        .args([
            "extract",
            archive.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password"));

    arcflow()
        .args([
            "extract",
            "--quiet",
            "--password",
            "hunter2",
            archive.to_str().unwrap(),
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(out.join("source/hello.txt")).unwrap(),
        "hello cli"
    );
}
