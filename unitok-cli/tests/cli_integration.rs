//! Integration tests for the utokenize and detokenize binaries

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn tokenize_english_text() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.txt", "Mr. Miller can't pay $15,000.00.\n");

    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i").arg(&input).arg("--lc").arg("eng");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Mr. Miller can n't pay $ 15,000.00 ."));
}

#[test]
fn tokenize_from_stdin_to_stdout() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("--lc").arg("eng").write_stdin("Hello,world!\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello , world !"));
}

#[test]
fn tokenize_simple_mode_suppresses_markup() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("--lc")
        .arg("eng")
        .arg("--simple")
        .write_stdin("peace-loving\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("peace - loving"))
        .stdout(predicate::str::contains("@").not());
}

#[test]
fn tokenize_output_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.txt", "One line.\nAnother line.\n");
    let output = dir.path().join("out.txt");

    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i").arg(&input).arg("-o").arg(&output);

    cmd.assert().success();
    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(content, "One line .\nAnother line .\n");
}

#[test]
fn json_annotation_output() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.txt", "Mr. Smith agreed.\n");
    let annotation = dir.path().join("out.json");

    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i")
        .arg(&input)
        .arg("-a")
        .arg(&annotation)
        .arg("--lc")
        .arg("eng");

    cmd.assert().success();
    let content = fs::read_to_string(&annotation).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed[0]["snt"], "Mr. Smith agreed.");
    assert_eq!(parsed[0]["chart"][0]["type"], "ABBREV");
    assert_eq!(parsed[0]["chart"][0]["surf"], "Mr.");
}

#[test]
fn double_colon_annotation_output() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, "in.txt", "Go now.\n");
    let annotation = dir.path().join("out.dcln");

    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i")
        .arg(&input)
        .arg("-a")
        .arg(&annotation)
        .arg("--annotation-format")
        .arg("double-colon");

    cmd.assert().success();
    let content = fs::read_to_string(&annotation).unwrap();
    assert!(content.starts_with("::line 1 ::s Go now.\n"));
    assert!(content.contains("::span 0-2 ::type WORD-B ::surf Go"));
    assert!(content.contains("::span 6-7 ::type PUNCT-E ::surf ."));
}

#[test]
fn line_id_mode() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-f")
        .arg("--lc")
        .arg("eng")
        .write_stdin("GEN:1:1 In the beginning, God created the heavens.\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "GEN:1:1 In the beginning , God created the heavens .",
        ));
}

#[test]
fn parallel_mode_preserves_line_order() {
    let dir = TempDir::new().unwrap();
    let body: String = (1..=50).map(|i| format!("Line number {i}.\n")).collect();
    let input = write_fixture(&dir, "in.txt", &body);
    let output = dir.path().join("out.txt");

    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i").arg(&input).arg("-o").arg(&output).arg("--parallel");

    cmd.assert().success();
    let content = fs::read_to_string(&output).unwrap();
    let expected: String = (1..=50).map(|i| format!("Line number {i} .\n")).collect();
    assert_eq!(content, expected);
}

#[test]
fn detokenize_round_trip() {
    let mut tok = Command::cargo_bin("utokenize").unwrap();
    let tokenized = tok
        .arg("--lc")
        .arg("eng")
        .write_stdin("Mr. Miller can't afford it.\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let mut detok = Command::cargo_bin("detokenize").unwrap();
    detok.arg("--lc").arg("eng").write_stdin(tokenized);
    detok
        .assert()
        .success()
        .stdout(predicate::str::contains("Mr. Miller can't afford it."));
}

#[test]
fn missing_input_file_fails() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-i").arg("nonexistent.txt");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.txt"));
}

#[test]
fn missing_data_dir_fails() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("-d").arg("/no/such/data/dir").write_stdin("x\n");

    cmd.assert().failure();
}

#[test]
fn unknown_language_falls_back_with_success() {
    let mut cmd = Command::cargo_bin("utokenize").unwrap();
    cmd.arg("--lc").arg("xyz").write_stdin("Hello, world!\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello , world !"));
}

#[test]
fn version_flags() {
    Command::cargo_bin("utokenize")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("utokenize"));
    Command::cargo_bin("detokenize")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("detokenize"));
}
