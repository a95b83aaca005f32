use assert_cmd::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn fcref() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("fcref"))
}

fn write_archive(path: &Path, members: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, text) in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(text.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn find_refs_without_arguments_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let assert = fcref()
        .current_dir(dir.path())
        .args(["find-refs", "Main"])
        .assert()
        .code(1);

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("Usage"), "stdout:\n{stdout}");
}

#[test]
fn find_variable_refs_without_arguments_prints_usage() {
    let assert = fcref().arg("find-variable-refs").assert().code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("Usage"), "stdout:\n{stdout}");
}

#[test]
fn empty_document_argument_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let assert = fcref()
        .current_dir(dir.path())
        .args(["find-refs", "", "Sheet"])
        .assert()
        .code(1);
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("Usage"), "stdout:\n{stdout}");
}

#[test]
fn empty_directory_is_silent_success() {
    let dir = tempfile::tempdir().unwrap();
    let assert = fcref()
        .current_dir(dir.path())
        .args(["find-refs", "Main", "Sheet", "Width"])
        .assert()
        .success();
    assert!(assert.get_output().stdout.is_empty());
}

#[test]
fn find_refs_reports_matching_file() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(
        &dir.path().join("A.FCStd"),
        &[("Document.xml", "  <Expression expression=\"&lt;Doc&gt;#Sheet.Width\"/>  \n")],
    );
    write_archive(&dir.path().join("B.FCStd"), &[("Document.xml", "nothing\n")]);

    let assert = fcref()
        .current_dir(dir.path())
        .args(["find-refs", "<Doc>", "Sheet", "Width", "--highlight", "brackets"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains("A.FCStd\n"), "stdout:\n{stdout}");
    assert!(!stdout.contains("B.FCStd"), "stdout:\n{stdout}");
    assert!(
        stdout.contains("<Expression expression=\"[[&lt;Doc&gt;#Sheet.Width]]\"/>\n\n"),
        "stdout:\n{stdout}"
    );
}

#[test]
fn find_variable_refs_json() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(
        &dir.path().join("Part.FCStd"),
        &[("Document.xml", "Master#Spreadsheet.Thickness\n")],
    );

    let assert = fcref()
        .current_dir(dir.path())
        .args(["find-variable-refs", "Thickness", "--format", "json-compact"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.starts_with('['), "stdout:\n{stdout}");
    assert!(stdout.contains("\"terms\":[\"Master#Spreadsheet.Thickness\"]"), "stdout:\n{stdout}");
}

#[test]
fn clean_backups_dry_run_keeps_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Main.FCStd1"), b"").unwrap();

    fcref()
        .current_dir(dir.path())
        .args(["clean-backups", "--dry-run"])
        .assert()
        .success();
    assert!(dir.path().join("Main.FCStd1").exists());

    fcref()
        .current_dir(dir.path())
        .arg("clean-backups")
        .assert()
        .success();
    assert!(!dir.path().join("Main.FCStd1").exists());
}
