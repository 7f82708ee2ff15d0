//! End-to-end tests for the glint binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn glint() -> Command {
    Command::cargo_bin("glint").expect("binary builds")
}

fn write_temp(extension: &str, contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .expect("temp file");
    file.write_all(contents).expect("write temp file");
    file
}

#[test]
fn highlights_file_by_extension() {
    let file = write_temp("c", b"int x;\n");
    glint()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("int"))
        .stdout(predicate::str::contains("\x1B["));
}

#[test]
fn html_format() {
    let file = write_temp("json", b"{\"a\": 1}");
    glint()
        .arg(file.path())
        .args(["--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<span data-hl=\"markup_attr\">"))
        .stdout(predicate::str::contains("<span data-hl=\"num\">1</span>"));
}

#[test]
fn token_dump_format() {
    let file = write_temp("json", b"true");
    glint()
        .arg(file.path())
        .args(["--format", "tokens"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\":\"bool\""));
}

#[test]
fn reads_stdin_with_explicit_lang() {
    glint()
        .args(["--lang", "diff", "--format", "tokens"])
        .write_stdin("+added\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("diff_ins"));
}

#[test]
fn stdin_without_lang_fails() {
    glint()
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--lang"));
}

#[test]
fn unknown_lang_fails() {
    glint()
        .args(["--lang", "cobol"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown language"));
}

#[test]
fn unknown_extension_fails() {
    let file = write_temp("xyz", b"x");
    glint()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--lang"));
}

#[test]
fn list_languages() {
    glint()
        .arg("--list-languages")
        .assert()
        .success()
        .stdout(predicate::str::contains("cpp"))
        .stdout(predicate::str::contains("JavaScript"));
}

#[test]
fn language_alias_resolves() {
    glint()
        .args(["--lang", "c++", "--format", "tokens"])
        .write_stdin("class X;")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\":\"kw\""));
}

#[test]
fn plain_text_passthrough() {
    glint()
        .args(["--lang", "txt"])
        .write_stdin("hello")
        .assert()
        .success()
        .stdout(predicate::eq("hello"));
}
