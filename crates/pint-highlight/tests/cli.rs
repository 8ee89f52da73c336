//! Tests for the `pint-highlight` binary.
#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn cmd() -> Command {
    Command::cargo_bin("pint-highlight").unwrap()
}

#[test]
fn highlights_stdin_with_explicit_language() {
    cmd()
        .args(["--language", "pint"])
        .write_stdin("var x: int;")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<span class=\"hljs-keyword\">var</span>",
        ))
        .stdout(predicate::str::contains(
            "<span class=\"hljs-attribute\">int</span>",
        ));
}

#[test]
fn highlights_file_with_auto_detection() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "predicate P {{ constraint x' == 1; }}").unwrap();

    cmd()
        .arg("--input")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("<span class=\"hljs-title\">x&#x27;</span>"));
}

#[test]
fn renders_document() {
    cmd()
        .arg("--document")
        .write_stdin("<pre><code class=\"language-pnt\">nil</code></pre>")
        .assert()
        .success()
        .stdout(
            "<pre><code class=\"language-pnt hljs language-pint\">\
             <span class=\"hljs-literal\">nil</span></code></pre>",
        );
}

#[test]
fn check_reports_builtin_grammar() {
    cmd()
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: pint"));
}

#[test]
fn check_fails_on_invalid_extra_grammar() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"name": "odd", "aliases": ["odd"], "rules": []}}"#
    )
    .unwrap();

    cmd()
        .arg("--grammar")
        .arg(file.path())
        .arg("--check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: odd: alias 'odd' repeats the grammar name"));
}

#[test]
fn dump_prints_grammar_json() {
    cmd()
        .arg("--dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pnt\""))
        .stdout(predicate::str::contains("__verify_ed25519"));
}

#[test]
fn unknown_language_fails() {
    cmd()
        .args(["--language", "cobol"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown language `cobol`"));
}

#[test]
fn short_flags_need_no_other_arguments() {
    cmd()
        .arg("-c")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: pint"));

    cmd()
        .args(["-l", "pnt"])
        .write_stdin("nil")
        .assert()
        .success()
        .stdout("<span class=\"hljs-literal\">nil</span>");
}
