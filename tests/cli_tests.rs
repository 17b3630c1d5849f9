//! Tests for the command line binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("sphinx-markup-extract").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_list_formats() {
    cli()
        .arg("--list-formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("csv"))
        .stdout(predicate::str::contains("tmprefs"))
        .stdout(predicate::str::contains("all"));
}

#[test]
fn test_unknown_format_exits_1() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("conf.py"), "app.add_role('x', r)\n").unwrap();
    cli()
        .arg(project.path())
        .args(["-o"])
        .arg(project.path())
        .args(["-F", "csv:pdf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("format 'pdf' not recognized"));
}

#[test]
fn test_missing_outdir_without_force_exits_1() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("conf.py"), "app.add_role('x', r)\n").unwrap();
    cli()
        .arg(project.path())
        .arg("-o")
        .arg(project.path().join("missing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_empty_project_exits_2() {
    let project = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    cli()
        .arg(project.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .code(2);
}

#[test]
fn test_successful_run() {
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join("conf.py"),
        "def setup(app):\n    app.add_directive('todo', Todo)\n    app.add_role('kbd', r)\n",
    )
    .unwrap();
    let out = TempDir::new().unwrap();
    let reports = out.path().join("reports");

    cli()
        .arg(project.path())
        .arg("-o")
        .arg(&reports)
        .args(["-f", "-F", "csv", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 directives, 1 roles"));

    assert!(reports.join("csv/names.csv").is_file());
    assert!(reports.join("list/roles.txt").is_file());
    assert!(!reports.join("html").exists());
}

#[test]
fn test_existing_output_without_force_exits_2() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("conf.py"), "app.add_role('x', r)\n").unwrap();
    let out = TempDir::new().unwrap();
    let run = || {
        let mut cmd = cli();
        cmd.arg(project.path()).arg("-o").arg(out.path()).args(["-F", "json"]);
        cmd
    };
    run().assert().success();
    run().assert().code(2).stderr(predicate::str::contains("Failed formats: json"));
}

#[test]
fn test_skipped_file_is_reported_once() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("conf.py"), "app.add_role('x', r)\n").unwrap();
    fs::write(project.path().join("broken.py"), "app.add_role('oops, r)\n").unwrap();
    let out = TempDir::new().unwrap();

    let assert = cli()
        .arg(project.path())
        .arg("-o")
        .arg(out.path())
        .args(["-F", "csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished with 1 warning(s)"));
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.matches("broken.py").count(), 1, "{}", stderr);
}
