use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn graft_cmd() -> Command {
    Command::cargo_bin("graft").unwrap()
}

const MANIFEST: &str = r#"
[project]
group = "com.example"
name = "app"
version = "1.0"

[dependencies]
"org.a:a" = "1.0"
"org.b:b" = "1.+"

[[repository]]
name = "local"

[[repository.module]]
id = "org.a:a:1.0"

[[repository.module]]
id = "org.a:a:2.0"

[[repository.module]]
id = "org.b:b:1.0"

[[repository.module]]
id = "org.b:b:1.3"
dependencies = { "org.a:a" = "2.0" }
"#;

fn project(manifest: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Graft.toml"), manifest).unwrap();
    tmp
}

#[test]
fn test_resolve_without_manifest_fails() {
    let tmp = TempDir::new().unwrap();

    graft_cmd()
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find Graft.toml"));
}

#[test]
fn test_resolve_lists_selected_versions() {
    let tmp = project(MANIFEST);

    graft_cmd()
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("org.a:a:2.0"))
        .stdout(predicate::str::contains("org.b:b:1.3"))
        .stdout(predicate::str::contains("org.a:a:1.0").not());
}

#[test]
fn test_resolve_with_manifest_flag() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("deps.toml");
    fs::write(&path, MANIFEST).unwrap();

    graft_cmd()
        .args(["resolve", "--manifest"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("org.b:b:1.3"));
}

#[test]
fn test_resolve_fail_policy_reports_conflict() {
    let tmp = project(MANIFEST);
    fs::write(
        tmp.path().join("graft-config.toml"),
        "[resolution]\nconflict = \"fail\"\n",
    )
    .unwrap();

    graft_cmd()
        .current_dir(tmp.path())
        .args(["resolve", "--config", "graft-config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflict on org.a:a"));
}

#[test]
fn test_resolve_unresolved_dependency_fails() {
    let tmp = project(&MANIFEST.replace(r#""org.b:b" = "1.+""#, r#""org.b:b" = "9.+""#));

    graft_cmd()
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("org.a:a:1.0"))
        .stderr(predicate::str::contains("could not be resolved"))
        .stderr(predicate::str::contains("org.b:b:9.+"));
}

#[test]
fn test_resolve_invalid_selector_fails() {
    let tmp = project(&MANIFEST.replace(r#""org.a:a" = "1.0""#, r#""org.a:a" = "[1.0""#));

    graft_cmd()
        .current_dir(tmp.path())
        .args(["resolve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[1.0"));
}
