use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn graft_cmd() -> Command {
    Command::cargo_bin("graft").unwrap()
}

fn project(modules: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let manifest = format!(
        r#"
[project]
name = "app"
version = "1.0"

[dependencies]
"org.x:x" = "1.0"

[[repository]]
name = "local"
{modules}"#
    );
    fs::write(tmp.path().join("Graft.toml"), manifest).unwrap();
    tmp
}

#[test]
fn test_cycles_reports_cycle() {
    let tmp = project(
        r#"
[[repository.module]]
id = "org.x:x:1.0"
dependencies = { "org.y:y" = "1.0", "org.w:w" = "1.0" }

[[repository.module]]
id = "org.y:y:1.0"
dependencies = { "org.z:z" = "1.0" }

[[repository.module]]
id = "org.z:z:1.0"
dependencies = { "org.x:x" = "1.0" }

[[repository.module]]
id = "org.w:w:1.0"
"#,
    );

    graft_cmd()
        .current_dir(tmp.path())
        .args(["cycles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dependency cycles (1):"))
        .stdout(predicate::str::contains("org.z:z:1.0"))
        .stdout(predicate::str::contains("org.w:w").not());
}

#[test]
fn test_cycles_none() {
    let tmp = project(
        r#"
[[repository.module]]
id = "org.x:x:1.0"
"#,
    );

    graft_cmd()
        .current_dir(tmp.path())
        .args(["cycles"])
        .assert()
        .success()
        .stdout("No dependency cycles.\n");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let tmp = project(
        r#"
[[repository.module]]
id = "org.x:x:1.0"
"#,
    );

    graft_cmd()
        .current_dir(tmp.path())
        .env_remove("RUST_LOG")
        .args(["cycles", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Using org.x:x:1.0 from local"));
}
