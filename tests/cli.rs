use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_sync_trigger() {
    let mut cmd = Command::cargo_bin("wiki-mirror").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_fails_fast_on_missing_config_file() {
    let mut cmd = Command::cargo_bin("wiki-mirror").expect("Binary exists");
    cmd.arg("sync").arg("--config").arg("/nonexistent/config.yaml");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}
