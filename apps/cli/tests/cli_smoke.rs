//! CLI 冒烟测试

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli() -> Command {
    Command::cargo_bin("notebot-cli").unwrap()
}

#[test]
fn test_list_sequences() {
    cli()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("intake-and-auto-center"))
        .stdout(predicate::str::contains("shoot-at-current-rpm"));
}

#[test]
fn test_shoot_without_note_does_nothing() {
    cli()
        .args(["run", "shoot"])
        .assert()
        .success()
        .stdout(predicate::str::contains("finished"))
        .stdout(predicate::str::contains("ShooterSetRpm").not());
}

#[test]
fn test_shoot_with_loaded_note() {
    cli()
        .args(["run", "shoot", "--rpm", "3000", "--loaded", "--clear-at", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ShooterSetRpm(3000.0)"))
        .stdout(predicate::str::contains("IndexerFeed"))
        .stdout(predicate::str::contains("finished after 1.500s"));
}

#[test]
fn test_intake_cancelled_at_time_limit() {
    cli()
        .args(["run", "intake", "--max-ms", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled (time limit reached)"))
        .stdout(predicate::str::contains("Interrupted"));
}

#[test]
fn test_zero_period_rejected() {
    cli()
        .args(["run", "outtake", "--period-ms", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("period"));
}

#[test]
fn test_config_init_check_and_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.toml");
    let path = path.to_str().unwrap();

    cli().args(["config", "init", path]).assert().success();
    cli()
        .args(["config", "init", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    cli()
        .args(["config", "check", path])
        .assert()
        .success()
        .stdout(predicate::str::contains("feed_settle"));
    cli()
        .args(["--config", path, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[timing]"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[timing]\nfeed_settle = -1.0\n").unwrap();

    cli()
        .args(["--config", path.to_str().unwrap(), "run", "shoot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timing.feed_settle"));
}

#[test]
fn test_sysid_csv_output() {
    cli()
        .args(["sysid", "--test", "dynamic-forward", "--timeout-ms", "200"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "test,direction,time_s,voltage,position,velocity",
        ))
        .stdout(predicate::str::contains("Dynamic,Forward,0.020,7.0000"))
        .stderr(predicate::str::contains("Shooter Dynamic Forward: 10 samples"));
}
