use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RULES: &str = r#"{"tech": {"AAPL": {"above": 200, "below": 180, "description": "Core"}}}"#;

/// A scratch directory holding a config, a rules file and a portfolio path.
struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with_extra("")
    }

    fn with_extra(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let rules = dir.path().join("rules.json");
        fs::write(&rules, RULES).expect("write rules");

        let config = dir.path().join("config.toml");
        let toml = format!(
            "{extra}\n[rules]\npath = {:?}\n\n[portfolio]\npath = {:?}\n",
            rules.display().to_string(),
            dir.path().join("portfolio.json").display().to_string(),
        );
        fs::write(&config, toml).expect("write config");
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("tickwatch").expect("binary built");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .env_remove("TELEGRAM_BOT_TOKEN")
            .env_remove("TELEGRAM_CHAT_ID")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

#[test]
fn validate_accepts_good_config() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rule(s) loaded"));
}

#[test]
fn validate_returns_nonzero_on_config_error() {
    let ws = Workspace::with_extra("[monitor]\ninterval_secs = 0\n");

    ws.cmd()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("monitor.interval_secs"));
}

#[test]
fn validate_reports_missing_telegram_secret() {
    let ws = Workspace::with_extra("[telegram]\nenabled = true\n");

    ws.cmd()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn missing_config_file_is_an_error() {
    let mut cmd = Command::cargo_bin("tickwatch").expect("binary built");
    cmd.args(["--config", "/nonexistent/tickwatch.toml", "list"])
        .assert()
        .failure();
}

#[test]
fn add_then_list_as_json() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["add", "aapl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added"));
    assert!(ws.path().join("portfolio.json").exists());

    let output = ws.cmd().args(["list", "--json"]).output().expect("run list");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document");
    assert_eq!(value["command"], "portfolio.list");
    assert_eq!(value["entries"][0]["ticker"], "AAPL");
}

#[test]
fn remove_untracked_ticker_is_a_no_op() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["remove", "NVDA", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"changed\":false"));
}

#[test]
fn check_untracked_ticker_fails() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["check", "NVDA"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NVDA is not in the portfolio"));
}

#[test]
fn check_with_no_alerts_as_json() {
    let ws = Workspace::new();

    let output = ws.cmd().args(["--json", "check"]).output().expect("run check");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["alerts"], serde_json::json!([]));
}
