//! End-to-end tests driving the `grind` binary.
//!
//! Each test gets its own home directory and database so runs never touch the
//! user's real history.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn grind_binary() -> String {
    env!("CARGO_BIN_EXE_grind").to_string()
}

fn grind(home: &Path) -> Command {
    let mut cmd = Command::new(grind_binary());
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("GRIND_DATABASE_PATH", home.join("grind.db"))
        .env_remove("RUST_LOG");
    cmd
}

/// Runs `grind run` with `script` piped to stdin.
fn run_session(home: &Path, script: &str) -> Output {
    let mut child = grind(home)
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn grind run");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_session_persists_history() {
    let temp = TempDir::new().unwrap();

    let output = run_session(
        temp.path(),
        "start\nswitch\nsave chemistry Kinematics\nswitch\nlaps\nquit\n",
    );
    assert!(
        output.status.success(),
        "grind run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let out = stdout(&output);
    assert!(out.contains("Saved Kinematics [Chemistry]"));
    assert!(out.contains("Saved Break 1 [Break]"));
    assert!(out.contains("Laps (most recent first):"));

    let export = grind(temp.path()).arg("export").output().unwrap();
    assert!(export.status.success());
    let history: serde_json::Value = serde_json::from_slice(&export.stdout).unwrap();
    let days = history.as_object().unwrap();
    assert_eq!(days.len(), 1);
    let today = days.values().next().unwrap();
    assert!(today["subjects"].get("Chemistry").is_some());

    let report = grind(temp.path())
        .args(["report", "--json"])
        .output()
        .unwrap();
    assert!(report.status.success());
    let report: serde_json::Value = serde_json::from_slice(&report.stdout).unwrap();
    assert_eq!(report["active_days"], 1);
    assert!(report["timezone"].is_string());
}

#[test]
fn test_end_of_input_saves_like_quit() {
    let temp = TempDir::new().unwrap();

    let output = run_session(temp.path(), "start\nswitch\nskip\n");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Saved Study 1 [Physics]"));

    let status = grind(temp.path()).arg("status").output().unwrap();
    let status = stdout(&status);
    assert!(status.contains("Days recorded: 1"), "{status}");
    assert!(!status.contains("Last saved: never"), "{status}");
}

#[test]
fn test_invalid_utf8_input_keeps_session_alive() {
    let temp = TempDir::new().unwrap();

    let mut child = grind(temp.path())
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start\nswitch\nskip\n\xff\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "grind run should survive bad input: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("unknown command"));

    let status = grind(temp.path()).arg("status").output().unwrap();
    let status = stdout(&status);
    assert!(status.contains("Days recorded: 1"), "{status}");
    assert!(!status.contains("Last saved: never"), "{status}");
}

#[test]
fn test_categories_from_config_file() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("grind.toml");
    std::fs::write(
        &config_path,
        "categories = [\"Maths\", \"History\"]\ndefault_category = \"History\"\n",
    )
    .unwrap();

    let mut child = grind(temp.path())
        .arg("--config")
        .arg(&config_path)
        .arg("run")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start\nswitch\nsave physics\nsave maths Proofs\nq\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    let out = stdout(&output);

    assert!(out.contains("Categories: Maths, History (default History)"));
    assert!(out.contains("Unknown category 'physics'"));
    assert!(out.contains("Saved Proofs [Maths]"));
}

#[test]
fn test_report_on_empty_history() {
    let temp = TempDir::new().unwrap();

    let output = grind(temp.path())
        .args(["report", "--month", "2026-10"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("STUDY REPORT: October 2026"));
    assert!(out.contains("No study data for this month yet."));
}

#[test]
fn test_sync_is_not_available() {
    let temp = TempDir::new().unwrap();

    let output = grind(temp.path()).arg("sync").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not available"), "{stderr}");
    assert!(stderr.contains("grind export"), "{stderr}");
}
