//! CLI smoke tests for the availability-cli binary
//!
//! Each test runs the real binary with a throwaway home directory so log
//! files and SQLite databases never leak outside the temp dir.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const OWNER: &str = "5f0c7c1e-8e43-4a3e-9c1e-2b7a1d6f4a10";

/// Run availability-cli with HOME pointed at `home`.
fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_availability-cli"))
        .args(args)
        .env("HOME", home)
        .env("APPDATA", home)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute availability-cli")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_config(dir: &TempDir, extra: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    let content = format!(
        r#"
server:
  home_dir: "{}"

logging:
  default:
    console_level: warn
    file: "logs/availability.log"
    file_level: debug
    max_backups: 2
    max_size_mb: 1
{}
"#,
        dir.path().join("home").to_string_lossy().replace('\\', "/"),
        extra
    );
    std::fs::write(&path, content).expect("Failed to write config file");
    path
}

fn write_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("fixture.json");
    let content = format!(
        r#"[
  {{
    "owner_id": "{OWNER}",
    "date": "2025-03-01",
    "intervals": [
      {{"start": "09:00", "end": "12:00", "status": "OPEN"}},
      {{"start": "13:00", "end": "14:00", "status": "RESERVED", "reservation_ref": "order-7"}}
    ]
  }},
  {{
    "owner_id": "{OWNER}",
    "date": "2025-03-03",
    "intervals": [
      {{"start": "08:00", "end": "09:00", "status": "OPEN"}}
    ]
  }}
]"#
    );
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_str(&stdout_of(output)).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}\nSTDERR: {}",
            stdout_of(output),
            stderr_of(output)
        )
    })
}

#[test]
fn test_cli_help_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_cli(tmp.path(), &["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = stdout_of(&output);
    assert!(stdout.contains("availability-cli") || stdout.contains("Availability"));
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    for sub in ["check", "reserve", "release", "available", "schedule", "next-open"] {
        assert!(stdout.contains(sub), "Should list '{sub}' subcommand");
    }
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--fixture"), "Should mention fixture option");
}

#[test]
fn test_cli_version_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_cli(tmp.path(), &["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("availability-cli"));
    assert!(stdout.chars().any(|c| c.is_ascii_digit()));
}

#[test]
fn test_cli_invalid_command() {
    let tmp = TempDir::new().unwrap();
    let output = run_cli(tmp.path(), &["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("error") || stderr.contains("unrecognized"),
        "Should contain error message about invalid command: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_missing_file() {
    let tmp = TempDir::new().unwrap();
    let output = run_cli(tmp.path(), &["-c", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("Config file not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed").unwrap();

    let output = run_cli(
        tmp.path(),
        &["--config", config_path.to_str().unwrap(), "check"],
    );

    assert!(!output.status.success(), "Should fail with invalid YAML");
    assert!(stderr_of(&output).contains("invalid.yaml"));
}

#[test]
fn test_cli_unknown_module_option_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "modules:\n  availability:\n    granularty: free\n");

    let output = run_cli(
        tmp.path(),
        &["--config", config_path.to_str().unwrap(), "check"],
    );

    assert!(!output.status.success());
    assert!(
        stderr_of(&output).contains("Invalid configuration for module 'availability'"),
        "STDERR: {}",
        stderr_of(&output)
    );
}

#[test]
fn test_cli_check_reports_module_settings() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(
        &tmp,
        "modules:\n  availability:\n    granularity: half_hour\n    next_open_horizon_days: 14\n",
    );

    let output = run_cli(
        tmp.path(),
        &["--config", config_path.to_str().unwrap(), "check"],
    );

    assert!(output.status.success(), "STDERR: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("in-memory"));
    assert!(stdout.contains("granularity=half_hour"));
    assert!(stdout.contains("next_open_horizon_days=14"));
}

#[test]
fn test_cli_print_config_emits_yaml() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");

    let output = run_cli(
        tmp.path(),
        &[
            "--config",
            config_path.to_str().unwrap(),
            "--database-url",
            "sqlite::memory:",
            "--print-config",
        ],
    );

    assert!(output.status.success(), "STDERR: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("home_dir:"));
    assert!(stdout.contains("sqlite::memory:"));
}

#[test]
fn test_cli_fixture_availability() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");
    let fixture = write_fixture(&tmp);
    let cfg = config_path.to_str().unwrap();
    let fix = fixture.to_str().unwrap();

    let free = run_cli(
        tmp.path(),
        &[
            "--config", cfg, "--fixture", fix, "available", "--owner", OWNER, "--date",
            "2025-03-01", "--range", "10:00-11:00",
        ],
    );
    assert!(free.status.success(), "STDERR: {}", stderr_of(&free));
    let body = json(&free);
    assert_eq!(body["is_available"], true);
    assert_eq!(body["open_slots"][0]["start"], "10:00");

    let taken = run_cli(
        tmp.path(),
        &[
            "--config", cfg, "--fixture", fix, "available", "--owner", OWNER, "--date",
            "2025-03-01", "--range", "13:00-13:30",
        ],
    );
    assert!(taken.status.success());
    assert_eq!(json(&taken)["is_available"], false);
}

#[test]
fn test_cli_reserve_splits_open_interval() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");
    let fixture = write_fixture(&tmp);

    let output = run_cli(
        tmp.path(),
        &[
            "--config",
            config_path.to_str().unwrap(),
            "--fixture",
            fixture.to_str().unwrap(),
            "reserve",
            "--owner",
            OWNER,
            "--date",
            "2025-03-01",
            "--range",
            "10:00-11:00",
            "--reference",
            "order-9",
        ],
    );

    assert!(output.status.success(), "STDERR: {}", stderr_of(&output));
    let day = json(&output);
    let intervals = day["intervals"].as_array().unwrap();
    assert_eq!(intervals.len(), 4);
    assert!(intervals
        .iter()
        .any(|i| i["status"] == "RESERVED" && i["reservation_ref"] == "order-9"));
}

#[test]
fn test_cli_reserving_taken_range_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");
    let fixture = write_fixture(&tmp);

    let output = run_cli(
        tmp.path(),
        &[
            "--config",
            config_path.to_str().unwrap(),
            "--fixture",
            fixture.to_str().unwrap(),
            "reserve",
            "--owner",
            OWNER,
            "--date",
            "2025-03-01",
            "--range",
            "13:00-14:00",
            "--reference",
            "order-10",
        ],
    );

    assert!(!output.status.success());
    assert!(
        stderr_of(&output).contains("Conflict"),
        "STDERR: {}",
        stderr_of(&output)
    );
}

#[test]
fn test_cli_next_open_and_schedule() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");
    let fixture = write_fixture(&tmp);
    let cfg = config_path.to_str().unwrap();
    let fix = fixture.to_str().unwrap();

    let next = run_cli(
        tmp.path(),
        &[
            "--config", cfg, "--fixture", fix, "next-open", "--owner", OWNER, "--from",
            "2025-03-02",
        ],
    );
    assert!(next.status.success(), "STDERR: {}", stderr_of(&next));
    let next = json(&next);
    assert_eq!(next["date"], "2025-03-03");
    assert_eq!(next["interval"]["start"], "08:00");

    let report = run_cli(
        tmp.path(),
        &[
            "--config", cfg, "--fixture", fix, "schedule", "--owner", OWNER, "--from",
            "2025-03-01", "--to", "2025-03-31",
        ],
    );
    assert!(report.status.success(), "STDERR: {}", stderr_of(&report));
    let report = json(&report);
    assert_eq!(report["days"].as_array().unwrap().len(), 2);
    assert_eq!(report["summary"]["open"], 2);
    assert_eq!(report["summary"]["reserved"], 1);
}

#[test]
fn test_cli_show_missing_day_fails() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");

    let output = run_cli(
        tmp.path(),
        &[
            "--config",
            config_path.to_str().unwrap(),
            "show",
            "--owner",
            OWNER,
            "--date",
            "2025-03-01",
        ],
    );

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("Not found"));
}

#[test]
fn test_cli_sqlite_store_persists_between_runs() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(
        &tmp,
        "database:\n  url: \"sqlite://data/availability.db\"\n  max_conns: 2\n",
    );
    let cfg = config_path.to_str().unwrap();

    let add = run_cli(
        tmp.path(),
        &[
            "--config", cfg, "add", "--owner", OWNER, "--date", "2025-03-05", "--range",
            "09:00-10:00", "--range", "10:00-11:00",
        ],
    );
    assert!(add.status.success(), "STDERR: {}", stderr_of(&add));
    assert!(tmp.path().join("home/data/availability.db").exists());

    let show = run_cli(
        tmp.path(),
        &["--config", cfg, "show", "--owner", OWNER, "--date", "2025-03-05"],
    );
    assert!(show.status.success(), "STDERR: {}", stderr_of(&show));
    let day = json(&show);
    assert_eq!(day["intervals"].as_array().unwrap().len(), 2);
    assert_eq!(day["version"], 1);
}

#[test]
fn test_cli_log_file_written_under_home_dir() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "");

    let output = run_cli(
        tmp.path(),
        &["--config", config_path.to_str().unwrap(), "check"],
    );

    assert!(output.status.success());
    assert!(tmp.path().join("home/logs/availability.log").exists());
}

#[test]
fn test_cli_no_arguments_runs_check() {
    let tmp = TempDir::new().unwrap();
    let output = run_cli(tmp.path(), &[]);

    assert!(output.status.success(), "STDERR: {}", stderr_of(&output));
    assert!(stdout_of(&output).contains("Configuration check passed"));
    assert!(tmp.path().join(".availability").is_dir());
}
