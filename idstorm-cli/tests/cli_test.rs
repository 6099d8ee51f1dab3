//! End-to-end runs of the idstorm binary against the in-memory target

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

const MEMORY_CONFIG: &str = r#"
run:
  concurrency_limit: 8
  backoff:
    strategy:
      type: fixed
    initial_delay: 0s
    max_delay: 0s
target:
  kind: memory
  memory:
    failure_rate: 0.25
    seed: 11
logging:
  level: warn
"#;

fn idstorm(args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_idstorm"));
    for (key, _) in std::env::vars() {
        if key.starts_with("IDSTORM_") {
            command.env_remove(key);
        }
    }
    command.args(args).output().expect("failed to run idstorm")
}

fn write_config(dir: &Path) -> String {
    let path = dir.join("idstorm.yaml");
    std::fs::write(&path, MEMORY_CONFIG).unwrap();
    path.display().to_string()
}

#[test]
fn test_memory_run_reports_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let report_file = dir.path().join("report.json");

    let output = idstorm(&[
        "--config",
        &config,
        "run",
        "--operation",
        "insert",
        "--records",
        "120",
        "--output",
        "json",
        "--report-file",
        report_file.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["operation"], "create");
    assert_eq!(report["target"], "memory");
    assert_eq!(report["success_count"], 120);
    assert_eq!(report["fatal_count"], 0);
    assert_eq!(report["termination"], "completed");

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&report_file).unwrap()).unwrap();
    assert_eq!(written, report);
}

#[test]
fn test_round_limit_fails_the_process() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = idstorm(&[
        "--config", &config, "run", "--operation", "insert", "--records", "200",
        "--max-rounds", "1", "--output", "json",
    ]);
    assert!(!output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["termination"], "max_rounds");
    let success = report["success_count"].as_u64().unwrap();
    let fatal = report["fatal_count"].as_u64().unwrap();
    assert_eq!(success + fatal, 200);
    assert_eq!(report["unresolved_count"].as_u64().unwrap(), fatal);
}

#[test]
fn test_scenarios_are_listed() {
    let output = idstorm(&["scenarios"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["baseline", "satellite", "tactical-radio", "total-degradation"] {
        assert!(stdout.contains(name), "missing {} in:\n{}", name, stdout);
    }
}

#[test]
fn test_generated_sample_validates() {
    let dir = tempfile::tempdir().unwrap();
    let sample = dir.path().join("conf/sample.yaml");
    let sample = sample.to_str().unwrap();

    let generated = idstorm(&["config", "generate", "--output", sample]);
    assert!(generated.status.success());

    let again = idstorm(&["config", "generate", "--output", sample]);
    assert!(!again.status.success());

    let validated = idstorm(&["config", "validate", "--config-file", sample]);
    assert!(validated.status.success());
}

#[test]
fn test_invalid_configuration_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "run:\n  concurrency_limit: 0\n").unwrap();

    let output = idstorm(&[
        "--config",
        path.to_str().unwrap(),
        "run",
        "--operation",
        "insert",
        "--target",
        "memory",
    ]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
