//! Integration test: the `glimmer` binary's process-level contract.
//!
//! Diagnostic lines on stdout, logs on stderr, exit status 0 after a
//! bounded run and 255 after any start-up failure.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use glimmer::engine::Diagnostic;
use glimmer::{models, HALT_EXIT_STATUS};
use glimmer_test_utils::fixtures::mismatched_version_blob;

fn glimmer(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glimmer"))
        .args(args)
        .env("RUST_LOG", "glimmer=warn")
        .output()
        .expect("spawn glimmer")
}

/// A path in the temp dir unique to this test process.
fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("glimmer-cli-{}-{name}", std::process::id()))
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn bounded_run_prints_one_line_per_iteration() {
    let out = glimmer(&["run", "--iterations", "5", "--period-ms", "1"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let lines = stdout_lines(&out);
    assert_eq!(lines.len(), 5);
    for line in &lines {
        let d: Diagnostic = line.parse().unwrap();
        assert!(d.abs_error() < 0.06, "{line}");
    }
}

#[test]
fn schema_mismatch_exits_255() {
    let path = scratch("old.glm");
    fs::write(&path, mismatched_version_blob()).unwrap();
    let out = glimmer(&["run", "--model-file", path.to_str().unwrap(), "--iterations", "1"]);
    fs::remove_file(&path).ok();

    assert_eq!(out.status.code(), Some(i32::from(HALT_EXIT_STATUS)));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("schema version 2"), "{stderr}");
}

#[test]
fn invalid_config_exits_255() {
    let path = scratch("bad.toml");
    fs::write(&path, "period_ms = 0\n").unwrap();
    let out = glimmer(&["run", "--config", path.to_str().unwrap(), "--iterations", "1"]);
    fs::remove_file(&path).ok();
    assert_eq!(out.status.code(), Some(255));
}

#[test]
fn exported_model_runs_from_file() {
    let path = scratch("f32.glm");
    let out = glimmer(&["export", "--model", "f32", "--output", path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(fs::read(&path).unwrap(), models::SINE_F32);

    let out = glimmer(&[
        "run",
        "--model-file",
        path.to_str().unwrap(),
        "--iterations",
        "3",
        "--period-ms",
        "1",
    ]);
    fs::remove_file(&path).ok();
    assert!(out.status.success());
    assert_eq!(stdout_lines(&out).len(), 3);
}

#[test]
fn info_describes_the_model() {
    let out = glimmer(&["info", "--model", "int8"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Schema version: 3"), "{text}");
    assert!(text.contains("DEQUANTIZE"));
}

#[test]
fn monitor_reads_diagnostics_from_file() {
    let path = scratch("serial.log");
    fs::write(&path, "boot\nPred:0.50,True:0.40\nPred:0.10,True:0.10\n").unwrap();
    let out = glimmer(&["monitor", path.to_str().unwrap()]);
    fs::remove_file(&path).ok();

    assert!(out.status.success());
    assert_eq!(
        stdout_lines(&out),
        ["Err:0.100,Mean:0.100", "Err:0.000,Mean:0.050"]
    );
}
