// Integration tests for the process runner.
//
// These launch real processes, using `sh` as the interpreter so they do not
// depend on a Swift toolchain.
#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use scriptpad_config::{OutputColors, RunnerSettings};
use scriptpad_core::{OutputEvent, ProcessRunner, RunError, RunState, Severity};

const TIMEOUT: Duration = Duration::from_secs(20);

fn sh_runner(dir: &Path) -> ProcessRunner {
    let settings = RunnerSettings {
        interpreter: "sh".to_string(),
        script_file_name: "script.sh".to_string(),
        script_dir: Some(dir.to_path_buf()),
        ..RunnerSettings::default()
    };
    ProcessRunner::new(settings, OutputColors::default()).unwrap()
}

fn appended_text(events: &[OutputEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            OutputEvent::Append(chunk) => Some(chunk.text.as_str()),
            OutputEvent::Clear => None,
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn process_exists(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

// ── Normal runs ────────────────────────────────────────────────────────

#[test]
fn test_run_streams_stdout_and_reports_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());

    runner.run("echo hello\n").unwrap();
    assert!(runner.is_running());
    let events = runner.wait_for_exit(TIMEOUT);

    let text = appended_text(&events);
    assert!(text.starts_with("hello\n"));
    assert!(text.ends_with("\nProcess exited with code 0\n\n\n"));
    assert_eq!(runner.state(), RunState::Idle);
    assert!(!runner.is_running());
    assert!(!runner.did_error_happen());
    assert_eq!(runner.last_exit_code(), Some(0));

    let written = std::fs::read_to_string(dir.path().join("script.sh")).unwrap();
    assert_eq!(written, "echo hello\n");
}

#[test]
fn test_stderr_diagnostics_at_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());

    runner
        .run("printf 'main.swift:2:5: error: boom\\n\\n' >&2\nexit 1\n")
        .unwrap();
    let events = runner.wait_for_exit(TIMEOUT);

    assert!(runner.did_error_happen());
    assert_eq!(runner.last_exit_code(), Some(1));
    let diagnostics = runner.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!((diagnostics[0].row, diagnostics[0].column), (2, 5));
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(diagnostics[0].message, "boom");

    let linked = events.iter().any(|e| match e {
        OutputEvent::Append(chunk) => chunk.links.iter().any(|l| l.target.payload() == "2,5"),
        OutputEvent::Clear => false,
    });
    assert!(linked);
    assert!(appended_text(&events).ends_with("\nProcess exited with code 1\n\n\n"));
}

#[test]
fn test_stdout_arrives_before_exit() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());
    runner.run("echo first\nexec sleep 30\n").unwrap();

    let deadline = Instant::now() + TIMEOUT;
    let mut seen = String::new();
    while !seen.contains("first") && Instant::now() < deadline {
        seen.push_str(&appended_text(&runner.pump_timeout(Duration::from_millis(100))));
    }
    assert!(seen.contains("first"));
    assert!(runner.is_running());

    runner.stop();
    assert!(!runner.is_running());
}

// ── Stop and restart ───────────────────────────────────────────────────

#[test]
fn test_stop_twice_is_harmless() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());
    runner.run("exec sleep 30\n").unwrap();

    runner.stop();
    runner.stop();
    assert_eq!(runner.state(), RunState::Idle);
    assert!(!runner.is_running());
    assert!(runner.pump().is_empty());
}

#[test]
fn test_restart_leaves_one_child() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());

    runner.run("exec sleep 30\n").unwrap();
    let first = runner.active_pid().unwrap();
    runner.run("exec sleep 30\n").unwrap();
    let second = runner.active_pid().unwrap();
    assert_ne!(first, second);

    #[cfg(target_os = "linux")]
    {
        assert!(!process_exists(first));
        assert!(process_exists(second));
    }

    runner.stop();
    #[cfg(target_os = "linux")]
    assert!(!process_exists(second));
}

#[test]
fn test_output_of_replaced_run_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(dir.path());

    runner.run("echo old\nexec sleep 30\n").unwrap();
    std::thread::sleep(Duration::from_millis(200));
    runner.run("echo new\n").unwrap();
    let text = appended_text(&runner.wait_for_exit(TIMEOUT));

    assert!(!text.contains("old"));
    assert!(text.contains("new"));
}

// ── Failures ───────────────────────────────────────────────────────────

#[test]
fn test_unwritable_script_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = sh_runner(&dir.path().join("missing"));

    let err = runner.run("echo hi\n").unwrap_err();
    assert!(matches!(err, RunError::Persistence { .. }));
    assert_eq!(runner.state(), RunState::Idle);
    assert!(!runner.is_running());
}

#[test]
fn test_missing_interpreter() {
    let dir = tempfile::tempdir().unwrap();
    let settings = RunnerSettings {
        interpreter: "scriptpad-no-such-interpreter".to_string(),
        script_dir: Some(dir.path().to_path_buf()),
        ..RunnerSettings::default()
    };
    let mut runner = ProcessRunner::new(settings, OutputColors::default()).unwrap();

    let err = runner.run("print(1)\n").unwrap_err();
    assert!(matches!(err, RunError::InterpreterNotFound { .. }));
    assert_eq!(runner.state(), RunState::Idle);
}

#[test]
fn test_output_ceiling_clears_pane() {
    let dir = tempfile::tempdir().unwrap();
    let settings = RunnerSettings {
        interpreter: "sh".to_string(),
        script_file_name: "script.sh".to_string(),
        script_dir: Some(dir.path().to_path_buf()),
        max_output_chars: 1024,
    };
    let mut runner = ProcessRunner::new(settings, OutputColors::default()).unwrap();

    runner
        .run("i=0\nwhile [ $i -lt 200 ]; do echo 0123456789; i=$((i+1)); done\n")
        .unwrap();
    let events = runner.wait_for_exit(TIMEOUT);
    assert!(events.contains(&OutputEvent::Clear));
}
