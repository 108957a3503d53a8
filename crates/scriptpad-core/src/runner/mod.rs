//! Runs the buffer through an external interpreter.
//!
//! [`ProcessRunner`] writes the text to a fixed script path, launches the
//! interpreter on it, and turns what the child prints into [`OutputEvent`]s.
//! The child is supervised on a runner-owned tokio runtime; the supervisor
//! only sends messages, and all runner state changes when the host drains
//! them with [`ProcessRunner::pump`] or [`ProcessRunner::pump_timeout`].

pub mod error;
mod supervisor;

use std::process::Stdio;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use scriptpad_config::{AppConfig, OutputColors, RunnerSettings};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub use error::RunError;

use crate::diagnostics::{DiagnosticParser, DiagnosticRecord};
use crate::output::{exit_trailer, stdout_chunk, OutputEvent, OutputLog};
use supervisor::{supervise, Envelope, RunMessage};

/// Exit code reported when the child was ended by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// Lifecycle of a run: `Idle → Starting → Running → Terminated → Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Idle,
    Starting,
    Running,
    Terminated,
}

#[derive(Debug)]
struct ActiveRun {
    run_id: u64,
    pid: Option<u32>,
    stop: Option<oneshot::Sender<()>>,
    supervisor: JoinHandle<()>,
}

/// One-at-a-time script runner.
///
/// Must be driven from synchronous code: `stop` blocks on the runtime.
#[derive(Debug)]
pub struct ProcessRunner {
    settings: RunnerSettings,
    colors: OutputColors,
    parser: DiagnosticParser,
    runtime: tokio::runtime::Runtime,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    state: RunState,
    next_run_id: u64,
    active: Option<ActiveRun>,
    log: OutputLog,
    pending: Vec<OutputEvent>,
    did_error_happen: bool,
    last_exit_code: Option<i32>,
    diagnostics: Vec<DiagnosticRecord>,
}

impl ProcessRunner {
    /// Creates an idle runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the background runtime cannot start.
    pub fn new(settings: RunnerSettings, colors: OutputColors) -> Result<Self, RunError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("scriptpad-runner")
            .enable_all()
            .build()
            .map_err(RunError::Runtime)?;
        let parser = DiagnosticParser::new()?;
        let (tx, rx) = mpsc::channel();
        let log = OutputLog::new(settings.max_output_chars);

        Ok(Self {
            settings,
            colors,
            parser,
            runtime,
            tx,
            rx,
            state: RunState::Idle,
            next_run_id: 0,
            active: None,
            log,
            pending: Vec::new(),
            did_error_happen: false,
            last_exit_code: None,
            diagnostics: Vec::new(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RunError> {
        Self::new(config.runner.clone(), config.theme.output.clone())
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// True when the last finished run exited with a non-zero code.
    pub fn did_error_happen(&self) -> bool {
        self.did_error_happen
    }

    pub fn last_exit_code(&self) -> Option<i32> {
        self.last_exit_code
    }

    /// Diagnostics parsed from the last finished run's stderr.
    pub fn diagnostics(&self) -> &[DiagnosticRecord] {
        &self.diagnostics
    }

    /// OS pid of the running child.
    pub fn active_pid(&self) -> Option<u32> {
        self.active.as_ref().and_then(|run| run.pid)
    }

    /// Writes `text` to the script path and launches the interpreter on it.
    ///
    /// A run already in progress is stopped first, and its pending output
    /// is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be written, the interpreter is
    /// not on `PATH`, or the process fails to spawn. The runner is `Idle`
    /// afterwards in every case, with no error, exit code, or diagnostics
    /// left over from the previous run.
    pub fn run(&mut self, text: &str) -> Result<(), RunError> {
        self.stop();
        self.did_error_happen = false;
        self.last_exit_code = None;
        self.diagnostics.clear();
        self.state = RunState::Starting;

        let path = self.settings.script_path();
        if let Err(source) = std::fs::write(&path, text) {
            self.state = RunState::Idle;
            return Err(RunError::Persistence { path, source });
        }

        let interpreter = match which::which(&self.settings.interpreter) {
            Ok(found) => found,
            Err(source) => {
                self.state = RunState::Idle;
                return Err(RunError::InterpreterNotFound {
                    interpreter: self.settings.interpreter.clone(),
                    source,
                });
            }
        };

        let child = {
            let _guard = self.runtime.enter();
            Command::new(&interpreter)
                .arg(&path)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
        };
        let child = match child {
            Ok(child) => child,
            Err(source) => {
                self.state = RunState::Idle;
                return Err(RunError::Launch {
                    interpreter: self.settings.interpreter.clone(),
                    source,
                });
            }
        };

        self.next_run_id += 1;
        let run_id = self.next_run_id;
        let pid = child.id();
        let (stop_tx, stop_rx) = oneshot::channel();
        let supervisor = self
            .runtime
            .spawn(supervise(child, run_id, self.tx.clone(), stop_rx));

        tracing::info!(
            "Run {run_id}: started {} {} (pid {pid:?})",
            interpreter.display(),
            path.display()
        );

        self.active = Some(ActiveRun {
            run_id,
            pid,
            stop: Some(stop_tx),
            supervisor,
        });
        self.state = RunState::Running;
        Ok(())
    }

    /// Kills the running child, if any, and returns to `Idle`.
    ///
    /// Safe to call in any state and any number of times. Output the
    /// stopped run had not delivered yet is dropped.
    pub fn stop(&mut self) {
        if let Some(mut run) = self.active.take() {
            tracing::info!("Run {}: stopping", run.run_id);
            if let Some(stop) = run.stop.take() {
                let _ = stop.send(());
            }
            if let Err(e) = self.runtime.block_on(run.supervisor) {
                tracing::warn!("Run {}: supervisor ended abnormally: {e}", run.run_id);
            }
        }
        self.state = RunState::Idle;
    }

    /// Queues the clear sentinel for the output pane.
    pub fn clear_output(&mut self) {
        self.log.clear(&mut self.pending);
    }

    /// Applies every message already delivered and returns the resulting events.
    pub fn pump(&mut self) -> Vec<OutputEvent> {
        while let Ok(envelope) = self.rx.try_recv() {
            self.handle(envelope);
        }
        std::mem::take(&mut self.pending)
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for the first
    /// message when none is ready.
    pub fn pump_timeout(&mut self, timeout: Duration) -> Vec<OutputEvent> {
        if self.pending.is_empty() && self.is_running() {
            match self.rx.recv_timeout(timeout) {
                Ok(envelope) => self.handle(envelope),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Runner message channel closed");
                }
            }
        }
        self.pump()
    }

    /// Pumps until the current run finishes or `timeout` elapses.
    pub fn wait_for_exit(&mut self, timeout: Duration) -> Vec<OutputEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        loop {
            let now = Instant::now();
            if !self.is_running() || now >= deadline {
                events.extend(self.pump());
                return events;
            }
            events.extend(self.pump_timeout(deadline - now));
        }
    }

    fn handle(&mut self, envelope: Envelope) {
        let current = self.active.as_ref().map(|run| run.run_id);
        if current != Some(envelope.run_id) {
            tracing::trace!("Dropping message from stale run {}", envelope.run_id);
            return;
        }

        match envelope.message {
            RunMessage::Stdout(text) => {
                self.log
                    .append(stdout_chunk(text, &self.colors), &mut self.pending);
            }
            RunMessage::Exited { code, stderr } => {
                self.state = RunState::Terminated;
                let code = code.unwrap_or(SIGNALLED_EXIT_CODE);

                let (styled, records) = self.parser.render(&stderr, &self.colors);
                tracing::debug!(
                    "Run {}: {} diagnostic(s) in {} bytes of stderr",
                    envelope.run_id,
                    records.len(),
                    stderr.len()
                );
                self.log.append(styled, &mut self.pending);
                self.log
                    .append(exit_trailer(code, &self.colors), &mut self.pending);

                self.diagnostics = records;
                self.did_error_happen = code != 0;
                self.last_exit_code = Some(code);
                tracing::info!("Run {}: exited with code {code}", envelope.run_id);

                if let Some(run) = self.active.take() {
                    if let Err(e) = self.runtime.block_on(run.supervisor) {
                        tracing::warn!("Run {}: supervisor ended abnormally: {e}", run.run_id);
                    }
                }
                self.state = RunState::Idle;
            }
        }
    }
}

impl Drop for ProcessRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(max_output_chars: usize) -> ProcessRunner {
        let settings = RunnerSettings {
            max_output_chars,
            ..RunnerSettings::default()
        };
        ProcessRunner::new(settings, OutputColors::default()).unwrap()
    }

    fn inject(runner: &ProcessRunner, run_id: u64, message: RunMessage) {
        runner.tx.send(Envelope { run_id, message }).unwrap();
    }

    /// Installs a fake active run whose supervisor has already finished.
    fn fake_active(runner: &mut ProcessRunner, run_id: u64) {
        let supervisor = runner.runtime.spawn(async {});
        runner.active = Some(ActiveRun {
            run_id,
            pid: None,
            stop: None,
            supervisor,
        });
        runner.state = RunState::Running;
    }

    #[test]
    fn test_new_runner_is_idle() {
        let runner = runner(1024);
        assert_eq!(runner.state(), RunState::Idle);
        assert!(!runner.is_running());
        assert!(!runner.did_error_happen());
        assert!(runner.diagnostics().is_empty());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut runner = runner(1024);
        runner.stop();
        runner.stop();
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[test]
    fn test_stdout_then_exit_events() {
        let mut runner = runner(1024);
        fake_active(&mut runner, 1);
        inject(&runner, 1, RunMessage::Stdout("hi\n".to_string()));
        inject(
            &runner,
            1,
            RunMessage::Exited {
                code: Some(1),
                stderr: "main.swift:2:3: error: boom\n\n".to_string(),
            },
        );

        let events = runner.pump();
        assert_eq!(events.len(), 3);
        match &events[0] {
            OutputEvent::Append(chunk) => assert_eq!(chunk.text, "hi\n"),
            other => panic!("unexpected event {other:?}"),
        }
        match &events[1] {
            OutputEvent::Append(chunk) => assert_eq!(chunk.links.len(), 1),
            other => panic!("unexpected event {other:?}"),
        }
        match &events[2] {
            OutputEvent::Append(chunk) => {
                assert_eq!(chunk.text, "\nProcess exited with code 1\n\n\n")
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(runner.state(), RunState::Idle);
        assert!(runner.did_error_happen());
        assert_eq!(runner.last_exit_code(), Some(1));
        assert_eq!(runner.diagnostics().len(), 1);
        assert_eq!(runner.diagnostics()[0].row, 2);
    }

    #[test]
    fn test_signal_exit_reports_negative_code() {
        let mut runner = runner(1024);
        fake_active(&mut runner, 1);
        inject(
            &runner,
            1,
            RunMessage::Exited {
                code: None,
                stderr: String::new(),
            },
        );
        let events = runner.pump();
        assert_eq!(events.len(), 1);
        assert_eq!(runner.last_exit_code(), Some(SIGNALLED_EXIT_CODE));
        assert!(runner.did_error_happen());
    }

    #[test]
    fn test_stale_messages_are_dropped() {
        let mut runner = runner(1024);
        fake_active(&mut runner, 2);
        inject(&runner, 1, RunMessage::Stdout("old".to_string()));
        inject(
            &runner,
            1,
            RunMessage::Exited {
                code: Some(0),
                stderr: String::new(),
            },
        );
        assert!(runner.pump().is_empty());
        assert!(runner.is_running());
    }

    #[test]
    fn test_ceiling_clears_before_next_chunk() {
        let mut runner = runner(4);
        fake_active(&mut runner, 1);
        inject(&runner, 1, RunMessage::Stdout("12345".to_string()));
        inject(&runner, 1, RunMessage::Stdout("6".to_string()));
        let events = runner.pump();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], OutputEvent::Clear);
    }

    #[test]
    fn test_failed_launch_clears_previous_run_results() {
        let mut runner = runner(1024);
        fake_active(&mut runner, 1);
        inject(
            &runner,
            1,
            RunMessage::Exited {
                code: Some(1),
                stderr: "main.swift:2:3: error: boom\n".to_string(),
            },
        );
        runner.pump();
        assert!(runner.did_error_happen());
        assert_eq!(runner.diagnostics().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        runner.settings.script_dir = Some(dir.path().join("missing"));
        let err = runner.run("print(1)").unwrap_err();
        assert!(matches!(err, RunError::Persistence { .. }));
        assert_eq!(runner.state(), RunState::Idle);
        assert!(!runner.did_error_happen());
        assert_eq!(runner.last_exit_code(), None);
        assert!(runner.diagnostics().is_empty());
    }

    #[test]
    fn test_clear_output_emits_sentinel() {
        let mut runner = runner(1024);
        runner.clear_output();
        assert_eq!(runner.pump(), vec![OutputEvent::Clear]);
        assert!(runner.pump().is_empty());
    }
}
