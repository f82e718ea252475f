//! Shared utilities: shell command execution with timeout and cancellation.

pub mod fs;

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

/// How often a running child is polled for completion or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Cooperative cancellation flag shared between a request and the work it
/// spawns. Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of running a shell command.
#[derive(Debug)]
pub enum RunOutcome {
    /// The command ran to completion (any exit code).
    Completed {
        /// Combined stdout and stderr.
        output: String,
        exit_code: i32,
    },
    /// The per-call deadline fired and the child was killed.
    TimedOut,
    /// The request was cancelled and the child was killed.
    Cancelled,
    /// The command could not be started.
    SpawnError(String),
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, RunOutcome::Completed { exit_code: 0, .. })
    }

    /// Combined output if the command completed, regardless of exit code.
    pub fn output(&self) -> Option<&str> {
        match self {
            RunOutcome::Completed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Run `command` under the platform shell in `cwd`, killing it once
/// `timeout` elapses or `cancel` fires.
///
/// The runner never interprets output; callers get the combined
/// stdout+stderr text and decide what it means.
pub fn run_shell(
    command: &str,
    cwd: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> RunOutcome {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.args(["/C", command]);
        c
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.args(["-c", command]);
        c
    };

    let mut child = match cmd
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => return RunOutcome::SpawnError(format!("failed to start '{}': {}", command, e)),
    };

    let started = Instant::now();
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return RunOutcome::Cancelled;
        }

        match child.wait_timeout(POLL_INTERVAL) {
            Ok(Some(status)) => {
                let output = match child.wait_with_output() {
                    Ok(o) => {
                        let mut text = String::from_utf8_lossy(&o.stdout).into_owned();
                        text.push_str(&String::from_utf8_lossy(&o.stderr));
                        text
                    }
                    Err(e) => {
                        return RunOutcome::SpawnError(format!(
                            "failed to collect output of '{}': {}",
                            command, e
                        ))
                    }
                };
                return RunOutcome::Completed {
                    output,
                    exit_code: status.code().unwrap_or(-1),
                };
            }
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait(); // reap
                    return RunOutcome::TimedOut;
                }
            }
            Err(e) => {
                return RunOutcome::SpawnError(format!("failed to wait for '{}': {}", command, e))
            }
        }
    }
}
