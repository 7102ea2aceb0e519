//! External command execution with per-call timeout and interruption.
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;

/// How often a running child is polled for exit, timeout and interruption.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Default per-call timeout; package installs can take many minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

/// Errors raised while running an external command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program exited non-zero.
    #[error("{label} failed (exit {code}): {detail}", code = code.unwrap_or(-1))]
    Failed {
        /// Command label (program and leading arguments).
        label: String,
        /// Exit code, if any.
        code: Option<i32>,
        /// Trimmed stderr, or stdout when stderr is empty.
        detail: String,
    },

    /// The program ran past the configured timeout and was killed.
    #[error("{program} timed out after {secs}s")]
    TimedOut {
        /// Program name.
        program: String,
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// The operator interrupted the run while the program was executing.
    #[error("{program} interrupted by operator")]
    Interrupted {
        /// Program name.
        program: String,
    },
}

/// Whether `err` (or anything in its context chain) is an operator interrupt.
#[must_use]
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|e| matches!(e.downcast_ref::<ExecError>(), Some(ExecError::Interrupted { .. })))
}

/// Abstraction over process execution so resources and backends can be
/// tested without spawning real package managers.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command, failing if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the command cannot start, exits non-zero,
    /// times out, or is interrupted.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command and return its result regardless of exit status.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the command cannot start, times out, or is
    /// interrupted.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check whether a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    timeout: Duration,
    env: Vec<(String, String)>,
    interrupt: Arc<AtomicBool>,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, Arc::new(AtomicBool::new(false)))
    }
}

impl SystemExecutor {
    /// Create an executor with a per-call timeout and a shared interrupt flag.
    #[must_use]
    pub const fn new(timeout: Duration, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            timeout,
            env: Vec::new(),
            interrupt,
        }
    }

    /// Extra environment variables passed to every child.
    #[must_use]
    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    fn execute(&self, program: &str, args: &[&str]) -> Result<ExecResult, ExecError> {
        let mut child = Command::new(program)
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty child cannot block on a
        // full pipe while we poll for its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait(program, &mut child)?;

        Ok(ExecResult {
            stdout: stdout.map(join_output).unwrap_or_default(),
            stderr: stderr.map(join_output).unwrap_or_default(),
            success: status.success(),
            code: status.code(),
        })
    }

    fn wait(&self, program: &str, child: &mut Child) -> Result<ExitStatus, ExecError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    kill(child);
                    return Err(ExecError::Spawn {
                        program: program.to_string(),
                        source,
                    });
                }
            }
            if self.interrupt.load(Ordering::SeqCst) {
                kill(child);
                return Err(ExecError::Interrupted {
                    program: program.to_string(),
                });
            }
            if Instant::now() >= deadline {
                kill(child);
                return Err(ExecError::TimedOut {
                    program: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.execute(program, args)?;
        if !result.success {
            let detail = if result.stderr.trim().is_empty() {
                result.stdout.trim().to_string()
            } else {
                result.stderr.trim().to_string()
            };
            return Err(ExecError::Failed {
                label: label(program, args),
                code: result.code,
                detail,
            }
            .into());
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Ok(self.execute(program, args)?)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn label(program: &str, args: &[&str]) -> String {
    args.iter()
        .take(2)
        .fold(program.to_string(), |acc, a| format!("{acc} {a}"))
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).ok();
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_output(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn kill(child: &mut Child) {
    child.kill().ok();
    child.wait().ok();
}
