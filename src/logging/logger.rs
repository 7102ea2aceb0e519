//! Structured logger with dry-run awareness and the end-of-run summary.
use std::path::{Path, PathBuf};

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};

/// Implement the [`Log`] methods by delegating to inherent methods of the
/// same name.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Logger that emits [`tracing`] events; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) routes them to the
/// console and the run log.
#[derive(Debug, Clone)]
pub struct Logger {
    log_file: PathBuf,
}

impl Logger {
    /// Create a logger whose summary points at `log_file`.
    #[must_use]
    pub fn new(log_file: &Path) -> Self {
        Self {
            log_file: log_file.to_path_buf(),
        }
    }

    /// Path of the run log.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_file
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Print one line per target plus totals.
    pub fn print_summary(&self, entries: &[TaskEntry]) {
        if entries.is_empty() {
            return;
        }
        self.stage("Summary");

        let mut applied = 0u32;
        let mut satisfied = 0u32;
        let mut planned = 0u32;
        let mut failed = 0u32;

        for entry in entries {
            match entry.status {
                TaskStatus::Applied => applied += 1,
                TaskStatus::Satisfied => satisfied += 1,
                TaskStatus::Planned => planned += 1,
                TaskStatus::Failed => failed += 1,
            }
            let (icon, color) = entry.status.icon();
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        let total = applied + satisfied + planned + failed;
        self.info(&format!(
            "{total} targets: \x1b[32m{applied} applied\x1b[0m, \x1b[2m{satisfied} already ok\x1b[0m, \x1b[37m{planned} planned\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));
        self.info(&format!("\x1b[2mlog: {}\x1b[0m", self.log_file.display()));
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);
}
