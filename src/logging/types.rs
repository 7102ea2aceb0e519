//! Core logging types: summary entries, status, and the [`Log`] trait.

/// One target outcome for the end-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Target id.
    pub name: String,
    /// Outcome.
    pub status: TaskStatus,
    /// Optional detail (failure reason, backup path).
    pub message: Option<String>,
}

/// Outcome of a single target in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The target was out of date and has been converged.
    Applied,
    /// The target already satisfied its probe.
    Satisfied,
    /// Dry run: the target would have been applied.
    Planned,
    /// Applying the target failed.
    Failed,
}

impl TaskStatus {
    /// Summary icon and ANSI color.
    #[must_use]
    pub const fn icon(self) -> (&'static str, &'static str) {
        match self {
            Self::Applied => ("✓", "\x1b[32m"),
            Self::Satisfied => ("·", "\x1b[2m"),
            Self::Planned => ("~", "\x1b[37m"),
            Self::Failed => ("✗", "\x1b[31m"),
        }
    }
}

/// Abstraction over logging backends so engine code can log without caring
/// whether output reaches a terminal, a file, or a test capture.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (console only when verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
}
