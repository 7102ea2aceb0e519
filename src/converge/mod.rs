//! Convergence driver: probe each selected target, apply what is missing,
//! record every outcome, never stop on a single failure.
//!
//! - [`context`]: shared per-run context
//! - [`prober`]: target → resource mapping and the satisfied check
//! - [`links`]: backup-only pass over dotfile links
//! - [`validate`]: post-run health re-probe

pub mod context;
pub mod links;
pub mod prober;
pub mod validate;

pub use context::Context;

use std::path::Path;

use crate::config::catalog::{Action, Target};
use crate::error::TargetError;
use crate::exec::is_interrupted;
use crate::logging::{TaskEntry, TaskStatus};
use crate::resources::backup::BackupRecord;
use crate::resources::{ResourceChange, ResourceState};
use crate::select::CatalogSelection;

/// Outcome of one convergence run.
///
/// # Examples
///
/// ```
/// use bootstrap_cli::converge::RunReport;
///
/// let report = RunReport::default();
/// assert_eq!(report.summary(false), "0 applied, 0 already ok, 0 failed");
/// assert!(!report.is_interrupted());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Targets that were changed.
    pub applied: Vec<Target>,
    /// Targets already satisfied.
    pub skipped: Vec<Target>,
    /// Targets that would change (dry run only).
    pub planned: Vec<Target>,
    /// Targets that failed, with the reason.
    pub failed: Vec<(Target, String)>,
    /// Files moved aside during the run.
    pub backups: Vec<BackupRecord>,
    /// Id of the target in flight when the operator interrupted the run.
    pub interrupted: Option<String>,
}

impl RunReport {
    /// Whether the run stopped early on operator request.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.interrupted.is_some()
    }

    /// Total number of targets with a recorded outcome.
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied.len() + self.skipped.len() + self.planned.len() + self.failed.len()
    }

    /// One-line counts, e.g. `"3 applied, 10 already ok, 1 failed"`.
    #[must_use]
    pub fn summary(&self, dry_run: bool) -> String {
        let changed = if dry_run {
            format!("{} would change", self.planned.len())
        } else {
            format!("{} applied", self.applied.len())
        };
        format!(
            "{changed}, {} already ok, {} failed",
            self.skipped.len(),
            self.failed.len()
        )
    }

    /// Summary entries for [`Logger::print_summary`](crate::logging::Logger::print_summary).
    #[must_use]
    pub fn entries(&self) -> Vec<TaskEntry> {
        let entry = |t: &Target, status, message: Option<String>| TaskEntry {
            name: t.id.clone(),
            status,
            message,
        };
        let backup_note = |t: &Target| {
            self.backups
                .iter()
                .find(|b| home_path(t).is_some_and(|rel| b.original.ends_with(rel)))
                .map(|b| format!("backup: {}", b.backup.display()))
        };

        let mut out: Vec<TaskEntry> = self
            .applied
            .iter()
            .map(|t| entry(t, TaskStatus::Applied, backup_note(t)))
            .collect();
        out.extend(self.planned.iter().map(|t| entry(t, TaskStatus::Planned, None)));
        out.extend(self.skipped.iter().map(|t| entry(t, TaskStatus::Satisfied, None)));
        out.extend(
            self.failed
                .iter()
                .map(|(t, reason)| entry(t, TaskStatus::Failed, Some(reason.clone()))),
        );
        out
    }
}

/// Path under home that a target writes, if any.
fn home_path(target: &Target) -> Option<&Path> {
    match &target.action {
        Action::Link { target, .. } | Action::Template { target, .. } => Some(target),
        Action::Clone { dest, .. } => Some(dest),
        Action::Package(_) => None,
    }
}

/// Converge `selection`.
///
/// Packages and clones run first, then the dotfile pass (links and the
/// identity template). Within a pass targets run in catalog order. A failed
/// target is recorded and the loop moves on; an operator interrupt stops the
/// loop and leaves the remaining targets untouched.
#[must_use]
pub fn apply(selection: &CatalogSelection, ctx: &Context) -> RunReport {
    let (dotfiles, packages): (Vec<&Target>, Vec<&Target>) =
        selection.targets().iter().partition(|t| t.is_dotfile());

    let mut report = RunReport::default();
    for (stage, targets) in [("Packages", packages), ("Dotfiles", dotfiles)] {
        if targets.is_empty() {
            continue;
        }
        ctx.log.stage(stage);
        for target in targets {
            if report.is_interrupted() {
                break;
            }
            if ctx.is_interrupted() {
                ctx.log
                    .warn(&format!("interrupted; stopping before {}", target.id));
                report.interrupted = Some(target.id.clone());
                break;
            }
            converge_target(target, ctx, &mut report);
        }
        if report.is_interrupted() {
            break;
        }
    }
    ctx.log.info(&report.summary(ctx.dry_run));
    report
}

/// Probe and, if needed, apply a single target, recording the outcome.
fn converge_target(target: &Target, ctx: &Context, report: &mut RunReport) {
    if !ctx.platform.accepts(&target.platforms) {
        ctx.log.debug(&format!(
            "{}: not applicable on {}",
            target.id, ctx.platform.os
        ));
        return;
    }

    let resource = match prober::resource_for(target, ctx) {
        Ok(resource) => resource,
        Err(e) => {
            record_failure(target, &format!("{e:#}"), ctx, report);
            return;
        }
    };

    let state = resource.current_state().unwrap_or_else(|e| {
        ctx.log
            .debug(&format!("probe {} indeterminate: {e:#}", target.id));
        ResourceState::Missing
    });

    match &state {
        ResourceState::Correct => {
            ctx.log.debug(&format!("ok: {}", target.id));
            report.skipped.push(target.clone());
        }
        ResourceState::Invalid { reason } => {
            record_failure(target, reason, ctx, report);
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } if ctx.dry_run => {
            let msg = if let ResourceState::Incorrect { current } = &state {
                format!("would apply {} (currently {current})", target.id)
            } else {
                format!("would apply {}", target.id)
            };
            ctx.log.dry_run(&msg);
            report.planned.push(target.clone());
        }
        ResourceState::Missing | ResourceState::Incorrect { .. } => {
            ctx.log.debug(&format!("applying {}", resource.description()));
            match resource.apply() {
                Ok(ResourceChange::Applied) => {
                    ctx.log.info(&format!("applied {}", target.id));
                    report.applied.push(target.clone());
                }
                Ok(ResourceChange::BackedUp { backup }) => {
                    ctx.log.info(&format!(
                        "applied {} (backed up {} to {})",
                        target.id,
                        backup.original.display(),
                        backup.backup.display()
                    ));
                    report.applied.push(target.clone());
                    report.backups.push(backup);
                }
                Ok(ResourceChange::AlreadyCorrect) => {
                    ctx.log.debug(&format!("ok: {}", target.id));
                    report.skipped.push(target.clone());
                }
                Err(e) => record_error(target, &e, ctx, report),
            }
        }
    }
}

/// Record a failed apply, keeping any backup taken before the failure.
fn record_error(target: &Target, err: &anyhow::Error, ctx: &Context, report: &mut RunReport) {
    if let Some(TargetError::AfterBackup(backup)) = err.downcast_ref::<TargetError>() {
        ctx.log.warn(&format!(
            "{}: backed up {} to {} before failing",
            target.id,
            backup.original.display(),
            backup.backup.display()
        ));
        report.backups.push(backup.clone());
    }
    if is_interrupted(err) {
        ctx.log
            .warn(&format!("interrupted while applying {}", target.id));
        report.interrupted = Some(target.id.clone());
    } else {
        record_failure(target, &format!("{err:#}"), ctx, report);
    }
}

fn record_failure(target: &Target, reason: &str, ctx: &Context, report: &mut RunReport) {
    ctx.log.error(&format!("{} failed: {reason}", target.id));
    report.failed.push((target.clone(), reason.to_string()));
}
