//! Backup-only pass: move real files out of the way of dotfile links
//! without creating any symlinks.
use super::context::Context;
use super::RunReport;
use crate::config::catalog::{Action, Target};
use crate::resources::fs::resolve_under;
use crate::resources::symlink::{LinkState, SymlinkResource};

/// Back up every real file or directory sitting where a selected link
/// should go.
///
/// Links already correct, absent, or pointing elsewhere are reported as
/// skipped. A missing source is recorded as failed.
#[must_use]
pub fn backup_conflicts<'t>(
    targets: impl IntoIterator<Item = &'t Target>,
    ctx: &Context,
) -> RunReport {
    let mut report = RunReport::default();
    ctx.log.stage("Backing up conflicting files");

    for target in targets {
        let Action::Link { source, target: dest } = &target.action else {
            continue;
        };
        if ctx.is_interrupted() {
            report.interrupted = Some(target.id.clone());
            ctx.log
                .warn(&format!("interrupted; stopping before {}", target.id));
            break;
        }
        let link = SymlinkResource::new(
            resolve_under(&ctx.platform.dotfiles_dir(), source),
            resolve_under(&ctx.platform.home, dest),
        );

        match link.link_state() {
            LinkState::RealFileConflict if ctx.dry_run => {
                ctx.log
                    .dry_run(&format!("would back up {}", link.target.display()));
                report.planned.push(target.clone());
            }
            LinkState::RealFileConflict => match link.backup_conflict() {
                Ok(Some(record)) => {
                    ctx.log.info(&format!(
                        "backed up {} to {}",
                        record.original.display(),
                        record.backup.display()
                    ));
                    report.applied.push(target.clone());
                    report.backups.push(record);
                }
                Ok(None) => report.skipped.push(target.clone()),
                Err(e) => {
                    ctx.log.error(&format!("{} failed: {e:#}", target.id));
                    report.failed.push((target.clone(), format!("{e:#}")));
                }
            },
            LinkState::SourceMissing => {
                let reason = format!("source missing: {}", link.source.display());
                ctx.log.warn(&format!("{}: {reason}", target.id));
                report.failed.push((target.clone(), reason));
            }
            LinkState::Absent | LinkState::CorrectSymlink | LinkState::WrongSymlink { .. } => {
                ctx.log.debug(&format!("nothing to back up for {}", target.id));
                report.skipped.push(target.clone());
            }
        }
    }

    ctx.log.info(&format!("{} backed up", report.backups.len()));
    report
}
