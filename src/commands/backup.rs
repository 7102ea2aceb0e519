//! `backup`: move conflicting files aside without linking.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;

use super::{CommandSetup, Outcome};
use crate::cli::GlobalOpts;
use crate::config::catalog::Action;
use crate::converge::{Context, RunReport, links};
use crate::logging::Logger;
use crate::platform::PlatformContext;

/// Run the backup command.
///
/// # Errors
///
/// Returns an error if home is unusable or configuration loading fails.
pub fn run(
    global: &GlobalOpts,
    platform: PlatformContext,
    log: &Logger,
    interrupt: &Arc<AtomicBool>,
) -> Result<Outcome> {
    let setup = CommandSetup::init(global, platform, log)?;
    let ctx = setup.context(global, log, interrupt);
    let report = back_up_conflicts(&setup, &ctx);
    log.print_summary(&report.entries());
    log.info(&report.summary(global.dry_run));
    Ok(super::install::outcome(&report))
}

/// Back up every real file blocking one of the platform's dotfile links.
#[must_use]
pub fn back_up_conflicts(setup: &CommandSetup, ctx: &Context) -> RunReport {
    links::backup_conflicts(
        setup
            .catalog
            .targets()
            .iter()
            .filter(|t| matches!(t.action, Action::Link { .. })),
        ctx,
    )
}
