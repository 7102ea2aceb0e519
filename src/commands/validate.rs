//! `validate`: re-probe the health set without mutating anything.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;

use super::{CommandSetup, Outcome};
use crate::cli::GlobalOpts;
use crate::converge::Context;
use crate::converge::validate::{self, ValidationReport};
use crate::logging::Logger;
use crate::platform::PlatformContext;

/// Run the validate command over the whole platform catalog.
///
/// # Errors
///
/// Returns an error if home is unusable or configuration loading fails.
/// Failing checks are reported, never returned.
pub fn run(
    global: &GlobalOpts,
    platform: PlatformContext,
    log: &Logger,
    interrupt: &Arc<AtomicBool>,
) -> Result<Outcome> {
    let setup = CommandSetup::init(global, platform, log)?;
    let ctx = setup.context(global, log, interrupt);
    let report = check_health(&setup, &ctx);
    log.debug(&report.summary());
    Ok(Outcome::Completed)
}

/// Re-probe the platform catalog's health targets under `ctx`.
#[must_use]
pub fn check_health(setup: &CommandSetup, ctx: &Context) -> ValidationReport {
    let targets = validate::health_targets(setup.catalog.targets(), &setup.config.settings.health);
    if targets.is_empty() {
        ctx.log.warn("no health targets apply on this platform");
        return ValidationReport::default();
    }
    validate::validate(&targets, ctx)
}
