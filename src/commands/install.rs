//! `install`: select, check preconditions, converge, validate.
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Result, anyhow};

use super::preflight::{self, NetworkProbe, PreflightOptions, UreqProbe};
use super::{CommandSetup, Outcome};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::settings::Identity;
use crate::converge::{self, Context, RunReport, validate};
use crate::logging::Logger;
use crate::platform::PlatformContext;
use crate::select::{self, CatalogSelection, Mode, NoPrompter, Prompter, TerminalPrompter};

/// Run the install command.
///
/// `menu` is set for the bare `bootstrap` invocation, which offers the mode
/// menu when no mode was given on the command line.
///
/// # Errors
///
/// Returns an error if configuration loading, selection, or a precondition
/// fails. Target failures are recorded and do not error.
pub fn run(
    global: &GlobalOpts,
    opts: &InstallOpts,
    menu: bool,
    platform: PlatformContext,
    log: &Logger,
    interrupt: &Arc<AtomicBool>,
) -> Result<Outcome> {
    let setup = CommandSetup::init(global, platform, log)?;

    let interactive = super::is_interactive(global);
    let mut terminal = TerminalPrompter;
    let mut fallback = NoPrompter;
    let prompter: &mut dyn Prompter = if interactive {
        &mut terminal
    } else {
        &mut fallback
    };

    let mode = resolve_mode(opts, menu && interactive, prompter)?;
    log.stage("Selecting targets");
    let selection = select::select(&setup.catalog, mode, prompter)?;
    log.info(&format!(
        "mode {}: {} targets in {} categories",
        selection.mode(),
        selection.len(),
        selection.categories().len()
    ));
    if selection.is_empty() {
        log.warn("nothing selected");
        return Ok(Outcome::Completed);
    }

    let identity = resolve_identity(opts, &setup, &selection, interactive, prompter)?;
    let ctx = setup.context(global, log, interrupt).with_identity(identity);
    let report = execute(&setup, &selection, &ctx, opts, &UreqProbe::new(), log)?;
    Ok(outcome(&report))
}

/// Check preconditions, then converge `selection` under `ctx`.
///
/// # Errors
///
/// Returns the first failed precondition; nothing has been changed then.
pub fn execute(
    setup: &CommandSetup,
    selection: &CatalogSelection,
    ctx: &Context,
    opts: &InstallOpts,
    probe: &dyn NetworkProbe,
    log: &Logger,
) -> Result<RunReport> {
    preflight::check(
        &setup.platform,
        selection,
        PreflightOptions {
            probe_url: &setup.config.settings.network_probe_url,
            offline: opts.offline,
            dry_run: ctx.dry_run,
        },
        probe,
        log,
    )?;

    let run_validator = !opts.no_validate && !ctx.dry_run;
    Ok(converge_and_report(
        selection,
        ctx,
        log,
        &setup.config.settings.health,
        run_validator,
    ))
}

/// Pick the mode from `--categories`, `--mode`, the menu, or the default.
///
/// # Errors
///
/// Returns an error for an unknown mode or category, or when the menu
/// cannot be answered.
pub fn resolve_mode(opts: &InstallOpts, menu: bool, prompter: &mut dyn Prompter) -> Result<Mode> {
    if let Some(list) = &opts.categories {
        return Mode::from_category_list(list);
    }
    if let Some(tag) = &opts.mode {
        return Mode::from_tag(tag).ok_or_else(|| anyhow!("unknown mode '{tag}'"));
    }
    if menu {
        return select::prompt_mode(prompter);
    }
    Ok(Mode::Everything)
}

/// CLI flags, then settings, then prompts when a template is selected.
///
/// # Errors
///
/// Returns an error when a prompt cannot be answered.
pub fn resolve_identity(
    opts: &InstallOpts,
    setup: &CommandSetup,
    selection: &CatalogSelection,
    interactive: bool,
    prompter: &mut dyn Prompter,
) -> Result<Identity> {
    let identity = Identity {
        name: opts.git_name.clone(),
        email: opts.git_email.clone(),
    }
    .or(setup.config.settings.identity.clone());

    if interactive && selection.needs_identity() && !identity.is_complete() {
        return select::prompt_identity(identity, prompter);
    }
    Ok(identity)
}

/// Converge `selection`, print the summary, and re-probe the health set.
///
/// The validator is skipped when the run was interrupted.
#[must_use]
pub fn converge_and_report(
    selection: &CatalogSelection,
    ctx: &Context,
    log: &Logger,
    health: &[String],
    run_validator: bool,
) -> RunReport {
    let report = converge::apply(selection, ctx);
    log.print_summary(&report.entries());

    if let Some(at) = &report.interrupted {
        log.warn(&format!("run interrupted: {at}"));
    } else if run_validator {
        let targets = validate::health_targets(selection.targets(), health);
        let checked = validate::validate(&targets, ctx);
        log.info(&checked.summary());
    }
    report
}

/// Map a finished report to the process outcome.
#[must_use]
pub const fn outcome(report: &RunReport) -> Outcome {
    if report.is_interrupted() {
        Outcome::Interrupted
    } else {
        Outcome::Completed
    }
}
