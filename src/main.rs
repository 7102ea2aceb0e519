//! `bootstrap` binary: parse arguments, set up logging, dispatch.
use std::io::{self, Write as _};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{CommandFactory as _, Parser as _};

use bootstrap_cli::cli::{Cli, Command, InstallOpts};
use bootstrap_cli::commands::{self, Outcome};
use bootstrap_cli::logging::{self, Logger};
use bootstrap_cli::platform::PlatformContext;

fn main() -> ExitCode {
    let args = Cli::parse();

    match &args.command {
        Some(Command::Completions { shell }) => {
            clap_complete::generate(*shell, &mut Cli::command(), "bootstrap", &mut io::stdout());
            return ExitCode::SUCCESS;
        }
        Some(Command::Version) => {
            let mut out = io::stdout();
            return match writeln!(out, "bootstrap {}", logging::version()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        _ => {}
    }

    let mut platform = PlatformContext::detect(std::path::PathBuf::new());
    if let Some(path) = &args.global.log_file {
        platform = platform.with_log_path(path.clone());
    } else if platform.home.as_os_str().is_empty() {
        let fallback = std::env::temp_dir().join(format!("bootstrap-{}.log", platform.os));
        platform = platform.with_log_path(fallback);
    }
    logging::init_subscriber(args.global.verbose, &platform.log_path);
    let log = Logger::new(&platform.log_path);

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        log.warn(&format!("interrupt handler unavailable: {e}"));
    }

    log.debug(&format!("bootstrap {}", logging::version()));

    let global = &args.global;
    let result = match &args.command {
        None => {
            let opts = InstallOpts::default();
            commands::install::run(global, &opts, true, platform, &log, &interrupt)
        }
        Some(Command::Install(opts)) => {
            commands::install::run(global, opts, false, platform, &log, &interrupt)
        }
        Some(Command::Validate) => commands::validate::run(global, platform, &log, &interrupt),
        Some(Command::Backup) => commands::backup::run(global, platform, &log, &interrupt),
        Some(Command::Completions { .. } | Command::Version) => Ok(Outcome::Completed),
    };

    match result {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
