//! Subcommand orchestration: shared setup, root resolution, and the
//! `install`, `validate`, and `backup` handlers.
pub mod backup;
pub mod install;
pub mod preflight;
pub mod validate;

use std::io::IsTerminal as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;

use crate::backends::BackendSet;
use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::catalog::Catalog;
use crate::converge::Context;
use crate::error::ConfigError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::platform::PlatformContext;

/// Environment variable naming the repository root.
pub const ROOT_ENV: &str = "BOOTSTRAP_ROOT";

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The run completed, possibly with recorded target failures.
    Completed,
    /// The operator interrupted the run.
    Interrupted,
}

impl Outcome {
    /// Process exit status.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::Interrupted => 130,
        }
    }
}

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform, with the resolved root.
    pub platform: Arc<PlatformContext>,
    /// Loaded catalog and settings.
    pub config: Config,
    /// Catalog entries that apply on this platform.
    pub catalog: Catalog,
}

impl CommandSetup {
    /// Check home, resolve the root, load configuration, and filter the
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::HomeUnavailable`](crate::error::PreconditionError::HomeUnavailable)
    /// before touching the filesystem when home is unusable, or an error if
    /// the root cannot be determined or a config file fails to parse.
    pub fn init(global: &GlobalOpts, mut platform: PlatformContext, log: &dyn Log) -> Result<Self> {
        preflight::require_home(&platform)?;
        platform.root = resolve_root(global)?;
        log.info(&format!(
            "platform: {} (shell {}), root {}",
            platform.os,
            platform.shell,
            platform.root.display()
        ));

        log.stage("Loading configuration");
        let config = Config::load(&platform.root)?;
        let catalog = config.catalog.for_platform(&platform);
        log.info(&format!(
            "{} of {} catalog targets apply on {}",
            catalog.len(),
            config.catalog.len(),
            platform.os
        ));

        if !config.warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                config.warnings.len()
            ));
            for warning in &config.warnings {
                log.warn(&format!("  {warning}"));
            }
        }

        Ok(Self {
            platform: Arc::new(platform),
            config,
            catalog,
        })
    }

    /// Build the driver context with real process execution.
    #[must_use]
    pub fn context(
        &self,
        global: &GlobalOpts,
        log: &Logger,
        interrupt: &Arc<AtomicBool>,
    ) -> Context {
        let timeout = global.timeout.map_or_else(
            || self.config.settings.timeout(),
            std::time::Duration::from_secs,
        );
        let executor: Arc<dyn Executor> = Arc::new(
            SystemExecutor::new(timeout, Arc::clone(interrupt)).with_env(self.platform.child_env()),
        );
        let backends = BackendSet::for_platform(&self.platform, &executor);
        self.context_with(global, backends, Arc::new(log.clone()), interrupt)
    }

    /// Build the driver context over the given adapters and log.
    ///
    /// The identity comes from the settings file; `install` replaces it with
    /// the one resolved from flags and prompts.
    #[must_use]
    pub fn context_with(
        &self,
        global: &GlobalOpts,
        backends: BackendSet,
        log: Arc<dyn Log>,
        interrupt: &Arc<AtomicBool>,
    ) -> Context {
        Context::new(Arc::clone(&self.platform), backends, log)
            .with_dry_run(global.dry_run)
            .with_interrupt(Arc::clone(interrupt))
            .with_identity(self.config.settings.identity.clone())
    }
}

/// Whether prompts may be shown.
#[must_use]
pub fn is_interactive(global: &GlobalOpts) -> bool {
    !global.non_interactive && std::io::stdin().is_terminal()
}

/// Resolve the repository root.
///
/// Order: `--root`, then `BOOTSTRAP_ROOT`, then the directory the binary was
/// built or installed into, then the current directory. Auto-detected
/// candidates must contain `dotfiles/`.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] when no candidate qualifies.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resolve_root_from(
        global.root.as_deref(),
        std::env::var_os(ROOT_ENV).map(PathBuf::from).as_deref(),
        exe_dir.as_deref(),
        std::env::current_dir().ok().as_deref(),
    )
}

/// [`resolve_root`] over explicit inputs.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] when no candidate qualifies.
pub fn resolve_root_from(
    flag: Option<&Path>,
    env: Option<&Path>,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(root) = flag.or(env) {
        if !root.is_dir() {
            anyhow::bail!("repository root {} does not exist", root.display());
        }
        return Ok(dunce::canonicalize(root)?);
    }

    let mut candidates = Vec::new();
    if let Some(dir) = exe_dir {
        // target/<profile>/ → repo root, bin/ → repo root
        candidates.push(dir.join("..").join(".."));
        candidates.push(dir.join(".."));
    }
    if let Some(dir) = cwd {
        candidates.push(dir.to_path_buf());
    }

    for candidate in candidates {
        if is_repo_root(&candidate) {
            return Ok(dunce::canonicalize(&candidate)?);
        }
    }
    Err(ConfigError::RootNotFound.into())
}

fn is_repo_root(dir: &Path) -> bool {
    dir.join("dotfiles").is_dir()
}
