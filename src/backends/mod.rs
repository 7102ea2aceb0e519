//! Package-manager adapters behind a single [`PackageBackend`] trait.
//!
//! Each adapter shells out through an [`Executor`], so every command is
//! subject to the run's timeout and interrupt handling. Probing never
//! raises: a missing tool or an unreadable answer means "not installed".
pub mod apt;
pub mod cargo;
pub mod choco;
pub mod homebrew;
pub mod npm;
pub mod pipx;
pub mod winget;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use crate::config::catalog::Backend;
use crate::exec::Executor;
use crate::platform::PlatformContext;

/// A package manager the engine can query and install through.
#[cfg_attr(test, mockall::automock)]
pub trait PackageBackend: Send + Sync + std::fmt::Debug {
    /// Which catalog backend this adapter serves.
    fn kind(&self) -> Backend;

    /// Whether the manager's executable is on `PATH`.
    fn is_available(&self) -> bool;

    /// Whether `name` is already installed. Indeterminate answers are `false`.
    fn is_installed(&self, name: &str) -> bool;

    /// Install `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is missing or the install fails.
    fn install(&self, name: &str) -> Result<()>;
}

/// The adapters usable on this platform, keyed by backend.
#[derive(Debug, Default)]
pub struct BackendSet {
    backends: BTreeMap<Backend, Box<dyn PackageBackend>>,
}

impl BackendSet {
    /// Register every adapter whose backend can run on `ctx.os`.
    #[must_use]
    pub fn for_platform(ctx: &PlatformContext, executor: &Arc<dyn Executor>) -> Self {
        let all: Vec<Box<dyn PackageBackend>> = vec![
            Box::new(homebrew::Homebrew::formula(Arc::clone(executor))),
            Box::new(homebrew::Homebrew::cask(Arc::clone(executor))),
            Box::new(apt::Apt::new(Arc::clone(executor))),
            Box::new(winget::Winget::new(Arc::clone(executor))),
            Box::new(choco::Chocolatey::new(Arc::clone(executor))),
            Box::new(pipx::Pipx::new(Arc::clone(executor))),
            Box::new(npm::Npm::new(Arc::clone(executor))),
            Box::new(cargo::Cargo::new(Arc::clone(executor))),
        ];
        all.into_iter()
            .filter(|b| b.kind().runs_on(ctx.os))
            .fold(Self::default(), Self::with)
    }

    /// Add or replace the adapter for its backend.
    #[must_use]
    pub fn with(mut self, backend: Box<dyn PackageBackend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    /// Adapter for `kind`, if registered.
    #[must_use]
    pub fn get(&self, kind: Backend) -> Option<&dyn PackageBackend> {
        self.backends.get(&kind).map(AsRef::as_ref)
    }

    /// Registered backends, in catalog order.
    pub fn kinds(&self) -> impl Iterator<Item = Backend> + '_ {
        self.backends.keys().copied()
    }
}

/// Fail with a uniform message when `tool` is not on `PATH`.
fn require_tool(executor: &dyn Executor, tool: &str) -> Result<()> {
    if !executor.which(tool) {
        anyhow::bail!("{tool} not found on PATH");
    }
    Ok(())
}
