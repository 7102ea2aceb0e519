//! Homebrew formulae and casks.
use std::sync::Arc;

use anyhow::Result;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `brew` adapter; one instance serves formulae, another casks.
#[derive(Debug)]
pub struct Homebrew {
    executor: Arc<dyn Executor>,
    cask: bool,
}

impl Homebrew {
    /// Adapter for formulae.
    #[must_use]
    pub const fn formula(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            cask: false,
        }
    }

    /// Adapter for casks.
    #[must_use]
    pub const fn cask(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            cask: true,
        }
    }

    const fn kind_flag(&self) -> &'static str {
        if self.cask { "--cask" } else { "--formula" }
    }
}

impl PackageBackend for Homebrew {
    fn kind(&self) -> Backend {
        if self.cask { Backend::Cask } else { Backend::Brew }
    }

    fn is_available(&self) -> bool {
        self.executor.which("brew")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.executor
            .run_unchecked("brew", &["list", self.kind_flag(), "--versions", name])
            .is_ok_and(|r| r.success && !r.stdout.trim().is_empty())
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "brew")?;
        if self.cask {
            self.executor.run("brew", &["install", "--cask", name])?;
        } else {
            self.executor.run("brew", &["install", name])?;
        }
        Ok(())
    }
}
