//! Chocolatey packages.
use std::sync::Arc;

use anyhow::Result;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `choco` adapter.
#[derive(Debug)]
pub struct Chocolatey {
    executor: Arc<dyn Executor>,
}

impl Chocolatey {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

/// Whether `choco list --limit-output` output has a `name|version` line for
/// `name`. Chocolatey ids are case-insensitive.
fn listed(stdout: &str, name: &str) -> bool {
    stdout
        .lines()
        .filter_map(|line| line.split_once('|'))
        .any(|(id, _)| id.trim().eq_ignore_ascii_case(name))
}

impl PackageBackend for Chocolatey {
    fn kind(&self) -> Backend {
        Backend::Choco
    }

    fn is_available(&self) -> bool {
        self.executor.which("choco")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.executor
            .run_unchecked("choco", &["list", "--exact", "--limit-output", name])
            .is_ok_and(|r| r.success && listed(&r.stdout, name))
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "choco")?;
        self.executor
            .run("choco", &["install", name, "-y", "--no-progress"])?;
        Ok(())
    }
}
