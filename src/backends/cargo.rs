//! Binaries installed with `cargo install`.
use std::sync::Arc;

use anyhow::Result;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `cargo install` adapter.
#[derive(Debug)]
pub struct Cargo {
    executor: Arc<dyn Executor>,
}

impl Cargo {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

/// Crate names from `cargo install --list`: unindented `name vX.Y.Z:` lines.
fn installed_crates(stdout: &str) -> impl Iterator<Item = &str> {
    stdout
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| line.split_whitespace().next())
}

impl PackageBackend for Cargo {
    fn kind(&self) -> Backend {
        Backend::Cargo
    }

    fn is_available(&self) -> bool {
        self.executor.which("cargo")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.executor
            .run_unchecked("cargo", &["install", "--list"])
            .is_ok_and(|r| r.success && installed_crates(&r.stdout).any(|c| c == name))
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "cargo")?;
        self.executor.run("cargo", &["install", "--locked", name])?;
        Ok(())
    }
}
