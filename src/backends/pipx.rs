//! Python applications installed with pipx.
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `pipx` adapter.
#[derive(Debug)]
pub struct Pipx {
    executor: Arc<dyn Executor>,
}

/// The part of `pipx list --json` we read.
#[derive(Debug, Deserialize)]
struct PipxListing {
    #[serde(default)]
    venvs: BTreeMap<String, serde_json::Value>,
}

impl Pipx {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl PackageBackend for Pipx {
    fn kind(&self) -> Backend {
        Backend::Pipx
    }

    fn is_available(&self) -> bool {
        self.executor.which("pipx")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        let Ok(result) = self.executor.run_unchecked("pipx", &["list", "--json"]) else {
            return false;
        };
        serde_json::from_str::<PipxListing>(&result.stdout)
            .is_ok_and(|listing| listing.venvs.contains_key(name))
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "pipx")?;
        self.executor.run("pipx", &["install", name])?;
        Ok(())
    }
}
