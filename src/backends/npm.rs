//! Global npm packages.
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `npm -g` adapter.
#[derive(Debug)]
pub struct Npm {
    executor: Arc<dyn Executor>,
}

/// The part of `npm ls -g --json` we read.
#[derive(Debug, Deserialize)]
struct NpmListing {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

impl Npm {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl PackageBackend for Npm {
    fn kind(&self) -> Backend {
        Backend::Npm
    }

    fn is_available(&self) -> bool {
        self.executor.which("npm")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        // npm exits non-zero on peer-dependency problems but still prints
        // the tree, so the exit status is ignored.
        let Ok(result) = self
            .executor
            .run_unchecked("npm", &["ls", "-g", "--depth=0", "--json"])
        else {
            return false;
        };
        serde_json::from_str::<NpmListing>(&result.stdout)
            .is_ok_and(|listing| listing.dependencies.contains_key(name))
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "npm")?;
        self.executor.run("npm", &["install", "-g", name])?;
        Ok(())
    }
}
