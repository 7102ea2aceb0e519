//! Package installation resource.
use anyhow::{Context as _, Result};

use super::{Resource, ResourceChange, ResourceState};
use crate::backends::PackageBackend;

/// A package that should be installed through a backend.
#[derive(Debug)]
pub struct PackageResource<'a> {
    /// Package name (or winget id).
    pub name: String,
    backend: &'a dyn PackageBackend,
}

impl<'a> PackageResource<'a> {
    /// Create a package resource.
    #[must_use]
    pub const fn new(name: String, backend: &'a dyn PackageBackend) -> Self {
        Self { name, backend }
    }
}

impl Resource for PackageResource<'_> {
    fn description(&self) -> String {
        format!("{} ({})", self.name, self.backend.kind())
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(if self.backend.is_installed(&self.name) {
            ResourceState::Correct
        } else {
            ResourceState::Missing
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.backend.is_installed(&self.name) {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        self.backend
            .install(&self.name)
            .with_context(|| format!("installing {}", self.description()))?;
        Ok(ResourceChange::Applied)
    }
}
