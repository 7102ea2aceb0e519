//! Configuration: the target catalog and run settings.
pub mod catalog;
pub mod settings;
pub mod toml_loader;
pub mod validation;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use catalog::Catalog;
use settings::Settings;
use validation::ValidationWarning;

/// Everything loaded from the repository before a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository root.
    pub root: PathBuf,
    /// Full catalog, not yet filtered by platform.
    pub catalog: Catalog,
    /// Run settings.
    pub settings: Settings,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<ValidationWarning>,
}

impl Config {
    /// Load the catalog and settings for `root` and validate them.
    ///
    /// # Errors
    ///
    /// Returns an error if either file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let catalog = Catalog::load(root).context("loading catalog")?;
        let settings = Settings::load(root).context("loading conf/bootstrap.toml")?;
        let warnings = validation::validate_all(root, &catalog, &settings);
        Ok(Self {
            root: root.to_path_buf(),
            catalog,
            settings,
            warnings,
        })
    }
}
