//! Catalog and settings validation. Everything here is a warning, never an
//! error: a run proceeds with whatever parsed.
use std::collections::HashSet;
use std::path::Path;

use super::catalog::{Action, Catalog};
use super::settings::Settings;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration source (e.g. `conf/catalog.toml`).
    pub source: String,
    /// The item or section that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.source, self.item, self.message)
    }
}

/// A check over loaded configuration.
pub trait ConfigValidator {
    /// Validate and return any warnings found.
    fn validate(&self, root: &Path) -> Vec<ValidationWarning>;

    /// Short name used in debug output.
    fn name(&self) -> &'static str;
}

/// Checks catalog structure: duplicate ids, empty names, and backends pinned
/// to platforms they cannot run on.
#[derive(Debug)]
pub struct CatalogValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> CatalogValidator<'a> {
    /// Validate `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }
}

impl ConfigValidator for CatalogValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for target in self.catalog.targets() {
            if !seen.insert(target.id.as_str()) {
                warnings.push(ValidationWarning::new(
                    "catalog",
                    &target.id,
                    "duplicate target id",
                ));
            }

            if let Action::Package(name) = &target.action
                && name.trim().is_empty()
            {
                warnings.push(ValidationWarning::new(
                    "catalog",
                    &target.id,
                    "package name is empty",
                ));
            }

            for os in &target.platforms {
                if !target.backend.runs_on(*os) {
                    warnings.push(ValidationWarning::new(
                        "catalog",
                        &target.id,
                        format!("backend '{}' cannot run on {os}", target.backend),
                    ));
                }
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}

/// Checks that link and template sources exist in the checkout and that
/// home-relative paths are relative.
#[derive(Debug)]
pub struct SourceValidator<'a> {
    catalog: &'a Catalog,
}

impl<'a> SourceValidator<'a> {
    /// Validate sources referenced by `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }
}

impl ConfigValidator for SourceValidator<'_> {
    fn validate(&self, root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let dotfiles = root.join("dotfiles");

        for target in self.catalog.targets() {
            let (source, home_path) = match &target.action {
                Action::Link { source, target } => (Some(dotfiles.join(source)), target),
                Action::Template { source, target } => (Some(root.join(source)), target),
                Action::Clone { dest, .. } => (None, dest),
                Action::Package(_) => continue,
            };

            if let Some(source) = source
                && !source.exists()
            {
                warnings.push(ValidationWarning::new(
                    "catalog",
                    &target.id,
                    format!("source does not exist: {}", source.display()),
                ));
            }

            if home_path.is_absolute() {
                warnings.push(ValidationWarning::new(
                    "catalog",
                    &target.id,
                    "destination should be relative to the home directory",
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "sources"
    }
}

/// Checks settings against the catalog.
#[derive(Debug)]
pub struct SettingsValidator<'a> {
    settings: &'a Settings,
    catalog: &'a Catalog,
}

impl<'a> SettingsValidator<'a> {
    /// Validate `settings` against `catalog`.
    #[must_use]
    pub const fn new(settings: &'a Settings, catalog: &'a Catalog) -> Self {
        Self { settings, catalog }
    }
}

impl ConfigValidator for SettingsValidator<'_> {
    fn validate(&self, _root: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if self.settings.timeout_secs == 0 {
            warnings.push(ValidationWarning::new(
                "conf/bootstrap.toml",
                "timeout_secs",
                "timeout of 0 seconds kills every command immediately",
            ));
        }

        for id in &self.settings.health {
            if self.catalog.get(id).is_none() {
                warnings.push(ValidationWarning::new(
                    "conf/bootstrap.toml",
                    id,
                    "health id does not match any catalog target",
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "settings"
    }
}

/// Run every validator and collect their warnings, parse warnings first.
#[must_use]
pub fn validate_all(root: &Path, catalog: &Catalog, settings: &Settings) -> Vec<ValidationWarning> {
    let validators: [&dyn ConfigValidator; 3] = [
        &CatalogValidator::new(catalog),
        &SourceValidator::new(catalog),
        &SettingsValidator::new(settings, catalog),
    ];

    let mut warnings = catalog.warnings().to_vec();
    for validator in validators {
        let found = validator.validate(root);
        tracing::debug!("validator {}: {} warning(s)", validator.name(), found.len());
        warnings.extend(found);
    }
    warnings
}
