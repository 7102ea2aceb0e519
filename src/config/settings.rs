//! Run settings from `<root>/conf/bootstrap.toml`.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::toml_loader;
use crate::error::ConfigError;

/// Default per-command timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Default endpoint probed by the network precondition.
pub const DEFAULT_NETWORK_PROBE_URL: &str = "https://github.com";

/// Git identity used to render the identity template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Identity {
    /// `user.name`.
    pub name: Option<String>,
    /// `user.email`.
    pub email: Option<String>,
}

impl Identity {
    /// Fill unset fields from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            name: self.name.or(other.name),
            email: self.email.or(other.email),
        }
    }

    /// Whether both name and email are present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.name) && filled(&self.email)
    }
}

/// Optional settings; every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Per-command timeout in seconds.
    pub timeout_secs: u64,
    /// URL probed for network reachability.
    pub network_probe_url: String,
    /// Identity defaults for the template target.
    pub identity: Identity,
    /// Target ids checked by the validator; empty uses essential + dotfile.
    pub health: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            network_probe_url: DEFAULT_NETWORK_PROBE_URL.to_string(),
            identity: Identity::default(),
            health: Vec::new(),
        }
    }
}

impl Settings {
    /// Load `<root>/conf/bootstrap.toml`, or defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        toml_loader::load_config(&root.join("conf").join("bootstrap.toml"))
    }

    /// Per-command timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
