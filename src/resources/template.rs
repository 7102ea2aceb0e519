//! Identity file rendered from a repository template.
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::backup;
use super::fs::{ensure_parent_dir, entry_exists};
use super::symlink::is_symlink;
use super::{Resource, ResourceChange, ResourceState};
use crate::config::settings::Identity;
use crate::error::TargetError;
use crate::platform::Os;

const NAME: &str = "{{NAME}}";
const EMAIL: &str = "{{EMAIL}}";
const CREDENTIAL_HELPER: &str = "{{CREDENTIAL_HELPER}}";

/// Credential helper for `os`, or `None` where no helper is configured.
#[must_use]
pub const fn credential_helper(os: Os) -> Option<&'static str> {
    match os {
        Os::MacOs => Some("osxkeychain"),
        Os::Linux => Some("cache --timeout=3600"),
        Os::Wsl => Some(r"/mnt/c/Program\ Files/Git/mingw64/bin/git-credential-manager.exe"),
        Os::Windows => Some("manager"),
        Os::Unknown => None,
    }
}

/// The `[credential]` stanza for `os`; empty on [`Os::Unknown`].
#[must_use]
pub fn credential_stanza(os: Os) -> String {
    credential_helper(os).map_or_else(String::new, |helper| {
        format!("[credential]\n\thelper = {helper}\n")
    })
}

/// Substitute identity and credential placeholders in `template`.
///
/// When the template has no credential placeholder the stanza is appended.
#[must_use]
pub fn render(template: &str, name: &str, email: &str, os: Os) -> String {
    let stanza = credential_stanza(os);
    let mut out = template.replace(NAME, name).replace(EMAIL, email);
    if out.contains(CREDENTIAL_HELPER) {
        out = out.replace(CREDENTIAL_HELPER, stanza.trim_end());
    } else if !stanza.is_empty() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&stanza);
    }
    out
}

/// A file under home whose content is a rendered template.
#[derive(Debug, Clone)]
pub struct TemplateResource {
    /// Template file inside the repository.
    pub source: PathBuf,
    /// Rendered file under home.
    pub target: PathBuf,
    identity: Identity,
    os: Os,
}

impl TemplateResource {
    /// Create a template resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf, identity: Identity, os: Os) -> Self {
        Self {
            source,
            target,
            identity,
            os,
        }
    }

    /// Render the template with this resource's identity.
    ///
    /// # Errors
    ///
    /// Returns [`TargetError::SourceMissing`] if the template is absent,
    /// [`TargetError::IdentityMissing`] if name or email is unset.
    pub fn rendered(&self) -> Result<String> {
        if !self.source.is_file() {
            return Err(TargetError::SourceMissing(self.source.display().to_string()).into());
        }
        let missing: Vec<&str> = [("name", &self.identity.name), ("email", &self.identity.email)]
            .into_iter()
            .filter(|(_, v)| v.as_deref().is_none_or(|s| s.trim().is_empty()))
            .map(|(k, _)| k)
            .collect();
        if !missing.is_empty() {
            return Err(TargetError::IdentityMissing(missing.join(" and ")).into());
        }
        let template = std::fs::read_to_string(&self.source)
            .with_context(|| format!("reading template {}", self.source.display()))?;
        Ok(render(
            &template,
            self.identity.name.as_deref().unwrap_or_default().trim(),
            self.identity.email.as_deref().unwrap_or_default().trim(),
            self.os,
        ))
    }
}

impl Resource for TemplateResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.source.display(), self.target.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.source.is_file() {
            return Ok(ResourceState::Invalid {
                reason: format!("source missing: {}", self.source.display()),
            });
        }
        if !entry_exists(&self.target) {
            return Ok(ResourceState::Missing);
        }
        if is_symlink(&self.target) || !self.target.is_file() {
            return Ok(ResourceState::Incorrect {
                current: "not a regular file".to_string(),
            });
        }
        if !self.identity.is_complete() {
            // Nothing to compare against; an existing file is kept as is.
            return Ok(ResourceState::Correct);
        }
        let expected = self.rendered()?;
        let actual = std::fs::read_to_string(&self.target)
            .with_context(|| format!("reading {}", self.target.display()))?;
        if actual == expected {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            })
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if self.source.is_file()
            && !self.identity.is_complete()
            && self.target.is_file()
            && !is_symlink(&self.target)
        {
            return Ok(ResourceChange::AlreadyCorrect);
        }
        let content = self.rendered()?;

        let backup = if entry_exists(&self.target) {
            if !is_symlink(&self.target)
                && std::fs::read_to_string(&self.target).is_ok_and(|c| c == content)
            {
                return Ok(ResourceChange::AlreadyCorrect);
            }
            if is_symlink(&self.target) {
                std::fs::remove_file(&self.target)
                    .with_context(|| format!("removing symlink {}", self.target.display()))?;
                None
            } else {
                Some(backup::create_backup(&self.target)?)
            }
        } else {
            ensure_parent_dir(&self.target)?;
            None
        };

        let written = std::fs::write(&self.target, content)
            .with_context(|| format!("writing {}", self.target.display()));
        match backup {
            Some(backup) => {
                written.with_context(|| TargetError::AfterBackup(backup.clone()))?;
                Ok(ResourceChange::BackedUp { backup })
            }
            None => {
                written?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}
