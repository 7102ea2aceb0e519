//! Dotfile symlink resource with backup of whatever is in the way.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::backup::{self, BackupRecord};
use super::fs::ensure_parent_dir;
use super::{Resource, ResourceChange, ResourceState};
use crate::error::TargetError;

/// What currently sits at a link's target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing at the target path.
    Absent,
    /// A real file or directory occupies the target path.
    RealFileConflict,
    /// The target is a symlink resolving to the source.
    CorrectSymlink,
    /// The target is a symlink resolving elsewhere (or dangling).
    WrongSymlink {
        /// Where the link currently points.
        points_to: PathBuf,
    },
    /// The source is absent from the checkout.
    SourceMissing,
}

/// A symlink binding: `target` (under home) should resolve to `source`
/// (inside the repository).
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// What the link points to.
    pub source: PathBuf,
    /// Where the link lives.
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Create a binding.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Classify the target path.
    #[must_use]
    pub fn link_state(&self) -> LinkState {
        if !self.source.exists() {
            return LinkState::SourceMissing;
        }
        let Ok(meta) = self.target.symlink_metadata() else {
            return LinkState::Absent;
        };
        if !meta.file_type().is_symlink() {
            return LinkState::RealFileConflict;
        }
        match std::fs::read_link(&self.target) {
            Ok(existing) if self.resolves_to_source(&existing) => LinkState::CorrectSymlink,
            Ok(existing) => LinkState::WrongSymlink {
                points_to: existing,
            },
            Err(_) => LinkState::WrongSymlink {
                points_to: PathBuf::new(),
            },
        }
    }

    fn resolves_to_source(&self, existing: &Path) -> bool {
        let absolute = if existing.is_absolute() {
            existing.to_path_buf()
        } else {
            self.target
                .parent()
                .map_or_else(|| existing.to_path_buf(), |p| p.join(existing))
        };
        if paths_equal(&absolute, &self.source) {
            return true;
        }
        match (
            dunce::canonicalize(&self.target),
            dunce::canonicalize(&self.source),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Move a real file or directory at the target aside without linking.
    ///
    /// Returns `None` when nothing needed backing up.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be created.
    pub fn backup_conflict(&self) -> Result<Option<BackupRecord>> {
        let conflict = self
            .target
            .symlink_metadata()
            .is_ok_and(|m| !m.file_type().is_symlink());
        if !conflict {
            return Ok(None);
        }
        backup::create_backup(&self.target).map(Some)
    }
}

impl Resource for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        Ok(match self.link_state() {
            LinkState::Absent => ResourceState::Missing,
            LinkState::CorrectSymlink => ResourceState::Correct,
            LinkState::RealFileConflict => ResourceState::Incorrect {
                current: "a real file or directory is in the way".to_string(),
            },
            LinkState::WrongSymlink { points_to } => ResourceState::Incorrect {
                current: format!("points to {}", points_to.display()),
            },
            LinkState::SourceMissing => ResourceState::Invalid {
                reason: format!("source missing: {}", self.source.display()),
            },
        })
    }

    fn apply(&self) -> Result<ResourceChange> {
        let change = match self.link_state() {
            LinkState::CorrectSymlink => return Ok(ResourceChange::AlreadyCorrect),
            LinkState::SourceMissing => {
                return Err(TargetError::SourceMissing(self.source.display().to_string()).into());
            }
            LinkState::Absent => {
                ensure_parent_dir(&self.target)?;
                ResourceChange::Applied
            }
            LinkState::WrongSymlink { .. } => {
                remove_symlink(&self.target)
                    .with_context(|| format!("remove stale link: {}", self.target.display()))?;
                ResourceChange::Applied
            }
            LinkState::RealFileConflict => {
                let backup = backup::create_backup(&self.target)?;
                ResourceChange::BackedUp { backup }
            }
        };

        let mut linked = create_symlink(&self.source, &self.target)
            .with_context(|| format!("create link: {}", self.target.display()));
        if let ResourceChange::BackedUp { backup } = &change {
            linked = linked.with_context(|| TargetError::AfterBackup(backup.clone()));
        }
        linked?;
        Ok(change)
    }
}

/// Compare two paths for equality, ignoring the `\\?\` prefix on Windows.
fn paths_equal(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        #[cfg(windows)]
        {
            let s = p.to_string_lossy();
            if let Some(stripped) = s.strip_prefix(r"\\?\") {
                return PathBuf::from(stripped);
            }
        }
        p.to_path_buf()
    };

    normalize(a) == normalize(b)
}

/// Create a symlink at `link` pointing to `source`.
fn create_symlink(source: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(source, link).with_context(|| {
            format!(
                "creating symlink {} -> {}",
                link.display(),
                source.display()
            )
        })?;
    }

    #[cfg(windows)]
    {
        let is_dir = source.is_dir();
        let result = if is_dir {
            std::os::windows::fs::symlink_dir(source, link)
        } else {
            std::os::windows::fs::symlink_file(source, link)
        };

        if result.is_err() {
            // Without Developer Mode or elevation, mklink /J still works for
            // directories; file links need the privilege either way.
            let mut cmd = std::process::Command::new("cmd");
            cmd.args(["/c", "mklink"]);
            if is_dir {
                cmd.arg("/J");
            }
            let output = cmd
                .arg(link)
                .arg(source)
                .output()
                .context("failed to run mklink")?;
            if !output.status.success() {
                anyhow::bail!(
                    "mklink {} -> {}: {}",
                    link.display(),
                    source.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
        }
    }

    Ok(())
}

/// Remove a symlink (file or directory flavoured).
fn remove_symlink(path: &Path) -> Result<()> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("reading metadata: {}", path.display()))?;
    if is_dir_like(&meta) {
        std::fs::remove_dir(path)
            .with_context(|| format!("removing directory link: {}", path.display()))?;
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing link: {}", path.display()))?;
    }
    Ok(())
}

/// Whether metadata describes a directory-like entry.
///
/// Windows reports directory symlinks and junctions as non-directories through
/// `is_dir()`, so the raw `FILE_ATTRIBUTE_DIRECTORY` bit is checked instead.
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        meta.file_attributes() & 0x10 != 0
    }
    #[cfg(not(windows))]
    {
        meta.is_dir()
    }
}

/// Whether a symlink lives at `path`, whether or not it dangles.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink())
}
