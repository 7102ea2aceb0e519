//! Git clone resource for shell frameworks and themes.
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};
use git2::build::RepoBuilder;
use git2::{FetchOptions, RemoteCallbacks, Repository};

use super::backup;
use super::fs::{ensure_parent_dir, entry_exists};
use super::{Resource, ResourceChange, ResourceState};
use crate::error::TargetError;
use crate::exec::ExecError;

/// A repository that should be cloned at `dest`.
#[derive(Debug, Clone)]
pub struct CloneResource {
    /// Remote URL.
    pub url: String,
    /// Absolute destination.
    pub dest: PathBuf,
    interrupt: Arc<AtomicBool>,
}

impl CloneResource {
    /// Create a clone resource; the transfer aborts when `interrupt` is raised.
    #[must_use]
    pub const fn new(url: String, dest: PathBuf, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            url,
            dest,
            interrupt,
        }
    }

    fn clone_into_place(&self) -> Result<()> {
        let mut callbacks = RemoteCallbacks::new();
        let interrupt = Arc::clone(&self.interrupt);
        callbacks.transfer_progress(move |_| !interrupt.load(Ordering::SeqCst));

        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);
        fetch.depth(1);

        let result = RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&self.url, &self.dest);

        match result {
            Ok(_) => Ok(()),
            Err(_) if self.interrupt.load(Ordering::SeqCst) => {
                // Leave no half-written checkout behind for the next run.
                std::fs::remove_dir_all(&self.dest).ok();
                Err(ExecError::Interrupted {
                    program: "git clone".to_string(),
                }
                .into())
            }
            Err(e) => {
                std::fs::remove_dir_all(&self.dest).ok();
                Err(e).with_context(|| format!("cloning {}", self.url))
            }
        }
    }
}

impl Resource for CloneResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.url, self.dest.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if Repository::open(&self.dest).is_ok() {
            return Ok(ResourceState::Correct);
        }
        if entry_exists(&self.dest) {
            return Ok(ResourceState::Incorrect {
                current: "exists but is not a git repository".to_string(),
            });
        }
        Ok(ResourceState::Missing)
    }

    fn apply(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Incorrect { .. } => {
                let backup = backup::create_backup(&self.dest)?;
                self.clone_into_place()
                    .with_context(|| TargetError::AfterBackup(backup.clone()))?;
                Ok(ResourceChange::BackedUp { backup })
            }
            ResourceState::Missing | ResourceState::Invalid { .. } => {
                ensure_parent_dir(&self.dest)?;
                self.clone_into_place()?;
                Ok(ResourceChange::Applied)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    /// Create a local repository with one commit to clone from.
    fn upstream(dir: &std::path::Path) -> String {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("oh-my-zsh.sh"), "# framework\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(std::path::Path::new("oh-my-zsh.sh")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();
        format!("file://{}", dir.display())
    }

    #[test]
    fn missing_dest_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let res = CloneResource::new(
            "https://example.invalid/x.git".to_string(),
            dir.path().join(".oh-my-zsh"),
            flag(),
        );
        assert_eq!(res.current_state().unwrap(), ResourceState::Missing);
    }

    #[test]
    fn existing_repo_is_correct() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path().join(".oh-my-zsh")).unwrap();
        let res = CloneResource::new(
            "https://example.invalid/x.git".to_string(),
            dir.path().join(".oh-my-zsh"),
            flag(),
        );
        assert_eq!(res.current_state().unwrap(), ResourceState::Correct);
        assert_eq!(res.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn plain_directory_is_incorrect() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".oh-my-zsh")).unwrap();
        let res = CloneResource::new(
            "https://example.invalid/x.git".to_string(),
            dir.path().join(".oh-my-zsh"),
            flag(),
        );
        assert!(matches!(
            res.current_state().unwrap(),
            ResourceState::Incorrect { .. }
        ));
    }

    #[test]
    fn clones_from_local_upstream() {
        let dir = tempfile::tempdir().unwrap();
        let up = dir.path().join("upstream");
        std::fs::create_dir(&up).unwrap();
        let url = upstream(&up);
        let dest = dir.path().join("home").join(".oh-my-zsh");
        let res = CloneResource::new(url, dest.clone(), flag());

        assert_eq!(res.apply().unwrap(), ResourceChange::Applied);
        assert!(dest.join("oh-my-zsh.sh").exists());
        assert_eq!(res.apply().unwrap(), ResourceChange::AlreadyCorrect);
    }

    #[test]
    fn failed_clone_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(".oh-my-zsh");
        let res = CloneResource::new(
            format!("file://{}", dir.path().join("no-such-repo").display()),
            dest.clone(),
            flag(),
        );
        assert!(res.apply().is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn failed_clone_over_directory_carries_backup() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(".oh-my-zsh");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("custom.zsh"), "# mine\n").unwrap();
        let res = CloneResource::new(
            format!("file://{}", dir.path().join("no-such-repo").display()),
            dest.clone(),
            flag(),
        );

        let err = res.apply().unwrap_err();
        let Some(TargetError::AfterBackup(record)) = err.downcast_ref::<TargetError>() else {
            panic!("expected the backup on the error, got {err:#}");
        };
        assert_eq!(record.original, dest);
        assert!(record.backup.join("custom.zsh").exists());
        assert!(format!("{err:#}").contains("cloning file://"));
    }
}
