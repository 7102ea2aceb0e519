//! Timestamped, never-clobbering backups of files about to be replaced.
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Local};

/// Upper bound on `.1`, `.2`, ... suffixes tried for one timestamp.
const MAX_SUFFIX: u32 = 999;

/// A file or directory that was moved aside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Where the entry used to live.
    pub original: PathBuf,
    /// Where it lives now.
    pub backup: PathBuf,
    /// When it was moved.
    pub timestamp: DateTime<Local>,
}

/// Candidate backup path: `<original>.backup.<stamp>` with an optional
/// numeric suffix.
#[must_use]
pub fn backup_path(original: &Path, stamp: &str, suffix: u32) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(format!(".backup.{stamp}"));
    if suffix > 0 {
        name.push(format!(".{suffix}"));
    }
    PathBuf::from(name)
}

/// Move `original` to a fresh backup path and return the record.
///
/// The stamp is local time as `YYYYMMDD_HHMMSS`. When that path is taken,
/// `.1`, `.2`, ... are tried in turn. An existing backup is never
/// overwritten.
///
/// # Errors
///
/// Returns an error if `original` does not exist, cannot be moved, or every
/// candidate path is taken.
pub fn create_backup(original: &Path) -> Result<BackupRecord> {
    let timestamp = Local::now();
    let stamp = timestamp.format("%Y%m%d_%H%M%S").to_string();

    for suffix in 0..=MAX_SUFFIX {
        let candidate = backup_path(original, &stamp, suffix);
        match move_no_clobber(original, &candidate) {
            Ok(()) => {
                return Ok(BackupRecord {
                    original: original.to_path_buf(),
                    backup: candidate,
                    timestamp,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "backing up {} to {}",
                        original.display(),
                        candidate.display()
                    )
                });
            }
        }
    }

    bail!(
        "no free backup path for {} (tried {} suffixes)",
        original.display(),
        MAX_SUFFIX
    )
}

/// Move `from` to `to`, failing with [`io::ErrorKind::AlreadyExists`] if `to`
/// is taken.
///
/// Regular files are hard-linked then unlinked, which is atomic with respect
/// to an existing `to`. Directories (and filesystems without hard links) fall
/// back to an existence check followed by a rename.
fn move_no_clobber(from: &Path, to: &Path) -> io::Result<()> {
    let meta = std::fs::symlink_metadata(from)?;
    if meta.is_file() {
        match std::fs::hard_link(from, to) {
            Ok(()) => return std::fs::remove_file(from),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
            Err(_) => {}
        }
    }
    if to.symlink_metadata().is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    std::fs::rename(from, to)
}
