//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors which command handlers convert to
//! [`anyhow::Error`] at the CLI boundary via `?`.
//!
//! # Error hierarchy
//!
//! ```text
//! PreconditionError  fatal, aborts before any mutation
//! ConfigError        catalog / settings / root resolution
//! TargetError        recorded per target, never fatal
//! ```
//!
//! Only the first two reach a non-zero exit status.

use thiserror::Error;

use crate::resources::backup::BackupRecord;

/// Fatal conditions checked before the first mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// Neither `HOME` nor `USERPROFILE` points at a directory.
    #[error("home directory is not set or does not exist")]
    HomeUnavailable,

    /// The OS is unknown and the selection has nothing platform-agnostic.
    #[error("unsupported platform '{os}': no platform-agnostic targets to run")]
    UnsupportedPlatform {
        /// Detected OS tag.
        os: String,
    },

    /// The network probe could not reach its endpoint.
    #[error("no network connectivity (could not reach {url})")]
    NoNetwork {
        /// URL that was probed.
        url: String,
    },

    /// A required interpreter or shell is not on `PATH`.
    #[error("required interpreter '{name}' not found on PATH")]
    MissingInterpreter {
        /// Interpreter name that was looked up.
        name: String,
    },
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The repository root could not be located.
    #[error("cannot determine repository root; use --root or set BOOTSTRAP_ROOT")]
    RootNotFound,

    /// A TOML file failed to parse.
    #[error("invalid TOML in {file}: {message}")]
    InvalidSyntax {
        /// File that failed to parse.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Non-fatal per-target failures, accumulated into the run report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Context on a failure that happened after the existing entry was
    /// moved aside; carries the record so the report keeps it.
    #[error("original moved to {}", .0.backup.display())]
    AfterBackup(BackupRecord),

    /// A dotfile source is absent from the repository checkout.
    #[error("source missing: {0}")]
    SourceMissing(String),

    /// The identity template needs a name and email that were not supplied.
    #[error("git identity not configured (missing {0})")]
    IdentityMissing(String),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn precondition_no_network_display() {
        let e = PreconditionError::NoNetwork {
            url: "https://github.com".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "no network connectivity (could not reach https://github.com)"
        );
    }

    #[test]
    fn precondition_missing_interpreter_display() {
        let e = PreconditionError::MissingInterpreter {
            name: "sh".to_string(),
        };
        assert_eq!(e.to_string(), "required interpreter 'sh' not found on PATH");
    }

    #[test]
    fn precondition_unsupported_platform_display() {
        let e = PreconditionError::UnsupportedPlatform {
            os: "unknown".to_string(),
        };
        assert!(e.to_string().contains("unsupported platform 'unknown'"));
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "/repo/conf/catalog.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/repo/conf/catalog.toml"));
    }

    #[test]
    fn config_error_invalid_syntax_display() {
        let e = ConfigError::InvalidSyntax {
            file: "catalog.toml".to_string(),
            message: "expected `]`".to_string(),
        };
        assert_eq!(e.to_string(), "invalid TOML in catalog.toml: expected `]`");
    }

    #[test]
    fn target_error_display() {
        let record = BackupRecord {
            original: "/home/ada/.oh-my-zsh".into(),
            backup: "/home/ada/.oh-my-zsh.backup.20260101_120000".into(),
            timestamp: chrono::Local::now(),
        };
        let e = anyhow::anyhow!("cloning failed").context(TargetError::AfterBackup(record.clone()));
        assert_eq!(
            format!("{e:#}"),
            "original moved to /home/ada/.oh-my-zsh.backup.20260101_120000: cloning failed"
        );
        assert_eq!(
            e.downcast_ref::<TargetError>(),
            Some(&TargetError::AfterBackup(record))
        );
        assert_eq!(
            TargetError::SourceMissing("/repo/dotfiles/common/zshrc".to_string()).to_string(),
            "source missing: /repo/dotfiles/common/zshrc"
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<PreconditionError>();
        assert_send_sync::<ConfigError>();
        assert_send_sync::<TargetError>();
    }

    #[test]
    fn precondition_downcasts_from_anyhow() {
        let e: anyhow::Error = PreconditionError::HomeUnavailable.into();
        assert!(e.downcast_ref::<PreconditionError>().is_some());
    }
}
