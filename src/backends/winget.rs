//! Windows Package Manager.
use std::sync::Arc;

use anyhow::Result;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `APPINSTALLER_CLI_ERROR_PACKAGE_ALREADY_INSTALLED`.
const ALREADY_INSTALLED: i32 = -1_978_335_135;
/// `APPINSTALLER_CLI_ERROR_UPDATE_NOT_APPLICABLE`.
const NO_APPLICABLE_UPGRADE: i32 = -1_978_335_189;

/// `winget` adapter keyed by exact package id.
#[derive(Debug)]
pub struct Winget {
    executor: Arc<dyn Executor>,
}

impl Winget {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl PackageBackend for Winget {
    fn kind(&self) -> Backend {
        Backend::Winget
    }

    fn is_available(&self) -> bool {
        self.executor.which("winget")
    }

    fn is_installed(&self, id: &str) -> bool {
        if !self.is_available() {
            return false;
        }
        self.executor
            .run_unchecked(
                "winget",
                &[
                    "list",
                    "--id",
                    id,
                    "--exact",
                    "--accept-source-agreements",
                    "--disable-interactivity",
                ],
            )
            .is_ok_and(|r| r.success && r.stdout.contains(id))
    }

    fn install(&self, id: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "winget")?;
        let result = self.executor.run_unchecked(
            "winget",
            &[
                "install",
                "--id",
                id,
                "--exact",
                "--silent",
                "--source",
                "winget",
                "--accept-source-agreements",
                "--accept-package-agreements",
                "--disable-interactivity",
            ],
        )?;
        if result.success || matches!(result.code, Some(ALREADY_INSTALLED | NO_APPLICABLE_UPGRADE)) {
            return Ok(());
        }
        // winget writes most diagnostics to stdout.
        let detail = if result.stderr.trim().is_empty() {
            result.stdout.trim().to_string()
        } else {
            format!("{}\n{}", result.stdout.trim(), result.stderr.trim())
        };
        anyhow::bail!(
            "winget install {id} failed (exit {}): {detail}",
            result.code.unwrap_or(-1)
        )
    }
}
