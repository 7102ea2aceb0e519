//! Debian/Ubuntu packages through `apt-get`.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;

use super::{PackageBackend, require_tool};
use crate::config::catalog::Backend;
use crate::exec::Executor;

/// `apt-get` adapter. The package index is refreshed once per run, before
/// the first install.
#[derive(Debug)]
pub struct Apt {
    executor: Arc<dyn Executor>,
    index_refreshed: AtomicBool,
}

impl Apt {
    /// Create the adapter.
    #[must_use]
    pub const fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            index_refreshed: AtomicBool::new(false),
        }
    }

    /// Run an `apt-get` subcommand, through `sudo` when it is available.
    fn apt_get(&self, args: &[&str]) -> Result<()> {
        let mut full = vec!["DEBIAN_FRONTEND=noninteractive", "apt-get"];
        full.extend_from_slice(args);
        if self.executor.which("sudo") {
            self.executor.run("sudo", &full)?;
        } else {
            self.executor.run("env", &full)?;
        }
        Ok(())
    }
}

impl PackageBackend for Apt {
    fn kind(&self) -> Backend {
        Backend::Apt
    }

    fn is_available(&self) -> bool {
        self.executor.which("apt-get")
    }

    fn is_installed(&self, name: &str) -> bool {
        if !self.executor.which("dpkg-query") {
            return false;
        }
        self.executor
            .run_unchecked("dpkg-query", &["-W", "-f=${Status}", name])
            .is_ok_and(|r| r.success && r.stdout.contains("install ok installed"))
    }

    fn install(&self, name: &str) -> Result<()> {
        require_tool(self.executor.as_ref(), "apt-get")?;
        if !self.index_refreshed.load(Ordering::SeqCst) {
            self.apt_get(&["update", "-q"])?;
            self.index_refreshed.store(true, Ordering::SeqCst);
        }
        self.apt_get(&["install", "-y", "-q", name])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::resources::test_helpers::MockExecutor;

    #[test]
    fn installed_status_is_parsed() {
        let exec = Arc::new(MockExecutor::ok("install ok installed"));
        assert!(Apt::new(exec.clone()).is_installed("git"));
        assert_eq!(exec.calls(), ["dpkg-query -W -f=${Status} git"]);
    }

    #[test]
    fn deinstalled_package_is_not_installed() {
        let exec = Arc::new(MockExecutor::ok("deinstall ok config-files"));
        assert!(!Apt::new(exec).is_installed("git"));
    }

    #[test]
    fn unknown_package_is_not_installed() {
        let exec = Arc::new(MockExecutor::fail());
        assert!(!Apt::new(exec).is_installed("no-such-package"));
    }

    #[test]
    fn index_refreshed_once() {
        let exec = Arc::new(MockExecutor::with_responses(vec![
            (true, String::new()),
            (true, String::new()),
            (true, String::new()),
        ]));
        let apt = Apt::new(exec.clone());
        apt.install("git").unwrap();
        apt.install("zsh").unwrap();
        assert_eq!(
            exec.calls(),
            [
                "sudo DEBIAN_FRONTEND=noninteractive apt-get update -q",
                "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -q git",
                "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -q zsh",
            ]
        );
    }

    #[test]
    fn failed_refresh_is_retried_on_next_install() {
        let exec = Arc::new(MockExecutor::with_responses(vec![
            (false, "E: Could not get lock".to_string()),
            (true, String::new()),
            (true, String::new()),
        ]));
        let apt = Apt::new(exec.clone());
        assert!(apt.install("git").is_err());
        apt.install("zsh").unwrap();
        assert_eq!(
            exec.calls(),
            [
                "sudo DEBIAN_FRONTEND=noninteractive apt-get update -q",
                "sudo DEBIAN_FRONTEND=noninteractive apt-get update -q",
                "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y -q zsh",
            ]
        );
    }

    #[test]
    fn install_failure_propagates() {
        let exec = Arc::new(MockExecutor::with_responses(vec![
            (true, String::new()),
            (false, "E: Unable to locate package nope".to_string()),
        ]));
        let err = Apt::new(exec).install("nope").unwrap_err();
        assert!(err.to_string().contains("Unable to locate package"));
    }
}
