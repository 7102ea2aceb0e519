//! Fatal preconditions, checked before the first mutation.
use std::path::Path;
use std::time::Duration;

use crate::error::PreconditionError;
use crate::logging::Log;
use crate::platform::{Os, PlatformContext};
use crate::select::CatalogSelection;

/// Upper bound on the reachability request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Network reachability check.
pub trait NetworkProbe {
    /// Whether `url` answered at all; any HTTP status counts.
    fn reachable(&self, url: &str) -> bool;
}

/// [`NetworkProbe`] that sends a `HEAD` request.
#[derive(Debug)]
pub struct UreqProbe {
    agent: ureq::Agent,
}

impl UreqProbe {
    /// Create a probe with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(PROBE_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkProbe for UreqProbe {
    fn reachable(&self, url: &str) -> bool {
        self.agent.head(url).call().is_ok()
    }
}

/// Inputs for [`check`] that do not come from the platform.
#[derive(Debug, Clone, Copy)]
pub struct PreflightOptions<'a> {
    /// Endpoint for the network probe.
    pub probe_url: &'a str,
    /// Skip the network probe.
    pub offline: bool,
    /// Preview run; nothing will be fetched.
    pub dry_run: bool,
}

/// Verify every precondition for running `selection`.
///
/// # Errors
///
/// Returns the first [`PreconditionError`] found.
pub fn check(
    platform: &PlatformContext,
    selection: &CatalogSelection,
    opts: PreflightOptions<'_>,
    probe: &dyn NetworkProbe,
    log: &dyn Log,
) -> Result<(), PreconditionError> {
    log.stage("Checking preconditions");
    require_home(platform)?;

    if platform.os == Os::Unknown && !selection.targets().iter().any(|t| t.platforms.is_empty()) {
        return Err(PreconditionError::UnsupportedPlatform {
            os: platform.os.to_string(),
        });
    }

    let interpreter = required_interpreter(platform.os);
    if !interpreter.iter().any(|name| which::which(name).is_ok()) {
        return Err(PreconditionError::MissingInterpreter {
            name: interpreter.join(" or "),
        });
    }

    if opts.dry_run || opts.offline || !selection.needs_network() {
        log.debug("network probe skipped");
    } else if probe.reachable(opts.probe_url) {
        log.debug(&format!("network ok ({})", opts.probe_url));
    } else {
        return Err(PreconditionError::NoNetwork {
            url: opts.probe_url.to_string(),
        });
    }

    log.info(&format!("home {}", display_home(&platform.home)));
    Ok(())
}

/// Fail unless home names an existing directory.
///
/// # Errors
///
/// Returns [`PreconditionError::HomeUnavailable`] otherwise.
pub fn require_home(platform: &PlatformContext) -> Result<(), PreconditionError> {
    if platform.home.as_os_str().is_empty() || !platform.home.is_dir() {
        return Err(PreconditionError::HomeUnavailable);
    }
    Ok(())
}

/// Shells that package backends spawn through; one must exist.
const fn required_interpreter(os: Os) -> &'static [&'static str] {
    match os {
        Os::Windows => &["pwsh", "powershell"],
        Os::MacOs | Os::Linux | Os::Wsl | Os::Unknown => &["sh"],
    }
}

fn display_home(home: &Path) -> String {
    dunce::simplified(home).display().to_string()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::catalog::{Action, Backend, Catalog, Category, Target};
    use crate::logging::isolated_logger;
    use crate::select::Mode;
    use std::cell::Cell;
    use std::path::PathBuf;

    struct FakeProbe {
        up: bool,
        calls: Cell<u32>,
    }

    impl FakeProbe {
        const fn new(up: bool) -> Self {
            Self {
                up,
                calls: Cell::new(0),
            }
        }
    }

    impl NetworkProbe for FakeProbe {
        fn reachable(&self, _url: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.up
        }
    }

    fn package(id: &str, platforms: Vec<Os>) -> Target {
        Target {
            id: id.to_string(),
            category: Category::Essential,
            backend: Backend::Apt,
            platforms,
            action: Action::Package(id.to_string()),
        }
    }

    fn link() -> Target {
        Target {
            id: "link:.zshrc".to_string(),
            category: Category::Dotfile,
            backend: Backend::Symlink,
            platforms: Vec::new(),
            action: Action::Link {
                source: PathBuf::from("common/zshrc"),
                target: PathBuf::from(".zshrc"),
            },
        }
    }

    fn selection(targets: Vec<Target>) -> CatalogSelection {
        CatalogSelection::from_categories(
            &Catalog::from_targets(targets),
            Mode::Everything,
            Category::ALL.to_vec(),
        )
    }

    const ONLINE: PreflightOptions<'static> = PreflightOptions {
        probe_url: "https://github.com",
        offline: false,
        dry_run: false,
    };

    #[test]
    fn missing_home_is_fatal() {
        let (log, _tmp, _guard) = isolated_logger();
        let platform = PlatformContext::new(Os::Linux, PathBuf::new(), PathBuf::from("/repo"));
        let err = check(&platform, &selection(vec![link()]), ONLINE, &FakeProbe::new(true), &log)
            .unwrap_err();
        assert_eq!(err, PreconditionError::HomeUnavailable);
    }

    #[test]
    fn unknown_os_needs_agnostic_targets() {
        let (log, tmp, _guard) = isolated_logger();
        let platform = PlatformContext::new(Os::Unknown, tmp.path().to_path_buf(), PathBuf::new());
        let only_apt = selection(vec![package("apt:git", vec![Os::Linux])]);
        let err = check(&platform, &only_apt, ONLINE, &FakeProbe::new(true), &log).unwrap_err();
        assert!(matches!(err, PreconditionError::UnsupportedPlatform { ref os } if os == "unknown"));
    }

    #[cfg(unix)]
    #[test]
    fn unreachable_network_is_fatal() {
        let (log, tmp, _guard) = isolated_logger();
        let platform = PlatformContext::new(Os::Linux, tmp.path().to_path_buf(), PathBuf::new());
        let err = check(
            &platform,
            &selection(vec![package("apt:git", vec![Os::Linux])]),
            ONLINE,
            &FakeProbe::new(false),
            &log,
        )
        .unwrap_err();
        assert!(matches!(err, PreconditionError::NoNetwork { ref url } if url == "https://github.com"));
    }

    #[cfg(unix)]
    #[test]
    fn probe_skipped_when_offline_dry_run_or_local_only() {
        let (log, tmp, _guard) = isolated_logger();
        let platform = PlatformContext::new(Os::Linux, tmp.path().to_path_buf(), PathBuf::new());
        let probe = FakeProbe::new(false);
        let remote = selection(vec![package("apt:git", vec![Os::Linux])]);

        let offline = PreflightOptions {
            offline: true,
            ..ONLINE
        };
        check(&platform, &remote, offline, &probe, &log).unwrap();

        let dry_run = PreflightOptions {
            dry_run: true,
            ..ONLINE
        };
        check(&platform, &remote, dry_run, &probe, &log).unwrap();

        check(&platform, &selection(vec![link()]), ONLINE, &probe, &log).unwrap();
        assert_eq!(probe.calls.get(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn reachable_network_passes() {
        let (log, tmp, _guard) = isolated_logger();
        let platform = PlatformContext::new(Os::Linux, tmp.path().to_path_buf(), PathBuf::new());
        let probe = FakeProbe::new(true);
        check(
            &platform,
            &selection(vec![package("apt:git", vec![Os::Linux])]),
            ONLINE,
            &probe,
            &log,
        )
        .unwrap();
        assert_eq!(probe.calls.get(), 1);
    }

    #[test]
    fn interpreter_names() {
        assert_eq!(required_interpreter(Os::Linux), ["sh"]);
        assert_eq!(required_interpreter(Os::Windows), ["pwsh", "powershell"]);
    }
}
