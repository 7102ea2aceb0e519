//! Platform detection and the per-run [`PlatformContext`].
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Detected operating system or environment variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Apple macOS.
    #[serde(rename = "macos")]
    MacOs,
    /// Native Linux.
    Linux,
    /// Linux running under Windows Subsystem for Linux.
    Wsl,
    /// Native Windows.
    Windows,
    /// Anything else; only platform-agnostic targets run.
    Unknown,
}

impl Os {
    /// Every concrete OS, in display order.
    pub const KNOWN: [Self; 4] = [Self::MacOs, Self::Linux, Self::Wsl, Self::Windows];

    /// Parse a catalog tag such as `macos` or `wsl`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "mac" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "wsl" => Some(Self::Wsl),
            "windows" | "win" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Coarse family name exported to child processes.
    #[must_use]
    pub const fn family(self) -> &'static str {
        match self {
            Self::MacOs | Self::Linux | Self::Wsl => "unix",
            Self::Windows => "windows",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
            Self::Wsl => write!(f, "wsl"),
            Self::Windows => write!(f, "windows"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Interactive shell the operator is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    /// GNU bash.
    Bash,
    /// Z shell.
    Zsh,
    /// Windows PowerShell or PowerShell 7.
    PowerShell,
    /// Unrecognised or unset.
    Unknown,
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bash => write!(f, "bash"),
            Self::Zsh => write!(f, "zsh"),
            Self::PowerShell => write!(f, "powershell"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Raw host facts that detection is computed from.
///
/// Gathering these is the only impure step; [`PlatformContext::from_probe`]
/// is a pure function of this value.
#[derive(Debug, Clone, Default)]
pub struct HostProbe {
    /// Kernel / target OS name (`std::env::consts::OS`).
    pub kernel: String,
    /// Whether a WSL marker was found.
    pub wsl_marker: bool,
    /// Value of `SHELL`, if set.
    pub shell_path: Option<String>,
    /// Whether `PSModulePath` is set (PowerShell session on Windows).
    pub powershell_marker: bool,
    /// Home directory, if one could be determined.
    pub home: Option<PathBuf>,
}

impl HostProbe {
    /// Read the facts from the running process environment.
    #[must_use]
    pub fn gather() -> Self {
        let kernel = std::env::consts::OS.to_string();
        let wsl_marker = kernel == "linux"
            && (std::env::var_os("WSL_DISTRO_NAME").is_some()
                || std::env::var_os("WSL_INTEROP").is_some()
                || std::fs::read_to_string("/proc/sys/kernel/osrelease")
                    .is_ok_and(|s| s.to_ascii_lowercase().contains("microsoft")));
        let home = if kernel == "windows" {
            std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"))
        } else {
            std::env::var_os("HOME")
        }
        .filter(|h| !h.is_empty())
        .map(PathBuf::from);

        Self {
            kernel,
            wsl_marker,
            shell_path: std::env::var("SHELL").ok(),
            powershell_marker: std::env::var_os("PSModulePath").is_some(),
            home,
        }
    }
}

/// Immutable per-run platform information, passed explicitly to every
/// component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    /// Detected OS variant.
    pub os: Os,
    /// Detected operator shell.
    pub shell: Shell,
    /// User home directory (empty when it could not be determined).
    pub home: PathBuf,
    /// Append-only run log for this OS.
    pub log_path: PathBuf,
    /// Root of the checked-out repository.
    pub root: PathBuf,
}

impl PlatformContext {
    /// Detect the current platform.
    #[must_use]
    pub fn detect(root: PathBuf) -> Self {
        Self::from_probe(&HostProbe::gather(), root)
    }

    /// Build a context from gathered host facts.
    #[must_use]
    pub fn from_probe(probe: &HostProbe, root: PathBuf) -> Self {
        let os = match probe.kernel.as_str() {
            "macos" => Os::MacOs,
            "linux" if probe.wsl_marker => Os::Wsl,
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            _ => Os::Unknown,
        };

        let shell = probe
            .shell_path
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .map_or_else(
                || {
                    if os == Os::Windows && probe.powershell_marker {
                        Shell::PowerShell
                    } else {
                        Shell::Unknown
                    }
                },
                |name| match name.trim_end_matches(".exe") {
                    "zsh" => Shell::Zsh,
                    "bash" => Shell::Bash,
                    "pwsh" | "powershell" => Shell::PowerShell,
                    _ => Shell::Unknown,
                },
            );

        let home = probe.home.clone().unwrap_or_default();
        let log_path = default_log_path(&home, os);

        Self {
            os,
            shell,
            home,
            log_path,
            root,
        }
    }

    /// Create a context with explicit values.
    #[must_use]
    pub fn new(os: Os, home: PathBuf, root: PathBuf) -> Self {
        let log_path = default_log_path(&home, os);
        Self {
            os,
            shell: Shell::Unknown,
            home,
            log_path,
            root,
        }
    }

    /// Replace the log path (from `--log-file`).
    #[must_use]
    pub fn with_log_path(mut self, path: PathBuf) -> Self {
        self.log_path = path;
        self
    }

    /// Whether a target restricted to `platforms` applies here.
    ///
    /// An empty set is platform-agnostic and always applies; a non-empty set
    /// never matches [`Os::Unknown`].
    #[must_use]
    pub fn accepts(&self, platforms: &[Os]) -> bool {
        platforms.is_empty() || (self.os != Os::Unknown && platforms.contains(&self.os))
    }

    /// Directory holding the dotfile sources.
    #[must_use]
    pub fn dotfiles_dir(&self) -> PathBuf {
        self.root.join("dotfiles")
    }

    /// Variables handed to child processes launched by backends.
    #[must_use]
    pub fn child_env(&self) -> Vec<(String, String)> {
        let dotfiles = self.dotfiles_dir();
        vec![
            (
                "BOOTSTRAP_ROOT".to_string(),
                self.root.display().to_string(),
            ),
            (
                "BOOTSTRAP_OS_FAMILY".to_string(),
                self.os.family().to_string(),
            ),
            ("BOOTSTRAP_PLATFORM".to_string(), self.os.to_string()),
            (
                "BOOTSTRAP_COMMON_DIR".to_string(),
                dotfiles.join("common").display().to_string(),
            ),
            (
                "BOOTSTRAP_OS_DIR".to_string(),
                dotfiles.join(self.os.to_string()).display().to_string(),
            ),
        ]
    }
}

fn default_log_path(home: &Path, os: Os) -> PathBuf {
    home.join(".bootstrap").join(format!("{os}.log"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn probe(kernel: &str) -> HostProbe {
        HostProbe {
            kernel: kernel.to_string(),
            home: Some(PathBuf::from("/home/dev")),
            ..HostProbe::default()
        }
    }

    #[test]
    fn detects_macos() {
        let ctx = PlatformContext::from_probe(&probe("macos"), PathBuf::from("/repo"));
        assert_eq!(ctx.os, Os::MacOs);
    }

    #[test]
    fn detects_wsl_from_marker() {
        let mut p = probe("linux");
        p.wsl_marker = true;
        let ctx = PlatformContext::from_probe(&p, PathBuf::from("/repo"));
        assert_eq!(ctx.os, Os::Wsl);
    }

    #[test]
    fn plain_linux_without_marker() {
        let ctx = PlatformContext::from_probe(&probe("linux"), PathBuf::from("/repo"));
        assert_eq!(ctx.os, Os::Linux);
    }

    #[test]
    fn unrecognised_kernel_is_unknown() {
        let ctx = PlatformContext::from_probe(&probe("freebsd"), PathBuf::from("/repo"));
        assert_eq!(ctx.os, Os::Unknown);
    }

    #[test]
    fn shell_from_path() {
        let mut p = probe("linux");
        p.shell_path = Some("/usr/bin/zsh".to_string());
        let ctx = PlatformContext::from_probe(&p, PathBuf::from("/repo"));
        assert_eq!(ctx.shell, Shell::Zsh);

        p.shell_path = Some("/bin/bash".to_string());
        let ctx = PlatformContext::from_probe(&p, PathBuf::from("/repo"));
        assert_eq!(ctx.shell, Shell::Bash);
    }

    #[test]
    fn powershell_marker_on_windows() {
        let mut p = probe("windows");
        p.powershell_marker = true;
        let ctx = PlatformContext::from_probe(&p, PathBuf::from("C:/repo"));
        assert_eq!(ctx.shell, Shell::PowerShell);
    }

    #[test]
    fn missing_home_is_empty() {
        let mut p = probe("linux");
        p.home = None;
        let ctx = PlatformContext::from_probe(&p, PathBuf::from("/repo"));
        assert!(ctx.home.as_os_str().is_empty());
    }

    #[test]
    fn log_path_is_per_os() {
        let linux = PlatformContext::new(Os::Linux, PathBuf::from("/h"), PathBuf::from("/r"));
        let mac = PlatformContext::new(Os::MacOs, PathBuf::from("/h"), PathBuf::from("/r"));
        assert_ne!(linux.log_path, mac.log_path);
        assert!(linux.log_path.starts_with("/h"));
    }

    #[test]
    fn accepts_agnostic_everywhere() {
        let unknown = PlatformContext::new(Os::Unknown, PathBuf::from("/h"), PathBuf::from("/r"));
        assert!(unknown.accepts(&[]));
        assert!(!unknown.accepts(&[Os::Linux]));
    }

    #[test]
    fn accepts_listed_platform_only() {
        let wsl = PlatformContext::new(Os::Wsl, PathBuf::from("/h"), PathBuf::from("/r"));
        assert!(wsl.accepts(&[Os::Linux, Os::Wsl]));
        assert!(!wsl.accepts(&[Os::MacOs]));
    }

    #[test]
    fn child_env_carries_context() {
        let ctx = PlatformContext::new(Os::Linux, PathBuf::from("/h"), PathBuf::from("/r"));
        let env = ctx.child_env();
        let get = |k: &str| {
            env.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("BOOTSTRAP_PLATFORM"), "linux");
        assert_eq!(get("BOOTSTRAP_OS_FAMILY"), "unix");
        assert!(get("BOOTSTRAP_OS_DIR").ends_with("linux"));
    }

    #[test]
    fn os_tags_round_trip() {
        for os in Os::KNOWN {
            assert_eq!(Os::from_tag(&os.to_string()), Some(os));
        }
        assert_eq!(Os::from_tag("plan9"), None);
    }
}
