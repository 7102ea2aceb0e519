// Shared helpers for integration tests.
//
// Provides a throwaway repository checkout and home directory, a catalog
// builder, and an in-memory package backend so each test can converge a
// real filesystem without touching the host's package managers.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bootstrap_cli::backends::{BackendSet, PackageBackend};
use bootstrap_cli::config::catalog::{Backend, Catalog, Category};
use bootstrap_cli::config::settings::Identity;
use bootstrap_cli::converge::Context;
use bootstrap_cli::logging::{Log, Logger};
use bootstrap_cli::platform::{Os, PlatformContext};
use bootstrap_cli::select::{CatalogSelection, Mode};

/// A repository checkout and a home directory, both temporary.
pub struct TestEnv {
    /// Holds `root/` and `home/`.
    pub dir: tempfile::TempDir,
}

impl TestEnv {
    /// Create an empty checkout (just `dotfiles/`) and an empty home.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("root").join("dotfiles")).expect("create dotfiles");
        std::fs::create_dir_all(dir.path().join("home")).expect("create home");
        Self { dir }
    }

    /// Repository root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    /// Home directory.
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Write a dotfile source under `dotfiles/`.
    pub fn with_dotfile(self, source: &str, content: &str) -> Self {
        write(&self.root().join("dotfiles").join(source), content);
        self
    }

    /// Write a file relative to the repository root.
    pub fn with_repo_file(self, path: &str, content: &str) -> Self {
        write(&self.root().join(path), content);
        self
    }

    /// Write a real file in home.
    pub fn with_home_file(self, path: &str, content: &str) -> Self {
        write(&self.home().join(path), content);
        self
    }

    /// Platform context for `os` rooted in this environment.
    pub fn platform(&self, os: Os) -> PlatformContext {
        PlatformContext::new(os, self.home(), self.root())
            .with_log_path(self.dir.path().join("bootstrap.log"))
    }

    /// Driver context for `os` with the given adapters.
    pub fn context(&self, os: Os, backends: BackendSet) -> Context {
        let platform = self.platform(os);
        let log: Arc<dyn Log> = Arc::new(Logger::new(&platform.log_path));
        Context::new(Arc::new(platform), backends, log)
    }

    /// Driver context whose log lines are kept in `log`.
    pub fn recorded_context(&self, os: Os, backends: BackendSet, log: &RecordingLog) -> Context {
        let log: Arc<dyn Log> = Arc::new(log.clone());
        Context::new(Arc::new(self.platform(os)), backends, log)
    }

    /// Backup files sitting next to `home/<path>`.
    pub fn backups_of(&self, path: &str) -> Vec<PathBuf> {
        let original = self.home().join(path);
        let parent = original.parent().expect("parent").to_path_buf();
        let prefix = format!(
            "{}.backup.",
            original.file_name().expect("file name").to_string_lossy()
        );
        let mut found: Vec<PathBuf> = std::fs::read_dir(parent)
            .expect("read home")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect();
        found.sort();
        found
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, content).expect("write file");
}

/// Parse catalog TOML, panicking on syntax errors.
pub fn catalog(toml: &str) -> Catalog {
    Catalog::parse(toml, "test.toml").expect("parse test catalog")
}

/// Select every category of `catalog` filtered for `os`.
pub fn select_all(catalog: &Catalog, platform: &PlatformContext) -> CatalogSelection {
    CatalogSelection::from_categories(
        &catalog.for_platform(platform),
        Mode::Everything,
        Category::ALL.to_vec(),
    )
}

/// A complete identity.
pub fn identity() -> Identity {
    Identity {
        name: Some("Ada Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
    }
}

/// In-memory package manager.
///
/// Clones share state, so a test can keep one handle and hand another to a
/// [`BackendSet`].
#[derive(Debug, Clone)]
pub struct FakeBackend {
    kind: Backend,
    installed: Arc<Mutex<HashSet<String>>>,
    failing: Arc<HashSet<String>>,
    installs: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    /// A backend for `kind` with nothing installed.
    pub fn new(kind: Backend) -> Self {
        Self {
            kind,
            installed: Arc::default(),
            failing: Arc::default(),
            installs: Arc::default(),
        }
    }

    /// Mark `names` as already installed.
    pub fn with_installed(self, names: &[&str]) -> Self {
        self.installed
            .lock()
            .expect("lock")
            .extend(names.iter().map(ToString::to_string));
        self
    }

    /// Make installing any of `names` fail.
    pub fn with_failing(mut self, names: &[&str]) -> Self {
        self.failing = Arc::new(names.iter().map(ToString::to_string).collect());
        self
    }

    /// Names passed to `install`, in call order.
    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().expect("lock").clone()
    }

    /// A [`BackendSet`] holding just this backend.
    pub fn into_set(self) -> BackendSet {
        BackendSet::default().with(Box::new(self))
    }
}

impl PackageBackend for FakeBackend {
    fn kind(&self) -> Backend {
        self.kind
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_installed(&self, name: &str) -> bool {
        self.installed.lock().expect("lock").contains(name)
    }

    fn install(&self, name: &str) -> anyhow::Result<()> {
        self.installs.lock().expect("lock").push(name.to_string());
        if self.failing.contains(name) {
            anyhow::bail!("{} install {name} failed (exit 100)", self.kind);
        }
        self.installed.lock().expect("lock").insert(name.to_string());
        Ok(())
    }
}

/// [`Log`] that keeps every line as `"<level> <message>"`.
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLog {
    /// Lines logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock").clone()
    }

    /// Whether any line at `level` contains `needle`.
    pub fn has(&self, level: &str, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|l| l.starts_with(level) && l.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines.lock().expect("lock").push(format!("{level} {msg}"));
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }

    fn info(&self, msg: &str) {
        self.push("info", msg);
    }

    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }

    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }

    fn error(&self, msg: &str) {
        self.push("error", msg);
    }

    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
}
