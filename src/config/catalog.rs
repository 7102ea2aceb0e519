//! The target catalog: every capability the engine can converge.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::toml_loader;
use super::validation::ValidationWarning;
use crate::error::ConfigError;
use crate::platform::{Os, PlatformContext};

/// Catalog compiled into the binary.
pub const DEFAULT_CATALOG: &str = include_str!("../../catalog/default.toml");

/// Label used for warnings about the compiled-in catalog.
const BUILTIN_LABEL: &str = "catalog/default.toml";

/// Grouping used by the selector, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Shell, git, core build tools.
    Essential,
    /// Command-line utilities.
    Cli,
    /// Language toolchains and editors.
    Dev,
    /// Cloud provider tooling.
    Cloud,
    /// Chat and communication apps.
    Comm,
    /// Media players and editors.
    Media,
    /// Desktop utilities.
    Utility,
    /// Dotfile links, shell frameworks, identity file.
    Dotfile,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Essential,
        Self::Cli,
        Self::Dev,
        Self::Cloud,
        Self::Comm,
        Self::Media,
        Self::Utility,
        Self::Dotfile,
    ];

    /// Parse a section or `--categories` tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.tag().eq_ignore_ascii_case(tag.trim()))
    }

    /// Tag as used in catalog section names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Cli => "cli",
            Self::Dev => "dev",
            Self::Cloud => "cloud",
            Self::Comm => "comm",
            Self::Media => "media",
            Self::Utility => "utility",
            Self::Dotfile => "dotfile",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Mechanism that realises a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Backend {
    /// Homebrew formula.
    Brew,
    /// Homebrew cask.
    Cask,
    /// Debian/Ubuntu apt.
    Apt,
    /// Windows Package Manager.
    Winget,
    /// Chocolatey.
    Choco,
    /// Python applications via pipx.
    Pipx,
    /// Global npm packages.
    Npm,
    /// `cargo install` binaries.
    Cargo,
    /// Dotfile symlink.
    Symlink,
    /// Git clone of a shell framework or theme.
    GitClone,
    /// Rendered identity template.
    Template,
}

impl Backend {
    /// Every package-manager backend, in catalog emission order.
    pub const PACKAGE_MANAGERS: [Self; 8] = [
        Self::Brew,
        Self::Cask,
        Self::Apt,
        Self::Winget,
        Self::Choco,
        Self::Pipx,
        Self::Npm,
        Self::Cargo,
    ];

    /// Prefix used in target ids.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Brew => "brew",
            Self::Cask => "cask",
            Self::Apt => "apt",
            Self::Winget => "winget",
            Self::Choco => "choco",
            Self::Pipx => "pipx",
            Self::Npm => "npm",
            Self::Cargo => "cargo",
            Self::Symlink => "link",
            Self::GitClone => "clone",
            Self::Template => "template",
        }
    }

    /// Platforms a target runs on when its section has no OS suffix.
    #[must_use]
    pub const fn default_platforms(self) -> &'static [Os] {
        match self {
            Self::Brew | Self::Cask => &[Os::MacOs],
            Self::Apt => &[Os::Linux, Os::Wsl],
            Self::Winget | Self::Choco => &[Os::Windows],
            Self::Pipx
            | Self::Npm
            | Self::Cargo
            | Self::Symlink
            | Self::GitClone
            | Self::Template => &[],
        }
    }

    /// Whether the backend can run on `os` at all.
    #[must_use]
    pub fn runs_on(self, os: Os) -> bool {
        let defaults = self.default_platforms();
        defaults.is_empty() || defaults.contains(&os)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// What applying a target does. Paths are relative: link and template
/// sources to the repository, targets and clone destinations to home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Install a package by name.
    Package(String),
    /// Symlink `~/<target>` to `<root>/dotfiles/<source>`.
    Link {
        /// Source under `dotfiles/`.
        source: PathBuf,
        /// Destination under home.
        target: PathBuf,
    },
    /// Clone `url` into `~/<dest>`.
    Clone {
        /// Remote URL.
        url: String,
        /// Destination under home.
        dest: PathBuf,
    },
    /// Render `<root>/<source>` into `~/<target>`.
    Template {
        /// Template path under the repository root.
        source: PathBuf,
        /// Destination under home.
        target: PathBuf,
    },
}

/// A single desired capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique id, e.g. `brew:git` or `link:.zshrc`.
    pub id: String,
    /// Selector grouping.
    pub category: Category,
    /// Mechanism.
    pub backend: Backend,
    /// Platforms this target applies to; empty means all.
    pub platforms: Vec<Os>,
    /// What applying does.
    pub action: Action,
}

impl Target {
    /// Whether this target belongs to the dotfile pass.
    #[must_use]
    pub const fn is_dotfile(&self) -> bool {
        matches!(self.action, Action::Link { .. } | Action::Template { .. })
    }

    /// Whether applying this target needs the network.
    #[must_use]
    pub const fn needs_network(&self) -> bool {
        matches!(self.action, Action::Package(_) | Action::Clone { .. })
    }
}

/// A `links` entry: a bare source path or an explicit `{ source, target }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Simple(String),
    WithTarget { source: String, target: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CloneEntry {
    name: String,
    url: String,
    dest: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateEntry {
    source: String,
    target: String,
}

/// One catalog section as written on disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Section {
    brew: Vec<String>,
    cask: Vec<String>,
    apt: Vec<String>,
    winget: Vec<String>,
    choco: Vec<String>,
    pipx: Vec<String>,
    npm: Vec<String>,
    cargo: Vec<String>,
    clones: Vec<CloneEntry>,
    links: Vec<LinkEntry>,
    templates: Vec<TemplateEntry>,
}

impl Section {
    fn take_packages(&mut self, backend: Backend) -> Vec<String> {
        let list = match backend {
            Backend::Brew => &mut self.brew,
            Backend::Cask => &mut self.cask,
            Backend::Apt => &mut self.apt,
            Backend::Winget => &mut self.winget,
            Backend::Choco => &mut self.choco,
            Backend::Pipx => &mut self.pipx,
            Backend::Npm => &mut self.npm,
            Backend::Cargo => &mut self.cargo,
            Backend::Symlink | Backend::GitClone | Backend::Template => return Vec::new(),
        };
        std::mem::take(list)
    }
}

/// Derive the home-relative target for a link source without an explicit
/// target: `common/zshrc` becomes `.zshrc`.
#[must_use]
pub fn default_link_target(source: &str) -> PathBuf {
    let name = Path::new(source)
        .file_name()
        .map_or_else(|| source.to_string(), |n| n.to_string_lossy().into_owned());
    if name.starts_with('.') {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!(".{name}"))
    }
}

fn target_label(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// The full, ordered list of targets plus any warnings raised while parsing.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    targets: Vec<Target>,
    warnings: Vec<ValidationWarning>,
}

impl Catalog {
    /// Build a catalog from already-constructed targets.
    #[must_use]
    pub const fn from_targets(targets: Vec<Target>) -> Self {
        Self {
            targets,
            warnings: Vec::new(),
        }
    }

    /// Parse the compiled-in catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] if the embedded file is malformed.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(DEFAULT_CATALOG, BUILTIN_LABEL)
    }

    /// Load `<root>/conf/catalog.toml` when present, else the compiled-in
    /// catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chosen file cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join("conf").join("catalog.toml");
        if !path.exists() {
            return Self::builtin();
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, "conf/catalog.toml")
    }

    /// Parse catalog TOML.
    ///
    /// Sections are emitted in [`Category`] order (ties by section name);
    /// within a section, package managers come first in
    /// [`Backend::PACKAGE_MANAGERS`] order, then clones, links, templates,
    /// each in file order. Sections with unknown names are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSyntax`] on malformed TOML or unknown keys.
    pub fn parse(content: &str, label: &str) -> Result<Self, ConfigError> {
        let sections: Vec<(String, Section)> = toml_loader::parse_sections(content, label)?;
        let mut warnings = Vec::new();

        let mut named = Vec::with_capacity(sections.len());
        for (name, section) in sections {
            match toml_loader::parse_section_name(&name) {
                Ok(parsed) => named.push((parsed, name, section)),
                Err(message) => {
                    warnings.push(ValidationWarning::new(label, &name, message));
                }
            }
        }
        named.sort_by(|a, b| a.0.category.cmp(&b.0.category).then_with(|| a.1.cmp(&b.1)));

        let mut targets = Vec::new();
        for (parsed, _, mut section) in named {
            let category = parsed.category;
            let platforms_for = |backend: Backend| {
                parsed
                    .platforms
                    .clone()
                    .unwrap_or_else(|| backend.default_platforms().to_vec())
            };

            for backend in Backend::PACKAGE_MANAGERS {
                for name in section.take_packages(backend) {
                    targets.push(Target {
                        id: format!("{}:{name}", backend.tag()),
                        category,
                        backend,
                        platforms: platforms_for(backend),
                        action: Action::Package(name),
                    });
                }
            }

            for clone in section.clones {
                targets.push(Target {
                    id: format!("{}:{}", Backend::GitClone.tag(), clone.name),
                    category,
                    backend: Backend::GitClone,
                    platforms: platforms_for(Backend::GitClone),
                    action: Action::Clone {
                        url: clone.url,
                        dest: PathBuf::from(clone.dest),
                    },
                });
            }

            for link in section.links {
                let (source, target) = match link {
                    LinkEntry::Simple(source) => {
                        let target = default_link_target(&source);
                        (source, target)
                    }
                    LinkEntry::WithTarget { source, target } => (source, PathBuf::from(target)),
                };
                targets.push(Target {
                    id: format!("{}:{}", Backend::Symlink.tag(), target_label(&target)),
                    category,
                    backend: Backend::Symlink,
                    platforms: platforms_for(Backend::Symlink),
                    action: Action::Link {
                        source: PathBuf::from(source),
                        target,
                    },
                });
            }

            for template in section.templates {
                let target = PathBuf::from(template.target);
                targets.push(Target {
                    id: format!("{}:{}", Backend::Template.tag(), target_label(&target)),
                    category,
                    backend: Backend::Template,
                    platforms: platforms_for(Backend::Template),
                    action: Action::Template {
                        source: PathBuf::from(template.source),
                        target,
                    },
                });
            }
        }

        Ok(Self { targets, warnings })
    }

    /// Targets that apply on `ctx.os`, in catalog order.
    #[must_use]
    pub fn for_platform(&self, ctx: &PlatformContext) -> Self {
        Self {
            targets: self
                .targets
                .iter()
                .filter(|t| ctx.accepts(&t.platforms))
                .cloned()
                .collect(),
            warnings: Vec::new(),
        }
    }

    /// All targets, in catalog order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Look up a target by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Categories present in this catalog, in display order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.targets.iter().any(|t| t.category == *c))
            .collect()
    }

    /// Warnings raised while parsing.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Number of targets.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the catalog has no targets.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
