//! Interactive selector: narrows the platform catalog to one run's targets.
//!
//! Selection is a pure mapping from (catalog, mode, answers) to a
//! [`CatalogSelection`]. All terminal input goes through the [`Prompter`]
//! trait so that scripted runs never block on stdin.
use std::fmt;

use anyhow::{Result, bail};

use crate::config::catalog::{Action, Catalog, Category, Target};
use crate::config::settings::Identity;

/// How much of the catalog a run converges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Core tools and dotfiles only.
    Essential,
    /// Everything a development machine needs, minus desktop apps.
    FullDev,
    /// Every category.
    Everything,
    /// Ask once per category.
    Custom,
    /// Fixed category list from `--categories`.
    Categories(Vec<Category>),
}

impl Mode {
    /// Modes offered by the interactive menu, in menu order.
    pub const MENU: [Self; 4] = [Self::Essential, Self::FullDev, Self::Everything, Self::Custom];

    /// Parse a `--mode` value.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "essential" => Some(Self::Essential),
            "full-dev" | "full" => Some(Self::FullDev),
            "everything" | "all" => Some(Self::Everything),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Parse a comma-separated `--categories` list.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown category.
    pub fn from_category_list(list: &str) -> Result<Self> {
        let mut categories = Vec::new();
        for tag in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some(category) = Category::from_tag(tag) else {
                bail!(
                    "unknown category '{tag}' (expected one of: {})",
                    Category::ALL.map(Category::tag).join(", ")
                );
            };
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        if categories.is_empty() {
            bail!("--categories needs at least one category");
        }
        Ok(Self::Categories(categories))
    }

    /// Menu description.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Essential => "Essential (shell, git, core tools, dotfiles)",
            Self::FullDev => "Full development (essential + CLI, dev, cloud tooling)",
            Self::Everything => "Everything (all categories)",
            Self::Custom => "Custom (choose each category)",
            Self::Categories(_) => "Selected categories",
        }
    }

    /// Categories included without asking, or `None` for [`Mode::Custom`].
    #[must_use]
    pub fn fixed_categories(&self) -> Option<Vec<Category>> {
        match self {
            Self::Essential => Some(vec![Category::Essential, Category::Dotfile]),
            Self::FullDev => Some(vec![
                Category::Essential,
                Category::Cli,
                Category::Dev,
                Category::Cloud,
                Category::Dotfile,
            ]),
            Self::Everything => Some(Category::ALL.to_vec()),
            Self::Categories(list) => Some(list.clone()),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Essential => f.write_str("essential"),
            Self::FullDev => f.write_str("full-dev"),
            Self::Everything => f.write_str("everything"),
            Self::Custom => f.write_str("custom"),
            Self::Categories(list) => {
                let tags: Vec<&str> = list.iter().map(|c| c.tag()).collect();
                write!(f, "categories({})", tags.join(","))
            }
        }
    }
}

/// The targets chosen for one run, in catalog order.
#[derive(Debug, Clone)]
pub struct CatalogSelection {
    mode: Mode,
    categories: Vec<Category>,
    targets: Vec<Target>,
}

impl CatalogSelection {
    /// Every target of `catalog` whose category is in `categories`.
    #[must_use]
    pub fn from_categories(catalog: &Catalog, mode: Mode, categories: Vec<Category>) -> Self {
        let targets = catalog
            .targets()
            .iter()
            .filter(|t| categories.contains(&t.category))
            .cloned()
            .collect();
        Self {
            mode,
            categories,
            targets,
        }
    }

    /// Mode that produced this selection.
    #[must_use]
    pub const fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Categories included.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Selected targets, in catalog order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Whether any selected target needs the network.
    #[must_use]
    pub fn needs_network(&self) -> bool {
        self.targets.iter().any(Target::needs_network)
    }

    /// Whether any selected target renders the identity template.
    #[must_use]
    pub fn needs_identity(&self) -> bool {
        self.targets
            .iter()
            .any(|t| matches!(t.action, Action::Template { .. }))
    }

    /// Number of selected targets.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing was selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Source of operator answers.
pub trait Prompter {
    /// Pick one entry of `options`; returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read.
    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize>;

    /// Ask a yes/no question.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Ask for a line of text.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read.
    fn input(&mut self, prompt: &str) -> Result<String>;
}

/// Prompts on the controlling terminal with `dialoguer`.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn choose(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        Ok(dialoguer::Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()?)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?)
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        Ok(dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }
}

/// Prompter for scripted runs: every question is an error.
#[derive(Debug, Default)]
pub struct NoPrompter;

impl Prompter for NoPrompter {
    fn choose(&mut self, prompt: &str, _: &[String]) -> Result<usize> {
        bail!("'{prompt}' needs an interactive terminal; pass --mode instead")
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        bail!("'{prompt}' needs an interactive terminal; pass --categories instead")
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        bail!("'{prompt}' needs an interactive terminal")
    }
}

/// Show the numbered mode menu.
///
/// # Errors
///
/// Propagates prompter errors.
pub fn prompt_mode(prompter: &mut dyn Prompter) -> Result<Mode> {
    let options: Vec<String> = Mode::MENU.iter().map(|m| m.describe().to_string()).collect();
    let index = prompter.choose("Select an installation mode", &options)?;
    Mode::MENU
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow::anyhow!("menu choice {index} out of range"))
}

/// Narrow a platform-filtered `catalog` by `mode`.
///
/// [`Mode::Custom`] asks one yes/no question per category present in the
/// catalog; every other mode is answered without prompting.
///
/// # Errors
///
/// Propagates prompter errors.
pub fn select(catalog: &Catalog, mode: Mode, prompter: &mut dyn Prompter) -> Result<CatalogSelection> {
    let categories = if let Some(fixed) = mode.fixed_categories() {
        fixed
    } else {
        let mut accepted = Vec::new();
        for category in catalog.categories() {
            let count = catalog
                .targets()
                .iter()
                .filter(|t| t.category == category)
                .count();
            if prompter.confirm(&format!("Install {category} ({count} targets)?"))? {
                accepted.push(category);
            }
        }
        accepted
    };
    Ok(CatalogSelection::from_categories(catalog, mode, categories))
}

/// Ask for whichever identity fields are still missing.
///
/// # Errors
///
/// Propagates prompter errors.
pub fn prompt_identity(identity: Identity, prompter: &mut dyn Prompter) -> Result<Identity> {
    let name = ask_if_blank(identity.name, "Git user name", prompter)?;
    let email = ask_if_blank(identity.email, "Git email", prompter)?;
    Ok(Identity { name, email })
}

fn ask_if_blank(
    value: Option<String>,
    prompt: &str,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>> {
    if value.as_deref().is_some_and(|v| !v.trim().is_empty()) {
        return Ok(value);
    }
    let answer = prompter.input(prompt)?;
    Ok(Some(answer.trim().to_string()).filter(|a| !a.is_empty()))
}

/// Prompter that replays canned answers, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    /// Answers for [`Prompter::choose`].
    pub choices: std::collections::VecDeque<usize>,
    /// Answers for [`Prompter::confirm`].
    pub confirms: std::collections::VecDeque<bool>,
    /// Answers for [`Prompter::input`].
    pub inputs: std::collections::VecDeque<String>,
    /// Every prompt shown, in order.
    pub asked: Vec<String>,
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn choose(&mut self, prompt: &str, _: &[String]) -> Result<usize> {
        self.asked.push(prompt.to_string());
        self.choices
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted choice"))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.asked.push(prompt.to_string());
        self.confirms
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted confirm"))
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.inputs
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted input"))
    }
}
